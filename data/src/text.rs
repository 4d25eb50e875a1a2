//! Text serialization of boards
//!
//! A board of height H and width W is written as H lines of W characters, each
//! of which is either `0` (dead cell) or `1` (live cell). Lines are written
//! from top to bottom and terminated by a newline. Two runs that computed the
//! same final board therefore produce byte-identical files.

use crate::{
    board::{self, Board, BoardView},
    ALIVE, DEAD,
};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Write a board in text form
pub fn write_board(mut output: impl Write, board: BoardView<'_>) -> io::Result<()> {
    let mut line = String::with_capacity(board.ncols() + 1);
    for row in board.rows() {
        line.clear();
        line.extend(row.iter().map(|&cell| board::cell_char(cell)));
        line.push('\n');
        output.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Mechanism to write a board into a text file
pub struct Writer {
    /// Buffered file handle
    file: BufWriter<File>,

    /// Path to the file, for error reporting
    path: PathBuf,
}
//
impl Writer {
    /// Create or truncate the output file
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WriteError> {
        let path = path.as_ref().to_owned();
        let file = File::create(&path).map_err(|source| WriteError {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            file: BufWriter::new(file),
            path,
        })
    }

    /// Write a board into the file
    pub fn write(&mut self, board: BoardView<'_>) -> Result<(), WriteError> {
        write_board(&mut self.file, board).map_err(|source| self.error(source))
    }

    /// Flush the file and make sure its contents reached the OS
    pub fn close(mut self) -> Result<(), WriteError> {
        self.file.flush().map_err(|source| self.error(source))?;
        let file = self
            .file
            .into_inner()
            .expect("Cannot fail, the buffer was just flushed");
        file.sync_all().map_err(|source| WriteError {
            path: self.path,
            source,
        })
    }

    /// Annotate an I/O error with the output path
    fn error(&self, source: io::Error) -> WriteError {
        WriteError {
            path: self.path.clone(),
            source,
        }
    }
}

/// Error while writing a board to a file
#[derive(Debug, Error)]
#[error("failed to write board to {path:?}")]
pub struct WriteError {
    /// File that was being written
    pub path: PathBuf,

    /// Underlying I/O error
    #[source]
    pub source: io::Error,
}

/// Parse a board from its text form
///
/// Trailing whitespace at the end of lines is ignored, and so are empty
/// trailing lines. All remaining lines must have the same nonzero length.
pub fn parse_board(text: &str) -> Result<Board, ParseError> {
    let lines = text
        .trim_end()
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>();
    let height = lines.len();
    let width = lines.first().map_or(0, |line| line.len());
    if height == 0 || width == 0 {
        return Err(ParseError::Empty);
    }

    let mut board = board::dead([height, width]);
    for (y, (line, mut row)) in lines.iter().zip(board.rows_mut()).enumerate() {
        if line.len() != width {
            return Err(ParseError::Ragged {
                line: y + 1,
                expected: width,
                found: line.len(),
            });
        }
        for (x, (byte, cell)) in line.bytes().zip(row.iter_mut()).enumerate() {
            *cell = match byte {
                b'0' => DEAD,
                b'1' => ALIVE,
                other => {
                    return Err(ParseError::BadCell {
                        line: y + 1,
                        column: x + 1,
                        found: char::from(other),
                    })
                }
            };
        }
    }
    Ok(board)
}

/// Read a board from a text file
pub fn read_board(path: impl AsRef<Path>) -> Result<Board, ReadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_board(&text)?)
}

/// Error while parsing a board from text
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("board contains no cells")]
    Empty,

    #[error("line {line} has {found} cells, expected {expected}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("unexpected character {found:?} at line {line}, column {column}")]
    BadCell {
        line: usize,
        column: usize,
        found: char,
    },
}

/// Error while reading a board from a file
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read board file")]
    Io(#[from] io::Error),

    #[error("failed to parse board file")]
    Parse(#[from] ParseError),
}
