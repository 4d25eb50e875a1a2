//! End-to-end checks of the strategy binaries

use std::{
    fs,
    path::PathBuf,
    process::{Command, Output},
};

/// Run a strategy binary with some arguments
fn run(binary: &str, args: &[&str]) -> Output {
    Command::new(binary)
        .args(args)
        .output()
        .expect("Failed to start the strategy binary")
}

/// Path to a scratch output file for a test
fn scratch_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name)
}

const STRATEGIES: [(&str, &str); 3] = [
    ("serial", env!("CARGO_BIN_EXE_gol-serial")),
    ("simd", env!("CARGO_BIN_EXE_gol-simd")),
    ("parallel", env!("CARGO_BIN_EXE_gol-parallel")),
];

#[test]
fn wrong_argument_count_prints_usage() {
    for (name, binary) in STRATEGIES {
        for args in [&[][..], &["10"], &["10", "10"], &["10", "10", "10", "10"]] {
            let output = run(binary, args);
            assert_eq!(output.status.code(), Some(1), "{name} {args:?}");
            let stdout = String::from_utf8_lossy(&output.stdout);
            assert!(stdout.contains("Usage"), "{name} {args:?}: {stdout}");
        }
    }
}

#[test]
fn bad_numbers_are_fatal() {
    for (name, binary) in STRATEGIES {
        let output = run(binary, &["ten", "10", "10"]);
        assert!(!output.status.success(), "{name}");
    }
}

#[test]
fn outputs_are_identical() {
    let mut outputs = Vec::new();
    for (name, binary) in STRATEGIES {
        let path = scratch_path(&format!("cli-output-{name}.txt"));
        let path_str = path.to_str().unwrap();
        let output = run(binary, &["24", "37", "50", "--seed", "31", "-o", path_str]);
        assert!(output.status.success(), "{name}: {output:?}");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Model run time: "), "{name}: {stdout}");
        assert!(stdout.contains(" us\nTotal time: "), "{name}: {stdout}");
        outputs.push((name, fs::read_to_string(&path).unwrap()));
    }
    let (_, reference) = &outputs[0];
    assert_eq!(reference.lines().count(), 24);
    assert!(reference.lines().all(|line| line.len() == 37));
    for (name, output) in &outputs[1..] {
        assert_eq!(output, reference, "{name}");
    }
}

#[test]
fn glider_pattern() {
    let path = scratch_path("cli-glider.txt");
    let path_arg = path.to_str().unwrap();
    let output = run(
        STRATEGIES[0].1,
        &["5", "5", "4", "--pattern", "glider", "-o", path_arg],
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "00000\n00010\n01010\n00110\n00000\n"
    );
}
