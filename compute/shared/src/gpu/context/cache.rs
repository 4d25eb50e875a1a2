//! On-disk pipeline cache

use super::ContextBuildResult;
use directories::ProjectDirs;
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{fs, io::ErrorKind, ops::Deref, path::PathBuf, sync::Arc};
use vulkano::{
    device::Device,
    pipeline::cache::{PipelineCache, PipelineCacheCreateInfo},
};

/// GPU pipeline cache
///
/// Compiled compute pipelines are saved to the user's cache directory when
/// this is dropped, so that later runs skip shader compilation.
pub struct PersistentPipelineCache {
    /// In-RAM cache
    cache: Arc<PipelineCache>,

    /// Path to be used for on-disk persistence
    path: PathBuf,
}
//
impl PersistentPipelineCache {
    /// Attempt to load the pipeline cache from disk, otherwise create a new one
    pub fn new(dirs: &ProjectDirs, device: Arc<Device>) -> ContextBuildResult<Self> {
        let path = dirs.cache_dir().join("gpu_pipelines.bin");
        let initial_data = match fs::read(&path) {
            Ok(data) => {
                debug!(
                    "Loaded {} bytes of pipeline cache from {path:?}",
                    data.len()
                );
                data
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable pipeline cache at {path:?}: {e}");
                Vec::new()
            }
        };
        // SAFETY: The cache file is only ever written by Self::write, and
        //         Vulkan implementations reject data from other devices.
        let cache = unsafe {
            PipelineCache::new(
                device,
                PipelineCacheCreateInfo {
                    initial_data,
                    ..Default::default()
                },
            )?
        };
        Ok(Self { cache, path })
    }

    /// Write the pipeline cache back to disk
    pub fn write(&self) -> ContextBuildResult<()> {
        let data = self.cache.get_data()?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        // Write to a temporary file first so a crash never leaves a torn cache
        let wal_path = self.path.with_extension("wal");
        match fs::write(&wal_path, data) {
            Ok(()) => {
                fs::rename(wal_path, &self.path)?;
                Ok(())
            }
            Err(e) => {
                fs::remove_file(wal_path)?;
                Err(e.into())
            }
        }
    }
}
//
impl Deref for PersistentPipelineCache {
    type Target = Arc<PipelineCache>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}
//
impl Drop for PersistentPipelineCache {
    fn drop(&mut self) {
        if let Err(e) = self.write() {
            error!("Failed to write pipeline cache to disk: {e}");
        }
    }
}
