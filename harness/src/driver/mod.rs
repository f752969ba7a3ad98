//! Driver module - synthesized entry point for `Solution`-only sources
//!
//! - `plan`: typed parse/output steps derived from the signature
//! - `render`: C++ text for a plan, with the source's own `main` stripped
//! - `strip`: entry-point removal
//! - `DriverFile`: the on-disk driver, removed when dropped
//!
//! The driver module does NOT:
//! - Compile or run the driver
//! - Decide whether a platform needs one

pub mod plan;
pub mod render;
pub mod strip;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub use plan::DriverPlan;
pub use render::render;
pub use strip::{strip_entry_point, StripError};

/// Generated driver source on disk
///
/// Written atomically and deleted on drop, including when the run is
/// cancelled or panics.
#[derive(Debug)]
pub struct DriverFile {
    path: PathBuf,
}

impl DriverFile {
    pub fn create(path: impl Into<PathBuf>, contents: &str) -> io::Result<Self> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!("Wrote driver to {:?}", path);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DriverFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed driver {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove driver {:?}: {}", self.path, e),
        }
    }
}
