//! Per-input extraction directory.
//!
//! The directory is only named here; the extractor creates it. It is removed
//! when [`ExtractionDir::cleanup`] is called or, failing that, when the guard
//! is dropped, so an aborted run does not leave it behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Uniquely named scratch directory owned by one extraction run.
#[derive(Debug)]
pub struct ExtractionDir {
    path: PathBuf,
    removed: bool,
}

impl ExtractionDir {
    /// Reserve `<output_path>/<random hex>` without creating it.
    pub fn allocate(output_path: &Path) -> Self {
        Self {
            path: output_path.join(Uuid::new_v4().simple().to_string()),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the extractor created the directory.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Remove the directory tree, or whatever the extractor left at its path.
    /// A path that was never created is not an error.
    pub fn cleanup(mut self) -> io::Result<()> {
        self.removed = true;
        remove_tree(&self.path)
    }
}

impl Drop for ExtractionDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_tree(&self.path) {
            tracing::warn!(dir = %self.path.display(), error = %e, "failed to remove extraction directory");
        }
    }
}

fn remove_tree(path: &Path) -> io::Result<()> {
    let removed = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match removed {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
