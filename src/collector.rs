//! Packaging of extracted artifacts as pipeline output files.
//!
//! Every non-empty regular file below an extraction directory is copied
//! verbatim to a new output file named after the artifact. Empty files are
//! dropped. Dot-files and dot-directories are skipped, the same set a
//! recursive `**` glob would leave out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bulkx_protocol::{create_output_file, OutputFile};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Errors from artifact collection
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for artifact collection
pub type CollectResult<T> = Result<T, CollectError>;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Copy every non-empty file under `artifact_dir` into `output_path`.
///
/// Returns one descriptor per copied file. Entries are visited sorted by
/// name within each directory, but callers should not rely on the order.
/// On error, files already copied are removed again.
pub fn extract_non_empty_files(
    artifact_dir: &Path,
    output_path: &Path,
) -> CollectResult<Vec<OutputFile>> {
    let mut out_files = Vec::new();
    match copy_artifacts(artifact_dir, output_path, &mut out_files) {
        Ok(skipped_empty) => {
            tracing::info!(
                collected = out_files.len(),
                skipped_empty,
                dir = %artifact_dir.display(),
                "artifacts collected"
            );
            Ok(out_files)
        }
        Err(e) => {
            remove_output_files(&out_files);
            Err(e)
        }
    }
}

/// Delete output files written for a run that is being aborted.
pub fn remove_output_files(files: &[OutputFile]) {
    for file in files {
        match fs::remove_file(&file.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %file.path.display(), error = %e, "failed to remove output file")
            }
        }
    }
}

/// Copy artifacts into `out_files`, returning how many empty files were skipped.
fn copy_artifacts(
    artifact_dir: &Path,
    output_path: &Path,
    out_files: &mut Vec<OutputFile>,
) -> CollectResult<usize> {
    let mut skipped_empty = 0usize;

    for entry in WalkDir::new(artifact_dir)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        let path = entry.path();

        // Follows symlinks; a dangling link does not exist and is skipped
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => {
                return Err(CollectError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if metadata.is_dir() {
            continue;
        }

        let content = fs::read(path).map_err(|source| CollectError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if content.is_empty() {
            skipped_empty += 1;
            continue;
        }

        let display_name = entry.file_name().to_string_lossy();
        let out_file = create_output_file(output_path, &display_name);
        fs::write(&out_file.path, &content).map_err(|source| CollectError::Write {
            path: out_file.path.clone(),
            source,
        })?;

        tracing::debug!(
            artifact = %path.display(),
            output = %out_file.path.display(),
            bytes = content.len(),
            "artifact collected"
        );
        out_files.push(out_file);
    }

    Ok(skipped_empty)
}
