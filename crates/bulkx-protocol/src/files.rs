//! Input and output file descriptors exchanged with the pipeline.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolResult;

/// Data type recorded on output files unless the caller says otherwise.
pub const DEFAULT_DATA_TYPE: &str = "worker:file:generic";

/// A file handed to the task by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFile {
    /// Pipeline identifier, when the file came from an earlier task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Name shown to users
    pub display_name: String,
    /// Location on the shared filesystem
    pub path: PathBuf,
    /// Fields this worker does not interpret, passed through unchanged
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InputFile {
    pub fn new(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            uuid: None,
            display_name: display_name.into(),
            path: path.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A file produced by the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub uuid: String,
    pub display_name: String,
    /// Extension taken from the display name, without the dot (may be empty)
    pub extension: String,
    pub data_type: String,
    /// Backing path the task writes the content to
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_id: Option<String>,
}

/// Allocate a new output file under `output_path`.
///
/// The backing path is `<output_path>/<uuid>[.<extension>]`. Nothing is
/// created on disk; the caller writes the content.
pub fn create_output_file(output_path: &Path, display_name: &str) -> OutputFile {
    let uuid = Uuid::new_v4().simple().to_string();
    let extension = Path::new(display_name)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    let file_name = if extension.is_empty() {
        uuid.clone()
    } else {
        format!("{}.{}", uuid, extension)
    };

    OutputFile {
        path: output_path.join(file_name),
        uuid,
        display_name: display_name.to_string(),
        extension,
        data_type: DEFAULT_DATA_TYPE.to_string(),
        original_path: None,
        source_file_id: None,
    }
}

/// The part of an upstream task result this worker reads.
#[derive(Debug, Deserialize)]
struct PipeResult {
    #[serde(default)]
    output_files: Vec<InputFile>,
}

/// Resolve the files to process.
///
/// When an upstream task result is piped in (base64 JSON envelope), its
/// `output_files` are the inputs and `input_files` is ignored.
pub fn get_input_files(
    pipe_result: Option<&str>,
    input_files: Vec<InputFile>,
) -> ProtocolResult<Vec<InputFile>> {
    match pipe_result.map(str::trim).filter(|p| !p.is_empty()) {
        Some(encoded) => {
            let bytes = STANDARD.decode(encoded)?;
            let result: PipeResult = serde_json::from_slice(&bytes)?;
            Ok(result.output_files)
        }
        None => Ok(input_files),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;

    #[test]
    fn test_create_output_file_path_and_extension() {
        let out = create_output_file(Path::new("/data/out"), "Report_disk.raw.html");

        assert_eq!(out.display_name, "Report_disk.raw.html");
        assert_eq!(out.extension, "html");
        assert_eq!(out.uuid.len(), 32);
        assert_eq!(
            out.path,
            PathBuf::from(format!("/data/out/{}.html", out.uuid))
        );
        assert_eq!(out.data_type, DEFAULT_DATA_TYPE);
    }

    #[test]
    fn test_create_output_file_without_extension() {
        let out = create_output_file(Path::new("/data/out"), "alerts");
        assert_eq!(out.extension, "");
        assert_eq!(out.path, PathBuf::from("/data/out").join(&out.uuid));
    }

    #[test]
    fn test_create_output_file_unique() {
        let a = create_output_file(Path::new("/o"), "x.txt");
        let b = create_output_file(Path::new("/o"), "x.txt");
        assert_ne!(a.uuid, b.uuid);
        assert_ne!(a.path, b.path);
    }

    #[test]
    fn test_input_files_without_pipe() {
        let inputs = vec![InputFile::new("disk.raw", "/evidence/disk.raw")];
        let resolved = get_input_files(None, inputs.clone()).unwrap();
        assert_eq!(resolved, inputs);

        let resolved = get_input_files(Some("  "), inputs.clone()).unwrap();
        assert_eq!(resolved, inputs);
    }

    #[test]
    fn test_input_files_from_pipe_result() {
        let upstream = serde_json::json!({
            "output_files": [
                {"uuid": "abc", "display_name": "mem.img", "path": "/data/abc.img", "data_type": "x"}
            ],
            "workflow_id": "wf-1",
            "command": "upstream"
        });
        let encoded = STANDARD.encode(serde_json::to_vec(&upstream).unwrap());

        let ignored = vec![InputFile::new("ignored", "/ignored")];
        let resolved = get_input_files(Some(&encoded), ignored).unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].uuid.as_deref(), Some("abc"));
        assert_eq!(resolved[0].display_name, "mem.img");
        assert_eq!(resolved[0].path, PathBuf::from("/data/abc.img"));
        assert_eq!(resolved[0].extra["data_type"], "x");
    }

    #[test]
    fn test_invalid_pipe_result() {
        let err = get_input_files(Some("!!not base64!!"), Vec::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::Base64(_)));

        let encoded = STANDARD.encode(b"not json");
        let err = get_input_files(Some(&encoded), Vec::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }
}
