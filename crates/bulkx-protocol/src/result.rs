//! Task result envelope and per-file reports.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bulkx_report::{Priority, SummaryReport};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolResult;
use crate::files::{InputFile, OutputFile};

/// Report produced for one input file, as indexed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub summary: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file_uuid: Option<String>,
    /// UUID of the output file holding the rendered report
    pub content_file_uuid: String,
}

/// Pair an input with the output file its report was written to.
pub fn serialize_file_report(
    input_file: &InputFile,
    report_file: &OutputFile,
    report: &SummaryReport,
) -> FileReport {
    FileReport {
        summary: report.summary().to_string(),
        priority: report.priority(),
        input_file_uuid: input_file.uuid.clone(),
        content_file_uuid: report_file.uuid.clone(),
    }
}

/// Result envelope returned to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub output_files: Vec<OutputFile>,
    pub workflow_id: String,
    pub command: String,
    #[serde(default)]
    pub meta: serde_json::Value,
    #[serde(default)]
    pub file_reports: Vec<FileReport>,
    #[serde(default)]
    pub task_logs: Vec<OutputFile>,
}

impl TaskResult {
    /// Encode as base64 JSON, the form the pipeline passes between tasks.
    pub fn encode(&self) -> ProtocolResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    /// Decode a base64 JSON envelope.
    pub fn decode(encoded: &str) -> ProtocolResult<Self> {
        let bytes = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Build and encode the result envelope.
pub fn create_task_result(
    output_files: Vec<OutputFile>,
    workflow_id: &str,
    command: &str,
    meta: serde_json::Value,
    file_reports: Vec<FileReport>,
) -> ProtocolResult<String> {
    TaskResult {
        output_files,
        workflow_id: workflow_id.to_string(),
        command: command.to_string(),
        meta,
        file_reports,
        task_logs: Vec::new(),
    }
    .encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{create_output_file, get_input_files};
    use bulkx_report::summarize_xml;
    use std::path::Path;

    #[test]
    fn test_file_report_links_input_and_report() {
        let mut input = InputFile::new("disk.raw", "/evidence/disk.raw");
        input.uuid = Some("in-1".to_string());
        let report_file = create_output_file(Path::new("/out"), "Report_disk.raw.html");

        let report = SummaryReport::Generated(
            summarize_xml("<dfxml><feature_files><feature_file><name>url</name><count>4</count></feature_file></feature_files></dfxml>")
                .unwrap(),
        );
        let file_report = serialize_file_report(&input, &report_file, &report);

        assert_eq!(file_report.summary, "4 artifacts have been extracted.");
        assert_eq!(file_report.priority, Priority::Info);
        assert_eq!(file_report.input_file_uuid.as_deref(), Some("in-1"));
        assert_eq!(file_report.content_file_uuid, report_file.uuid);
    }

    #[test]
    fn test_file_report_for_unavailable_report() {
        let input = InputFile::new("disk.raw", "/evidence/disk.raw");
        let report_file = create_output_file(Path::new("/out"), "Report_disk.raw.html");

        let file_report = serialize_file_report(&input, &report_file, &SummaryReport::Unavailable);
        assert_eq!(file_report.summary, bulkx_report::REPORT_UNAVAILABLE);
        assert!(file_report.input_file_uuid.is_none());
    }

    #[test]
    fn test_task_result_decodes() {
        let out = create_output_file(Path::new("/out"), "email.txt");
        let encoded = create_task_result(
            vec![out.clone()],
            "wf-7",
            "bulk_extractor -o /out/tmp",
            serde_json::json!({}),
            Vec::new(),
        )
        .unwrap();

        let decoded = TaskResult::decode(&encoded).unwrap();
        assert_eq!(decoded.workflow_id, "wf-7");
        assert_eq!(decoded.command, "bulk_extractor -o /out/tmp");
        assert_eq!(decoded.output_files, vec![out]);
        assert!(decoded.task_logs.is_empty());
    }

    #[test]
    fn test_task_result_feeds_next_task() {
        let out = create_output_file(Path::new("/out"), "email.txt");
        let encoded = create_task_result(vec![out.clone()], "wf", "cmd", serde_json::json!({}), Vec::new())
            .unwrap();

        let inputs = get_input_files(Some(&encoded), Vec::new()).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].uuid.as_deref(), Some(out.uuid.as_str()));
        assert_eq!(inputs[0].path, out.path);
    }
}
