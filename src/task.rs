//! Task entry point and registration metadata.
//!
//! The pipeline routes work to this worker by [`TASK_NAME`]. A request names
//! its inputs either directly or through the encoded result of the previous
//! task, and receives an encoded [`bulkx_protocol::TaskResult`] back.

use std::path::PathBuf;

use bulkx_protocol::{create_task_result, get_input_files, InputFile, ProtocolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TaskConfig;
use crate::executor::{Executor, ExecutorError};

/// Name the task is registered and routed under.
pub const TASK_NAME: &str = "openrelik-worker-bulkextractor.tasks.bulkextractor";

/// Registration metadata shown by the pipeline UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub display_name: String,
    pub description: String,
    /// User-facing configuration fields (none are offered)
    #[serde(default)]
    pub task_config: Vec<serde_json::Value>,
}

pub fn task_metadata() -> TaskMetadata {
    TaskMetadata {
        display_name: "Bulkextractor".to_string(),
        description: "Runs the bulk_extractor command against a file".to_string(),
        task_config: Vec::new(),
    }
}

/// One task invocation as delivered by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Base64 result of the previous task, if chained
    #[serde(default)]
    pub pipe_result: Option<String>,
    /// Inputs used when there is no pipe result
    #[serde(default)]
    pub input_files: Vec<InputFile>,
    pub output_path: PathBuf,
    pub workflow_id: String,
    /// Values entered by the user for the task's config fields
    #[serde(default)]
    pub task_config: Option<serde_json::Value>,
}

/// Errors that fail the task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Run bulk_extractor over the request's inputs and encode the result.
pub fn run_task(request: &TaskRequest, config: &TaskConfig) -> Result<String, TaskError> {
    if request
        .task_config
        .as_ref()
        .is_some_and(|c| !c.is_null() && c.as_object().map_or(true, |m| !m.is_empty()))
    {
        tracing::warn!("task_config values ignored; this task has no user configuration");
    }

    let inputs = get_input_files(request.pipe_result.as_deref(), request.input_files.clone())?;
    tracing::info!(
        workflow_id = %request.workflow_id,
        inputs = inputs.len(),
        output_path = %request.output_path.display(),
        "task started"
    );

    let outcome = Executor::new(config.clone()).run(&inputs, &request.output_path)?;

    let meta = serde_json::json!({ "commands": outcome.commands });
    let encoded = create_task_result(
        outcome.output_files,
        &request.workflow_id,
        &outcome.command,
        meta,
        outcome.file_reports,
    )?;
    Ok(encoded)
}
