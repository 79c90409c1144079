//! bulkx worker - bulk_extractor task for the forensic pipeline
//!
//! Runs `bulk_extractor` against each input file, turns its `report.xml`
//! into a markdown report and hands every non-empty extracted artifact back
//! to the pipeline as an output file.

pub mod collector;
pub mod config;
pub mod executor;
pub mod task;

pub use collector::{extract_non_empty_files, CollectError};
pub use config::{ConfigError, TaskConfig};
pub use executor::{Executor, ExecutorError, ExecutorResult, ExtractionDir, Invocation, RunOutcome, RunState};
pub use task::{run_task, task_metadata, TaskError, TaskMetadata, TaskRequest, TASK_NAME};
