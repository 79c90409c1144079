//! bulkx Protocol Types
//!
//! File descriptors and the result envelope exchanged between the bulkx
//! worker and the task pipeline that schedules it.

pub mod error;
pub mod files;
pub mod result;

pub use error::{ProtocolError, ProtocolResult};
pub use files::{create_output_file, get_input_files, InputFile, OutputFile, DEFAULT_DATA_TYPE};
pub use result::{create_task_result, serialize_file_report, FileReport, TaskResult};
