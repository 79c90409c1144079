//! Worker configuration (bulkx.toml)
//!
//! Every field has a built-in default, so an absent file or an empty one
//! runs `bulk_extractor` from `PATH` with no extra arguments and no timeout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extractor binary used when none is configured.
pub const DEFAULT_EXTRACTOR: &str = "bulk_extractor";

/// Report file extension. The report body is markdown; the `html` name is
/// kept because consumers index report files by it.
pub const DEFAULT_REPORT_EXTENSION: &str = "html";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Task configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskConfig {
    /// Extractor program, looked up on PATH unless it contains a separator
    pub extractor: String,

    /// Arguments placed after `-o <dir>` and before the input path
    pub extra_args: Vec<String>,

    /// Extension of the per-input report file (no leading dot)
    pub report_extension: String,

    /// Kill the extractor after this many seconds (unset = wait indefinitely)
    pub timeout_seconds: Option<u64>,

    /// Grace period between SIGTERM and SIGKILL when the timeout fires
    pub termination_grace_seconds: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            extractor: DEFAULT_EXTRACTOR.to_string(),
            extra_args: Vec::new(),
            report_extension: DEFAULT_REPORT_EXTENSION.to_string(),
            timeout_seconds: None,
            termination_grace_seconds: 10,
        }
    }
}

impl TaskConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse config from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: TaskConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extractor.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "'extractor' must not be empty".to_string(),
            ));
        }

        if self.report_extension.is_empty()
            || self.report_extension.contains(['.', '/', '\\'])
        {
            return Err(ConfigError::ValidationError(format!(
                "Invalid report_extension '{}': expected a bare extension such as 'md'",
                self.report_extension
            )));
        }

        if self.timeout_seconds == Some(0) {
            return Err(ConfigError::ValidationError(
                "'timeout_seconds' must be greater than zero when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Display name of the report written for an input
    pub fn report_display_name(&self, input_display_name: &str) -> String {
        format!("Report_{}.{}", input_display_name, self.report_extension)
    }
}
