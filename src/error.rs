//! Configuration errors that terminate the audit before any output is produced.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status used for every [`ConfigError`].
pub const CONFIG_EXIT_CODE: i32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("schema file not found: {}", .0.display())]
    SchemaNotFound(PathBuf),
    #[error("dataset path not found: {}", .0.display())]
    DatasetNotFound(PathBuf),
}

impl ConfigError {
    pub fn exit_code(&self) -> i32 {
        CONFIG_EXIT_CODE
    }
}

/// Maps an error chain to the process exit status.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ConfigError>())
        .map(ConfigError::exit_code)
        .unwrap_or(1)
}
