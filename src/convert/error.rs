//! Conversion error types

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the external conversion toolchain
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Executable not found on the toolchain search path
    #[error("{program} is not installed or not on the toolchain path")]
    ToolchainMissing { program: String },

    /// Tool ran but exited unsuccessfully
    #[error("{program} failed ({status}): {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Tool did not finish in time and was killed
    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    /// Tool exited cleanly but left no output file
    #[error("Conversion produced no output at {0}")]
    MissingOutput(PathBuf),

    /// Output file is not a PDF
    #[error("Conversion output is not a PDF document")]
    InvalidOutput,

    #[error("Failed to serialize notebook: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
