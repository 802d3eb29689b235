// ============================================================================
// File: scriptpad/src/error.rs
// ----------------------------------------------------------------------------
// Internal error types for the execution pipeline.
//
// These never cross the public `run_script` boundary: the engine folds them
// into a `Diagnostic` before returning.
// ============================================================================

use std::path::PathBuf;

/// Errors raised by the individual pipeline stages
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The script artifact could not be written
    #[error("Failed to materialize script in {dir}: {source}")]
    Materialize {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter process could not be created
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for pipeline stages
pub type Result<T> = std::result::Result<T, ExecError>;
