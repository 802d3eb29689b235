// ============================================================================
// File: scriptpad/src/engine/outcome.rs
// ----------------------------------------------------------------------------
// Tagged results of a run and their flattening to the user-facing text.
// ============================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a run produced no program output
///
/// The `Display` text of each variant is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("Unknown language chosen.")]
    UnknownLanguage { language: String },

    #[error("Could not find command {command} in Path.")]
    CommandNotFound { command: String },

    #[error("Error timedout: script took longer than {} seconds to run.", format_secs(.timeout_ms))]
    TimedOut { timeout_ms: u64 },

    #[error("Failed to launch {command}: {reason}")]
    LaunchFailed { command: String, reason: String },

    #[error("Failed to prepare script: {reason}")]
    MaterializeFailed { reason: String },

    #[error("Execution was abandoned before producing a result.")]
    Abandoned,
}

impl Diagnostic {
    pub fn timed_out(timeout: Duration) -> Self {
        Diagnostic::TimedOut {
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

/// Whole seconds print without a fraction ("10"), others keep it ("0.5")
fn format_secs(ms: &u64) -> String {
    let ms = *ms;
    if ms % 1000 == 0 {
        (ms / 1000).to_string()
    } else {
        format!("{}", ms as f64 / 1000.0)
    }
}

/// Result of one run before flattening
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// Normalized program output (stdout and stderr merged)
    Output(String),
    Diagnostic(Diagnostic),
}

impl Outcome {
    pub fn is_output(&self) -> bool {
        matches!(self, Outcome::Output(_))
    }

    /// The text shown to the user
    pub fn text(&self) -> String {
        match self {
            Outcome::Output(text) => text.clone(),
            Outcome::Diagnostic(diagnostic) => diagnostic.to_string(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Output(text) => text,
            Outcome::Diagnostic(diagnostic) => diagnostic.to_string(),
        }
    }
}

impl From<Diagnostic> for Outcome {
    fn from(diagnostic: Diagnostic) -> Self {
        Outcome::Diagnostic(diagnostic)
    }
}

/// Full record of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub id: Uuid,
    pub language: String,
    pub outcome: Outcome,
    /// Interpreter exit code, informational only
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl ExecutionReport {
    pub fn text(&self) -> String {
        self.outcome.text()
    }
}
