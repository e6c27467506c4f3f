//! Error taxonomy for the recovery analytics engine
//!
//! Fatal conditions abort an analysis pass. `DegenerateInput` is the one
//! variant that never escapes a pass: the metric layer turns it into an
//! absent value (written as `-1` in metrics.csv).

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading artifacts or computing metrics
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Required artifact not found: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Malformed record in {file} (line {line}): {reason}")]
    MalformedRecord {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid duration string: {0:?}")]
    InvalidDuration(String),

    #[error("Fault workflow references unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Fault workflow template is reachable from itself: {0}")]
    CyclicWorkflow(String),

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AnalysisError {
    pub(crate) fn malformed(file: &str, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            file: file.to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput(reason.into())
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Convert a degenerate computation into an absent metric, propagating
/// everything else.
pub(crate) fn absent_on_degenerate<T>(result: Result<T>, metric: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AnalysisError::DegenerateInput(reason)) => {
            tracing::warn!("{} unavailable: {}", metric, reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
