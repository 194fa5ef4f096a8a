//! Error types for guide-core operations.

use guide_protocol::ErrorInfo;
use std::path::PathBuf;

/// All errors that can occur while driving a session.
///
/// Malformed agent messages are not errors: the classifier drops them.
#[derive(Debug, thiserror::Error)]
pub enum GuideError {
    // ─────────────────────────────────────────────────────────────────────
    // Session Control Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("Run {run_id} is still streaming")]
    RunInProgress { run_id: String },

    #[error("No active run")]
    NoActiveRun,

    #[error("Run {run_id} is already {status}")]
    RunClosed { run_id: String, status: String },

    // ─────────────────────────────────────────────────────────────────────
    // Stream Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Agent stream failed: {message}")]
    Transport { message: String },

    #[error("Invalid stream frame: {code}: {message}")]
    Frame { code: String, message: String },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using GuideError.
pub type Result<T> = std::result::Result<T, GuideError>;

impl From<ErrorInfo> for GuideError {
    fn from(info: ErrorInfo) -> Self {
        GuideError::Frame {
            code: info.code,
            message: info.message,
        }
    }
}

impl From<GuideError> for String {
    fn from(err: GuideError) -> String {
        err.to_string()
    }
}
