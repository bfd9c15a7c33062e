//! Error types for ChatPulse

use thiserror::Error;

/// Errors that can occur while analyzing a transcript
///
/// Parsing and the detectors never fail; these cover the policy and I/O edges
/// around them.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No messages found in transcript")]
    NoMessages,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
