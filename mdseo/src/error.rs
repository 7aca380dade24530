use serde::{Deserialize, Serialize};

/// Errors that can occur while turning source text into a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Input is {len} bytes, over the configured limit of {limit} bytes")]
    InputTooLarge { len: usize, limit: usize },

    #[error("Malformed event stream: {detail}")]
    Unbalanced { detail: String },

    #[error("Parser failed: {message}")]
    Custom { message: String },
}

/// A diagnostic message produced while parsing, rendering, or validating.
///
/// Diagnostics are non-fatal: callers always get a best-effort result
/// alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            code: Some(code.to_string()),
        }
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}
