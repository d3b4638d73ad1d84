use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a piece of input produced no tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoTextReason {
    /// Zero bytes, or nothing but separators and markup noise.
    Empty,
    /// Content looks like binary data.
    Binary,
    /// The location could not be opened or read.
    Unreadable,
}

impl std::fmt::Display for NoTextReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoTextReason::Empty => f.write_str("empty"),
            NoTextReason::Binary => f.write_str("binary"),
            NoTextReason::Unreadable => f.write_str("unreadable"),
        }
    }
}

/// Errors that can occur during normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("input has no text content ({0})")]
    NoTextContent(NoTextReason),
}
