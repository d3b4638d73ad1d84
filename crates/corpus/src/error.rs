use std::path::Path;

use thiserror::Error;

/// Errors raised while loading or validating a corpus.
///
/// Everything except [`CorpusError::NotFound`] is fatal for corpus
/// construction: no partially validated corpus is ever returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorpusError {
    /// Unknown license key, duplicate identifier, empty rule text and
    /// similar structural problems.
    #[error("corpus inconsistency: {0}")]
    Inconsistency(String),
    /// A license key lookup missed.
    #[error("license not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl CorpusError {
    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::Inconsistency(message.into())
    }

    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse<E: std::fmt::Display>(path: &Path, err: E) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this error means the corpus content itself is inconsistent
    /// (as opposed to the source being unreadable).
    pub fn is_inconsistency(&self) -> bool {
        matches!(self, Self::Inconsistency(_) | Self::NotFound(_))
    }
}
