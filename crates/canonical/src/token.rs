use serde::{Deserialize, Serialize};

/// A normalized token and where it came from in the source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// The normalized token text.
    pub text: String,
    /// Byte offset (inclusive) in the original text.
    pub start: usize,
    /// Byte offset (exclusive) in the original text.
    pub end: usize,
    /// 1-based line of the token's first character.
    pub line: u32,
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.text.as_str()
    }
}
