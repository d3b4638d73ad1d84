//! Output type of the normalizer.
//!
//! A [`NormalizedText`] is the token stream of one document (or one rule)
//! together with enough source mapping to turn a token range back into line
//! numbers and a verbatim substring of the original input.
//!
//! # Determinism
//!
//! For a fixed [`NormalizeConfig`](crate::NormalizeConfig) version and input
//! text, the token texts, offsets and lines are identical on every machine.
//!
//! # Examples
//!
//! ```rust
//! use canonical::{normalize, NormalizeConfig};
//!
//! let doc = normalize("Permission is hereby\ngranted, free of charge", &NormalizeConfig::default()).unwrap();
//! assert_eq!(doc.len(), 7);
//! assert_eq!(doc.canonical_text(), "permission is hereby granted free of charge");
//! assert_eq!(doc.line_span(0..doc.len()), Some((1, 2)));
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Token stream with per-token source lines and byte spans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedText {
    /// Tokens in source order.
    pub tokens: Vec<Token>,
    /// Normalizer version that produced the tokens.
    pub normalizer_version: u32,
}

impl NormalizedText {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token texts in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(|t| t.text.as_str())
    }

    /// Tokens joined with single spaces.
    ///
    /// Normalizing this string again yields the same token texts.
    pub fn canonical_text(&self) -> String {
        let mut out = String::with_capacity(self.tokens.iter().map(|t| t.text.len() + 1).sum());
        for token in &self.tokens {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&token.text);
        }
        out
    }

    /// Source line of the token at `idx`.
    pub fn line_of(&self, idx: usize) -> Option<u32> {
        self.tokens.get(idx).map(|t| t.line)
    }

    /// First and last source lines covered by a token range (end exclusive).
    ///
    /// Returns `None` for an empty or out-of-bounds range.
    pub fn line_span(&self, range: Range<usize>) -> Option<(u32, u32)> {
        if range.start >= range.end || range.end > self.tokens.len() {
            return None;
        }
        Some((self.tokens[range.start].line, self.tokens[range.end - 1].line))
    }

    /// Byte span in the original text covered by a token range (end exclusive).
    pub fn byte_span(&self, range: Range<usize>) -> Option<Range<usize>> {
        if range.start >= range.end || range.end > self.tokens.len() {
            return None;
        }
        Some(self.tokens[range.start].start..self.tokens[range.end - 1].end)
    }

    /// Verbatim slice of `source` covered by a token range.
    ///
    /// `source` must be the text this stream was produced from.
    pub fn source_text<'a>(&self, source: &'a str, range: Range<usize>) -> Option<&'a str> {
        self.byte_span(range).and_then(|span| source.get(span))
    }
}
