//! Text normalization for license matching.
//!
//! Both the rule corpus and every scanned document go through this crate, so
//! rule tokens and query tokens line up. The output keeps a mapping from each
//! token back to its source line and byte span, which is how a matched token
//! range becomes `start_line`/`end_line` and a verbatim `matched_text`.
//!
//! ## What we do
//!
//! - Unicode normalization (NFKC per grapheme cluster, configurable)
//! - Locale-free lowercasing
//! - Punctuation and markup noise become separators or are dropped
//! - Whitespace runs collapse
//! - Runs of long digit sequences (years) collapse into one placeholder
//! - Decoding of raw bytes with a binary-content guard
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no OS/locale dependence. Same text and config,
//! same tokens on any machine. Normalizing the canonical text of a result
//! again is a no-op.

mod config;
mod decode;
mod document;
mod error;
mod hash;
mod pipeline;
mod token;

pub use crate::config::NormalizeConfig;
pub use crate::decode::decode_bytes;
pub use crate::document::NormalizedText;
pub use crate::error::{CanonicalError, NoTextReason};
pub use crate::hash::{hash_normalized, hash_text};
pub use crate::pipeline::{normalize, DIGIT_PLACEHOLDER};
pub use crate::token::Token;
