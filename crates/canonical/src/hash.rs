//! Hashing utilities for normalized text.
//!
//! # Algorithms
//!
//! ## Normalized text hash
//!
//! ```text
//! SHA-256(version.to_be_bytes() || 0x00 || canonical_text_bytes)
//! ```
//!
//! Two texts that normalize to the same token stream under the same
//! normalizer version share this hash, which makes it a cheap duplicate
//! detector for corpus validation.
//!
//! # Examples
//!
//! ```rust
//! use canonical::{hash_normalized, hash_text, normalize, NormalizeConfig};
//!
//! let cfg = NormalizeConfig::default();
//! let a = normalize("MIT  License", &cfg).unwrap();
//! let b = normalize("mit\nlicense.", &cfg).unwrap();
//! assert_eq!(hash_normalized(&a), hash_normalized(&b));
//! assert_eq!(hash_text("hello").len(), 64);
//! ```

use sha2::{Digest, Sha256};

use crate::document::NormalizedText;

/// Hash arbitrary text with SHA-256 and return a hex digest.
///
/// Version-agnostic; use [`hash_normalized`] for token streams.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Version-aware identity hash of a normalized token stream.
pub fn hash_normalized(doc: &NormalizedText) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc.normalizer_version.to_be_bytes());
    hasher.update([0]);
    for (idx, token) in doc.tokens.iter().enumerate() {
        if idx > 0 {
            hasher.update(b" ");
        }
        hasher.update(token.text.as_bytes());
    }
    hex::encode(hasher.finalize())
}
