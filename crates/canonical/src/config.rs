//! Configuration types for the normalizer.
//!
//! This module defines [`NormalizeConfig`], which controls how document and
//! rule text is turned into matchable tokens.
//!
//! # Versioning
//!
//! The `version` field is critical for index reuse. Any change to
//! normalization behavior (even bug fixes) must be accompanied by a version
//! bump. The version is folded into the corpus checksum, so a cached index
//! built with an older normalizer is never served against a newer one.
//!
//! # Examples
//!
//! ```rust
//! use canonical::NormalizeConfig;
//!
//! let config = NormalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert!(config.lowercase);
//! assert!(config.strip_markup);
//! assert_eq!(config.min_collapsed_digits, 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;

/// Configuration for the normalizer.
///
/// Both the corpus loader and the query path must use the *same* config,
/// otherwise rule tokens and query tokens will not line up.
///
/// # Serialization
///
/// ```json
/// {
///   "version": 1,
///   "normalize_unicode": true,
///   "lowercase": true,
///   "strip_markup": true,
///   "min_collapsed_digits": 3
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NormalizeConfig {
    /// Version of the normalization behavior. Must be >= 1.
    pub version: u32,

    /// If true, apply Unicode NFKC normalization to each grapheme cluster
    /// before classification.
    ///
    /// With normalization enabled ligatures and compatibility forms fold to
    /// their plain equivalents:
    /// ```text
    /// "ﬁle" → "file"
    /// "Ｍｉｔ" → "mit"
    /// ```
    pub normalize_unicode: bool,

    /// If true, apply locale-free Unicode lowercasing.
    pub lowercase: bool,

    /// If true, drop tokens that only carry markup meaning (`br`, `nbsp`,
    /// `href`, HTML entity names and similar).
    pub strip_markup: bool,

    /// All-digit tokens with at least this many digits are replaced by a
    /// placeholder, and runs of them collapse to one token. This keeps
    /// copyright years from blocking matches while short numbers such as
    /// license versions survive.
    ///
    /// `0` disables digit collapsing.
    pub min_collapsed_digits: usize,
}

impl NormalizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }

    pub fn with_lowercase(mut self, enabled: bool) -> Self {
        self.lowercase = enabled;
        self
    }

    pub fn with_strip_markup(mut self, enabled: bool) -> Self {
        self.strip_markup = enabled;
        self
    }

    pub fn with_min_collapsed_digits(mut self, digits: usize) -> Self {
        self.min_collapsed_digits = digits;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.version == 0 {
            return Err(CanonicalError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.min_collapsed_digits == 1 {
            // Every single digit would collapse, merging "version 2" and "version 3".
            return Err(CanonicalError::InvalidConfig(
                "min_collapsed_digits must be 0 or >= 2".into(),
            ));
        }
        Ok(())
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            normalize_unicode: true,
            lowercase: true,
            strip_markup: true,
            min_collapsed_digits: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(NormalizeConfig::default().validate().is_ok());
    }

    #[test]
    fn version_zero_rejected() {
        let cfg = NormalizeConfig::new().with_version(0);
        assert!(matches!(
            cfg.validate(),
            Err(CanonicalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn single_digit_collapse_rejected() {
        let cfg = NormalizeConfig::new().with_min_collapsed_digits(1);
        assert!(cfg.validate().is_err());
        assert!(NormalizeConfig::new()
            .with_min_collapsed_digits(0)
            .validate()
            .is_ok());
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = NormalizeConfig::new()
            .with_lowercase(false)
            .with_min_collapsed_digits(4);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: NormalizeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
