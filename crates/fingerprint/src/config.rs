//! Configuration and error types for window fingerprinting.
//!
//! The fingerprint layer is a pure function of `(token_ids, config)`: no I/O
//! and no environment-dependent behavior, so an index built on one machine
//! can be restored and queried on another.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for k-token window fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FingerprintConfig {
    /// Configuration schema version.
    ///
    /// Any algorithmic change that can affect fingerprints must bump this
    /// version so cached indexes are rebuilt.
    pub version: u32,
    /// Number of tokens per window.
    ///
    /// Smaller windows seed more candidates (better recall around edits),
    /// larger windows seed fewer, more specific ones.
    pub k: usize,
    /// Seed for token hashing. Index and query must share it.
    pub seed: u64,
    /// Fingerprint batches of sequences on the rayon pool.
    pub use_parallel: bool,
}

impl FingerprintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window size (k). Typical values: 3-8.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), FingerprintError> {
        if self.version < 1 {
            return Err(FingerprintError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.k < 1 {
            return Err(FingerprintError::InvalidConfigK { k: self.k });
        }
        Ok(())
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            version: 1,
            k: 4,
            seed: 0xF00D_BAAD_F00D_BAAD,
            use_parallel: true,
        }
    }
}

/// Errors returned by the fingerprint layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("invalid config: k must be >= 1 (got {k})")]
    InvalidConfigK { k: usize },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },
}
