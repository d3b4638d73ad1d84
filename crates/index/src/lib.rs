//! # License index
//!
//! Posting index from k-token window fingerprints to the rules (and rule
//! positions) that contain them, plus a versioned cache so a process can
//! restore a previously built index instead of rebuilding it.
//!
//! ## Key Concepts
//!
//! - [`TokenDictionary`] gives every distinct rule token a dense `u32` id.
//!   Query tokens no rule contains map to [`UNKNOWN_TOKEN`].
//! - [`LicenseIndex::seed`] returns every [`Posting`] whose window
//!   fingerprint equals a query window. Rules shorter than `k` live in
//!   per-length tables reached through [`LicenseIndex::seed_short`].
//! - [`IndexCache`] stores encoded indexes keyed by [`cache_version`]
//!   (corpus checksum + schema + config). [`DirectoryIndexCache`] writes
//!   bincode + zstd blobs; [`InMemoryIndexCache`] keeps them in memory.
//!
//! ## Example Usage
//!
//! ```
//! use canonical::NormalizeConfig;
//! use corpus::{Corpus, InMemoryCorpus, LicenseRecord, RuleRecord};
//! use index::{cache_version, IndexCache, IndexConfig, InMemoryIndexCache, LicenseIndex};
//!
//! let source = InMemoryCorpus::default()
//!     .with_license(LicenseRecord::new("mit"))
//!     .with_rule(RuleRecord::new("mit_1.RULE", "Licensed under the MIT license", ["mit"]));
//! let corpus = Corpus::load(&source, &NormalizeConfig::default()).unwrap();
//!
//! let cfg = IndexConfig::default();
//! let index = LicenseIndex::build(corpus.rules(), &cfg).unwrap();
//!
//! let cache = InMemoryIndexCache::new();
//! let version = cache_version(corpus.checksum(), &cfg);
//! cache.store(&version, &index).unwrap();
//! assert!(cache.load_cached(&version).unwrap().is_some());
//! ```

mod cache;
mod codec;
mod dictionary;
mod license_index;

use bincode::error::{DecodeError, EncodeError};
use fingerprint::FingerprintConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::{cache_version, DirectoryIndexCache, InMemoryIndexCache, IndexCache};
pub use codec::{CompressionCodec, CompressionConfig};
pub use dictionary::{TokenDictionary, UNKNOWN_TOKEN};
pub use license_index::{LicenseIndex, Posting};

/// Bump whenever the encoded `LicenseIndex` layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// Index build parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Bumped when indexing behavior changes; part of the cache key.
    pub version: u32,
    /// Tokens per window.
    pub k: usize,
    /// Token hash seed shared by index and query.
    pub seed: u64,
    /// Fingerprint rules on the rayon pool.
    pub use_parallel: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let fp = FingerprintConfig::default();
        Self {
            version: 1,
            k: fp.k,
            seed: fp.seed,
            use_parallel: fp.use_parallel,
        }
    }
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

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

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.version < 1 {
            return Err(IndexError::InvalidConfig(format!(
                "version must be >= 1 (got {})",
                self.version
            )));
        }
        self.fingerprint_config()
            .validate()
            .map_err(|e| IndexError::InvalidConfig(e.to_string()))
    }

    pub(crate) fn fingerprint_config(&self) -> FingerprintConfig {
        FingerprintConfig::new()
            .with_k(self.k)
            .with_seed(self.seed)
            .with_parallel(self.use_parallel)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    #[error("index build failed: {0}")]
    Build(String),
    #[error("cached index is corrupt: {0}")]
    Corrupt(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("index cache I/O error: {0}")]
    Io(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e.to_string())
    }
}

impl IndexError {
    pub(crate) fn into_corrupt(self) -> Self {
        match self {
            IndexError::Decode(msg) | IndexError::Io(msg) => IndexError::Corrupt(msg),
            other => other,
        }
    }
}
