//! Workspace umbrella crate for licscan, a rule-based license text matcher.
//!
//! This crate stitches the corpus, index and matcher crates together behind
//! a [`LicenseEngine`]: load a corpus once, restore or build its index, then
//! answer any number of concurrent `match_location` queries.
//!
//! ```
//! use corpus::{InMemoryCorpus, LicenseRecord, RuleRecord};
//! use licscan::{EngineConfig, LicenseEngine, MatchOptions};
//!
//! let source = InMemoryCorpus::default()
//!     .with_license(LicenseRecord::new("mit").with_short_name("MIT License"))
//!     .with_rule(RuleRecord::new(
//!         "mit_12.RULE",
//!         "Licensed under the MIT license, see LICENSE for details",
//!         ["mit"],
//!     ));
//! let engine = LicenseEngine::init(&EngineConfig::default(), &source, None).unwrap();
//!
//! let report = engine
//!     .match_text(
//!         "# Licensed under the MIT license, see LICENSE for details.",
//!         &MatchOptions::default(),
//!     )
//!     .unwrap();
//! assert_eq!(report.matches[0].license_keys().collect::<Vec<_>>(), ["mit"]);
//! ```

pub mod collaborators;
pub mod config;
mod engine;
mod lifecycle;
mod results;

pub use canonical::{NoTextReason, NormalizeConfig};
pub use corpus::{CorpusError, CorpusSource, DirectoryCorpus, InMemoryCorpus};
pub use index::{DirectoryIndexCache, InMemoryIndexCache, IndexCache, IndexConfig, IndexError};
pub use matcher::{
    set_match_metrics, LicenseMatch, LicenseRef, MatchBudget, MatchDiagnostics, MatchError,
    MatchMetrics, MatchOptions, MatchReport, MatcherConfig, MatcherStrategy, Truncation,
};

pub use crate::config::{ConfigLoadError, LicscanConfig};
pub use crate::engine::{EngineConfig, LicenseEngine, DEFAULT_REFERENCE_URL};
pub use crate::lifecycle::{current, install, match_location, reload_if_changed, teardown};
pub use crate::results::{flatten_matches, LicenseResult, MatchedRule};

use thiserror::Error;

/// Errors that can occur while bringing up a [`LicenseEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The corpus could not be loaded or is internally inconsistent
    /// (duplicate identifiers, unknown license keys, unreadable files).
    #[error("failed to load corpus: {0}")]
    CorpusInconsistency(#[from] CorpusError),
    /// The index could not be built, or a cached index is corrupt.
    #[error("failed to prepare index: {0}")]
    IndexBuildFailure(#[from] IndexError),
    #[error("invalid engine config: {0}")]
    Config(String),
}

/// Errors returned by queries. Unreadable or binary input is not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("invalid match options: {0}")]
    InvalidOptions(String),
    #[error("no license engine installed")]
    EngineNotInstalled,
    #[error("match failed: {0}")]
    Match(MatchError),
}

impl From<MatchError> for QueryError {
    fn from(value: MatchError) -> Self {
        match value {
            MatchError::InvalidOptions(message) => QueryError::InvalidOptions(message),
            other => QueryError::Match(other),
        }
    }
}
