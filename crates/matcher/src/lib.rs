//! # License Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the rule corpus (`corpus`) and the rule index
//! (`index`). It turns one document into a list of license matches: each
//! match names the rule that matched, the licenses that rule expresses, how
//! much of the rule was found, a score and the line range it covers.
//!
//! ## Pipeline
//!
//! 1. **Tokenize**: normalize the document with the same `canonical`
//!    settings the corpus was built with and map tokens to index ids.
//! 2. **Seed**: every `k`-token query window is looked up in the index;
//!    short rules are looked up by their exact token sequence.
//! 3. **Align**: seeds are extended in both directions while the number of
//!    edits stays within `max(1, floor(rule_len * max_edit_ratio))`.
//! 4. **Score**: `coverage = matched * 100 / rule_len`,
//!    `score = coverage * relevance / 100`, both rounded to two decimals.
//! 5. **Filter**: matches below `min_score` are dropped.
//! 6. **Resolve overlaps**: greedy over score, coverage, rule length and
//!    identifier; a match overlapping a better one is dropped.
//! 7. **Emit**: sorted by start line, then score (desc), then identifier.
//!
//! Work per query is bounded by a [`MatchBudget`]. Running out of budget
//! returns the matches found so far with [`MatchReport::truncated`] set.
//!
//! ## Core Types
//!
//! - [`Matcher`]: shared, thread-safe matcher over one corpus and index.
//! - [`MatcherConfig`]: edit ratio, resync width and work budget.
//! - [`MatchOptions`]: per-query threshold and optional output.
//! - [`MatchReport`] / [`LicenseMatch`]: query results.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use canonical::NormalizeConfig;
//! use corpus::{Corpus, CorpusData, LicenseRecord, RuleRecord};
//! use index::{IndexConfig, LicenseIndex};
//! use matcher::{MatchOptions, Matcher, MatcherConfig};
//!
//! let data = CorpusData {
//!     licenses: vec![LicenseRecord::new("apache-2.0").with_short_name("Apache 2.0")],
//!     rules: vec![RuleRecord::new(
//!         "apache-2.0_notice.RULE",
//!         "Licensed under the Apache License, Version 2.0",
//!         ["apache-2.0"],
//!     )],
//! };
//! let normalize_cfg = NormalizeConfig::default();
//! let corpus = Corpus::build(data, &normalize_cfg).unwrap();
//! let index = LicenseIndex::build(corpus.rules(), &IndexConfig::default()).unwrap();
//! let matcher = Matcher::new(
//!     Arc::new(corpus),
//!     Arc::new(index),
//!     normalize_cfg,
//!     MatcherConfig::default(),
//! )
//! .unwrap();
//!
//! let report = matcher
//!     .match_text(
//!         "// Licensed under the Apache License, Version 2.0\n",
//!         &MatchOptions::default(),
//!     )
//!     .unwrap();
//! assert_eq!(report.matches[0].rule_identifier, "apache-2.0_notice.RULE");
//! assert_eq!(report.matches[0].score, 100.0);
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to record
//! per-query latency, candidate counts and truncation. This is typically done
//! once during startup so all calls through [`Matcher`] share the same
//! metrics backend.

pub mod engine;
pub mod metrics;
pub mod types;

pub use crate::engine::Matcher;
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::types::{
    LicenseMatch, LicenseRef, MatchBudget, MatchDiagnostics, MatchError, MatchOptions,
    MatchReport, MatcherConfig, MatcherStrategy, Truncation, SPDX_URL_BASE,
};
pub use crate::types::spdx_url;
