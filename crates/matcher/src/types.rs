use std::time::Duration;

use canonical::{CanonicalError, NoTextReason};
use corpus::License;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a match was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatcherStrategy {
    /// Every rule token matched in order with no gaps.
    Exact,
    /// Bounded-edit alignment: some rule tokens missing or extra query tokens.
    Approximate,
}

impl MatcherStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherStrategy::Exact => "exact",
            MatcherStrategy::Approximate => "approximate",
        }
    }
}

/// Why matching stopped before every candidate was aligned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    /// Seeding stopped after `max_seed_hits` hits.
    SeedLimit,
    AlignmentLimit,
    TimeLimit,
}

/// Work limit for a single query. Exceeding it truncates the result set
/// instead of failing the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchBudget {
    /// Maximum number of seed alignments attempted.
    #[serde(default = "MatchBudget::default_max_alignments")]
    pub max_alignments: usize,
    /// Maximum number of seed hits collected across all rules.
    #[serde(default = "MatchBudget::default_max_seed_hits")]
    pub max_seed_hits: usize,
    /// Wall-clock limit in milliseconds; `None` disables it.
    #[serde(default = "MatchBudget::default_max_elapsed_ms")]
    pub max_elapsed_ms: Option<u64>,
}

impl MatchBudget {
    pub(crate) fn default_max_alignments() -> usize {
        10_000
    }

    pub(crate) fn default_max_seed_hits() -> usize {
        1_000_000
    }

    pub(crate) fn default_max_elapsed_ms() -> Option<u64> {
        Some(10_000)
    }

    pub fn unlimited() -> Self {
        Self {
            max_alignments: usize::MAX,
            max_seed_hits: usize::MAX,
            max_elapsed_ms: None,
        }
    }

    pub fn with_max_alignments(mut self, max_alignments: usize) -> Self {
        self.max_alignments = max_alignments;
        self
    }

    pub fn with_max_seed_hits(mut self, max_seed_hits: usize) -> Self {
        self.max_seed_hits = max_seed_hits;
        self
    }

    pub fn with_max_elapsed(mut self, limit: Option<Duration>) -> Self {
        self.max_elapsed_ms = limit.map(|d| d.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed_ms.map(Duration::from_millis)
    }
}

impl Default for MatchBudget {
    fn default() -> Self {
        Self {
            max_alignments: Self::default_max_alignments(),
            max_seed_hits: Self::default_max_seed_hits(),
            max_elapsed_ms: Self::default_max_elapsed_ms(),
        }
    }
}

/// Engine-wide matcher tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatcherConfig {
    /// Edit budget per alignment as a fraction of the rule length.
    /// The budget is never below one edit.
    #[serde(default = "MatcherConfig::default_max_edit_ratio")]
    pub max_edit_ratio: f32,
    /// Tokens that must agree after a gap before alignment resumes.
    #[serde(default = "MatcherConfig::default_sync_tokens")]
    pub sync_tokens: usize,
    /// Partial matches with fewer matched tokens are dropped. Rules shorter
    /// than this only need to match completely.
    #[serde(default = "MatcherConfig::default_min_matched_tokens")]
    pub min_matched_tokens: usize,
    #[serde(default)]
    pub budget: MatchBudget,
}

impl MatcherConfig {
    pub(crate) fn default_max_edit_ratio() -> f32 {
        0.1
    }

    pub(crate) fn default_sync_tokens() -> usize {
        2
    }

    pub(crate) fn default_min_matched_tokens() -> usize {
        4
    }

    pub fn with_max_edit_ratio(mut self, ratio: f32) -> Self {
        self.max_edit_ratio = ratio;
        self
    }

    pub fn with_sync_tokens(mut self, sync: usize) -> Self {
        self.sync_tokens = sync;
        self
    }

    pub fn with_min_matched_tokens(mut self, min: usize) -> Self {
        self.min_matched_tokens = min;
        self
    }

    pub fn with_budget(mut self, budget: MatchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.max_edit_ratio) {
            return Err(MatchError::InvalidConfig(
                "max_edit_ratio must be between 0.0 and 1.0".into(),
            ));
        }
        if self.sync_tokens == 0 {
            return Err(MatchError::InvalidConfig(
                "sync_tokens must be greater than zero".into(),
            ));
        }
        if self.min_matched_tokens == 0 {
            return Err(MatchError::InvalidConfig(
                "min_matched_tokens must be greater than zero".into(),
            ));
        }
        if self.budget.max_alignments == 0 {
            return Err(MatchError::InvalidConfig(
                "budget.max_alignments must be greater than zero".into(),
            ));
        }
        if self.budget.max_seed_hits == 0 {
            return Err(MatchError::InvalidConfig(
                "budget.max_seed_hits must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Edit budget for a rule of `rule_len` tokens.
    pub fn max_edits(&self, rule_len: usize) -> usize {
        ((rule_len as f64 * self.max_edit_ratio as f64).floor() as usize).max(1)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_edit_ratio: Self::default_max_edit_ratio(),
            sync_tokens: Self::default_sync_tokens(),
            min_matched_tokens: Self::default_min_matched_tokens(),
            budget: MatchBudget::default(),
        }
    }
}

/// Per-query options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MatchOptions {
    /// Matches scoring below this (0-100) are dropped.
    #[serde(default)]
    pub min_score: f32,
    /// Attach the verbatim matched region of the input.
    #[serde(default)]
    pub include_text: bool,
    /// Attach [`MatchDiagnostics`] to every match.
    #[serde(default)]
    pub diagnostics: bool,
}

impl MatchOptions {
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_text(mut self, include_text: bool) -> Self {
        self.include_text = include_text;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=100.0).contains(&self.min_score) {
            return Err(MatchError::InvalidOptions(format!(
                "min_score must be within 0..=100 (got {})",
                self.min_score
            )));
        }
        Ok(())
    }
}

/// Base of [`LicenseRef::spdx_url`].
pub const SPDX_URL_BASE: &str = "https://spdx.org/licenses/";

/// License metadata attached to a match.
///
/// `reference_url` is empty until [`LicenseRef::resolve_reference_url`]
/// fills it from a template; the engine does this for every report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LicenseRef {
    pub key: String,
    pub short_name: String,
    pub name: String,
    pub category: String,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    pub text_urls: Vec<String>,
    /// First of `text_urls`, or empty.
    #[serde(default)]
    pub text_url: String,
    #[serde(default)]
    pub reference_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spdx_license_key: Option<String>,
    /// Empty when the license has no SPDX key.
    #[serde(default)]
    pub spdx_url: String,
}

impl LicenseRef {
    /// Set `reference_url` to `template` with `{}` replaced by the key.
    pub fn resolve_reference_url(&mut self, template: &str) {
        self.reference_url = template.replace("{}", &self.key);
    }
}

impl From<&License> for LicenseRef {
    fn from(license: &License) -> Self {
        let spdx_license_key = license.spdx_license_key().map(str::to_owned);
        Self {
            key: license.key().to_string(),
            short_name: license.short_name().to_string(),
            name: license.name().to_string(),
            category: license.category().to_string(),
            owner: license.owner().to_string(),
            homepage_url: license.homepage_url().map(str::to_owned),
            text_urls: license.text_urls().to_vec(),
            text_url: license.text_urls().first().cloned().unwrap_or_default(),
            reference_url: String::new(),
            spdx_url: spdx_url(spdx_license_key.as_deref().unwrap_or_default()),
            spdx_license_key,
        }
    }
}

/// `https://spdx.org/licenses/<key>` with a trailing `+` dropped, or empty.
pub fn spdx_url(spdx_key: &str) -> String {
    let key = spdx_key.trim_end_matches('+');
    if key.is_empty() {
        String::new()
    } else {
        format!("{SPDX_URL_BASE}{key}")
    }
}

/// How a match scored, for callers that asked for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchDiagnostics {
    pub matcher: MatcherStrategy,
    pub rule_length: usize,
    pub matched_length: usize,
    pub match_coverage: f32,
    pub rule_relevance: u8,
}

/// One detected rule in a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LicenseMatch {
    pub rule_identifier: String,
    /// Licenses of the rule, in rule order.
    pub licenses: Vec<LicenseRef>,
    pub license_choice: bool,
    /// `coverage * relevance / 100`, 0-100.
    pub score: f32,
    /// Share of rule tokens matched, 0-100.
    pub coverage: f32,
    pub matched_length: usize,
    pub rule_length: usize,
    /// 1-based, inclusive.
    pub start_line: u32,
    pub end_line: u32,
    pub matcher: MatcherStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<MatchDiagnostics>,
}

impl LicenseMatch {
    pub fn license_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.licenses.iter().map(|l| l.key.as_str())
    }
}

/// Result of matching one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MatchReport {
    /// Ordered by start line, then score descending, then rule identifier.
    pub matches: Vec<LicenseMatch>,
    /// Set when the work budget stopped alignment early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<Truncation>,
    /// Set when the input had nothing to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_text: Option<NoTextReason>,
}

impl MatchReport {
    pub fn no_text(reason: NoTextReason) -> Self {
        Self {
            no_text: Some(reason),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    #[error("invalid match options: {0}")]
    InvalidOptions(String),
    /// The index was not built from the rule store handed to the matcher.
    #[error("index does not belong to this corpus: {0}")]
    IndexMismatch(String),
    #[error("canonical error: {0}")]
    Canonical(#[from] CanonicalError),
}
