use std::fs;
use std::path::Path;
use std::sync::Arc;

use canonical::NormalizeConfig;
use corpus::{Corpus, CorpusSource};
use index::{cache_version, IndexCache, IndexConfig, IndexError, LicenseIndex};
use matcher::{MatchError, MatchOptions, MatchReport, Matcher, MatcherConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Level};

use crate::results::{flatten_matches, LicenseResult};
use crate::{EngineError, QueryError};

/// Default template for [`LicenseResult::reference_url`]; `{}` is replaced
/// by the license key.
pub const DEFAULT_REFERENCE_URL: &str = "https://enterprise.dejacode.com/urn/urn:dje:license:{}";

/// Settings for every stage of a [`LicenseEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub normalize: NormalizeConfig,
    pub index: IndexConfig,
    pub matcher: MatcherConfig,
    /// URL template for license reference pages, must contain `{}`.
    pub reference_url_template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            index: IndexConfig::default(),
            matcher: MatcherConfig::default(),
            reference_url_template: DEFAULT_REFERENCE_URL.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }

    pub fn with_matcher(mut self, matcher: MatcherConfig) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_reference_url_template(mut self, template: impl Into<String>) -> Self {
        self.reference_url_template = template.into();
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.normalize
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        self.index
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        self.matcher
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        if !self.reference_url_template.contains("{}") {
            return Err(EngineError::Config(format!(
                "reference_url_template must contain `{{}}` (got `{}`)",
                self.reference_url_template
            )));
        }
        Ok(())
    }
}

/// A loaded corpus, its index and a matcher over both.
///
/// Everything inside is immutable after [`LicenseEngine::init`]; share the
/// engine behind an `Arc` and query it from any number of threads.
pub struct LicenseEngine {
    config: EngineConfig,
    matcher: Matcher,
    index_version: String,
}

impl LicenseEngine {
    /// Load the corpus from `source`, then restore its index from `cache` or
    /// build it (and store it back) on a miss.
    ///
    /// A cache entry that exists but cannot be decoded fails initialization
    /// with [`EngineError::IndexBuildFailure`].
    pub fn init(
        config: &EngineConfig,
        source: &dyn CorpusSource,
        cache: Option<&dyn IndexCache>,
    ) -> Result<Self, EngineError> {
        let span = tracing::span!(Level::INFO, "engine.init");
        let _guard = span.enter();

        config.validate()?;
        let corpus = Corpus::load(source, &config.normalize)?;
        let index_version = cache_version(corpus.checksum(), &config.index);

        let cached = match cache {
            Some(cache) => cache.load_cached(&index_version)?,
            None => None,
        };
        let index = match cached {
            Some(index) => {
                info!(version = %index_version, "index_cache_hit");
                index
            }
            None => {
                debug!(version = %index_version, "index_cache_miss");
                let index = LicenseIndex::build(corpus.rules(), &config.index)?;
                if let Some(cache) = cache {
                    if let Err(error) = cache.store(&index_version, &index) {
                        warn!(version = %index_version, %error, "index_cache_store_failed");
                    }
                }
                index
            }
        };

        let matcher = Matcher::new(
            Arc::new(corpus),
            Arc::new(index),
            config.normalize.clone(),
            config.matcher.clone(),
        )
        .map_err(|e| match e {
            MatchError::IndexMismatch(message) => {
                EngineError::IndexBuildFailure(IndexError::Corrupt(message))
            }
            other => EngineError::Config(other.to_string()),
        })?;

        info!(
            licenses = matcher.corpus().licenses().len(),
            rules = matcher.corpus().rules().len(),
            version = %index_version,
            "engine_ready"
        );
        Ok(Self {
            config: config.clone(),
            matcher,
            index_version,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        self.matcher.corpus()
    }

    pub fn index(&self) -> &LicenseIndex {
        self.matcher.index()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Checksum of the loaded corpus.
    pub fn corpus_version(&self) -> &str {
        self.corpus().checksum()
    }

    /// Cache key the index was stored (or looked up) under.
    pub fn index_version(&self) -> &str {
        &self.index_version
    }

    /// Whether `source` still describes the corpus this engine was built from.
    pub fn is_current(&self, source: &dyn CorpusSource) -> Result<bool, EngineError> {
        let data = source.load()?;
        Ok(data.checksum(&self.config.normalize) == self.corpus_version())
    }

    /// Match in-memory text.
    pub fn match_text(&self, text: &str, opts: &MatchOptions) -> Result<MatchReport, QueryError> {
        let report = self.matcher.match_text(text, opts)?;
        Ok(self.with_reference_urls(report))
    }

    /// Match raw bytes, decoding them first.
    pub fn match_bytes(&self, bytes: &[u8], opts: &MatchOptions) -> Result<MatchReport, QueryError> {
        let report = self.matcher.match_bytes(bytes, opts)?;
        Ok(self.with_reference_urls(report))
    }

    fn with_reference_urls(&self, mut report: MatchReport) -> MatchReport {
        let template = &self.config.reference_url_template;
        for license in report.matches.iter_mut().flat_map(|m| m.licenses.iter_mut()) {
            license.resolve_reference_url(template);
        }
        report
    }

    /// Match the file at `location`. A file that cannot be read yields an
    /// empty report flagged [`canonical::NoTextReason::Unreadable`].
    pub fn match_location(
        &self,
        location: impl AsRef<Path>,
        opts: &MatchOptions,
    ) -> Result<MatchReport, QueryError> {
        opts.validate()?;
        let location = location.as_ref();
        match fs::read(location) {
            Ok(bytes) => self.match_bytes(&bytes, opts),
            Err(error) => {
                debug!(path = %location.display(), %error, "location_unreadable");
                Ok(MatchReport::no_text(canonical::NoTextReason::Unreadable))
            }
        }
    }

    /// One record per (match, license) for the file at `location`.
    pub fn license_results(
        &self,
        location: impl AsRef<Path>,
        opts: &MatchOptions,
    ) -> Result<Vec<LicenseResult>, QueryError> {
        let report = self.match_location(location, opts)?;
        Ok(self.flatten(&report))
    }

    /// Flatten an existing report with this engine's reference URL template.
    pub fn flatten(&self, report: &MatchReport) -> Vec<LicenseResult> {
        flatten_matches(&report.matches, &self.config.reference_url_template)
    }
}
