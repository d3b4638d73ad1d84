//! YAML Configuration File Support for licscan
//!
//! Loads every engine setting (normalization, index, matcher, result URLs)
//! plus the corpus and index cache locations from a single YAML file.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # licscan configuration
//! version: "1.0"
//!
//! corpus:
//!   path: "/var/lib/licscan/data"
//!
//! cache:
//!   path: "/var/cache/licscan"
//!   compression: "zstd"
//!   level: 3
//!
//! normalize:
//!   version: 1
//!   normalize_unicode: true
//!   lowercase: true
//!   strip_markup: true
//!   min_collapsed_digits: 3
//!
//! index:
//!   version: 1
//!   k: 4
//!   seed: 17293822573397606829
//!   use_parallel: true
//!
//! matcher:
//!   max_edit_ratio: 0.1
//!   sync_tokens: 2
//!   min_matched_tokens: 4
//!   max_alignments: 10000
//!   max_seed_hits: 1000000
//!   max_elapsed_ms: 10000
//!
//! results:
//!   reference_url_template: "https://enterprise.dejacode.com/urn/urn:dje:license:{}"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use canonical::NormalizeConfig;
use corpus::DirectoryCorpus;
use index::{CompressionCodec, CompressionConfig, DirectoryIndexCache, IndexConfig};
use matcher::{MatchBudget, MatcherConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineConfig, DEFAULT_REFERENCE_URL};

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LicscanConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub corpus: CorpusYamlConfig,

    #[serde(default)]
    pub cache: CacheYamlConfig,

    #[serde(default)]
    pub normalize: NormalizeYamlConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub matcher: MatcherYamlConfig,

    #[serde(default)]
    pub results: ResultsYamlConfig,
}

impl LicscanConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: LicscanConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.cache.validate()?;
        self.engine_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))
    }

    /// Engine settings described by this file.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_normalize(self.normalize.to_config())
            .with_index(self.index.to_config())
            .with_matcher(self.matcher.to_config())
            .with_reference_url_template(self.results.reference_url_template.clone())
    }

    /// Directory corpus at `corpus.path`, when set.
    pub fn corpus_source(&self) -> Option<DirectoryCorpus> {
        self.corpus.path.as_ref().map(DirectoryCorpus::new)
    }

    /// Index cache at `cache.path`, when set.
    pub fn index_cache(&self) -> Option<DirectoryIndexCache> {
        let path = self.cache.path.as_ref()?;
        Some(DirectoryIndexCache::new(path).with_compression(self.cache.compression_config()))
    }
}

impl Default for LicscanConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            corpus: CorpusYamlConfig::default(),
            cache: CacheYamlConfig::default(),
            normalize: NormalizeYamlConfig::default(),
            index: IndexYamlConfig::default(),
            matcher: MatcherYamlConfig::default(),
            results: ResultsYamlConfig::default(),
        }
    }
}

/// Where the license and rule files live
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusYamlConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Index cache YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheYamlConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_compression")]
    pub compression: String,

    #[serde(default = "default_compression_level")]
    pub level: i32,
}

impl CacheYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid = ["zstd", "none"];
        if !valid.contains(&self.compression.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "cache.compression must be one of: {valid:?}"
            )));
        }
        if !(1..=22).contains(&self.level) {
            return Err(ConfigLoadError::Validation(
                "cache.level must be within 1..=22".to_string(),
            ));
        }
        Ok(())
    }

    fn compression_config(&self) -> CompressionConfig {
        let codec = match self.compression.as_str() {
            "none" => CompressionCodec::None,
            _ => CompressionCodec::Zstd,
        };
        CompressionConfig::new(codec, self.level)
    }
}

impl Default for CacheYamlConfig {
    fn default() -> Self {
        Self {
            path: None,
            compression: default_compression(),
            level: default_compression_level(),
        }
    }
}

/// Normalizer YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "true_value")]
    pub normalize_unicode: bool,

    #[serde(default = "true_value")]
    pub lowercase: bool,

    #[serde(default = "true_value")]
    pub strip_markup: bool,

    #[serde(default = "default_min_collapsed_digits")]
    pub min_collapsed_digits: usize,
}

impl NormalizeYamlConfig {
    fn to_config(&self) -> NormalizeConfig {
        NormalizeConfig::default()
            .with_version(self.version)
            .with_unicode_normalization(self.normalize_unicode)
            .with_lowercase(self.lowercase)
            .with_strip_markup(self.strip_markup)
            .with_min_collapsed_digits(self.min_collapsed_digits)
    }
}

impl Default for NormalizeYamlConfig {
    fn default() -> Self {
        let cfg = NormalizeConfig::default();
        Self {
            version: cfg.version,
            normalize_unicode: cfg.normalize_unicode,
            lowercase: cfg.lowercase,
            strip_markup: cfg.strip_markup,
            min_collapsed_digits: cfg.min_collapsed_digits,
        }
    }
}

/// Index YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_k")]
    pub k: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "true_value")]
    pub use_parallel: bool,
}

impl IndexYamlConfig {
    fn to_config(&self) -> IndexConfig {
        IndexConfig {
            version: self.version,
            ..IndexConfig::default()
        }
        .with_k(self.k)
        .with_seed(self.seed)
        .with_parallel(self.use_parallel)
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        let cfg = IndexConfig::default();
        Self {
            version: cfg.version,
            k: cfg.k,
            seed: cfg.seed,
            use_parallel: cfg.use_parallel,
        }
    }
}

/// Matcher YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherYamlConfig {
    #[serde(default = "default_edit_ratio")]
    pub max_edit_ratio: f32,

    #[serde(default = "default_sync_tokens")]
    pub sync_tokens: usize,

    #[serde(default = "default_min_matched_tokens")]
    pub min_matched_tokens: usize,

    #[serde(default = "default_max_alignments")]
    pub max_alignments: usize,

    #[serde(default = "default_max_seed_hits")]
    pub max_seed_hits: usize,

    /// `null` disables the time limit.
    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: Option<u64>,
}

impl MatcherYamlConfig {
    fn to_config(&self) -> MatcherConfig {
        MatcherConfig::default()
            .with_max_edit_ratio(self.max_edit_ratio)
            .with_sync_tokens(self.sync_tokens)
            .with_min_matched_tokens(self.min_matched_tokens)
            .with_budget(MatchBudget {
                max_alignments: self.max_alignments,
                max_seed_hits: self.max_seed_hits,
                max_elapsed_ms: self.max_elapsed_ms,
            })
    }
}

impl Default for MatcherYamlConfig {
    fn default() -> Self {
        let cfg = MatcherConfig::default();
        Self {
            max_edit_ratio: cfg.max_edit_ratio,
            sync_tokens: cfg.sync_tokens,
            min_matched_tokens: cfg.min_matched_tokens,
            max_alignments: cfg.budget.max_alignments,
            max_seed_hits: cfg.budget.max_seed_hits,
            max_elapsed_ms: cfg.budget.max_elapsed_ms,
        }
    }
}

/// Result record YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsYamlConfig {
    #[serde(default = "default_reference_url")]
    pub reference_url_template: String,
}

impl Default for ResultsYamlConfig {
    fn default() -> Self {
        Self {
            reference_url_template: default_reference_url(),
        }
    }
}

// Helper functions for serde defaults
fn default_version() -> u32 {
    1
}
fn true_value() -> bool {
    true
}
fn default_min_collapsed_digits() -> usize {
    NormalizeConfig::default().min_collapsed_digits
}
fn default_k() -> usize {
    IndexConfig::default().k
}
fn default_seed() -> u64 {
    IndexConfig::default().seed
}
fn default_edit_ratio() -> f32 {
    MatcherConfig::default().max_edit_ratio
}
fn default_sync_tokens() -> usize {
    MatcherConfig::default().sync_tokens
}
fn default_min_matched_tokens() -> usize {
    MatcherConfig::default().min_matched_tokens
}
fn default_max_alignments() -> usize {
    MatchBudget::default().max_alignments
}
fn default_max_seed_hits() -> usize {
    MatchBudget::default().max_seed_hits
}
fn default_max_elapsed_ms() -> Option<u64> {
    MatchBudget::default().max_elapsed_ms
}
fn default_compression() -> String {
    "zstd".to_string()
}
fn default_compression_level() -> i32 {
    3
}
fn default_reference_url() -> String {
    DEFAULT_REFERENCE_URL.to_string()
}
