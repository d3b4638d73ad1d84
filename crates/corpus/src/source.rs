//! Where corpus records come from.
//!
//! A [`CorpusSource`] only hands over raw records; validation happens in
//! [`crate::Corpus::build`] so every source gets the same checks.

use std::fs;
use std::path::{Path, PathBuf};

use canonical::decode_bytes;
use serde::Deserialize;
use tracing::debug;

use crate::error::CorpusError;
use crate::license::LicenseRecord;
use crate::rule::{default_relevance, RuleRecord};

/// Raw, unvalidated corpus content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusData {
    pub licenses: Vec<LicenseRecord>,
    pub rules: Vec<RuleRecord>,
}

/// Supplies license and rule records to the engine.
pub trait CorpusSource: Send + Sync {
    fn load(&self) -> Result<CorpusData, CorpusError>;
}

/// Records held in memory, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    data: CorpusData,
}

impl InMemoryCorpus {
    pub fn new(licenses: Vec<LicenseRecord>, rules: Vec<RuleRecord>) -> Self {
        Self {
            data: CorpusData { licenses, rules },
        }
    }

    pub fn with_license(mut self, license: LicenseRecord) -> Self {
        self.data.licenses.push(license);
        self
    }

    pub fn with_rule(mut self, rule: RuleRecord) -> Self {
        self.data.rules.push(rule);
        self
    }
}

impl CorpusSource for InMemoryCorpus {
    fn load(&self) -> Result<CorpusData, CorpusError> {
        Ok(self.data.clone())
    }
}

const LICENSES_DIR: &str = "licenses";
const RULES_DIR: &str = "rules";
const LICENSE_TEXT_EXT: &str = "LICENSE";
const RULE_TEXT_EXT: &str = "RULE";

/// A corpus laid out on disk:
///
/// ```text
/// <root>/licenses/<key>.yml      metadata
/// <root>/licenses/<key>.LICENSE  optional full text
/// <root>/rules/<name>.yml        licenses, relevance, license_choice, optional inline text
/// <root>/rules/<name>.RULE       rule text when not inline
/// ```
///
/// The license key defaults to the file stem; the rule identifier defaults
/// to `<name>.RULE`. Files are read in sorted path order. A missing `rules`
/// directory is an empty rule set.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct LicenseFile {
    key: Option<String>,
    #[serde(default)]
    short_name: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    owner: String,
    homepage_url: Option<String>,
    #[serde(default)]
    text_urls: Vec<String>,
    spdx_license_key: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    identifier: Option<String>,
    #[serde(default)]
    licenses: Vec<String>,
    #[serde(default)]
    license_choice: bool,
    #[serde(default = "default_relevance")]
    relevance: u8,
    text: Option<String>,
}

impl DirectoryCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_licenses(&self) -> Result<Vec<LicenseRecord>, CorpusError> {
        let dir = self.root.join(LICENSES_DIR);
        let mut out = Vec::new();
        for path in yaml_files(&dir)? {
            let stem = file_stem(&path)?;
            let file: LicenseFile = parse_yaml(&path)?;
            let text = match file.text {
                Some(text) => Some(text),
                None => read_optional_text(&path.with_extension(LICENSE_TEXT_EXT))?,
            };
            out.push(LicenseRecord {
                key: file.key.unwrap_or(stem),
                short_name: file.short_name,
                name: file.name,
                category: file.category,
                owner: file.owner,
                homepage_url: file.homepage_url,
                text_urls: file.text_urls,
                spdx_license_key: file.spdx_license_key,
                text,
            });
        }
        Ok(out)
    }

    fn load_rules(&self) -> Result<Vec<RuleRecord>, CorpusError> {
        let dir = self.root.join(RULES_DIR);
        if !dir.exists() {
            debug!(dir = %dir.display(), "rules_dir_missing");
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for path in yaml_files(&dir)? {
            let stem = file_stem(&path)?;
            let file: RuleFile = parse_yaml(&path)?;
            let text_path = path.with_extension(RULE_TEXT_EXT);
            let text = match file.text {
                Some(text) => text,
                None => read_optional_text(&text_path)?.ok_or_else(|| {
                    CorpusError::inconsistency(format!(
                        "rule `{}` has no inline text and no {} file",
                        path.display(),
                        text_path.display()
                    ))
                })?,
            };
            out.push(RuleRecord {
                identifier: file
                    .identifier
                    .unwrap_or_else(|| format!("{stem}.{RULE_TEXT_EXT}")),
                text,
                licenses: file.licenses,
                license_choice: file.license_choice,
                relevance: file.relevance,
            });
        }
        Ok(out)
    }
}

impl CorpusSource for DirectoryCorpus {
    fn load(&self) -> Result<CorpusData, CorpusError> {
        Ok(CorpusData {
            licenses: self.load_licenses()?,
            rules: self.load_rules()?,
        })
    }
}

fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let entries = fs::read_dir(dir).map_err(|e| CorpusError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CorpusError::io(dir, e))?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn file_stem(path: &Path) -> Result<String, CorpusError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .ok_or_else(|| CorpusError::parse(path, "file name is not valid UTF-8"))
}

fn parse_yaml<T>(path: &Path) -> Result<T, CorpusError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    let raw = fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&raw).map_err(|e| CorpusError::parse(path, e))
}

fn read_optional_text(path: &Path) -> Result<Option<String>, CorpusError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).map_err(|e| CorpusError::io(path, e))?;
    let text = decode_bytes(&bytes).map_err(|e| {
        CorpusError::inconsistency(format!("{} is not usable text: {e}", path.display()))
    })?;
    Ok(Some(text.into_owned()))
}

impl Default for RuleFile {
    fn default() -> Self {
        Self {
            identifier: None,
            licenses: Vec::new(),
            license_choice: false,
            relevance: default_relevance(),
            text: None,
        }
    }
}
