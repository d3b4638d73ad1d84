use canonical::NormalizeConfig;
use sha2::{Digest, Sha256};
use tracing::{debug, info, Level};

use crate::error::CorpusError;
use crate::license::{LicenseDb, LicenseRecord};
use crate::rule::{RuleRecord, RuleStore};
use crate::source::{CorpusData, CorpusSource};

/// Suffix of the implicit rule built from a license's own text.
pub const LICENSE_RULE_SUFFIX: &str = ".LICENSE";

const CHECKSUM_DOMAIN: &[u8] = b"licscan-corpus-v1";

/// A fully validated corpus: license metadata, normalized rules and the
/// checksum that identifies this exact content.
#[derive(Debug, Clone)]
pub struct Corpus {
    licenses: LicenseDb,
    rules: RuleStore,
    checksum: String,
}

impl Corpus {
    /// Validate raw records into a corpus.
    ///
    /// Each license with non-blank text contributes an implicit rule
    /// `<key>.LICENSE` (relevance 100) unless a rule with that identifier
    /// already exists, in which case the load fails as a duplicate.
    pub fn build(data: CorpusData, cfg: &NormalizeConfig) -> Result<Self, CorpusError> {
        let span = tracing::span!(
            Level::INFO,
            "corpus.build",
            licenses = data.licenses.len(),
            rules = data.rules.len()
        );
        let _guard = span.enter();

        let checksum = data.checksum(cfg);
        let mut rules = data.rules;
        for license in &data.licenses {
            match license.text.as_deref() {
                Some(text) if !text.trim().is_empty() => rules.push(RuleRecord::new(
                    format!("{}{LICENSE_RULE_SUFFIX}", license.key),
                    text,
                    [license.key.as_str()],
                )),
                _ => debug!(license = %license.key, "license_without_text"),
            }
        }
        let licenses = LicenseDb::load(data.licenses)?;
        let rules = RuleStore::load(rules, &licenses, cfg)?;

        info!(
            licenses = licenses.len(),
            rules = rules.len(),
            tokens = rules.total_tokens(),
            checksum = %checksum,
            "corpus_loaded"
        );
        Ok(Self {
            licenses,
            rules,
            checksum,
        })
    }

    /// Load from a source and build.
    pub fn load(source: &dyn CorpusSource, cfg: &NormalizeConfig) -> Result<Self, CorpusError> {
        Self::build(source.load()?, cfg)
    }

    pub fn licenses(&self) -> &LicenseDb {
        &self.licenses
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// SHA-256 hex of the normalizer settings and all records.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

impl CorpusData {
    /// Checksum of this content as [`Corpus::build`] would report it.
    ///
    /// Independent of record order: licenses are hashed in key order and
    /// rules in identifier order.
    pub fn checksum(&self, cfg: &NormalizeConfig) -> String {
        let mut hasher = Sha256::new();
        hasher.update(CHECKSUM_DOMAIN);
        hasher.update(cfg.version.to_be_bytes());
        hasher.update([
            cfg.normalize_unicode as u8,
            cfg.lowercase as u8,
            cfg.strip_markup as u8,
        ]);
        hasher.update((cfg.min_collapsed_digits as u64).to_be_bytes());

        let mut licenses: Vec<&LicenseRecord> = self.licenses.iter().collect();
        licenses.sort_by(|a, b| a.key.cmp(&b.key));
        hasher.update((licenses.len() as u64).to_be_bytes());
        for lic in licenses {
            put_str(&mut hasher, &lic.key);
            put_str(&mut hasher, &lic.short_name);
            put_str(&mut hasher, &lic.name);
            put_str(&mut hasher, &lic.category);
            put_str(&mut hasher, &lic.owner);
            put_opt(&mut hasher, lic.homepage_url.as_deref());
            put_list(&mut hasher, &lic.text_urls);
            put_opt(&mut hasher, lic.spdx_license_key.as_deref());
            put_opt(&mut hasher, lic.text.as_deref());
        }

        let mut rules: Vec<&RuleRecord> = self.rules.iter().collect();
        rules.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        hasher.update((rules.len() as u64).to_be_bytes());
        for rule in rules {
            put_str(&mut hasher, &rule.identifier);
            put_str(&mut hasher, &rule.text);
            put_list(&mut hasher, &rule.licenses);
            hasher.update([rule.license_choice as u8, rule.relevance]);
        }
        hex::encode(hasher.finalize())
    }
}

fn put_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_be_bytes());
    hasher.update(s.as_bytes());
}

fn put_opt(hasher: &mut Sha256, s: Option<&str>) {
    match s {
        Some(s) => {
            hasher.update([1u8]);
            put_str(hasher, s);
        }
        None => hasher.update([0u8]),
    }
}

fn put_list(hasher: &mut Sha256, items: &[String]) {
    hasher.update((items.len() as u64).to_be_bytes());
    for item in items {
        put_str(hasher, item);
    }
}
