use std::collections::BTreeMap;

use canonical::NormalizedText;
use corpus::{RuleId, RuleStore};
use fingerprint::{fingerprint_batch, sequence_fingerprint, window_fingerprints};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, Level};

use crate::dictionary::TokenDictionary;
use crate::{IndexConfig, IndexError};

/// One occurrence of a k-window inside a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub rule: RuleId,
    /// Token position of the window start within the rule.
    pub pos: u32,
}

/// Read-only lookup structure from token windows to rule positions.
///
/// Built once per corpus and shared by every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseIndex {
    config: IndexConfig,
    dictionary: TokenDictionary,
    rule_tokens: Vec<Vec<u32>>,
    postings: HashMap<u64, Vec<Posting>>,
    /// Rules shorter than `k`, by token length, keyed by whole-rule fingerprint.
    short_postings: BTreeMap<u32, HashMap<u64, Vec<RuleId>>>,
}

impl LicenseIndex {
    /// Build the index for every rule in the store.
    ///
    /// Runs in time linear in the total number of rule tokens. Posting lists
    /// are in rule id order, then position order.
    pub fn build(rules: &RuleStore, cfg: &IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        let span = tracing::span!(Level::INFO, "index.build", rules = rules.len());
        let _guard = span.enter();

        if rules.len() >= u32::MAX as usize {
            return Err(IndexError::Build(format!(
                "{} rules exceed the 32-bit rule id space",
                rules.len()
            )));
        }

        let mut dictionary = TokenDictionary::new();
        let mut rule_tokens = Vec::with_capacity(rules.len());
        for rule in rules.iter() {
            if rule.len() >= u32::MAX as usize {
                return Err(IndexError::Build(format!(
                    "rule `{}` is too long to index",
                    rule.identifier()
                )));
            }
            let ids = rule
                .tokens()
                .iter()
                .map(|t| {
                    dictionary.intern(t).ok_or_else(|| {
                        IndexError::Build("token dictionary exceeds 32-bit id space".into())
                    })
                })
                .collect::<Result<Vec<u32>, _>>()?;
            rule_tokens.push(ids);
        }

        let fp_cfg = cfg.fingerprint_config();
        let windows = fingerprint_batch(&rule_tokens, &fp_cfg)
            .map_err(|e| IndexError::InvalidConfig(e.to_string()))?;

        let mut postings: HashMap<u64, Vec<Posting>> = HashMap::new();
        let mut short_postings: BTreeMap<u32, HashMap<u64, Vec<RuleId>>> = BTreeMap::new();
        for (idx, (fps, ids)) in windows.iter().zip(&rule_tokens).enumerate() {
            let rule = RuleId(idx as u32);
            if ids.len() < cfg.k {
                if let Some(fp) = sequence_fingerprint(ids, cfg.seed) {
                    short_postings
                        .entry(ids.len() as u32)
                        .or_default()
                        .entry(fp)
                        .or_default()
                        .push(rule);
                }
                continue;
            }
            for (pos, &fp) in fps.iter().enumerate() {
                postings.entry(fp).or_default().push(Posting {
                    rule,
                    pos: pos as u32,
                });
            }
        }

        let short_rules: usize = short_postings
            .values()
            .flat_map(|by_fp| by_fp.values())
            .map(Vec::len)
            .sum();
        info!(
            rules = rule_tokens.len(),
            dictionary = dictionary.len(),
            windows = postings.len(),
            short_rules,
            "index_built"
        );
        Ok(Self {
            config: cfg.clone(),
            dictionary,
            rule_tokens,
            postings,
            short_postings,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &TokenDictionary {
        &self.dictionary
    }

    pub fn rule_count(&self) -> usize {
        self.rule_tokens.len()
    }

    /// Token ids of a rule.
    pub fn rule_tokens(&self, rule: RuleId) -> Option<&[u32]> {
        self.rule_tokens.get(rule.index()).map(Vec::as_slice)
    }

    /// Map normalized query tokens to dictionary ids.
    pub fn tokenize_query(&self, doc: &NormalizedText) -> Vec<u32> {
        doc.texts().map(|t| self.dictionary.lookup(t)).collect()
    }

    /// Fingerprint every k-window of a query id stream.
    pub fn query_windows(&self, ids: &[u32]) -> Vec<u64> {
        window_fingerprints(ids, self.config.k, self.config.seed)
    }

    /// Fingerprint every window of `len` query ids, for short-rule lookup.
    pub fn query_windows_of_len(&self, ids: &[u32], len: usize) -> Vec<u64> {
        window_fingerprints(ids, len, self.config.seed)
    }

    /// Rule positions sharing the given window fingerprint.
    pub fn seed(&self, window: u64) -> &[Posting] {
        self.postings.get(&window).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Token lengths that have at least one short rule, ascending.
    pub fn short_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.short_postings.keys().map(|&len| len as usize)
    }

    /// Short rules of exactly `len` tokens whose whole-sequence fingerprint is `fp`.
    pub fn seed_short(&self, len: usize, fp: u64) -> &[RuleId] {
        u32::try_from(len)
            .ok()
            .and_then(|len| self.short_postings.get(&len))
            .and_then(|by_fp| by_fp.get(&fp))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
