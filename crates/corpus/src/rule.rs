//! Rule records and the validated [`RuleStore`].

use std::collections::HashMap;

use canonical::{hash_normalized, normalize, CanonicalError, NormalizeConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CorpusError;
use crate::license::LicenseDb;

/// Dense rule handle, assigned in identifier order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u32);

impl RuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub(crate) fn default_relevance() -> u8 {
    100
}

/// Raw rule as supplied by a corpus source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub identifier: String,
    pub text: String,
    pub licenses: Vec<String>,
    #[serde(default)]
    pub license_choice: bool,
    #[serde(default = "default_relevance")]
    pub relevance: u8,
}

impl RuleRecord {
    pub fn new<I, S>(identifier: impl Into<String>, text: impl Into<String>, licenses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identifier: identifier.into(),
            text: text.into(),
            licenses: licenses.into_iter().map(Into::into).collect(),
            license_choice: false,
            relevance: default_relevance(),
        }
    }

    pub fn with_license_choice(mut self, choice: bool) -> Self {
        self.license_choice = choice;
        self
    }

    pub fn with_relevance(mut self, relevance: u8) -> Self {
        self.relevance = relevance;
        self
    }
}

/// A validated rule with its normalized token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    id: RuleId,
    identifier: String,
    text: String,
    tokens: Vec<String>,
    licenses: Vec<String>,
    license_choice: bool,
    relevance: u8,
}

impl Rule {
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Original, unnormalized text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn licenses(&self) -> &[String] {
        &self.licenses
    }

    pub fn license_choice(&self) -> bool {
        self.license_choice
    }

    pub fn relevance(&self) -> u8 {
        self.relevance
    }

    /// Token length.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Read-only collection of validated rules.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<Rule>,
    by_identifier: HashMap<String, RuleId>,
    normalizer_version: u32,
}

impl RuleStore {
    /// Validate and normalize rule records.
    ///
    /// Rules are sorted by identifier before ids are assigned, so the same
    /// records yield the same ids in any input order. Any invalid record
    /// fails the whole load.
    pub fn load(
        mut records: Vec<RuleRecord>,
        licenses: &LicenseDb,
        cfg: &NormalizeConfig,
    ) -> Result<Self, CorpusError> {
        cfg.validate()
            .map_err(|e| CorpusError::inconsistency(format!("normalizer config: {e}")))?;
        if records.len() > u32::MAX as usize {
            return Err(CorpusError::inconsistency("too many rules for 32-bit rule ids"));
        }

        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        for pair in records.windows(2) {
            if pair[0].identifier == pair[1].identifier {
                return Err(CorpusError::inconsistency(format!(
                    "duplicate rule identifier `{}`",
                    pair[0].identifier
                )));
            }
        }
        for record in &records {
            validate_record(record, licenses)?;
        }

        let normalized: Vec<_> = records
            .par_iter()
            .map(|record| match normalize(&record.text, cfg) {
                Ok(doc) => Ok(doc),
                Err(CanonicalError::NoTextContent(_)) => Err(CorpusError::inconsistency(format!(
                    "rule `{}` has no matchable tokens",
                    record.identifier
                ))),
                Err(e) => Err(CorpusError::inconsistency(format!(
                    "rule `{}`: {e}",
                    record.identifier
                ))),
            })
            .collect::<Result<_, _>>()?;

        let mut seen_texts: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut rules = Vec::with_capacity(records.len());
        let mut by_identifier = HashMap::with_capacity(records.len());
        for (idx, (record, doc)) in records.into_iter().zip(normalized).enumerate() {
            if let Some(first) = seen_texts.insert(hash_normalized(&doc), idx) {
                let same_as = rules.get(first).map(Rule::identifier).unwrap_or_default();
                warn!(rule = %record.identifier, same_as = %same_as, "duplicate_rule_text");
            }
            let id = RuleId(idx as u32);
            by_identifier.insert(record.identifier.clone(), id);
            rules.push(Rule {
                id,
                identifier: record.identifier,
                text: record.text,
                tokens: doc.texts().map(str::to_owned).collect(),
                licenses: record.licenses,
                license_choice: record.license_choice,
                relevance: record.relevance,
            });
        }

        Ok(Self {
            rules,
            by_identifier,
            normalizer_version: cfg.version,
        })
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<&Rule> {
        self.by_identifier
            .get(identifier)
            .and_then(|id| self.get(*id))
    }

    /// Rules in id (identifier) order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn normalizer_version(&self) -> u32 {
        self.normalizer_version
    }

    pub fn total_tokens(&self) -> usize {
        self.rules.iter().map(Rule::len).sum()
    }
}

fn validate_record(record: &RuleRecord, licenses: &LicenseDb) -> Result<(), CorpusError> {
    let id = &record.identifier;
    if id.trim().is_empty() {
        return Err(CorpusError::inconsistency("rule with an empty identifier"));
    }
    if record.text.trim().is_empty() {
        return Err(CorpusError::inconsistency(format!("rule `{id}` has empty text")));
    }
    if record.licenses.is_empty() {
        return Err(CorpusError::inconsistency(format!("rule `{id}` names no license")));
    }
    if record.relevance > 100 {
        return Err(CorpusError::inconsistency(format!(
            "rule `{id}` has relevance {} outside 0..=100",
            record.relevance
        )));
    }
    for key in &record.licenses {
        if !licenses.contains(key) {
            return Err(CorpusError::inconsistency(format!(
                "rule `{id}` references unknown license `{key}`"
            )));
        }
    }
    Ok(())
}
