//! License metadata records and the key-addressed [`LicenseDb`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// Raw license metadata as supplied by a corpus source.
///
/// `text` is the full license text when the source has one; it becomes the
/// implicit `<key>.LICENSE` rule during [`crate::Corpus::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LicenseRecord {
    pub key: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub text_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdx_license_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl LicenseRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = short_name.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_homepage_url(mut self, url: impl Into<String>) -> Self {
        self.homepage_url = Some(url.into());
        self
    }

    pub fn with_text_url(mut self, url: impl Into<String>) -> Self {
        self.text_urls.push(url.into());
        self
    }

    pub fn with_spdx_license_key(mut self, key: impl Into<String>) -> Self {
        self.spdx_license_key = Some(key.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A validated, immutable license entry owned by [`LicenseDb`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    key: String,
    short_name: String,
    name: String,
    category: String,
    owner: String,
    homepage_url: Option<String>,
    text_urls: Vec<String>,
    spdx_license_key: Option<String>,
}

impl License {
    fn from_record(record: LicenseRecord) -> Self {
        Self {
            key: record.key,
            short_name: record.short_name,
            name: record.name,
            category: record.category,
            owner: record.owner,
            homepage_url: record.homepage_url,
            text_urls: record.text_urls,
            spdx_license_key: record.spdx_license_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn homepage_url(&self) -> Option<&str> {
        self.homepage_url.as_deref()
    }

    pub fn text_urls(&self) -> &[String] {
        &self.text_urls
    }

    pub fn spdx_license_key(&self) -> Option<&str> {
        self.spdx_license_key.as_deref()
    }
}

/// Key-addressed, read-only license metadata.
#[derive(Debug, Clone, Default)]
pub struct LicenseDb {
    licenses: BTreeMap<String, License>,
}

impl LicenseDb {
    /// Validate and index license records.
    ///
    /// Fails on an empty or duplicate key. Text fields are not kept here;
    /// see [`crate::Corpus::build`] for implicit license rules.
    pub fn load<I>(records: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = LicenseRecord>,
    {
        let mut licenses = BTreeMap::new();
        for record in records {
            if record.key.trim().is_empty() {
                return Err(CorpusError::inconsistency("license with an empty key"));
            }
            if record.key.trim() != record.key {
                return Err(CorpusError::inconsistency(format!(
                    "license key `{}` has surrounding whitespace",
                    record.key
                )));
            }
            if licenses.contains_key(&record.key) {
                return Err(CorpusError::inconsistency(format!(
                    "duplicate license key `{}`",
                    record.key
                )));
            }
            let license = License::from_record(record);
            licenses.insert(license.key.clone(), license);
        }
        Ok(Self { licenses })
    }

    pub fn get(&self, key: &str) -> Result<&License, CorpusError> {
        self.licenses
            .get(key)
            .ok_or_else(|| CorpusError::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.licenses.contains_key(key)
    }

    /// Licenses in key order.
    pub fn iter(&self) -> impl Iterator<Item = &License> + '_ {
        self.licenses.values()
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mit() -> LicenseRecord {
        LicenseRecord::new("mit")
            .with_short_name("MIT License")
            .with_category("Permissive")
            .with_owner("MIT")
            .with_text_url("http://opensource.org/licenses/mit-license.php")
            .with_spdx_license_key("MIT")
    }

    #[test]
    fn load_and_lookup() {
        let db = LicenseDb::load(vec![mit(), LicenseRecord::new("apache-2.0")]).unwrap();
        assert_eq!(db.len(), 2);
        let lic = db.get("mit").unwrap();
        assert_eq!(lic.short_name(), "MIT License");
        assert_eq!(lic.spdx_license_key(), Some("MIT"));
        assert_eq!(lic.homepage_url(), None);
    }

    #[test]
    fn iteration_is_in_key_order() {
        let db = LicenseDb::load(vec![
            LicenseRecord::new("zlib"),
            mit(),
            LicenseRecord::new("apache-2.0"),
        ])
        .unwrap();
        let keys: Vec<&str> = db.iter().map(License::key).collect();
        assert_eq!(keys, ["apache-2.0", "mit", "zlib"]);
    }

    #[test]
    fn missing_key_is_not_found() {
        let db = LicenseDb::load(vec![mit()]).unwrap();
        assert_eq!(
            db.get("gpl-2.0"),
            Err(CorpusError::NotFound("gpl-2.0".into()))
        );
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let err = LicenseDb::load(vec![mit(), mit()]).unwrap_err();
        assert!(matches!(err, CorpusError::Inconsistency(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = LicenseDb::load(vec![LicenseRecord::new("  ")]).unwrap_err();
        assert!(err.is_inconsistency());
    }

    #[test]
    fn blank_spdx_key_reads_as_absent() {
        let db = LicenseDb::load(vec![LicenseRecord::new("x").with_spdx_license_key(" ")]).unwrap();
        assert_eq!(db.get("x").unwrap().spdx_license_key(), None);
    }
}
