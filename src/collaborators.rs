//! Interfaces to the scanners that run next to license matching.
//!
//! Copyright, email and URL detection, package manifest recognition, file
//! information and archive extraction are not part of this crate. Each is a
//! trait here so a [`Scanner`] can combine whatever implementations the
//! caller registers with license matching into one [`ScanRecord`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use canonical::NoTextReason;
use matcher::{MatchOptions, Truncation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn, Level};

use crate::engine::LicenseEngine;
use crate::results::LicenseResult;
use crate::QueryError;

/// Failure reported by a collaborator for one location.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{collaborator}: {message}")]
pub struct CollaboratorError {
    pub collaborator: String,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyrightKind {
    Statement,
    Holder,
    Author,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyrightDetection {
    pub kind: CopyrightKind,
    pub value: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDetection {
    pub email: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlDetection {
    pub url: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// Package metadata read from a manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Ecosystem, e.g. `npm` or `maven`.
    pub package_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// License statement as written in the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_license: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub is_text: bool,
    pub is_archive: bool,
}

/// Progress of one archive extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractEvent {
    pub source: PathBuf,
    pub target: PathBuf,
    /// `false` when extraction starts, `true` once it finished.
    pub done: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

pub trait CopyrightFinder: Send + Sync {
    fn find_copyrights(&self, location: &Path) -> Result<Vec<CopyrightDetection>, CollaboratorError>;
}

pub trait EmailFinder: Send + Sync {
    fn find_emails(&self, location: &Path) -> Result<Vec<EmailDetection>, CollaboratorError>;
}

pub trait UrlFinder: Send + Sync {
    fn find_urls(&self, location: &Path) -> Result<Vec<UrlDetection>, CollaboratorError>;
}

pub trait PackageRecognizer: Send + Sync {
    /// `Ok(None)` when `location` is not a manifest this recognizer knows.
    fn recognize(&self, location: &Path) -> Result<Option<PackageManifest>, CollaboratorError>;
}

pub trait FileInfoCollector: Send + Sync {
    fn collect(&self, location: &Path) -> Result<FileInfo, CollaboratorError>;
}

pub trait ArchiveExtractor: Send + Sync {
    /// Extract every archive under `location`. The events are produced
    /// lazily and can be consumed once.
    fn extract<'a>(&'a self, location: &'a Path) -> Box<dyn Iterator<Item = ExtractEvent> + 'a>;
}

/// Everything known about one location after a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FileInfo>,
    pub licenses: Vec<LicenseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<Truncation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_text: Option<NoTextReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub copyrights: Vec<CopyrightDetection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<EmailDetection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<UrlDetection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageManifest>,
    /// Collaborator failures. They never abort the scan.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scan_errors: Vec<String>,
}

impl ScanRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// License matching plus any registered collaborators.
pub struct Scanner {
    engine: Arc<LicenseEngine>,
    copyrights: Option<Box<dyn CopyrightFinder>>,
    emails: Option<Box<dyn EmailFinder>>,
    urls: Option<Box<dyn UrlFinder>>,
    packages: Option<Box<dyn PackageRecognizer>>,
    file_info: Option<Box<dyn FileInfoCollector>>,
    extractor: Option<Box<dyn ArchiveExtractor>>,
}

impl Scanner {
    pub fn new(engine: Arc<LicenseEngine>) -> Self {
        Self {
            engine,
            copyrights: None,
            emails: None,
            urls: None,
            packages: None,
            file_info: None,
            extractor: None,
        }
    }

    pub fn with_copyright_finder(mut self, finder: impl CopyrightFinder + 'static) -> Self {
        self.copyrights = Some(Box::new(finder));
        self
    }

    pub fn with_email_finder(mut self, finder: impl EmailFinder + 'static) -> Self {
        self.emails = Some(Box::new(finder));
        self
    }

    pub fn with_url_finder(mut self, finder: impl UrlFinder + 'static) -> Self {
        self.urls = Some(Box::new(finder));
        self
    }

    pub fn with_package_recognizer(mut self, recognizer: impl PackageRecognizer + 'static) -> Self {
        self.packages = Some(Box::new(recognizer));
        self
    }

    pub fn with_file_info_collector(mut self, collector: impl FileInfoCollector + 'static) -> Self {
        self.file_info = Some(Box::new(collector));
        self
    }

    pub fn with_archive_extractor(mut self, extractor: impl ArchiveExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn engine(&self) -> &Arc<LicenseEngine> {
        &self.engine
    }

    /// Extraction events for `location`, or `None` without an extractor.
    pub fn extract<'a>(
        &'a self,
        location: &'a Path,
    ) -> Option<Box<dyn Iterator<Item = ExtractEvent> + 'a>> {
        self.extractor.as_ref().map(|e| e.extract(location))
    }

    /// Scan one file. Only invalid options fail the scan; collaborator
    /// errors are collected into [`ScanRecord::scan_errors`].
    pub fn scan(&self, location: &Path, opts: &MatchOptions) -> Result<ScanRecord, QueryError> {
        let span = tracing::span!(Level::DEBUG, "scanner.scan", path = %location.display());
        let _guard = span.enter();

        let report = self.engine.match_location(location, opts)?;
        let mut record = ScanRecord {
            path: location.display().to_string(),
            licenses: self.engine.flatten(&report),
            truncated: report.truncated,
            no_text: report.no_text,
            ..ScanRecord::default()
        };

        let mut errors = Vec::new();
        if let Some(collector) = &self.file_info {
            record.info = collect(collector.collect(location), &mut errors);
        }
        if let Some(finder) = &self.copyrights {
            record.copyrights = collect(finder.find_copyrights(location), &mut errors).unwrap_or_default();
        }
        if let Some(finder) = &self.emails {
            record.emails = collect(finder.find_emails(location), &mut errors).unwrap_or_default();
        }
        if let Some(finder) = &self.urls {
            record.urls = collect(finder.find_urls(location), &mut errors).unwrap_or_default();
        }
        if let Some(recognizer) = &self.packages {
            record.package = collect(recognizer.recognize(location), &mut errors).flatten();
        }
        record.scan_errors = errors;

        debug!(
            licenses = record.licenses.len(),
            errors = record.scan_errors.len(),
            "scan_complete"
        );
        Ok(record)
    }
}

fn collect<T>(result: Result<T, CollaboratorError>, errors: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%error, "collaborator_failed");
            errors.push(error.to_string());
            None
        }
    }
}
