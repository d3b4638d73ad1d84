use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::codec::{decode_index, encode_index, CompressionConfig};
use crate::{IndexConfig, IndexError, LicenseIndex, INDEX_SCHEMA_VERSION};

/// Storage for built indexes, keyed by a version string.
///
/// A miss is `Ok(None)`. A stored entry that cannot be decoded is
/// [`IndexError::Corrupt`]; callers must not silently rebuild over it.
pub trait IndexCache: Send + Sync {
    fn load_cached(&self, version: &str) -> Result<Option<LicenseIndex>, IndexError>;
    fn store(&self, version: &str, index: &LicenseIndex) -> Result<(), IndexError>;
}

/// Cache key for an index built from a corpus with `corpus_checksum` under `cfg`.
pub fn cache_version(corpus_checksum: &str, cfg: &IndexConfig) -> String {
    format!(
        "{corpus_checksum}-s{INDEX_SCHEMA_VERSION}-v{}-k{}-{:016x}",
        cfg.version, cfg.k, cfg.seed
    )
}

/// Encoded indexes held in a `RwLock<HashMap>`.
#[derive(Default)]
pub struct InMemoryIndexCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    compression: CompressionConfig,
}

impl InMemoryIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the stored bytes for `version`.
    pub fn put_raw(&self, version: &str, bytes: Vec<u8>) -> Result<(), IndexError> {
        self.entries
            .write()
            .map_err(|_| IndexError::Io("poisoned cache lock".into()))?
            .insert(version.to_string(), bytes);
        Ok(())
    }
}

impl IndexCache for InMemoryIndexCache {
    fn load_cached(&self, version: &str) -> Result<Option<LicenseIndex>, IndexError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| IndexError::Io("poisoned cache lock".into()))?;
        match guard.get(version) {
            Some(bytes) => decode_index(version, bytes, &self.compression).map(Some),
            None => Ok(None),
        }
    }

    fn store(&self, version: &str, index: &LicenseIndex) -> Result<(), IndexError> {
        let bytes = encode_index(version, index, &self.compression)?;
        self.put_raw(version, bytes)
    }
}

/// One compressed file per version under a directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so readers never observe a partial blob.
#[derive(Debug, Clone)]
pub struct DirectoryIndexCache {
    dir: PathBuf,
    compression: CompressionConfig,
}

impl DirectoryIndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            compression: CompressionConfig::default(),
        }
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds (or would hold) the index for `version`.
    pub fn path_for(&self, version: &str) -> PathBuf {
        let name: String = version
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.idx"))
    }
}

impl IndexCache for DirectoryIndexCache {
    fn load_cached(&self, version: &str) -> Result<Option<LicenseIndex>, IndexError> {
        let path = self.path_for(version);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "index_cache_miss");
                return Ok(None);
            }
            Err(e) => return Err(IndexError::Io(format!("{}: {e}", path.display()))),
        };
        decode_index(version, &bytes, &self.compression)
            .map(Some)
            .map_err(|e| IndexError::Corrupt(format!("{}: {e}", path.display())))
    }

    fn store(&self, version: &str, index: &LicenseIndex) -> Result<(), IndexError> {
        let bytes = encode_index(version, index, &self.compression)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| IndexError::Io(format!("{}: {e}", self.dir.display())))?;
        let path = self.path_for(version);
        // Unique temp file per call; concurrent stores of one version each
        // rename a complete blob into place.
        let write = || -> std::io::Result<()> {
            let mut file = NamedTempFile::new_in(&self.dir)?;
            file.write_all(&bytes)?;
            file.as_file().sync_all()?;
            file.persist(&path).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| IndexError::Io(format!("{}: {e}", path.display())))
    }
}
