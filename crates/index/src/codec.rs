use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::{IndexError, LicenseIndex, INDEX_SCHEMA_VERSION};

/// Compression codec options for cached index blobs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level, 1-22.
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => decode_all(data).map_err(|e| IndexError::Decode(e.to_string())),
        }
    }
}

/// Envelope written to the cache. The version string is checked on load so
/// a renamed or misplaced blob is never served for another corpus.
#[derive(Serialize, Deserialize)]
struct CachedIndex {
    schema_version: u16,
    version: String,
    index: LicenseIndex,
}

#[derive(Serialize)]
struct CachedIndexRef<'a> {
    schema_version: u16,
    version: &'a str,
    index: &'a LicenseIndex,
}

/// Encode and compress an index for storage under `version`.
pub(crate) fn encode_index(
    version: &str,
    index: &LicenseIndex,
    compression: &CompressionConfig,
) -> Result<Vec<u8>, IndexError> {
    let envelope = CachedIndexRef {
        schema_version: INDEX_SCHEMA_VERSION,
        version,
        index,
    };
    let encoded = encode_to_vec(&envelope, standard())?;
    compression.compress(&encoded)
}

/// Decompress and decode a stored index, checking it belongs to `version`.
///
/// Any failure is reported as [`IndexError::Corrupt`].
pub(crate) fn decode_index(
    version: &str,
    data: &[u8],
    compression: &CompressionConfig,
) -> Result<LicenseIndex, IndexError> {
    let decompressed = compression.decompress(data).map_err(IndexError::into_corrupt)?;
    let (cached, _): (CachedIndex, usize) =
        decode_from_slice(&decompressed, standard()).map_err(|e| IndexError::Corrupt(e.to_string()))?;
    if cached.schema_version != INDEX_SCHEMA_VERSION {
        return Err(IndexError::Corrupt(format!(
            "schema version {} does not match {INDEX_SCHEMA_VERSION}",
            cached.schema_version
        )));
    }
    if cached.version != version {
        return Err(IndexError::Corrupt(format!(
            "blob holds index `{}`, expected `{version}`",
            cached.version
        )));
    }
    Ok(cached.index)
}
