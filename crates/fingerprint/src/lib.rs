//! # Window fingerprints
//!
//! Turns a stream of token ids into one 64-bit fingerprint per window of `k`
//! consecutive ids. The index posts every rule window under its fingerprint;
//! at query time the same windows over the document point back at the rules
//! (and rule positions) that share them.
//!
//! ## Contract
//!
//! - Input is a token id stream produced from normalized text; this crate
//!   never sees raw text.
//! - Pure function of `(ids, config)`: no I/O, no clocks, no global state.
//!
//! Invariant: for the same ids and the same [`FingerprintConfig`] the output
//! is bit identical, sequentially or on the rayon pool.
//!
//! ## Example Usage
//!
//! ```
//! use fingerprint::{fingerprint_windows, FingerprintConfig};
//!
//! let ids = [3u32, 1, 4, 1, 5, 9, 2, 6];
//! let cfg = FingerprintConfig::default().with_k(3);
//! let fps = fingerprint_windows(&ids, &cfg).unwrap();
//! assert_eq!(fps.len(), ids.len() - 2);
//! ```

pub mod config;
mod shingles;

use rayon::prelude::*;

pub use crate::config::{FingerprintConfig, FingerprintError};
pub use crate::shingles::{sequence_fingerprint, window_fingerprints};

/// Current fingerprint algorithm version for this crate.
pub const FINGERPRINT_VERSION: u16 = 1;

/// Human-readable algorithm identifier.
pub const FINGERPRINT_ALGORITHM: &str = "xxh3_rolling_window_v1";

/// Fingerprint every k-window of one id stream.
pub fn fingerprint_windows(
    ids: &[u32],
    cfg: &FingerprintConfig,
) -> Result<Vec<u64>, FingerprintError> {
    cfg.validate()?;
    Ok(window_fingerprints(ids, cfg.k, cfg.seed))
}

/// Fingerprint many id streams, preserving input order.
///
/// Runs on the rayon pool when `cfg.use_parallel` is set.
pub fn fingerprint_batch<S>(
    sequences: &[S],
    cfg: &FingerprintConfig,
) -> Result<Vec<Vec<u64>>, FingerprintError>
where
    S: AsRef<[u32]> + Sync,
{
    cfg.validate()?;
    let out = if cfg.use_parallel {
        sequences
            .par_iter()
            .map(|seq| window_fingerprints(seq.as_ref(), cfg.k, cfg.seed))
            .collect()
    } else {
        sequences
            .iter()
            .map(|seq| window_fingerprints(seq.as_ref(), cfg.k, cfg.seed))
            .collect()
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = FingerprintConfig::default().with_k(0);
        assert_eq!(
            fingerprint_windows(&[1, 2, 3], &cfg),
            Err(FingerprintError::InvalidConfigK { k: 0 })
        );
    }

    #[test]
    fn batch_parallel_matches_sequential() {
        let seqs: Vec<Vec<u32>> = (0..32)
            .map(|s| (0..(s * 3 + 2)).map(|i| (i * 31 + s) as u32).collect())
            .collect();
        let par = fingerprint_batch(&seqs, &FingerprintConfig::default().with_parallel(true)).unwrap();
        let seq = fingerprint_batch(&seqs, &FingerprintConfig::default().with_parallel(false)).unwrap();
        assert_eq!(par, seq);
        assert_eq!(par.len(), seqs.len());
    }

    #[test]
    fn short_sequences_produce_no_windows() {
        let cfg = FingerprintConfig::default().with_k(4);
        let out = fingerprint_batch(&[vec![1u32, 2, 3]], &cfg).unwrap();
        assert!(out[0].is_empty());
    }
}
