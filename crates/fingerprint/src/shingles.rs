//! Rolling-hash windows over token id streams.
//!
//! Every window of `k` consecutive token ids is reduced to one 64-bit
//! fingerprint with a polynomial rolling hash, so the whole stream is
//! fingerprinted in O(n) regardless of `k`.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Compute rolling-hash fingerprints for every k-window, in order.
///
/// `out[i]` covers `ids[i..i + k]`. Returns an empty vector when `k == 0`
/// or the stream is shorter than `k`.
pub fn window_fingerprints(ids: &[u32], k: usize, seed: u64) -> Vec<u64> {
    let n = ids.len();
    if k == 0 || n < k {
        return Vec::new();
    }
    // Hash each token individually first.
    let mut th: Vec<u64> = Vec::with_capacity(n);
    th.extend(ids.iter().map(|id| xxh3_64_with_seed(&id.to_le_bytes(), seed)));

    // A large prime used as the base for the polynomial hash.
    // It's XORed with a seed-derived value to make the base unpredictable.
    const BASE: u64 = 1_000_003;
    let base = BASE ^ splitmix64(seed);

    // Precompute base^(k-1) for efficient removal of the oldest element in the window.
    let mut base_km1 = 1u64;
    for _ in 1..k {
        base_km1 = base_km1.wrapping_mul(base);
    }

    let mut out = Vec::with_capacity(n - k + 1);
    let mut h = 0u64;
    for &val in th.iter().take(k) {
        h = h.wrapping_mul(base).wrapping_add(val);
    }
    out.push(h);

    for (&old, &new) in th.iter().zip(th.iter().skip(k)) {
        h = h.wrapping_sub(old.wrapping_mul(base_km1));
        h = h.wrapping_mul(base).wrapping_add(new);
        out.push(h);
    }
    out
}

/// Fingerprint of a whole sequence.
///
/// Equal to the single window produced by
/// `window_fingerprints(ids, ids.len(), seed)`, so a short rule can be found
/// by fingerprinting query windows of the rule's length.
pub fn sequence_fingerprint(ids: &[u32], seed: u64) -> Option<u64> {
    window_fingerprints(ids, ids.len(), seed).first().copied()
}

/// A 64-bit mixing function with good distribution.
#[inline]
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
