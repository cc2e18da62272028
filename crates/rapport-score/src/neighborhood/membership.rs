//! Visited-set structures for neighborhood extraction.
//!
//! [`BloomFilter`] is the production structure: memory stays bounded no
//! matter how dense the rating graph is, at the price of occasionally
//! reporting an unvisited node as visited. The extractor treats such a node
//! as already seen and prunes it. [`ExactSet`] has no false positives and
//! is used where deterministic output matters more than memory.

use std::collections::HashSet;

use fixedbitset::FixedBitSet;
use rapport_core::NodeId;

/// Target capacity used when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 1000;
/// Target false-positive rate used when nothing else is configured.
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Approximate set membership: `add` and `contains`, no removal.
///
/// Implementations must never report a false negative.
pub trait Membership {
    fn add(&mut self, key: NodeId);
    fn contains(&self, key: NodeId) -> bool;
}

// ---------------------------------------------------------------------------
// BloomFilter
// ---------------------------------------------------------------------------

/// A classic bloom filter over a fixed bit array.
///
/// Keys are hashed once with BLAKE3 (over their big-endian bytes); the `k`
/// probe positions are derived by double hashing `h1 + i·h2 mod m`.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: FixedBitSet,
    hashes: u32,
}

impl BloomFilter {
    /// Size a filter for `capacity` keys at `false_positive_rate`.
    ///
    /// Uses `m = ⌈-n·ln p / (ln 2)²⌉` bits and `k = ⌈ln 2 · m / n⌉` probes.
    /// Degenerate inputs are clamped: capacity to at least 1 and the rate
    /// into `[1e-9, 0.5]`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn with_estimates(capacity: usize, false_positive_rate: f64) -> Self {
        let n = capacity.max(1) as f64;
        let p = false_positive_rate.clamp(1e-9, 0.5);
        let ln2 = std::f64::consts::LN_2;

        let m = (-n * p.ln() / (ln2 * ln2)).ceil().max(1.0);
        let k = (ln2 * m / n).ceil().max(1.0);

        Self {
            bits: FixedBitSet::with_capacity(m as usize),
            hashes: k as u32,
        }
    }

    /// Number of bits in the filter.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Number of probes per key.
    #[must_use]
    pub const fn hash_count(&self) -> u32 {
        self.hashes
    }

    #[allow(clippy::cast_possible_truncation)]
    fn probes(&self, key: NodeId) -> impl Iterator<Item = usize> + use<> {
        let digest = blake3::hash(&key.to_be_bytes());
        let bytes = digest.as_bytes();
        let mut lo = [0_u8; 8];
        let mut hi = [0_u8; 8];
        lo.copy_from_slice(&bytes[..8]);
        hi.copy_from_slice(&bytes[8..16]);
        let h1 = u64::from_le_bytes(lo);
        // Nonzero step, so probes for one key spread across the array.
        let h2 = u64::from_le_bytes(hi) | 1;

        let m = self.bits.len() as u64;
        (0..u64::from(self.hashes)).map(move |i| (h1.wrapping_add(i.wrapping_mul(h2)) % m) as usize)
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::with_estimates(DEFAULT_CAPACITY, DEFAULT_FALSE_POSITIVE_RATE)
    }
}

impl Membership for BloomFilter {
    fn add(&mut self, key: NodeId) {
        for bit in self.probes(key) {
            self.bits.insert(bit);
        }
    }

    fn contains(&self, key: NodeId) -> bool {
        self.probes(key).all(|bit| self.bits.contains(bit))
    }
}

// ---------------------------------------------------------------------------
// ExactSet
// ---------------------------------------------------------------------------

/// Exact visited set backed by a `HashSet`.
#[derive(Debug, Clone, Default)]
pub struct ExactSet(HashSet<NodeId>);

impl Membership for ExactSet {
    fn add(&mut self, key: NodeId) {
        self.0.insert(key);
    }

    fn contains(&self, key: NodeId) -> bool {
        self.0.contains(&key)
    }
}
