//! Station coverage tracking.

use crate::graph::CanonicalId;

/// A fixed-width bitset over canonical station ids.
///
/// Every search state carries one of these, so the representation stays
/// compact: one bit per station, cloned per successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSet {
    bits: Box<[u64]>,
    width: u32,
}

impl CoverageSet {
    /// An empty set over `width` stations.
    pub fn new(width: u32) -> Self {
        let words = (width as usize).div_ceil(64);
        Self {
            bits: vec![0; words].into_boxed_slice(),
            width,
        }
    }

    /// Mark a station. Returns whether it was newly covered.
    pub fn insert(&mut self, id: CanonicalId) -> bool {
        debug_assert!(id.0 < self.width);
        let word = (id.0 / 64) as usize;
        let mask = 1u64 << (id.0 % 64);
        let fresh = self.bits[word] & mask == 0;
        self.bits[word] |= mask;
        fresh
    }

    pub fn contains(&self, id: CanonicalId) -> bool {
        debug_assert!(id.0 < self.width);
        let word = (id.0 / 64) as usize;
        self.bits[word] & (1u64 << (id.0 % 64)) != 0
    }

    /// Number of covered stations.
    pub fn len(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    /// Total number of stations the set ranges over.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.width
    }
}
