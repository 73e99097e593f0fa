//! Deterministic random number generation for demo data.
//!
//! RULE: Demo data never touches a platform RNG.
//! Every stream is derived from one seed plus a stable stream slot, so the
//! same seed always yields the same customers, accounts and transactions.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct DemoRng {
    inner: Pcg64Mcg,
}

impl DemoRng {
    /// Create a stream from the seed and a stable slot.
    pub fn new(seed: u64, slot: DemoStream) -> Self {
        let derived = seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived),
        }
    }

    /// Per-entity stream, so one customer's data does not shift when the
    /// population size changes.
    pub fn for_entity(seed: u64, slot: DemoStream, entity: u64) -> Self {
        let mut rng = Self::new(seed, slot);
        rng.inner = Pcg64Mcg::seed_from_u64(rng.inner.next_u64() ^ entity);
        rng
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u64 in [lo, hi] inclusive.
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        lo + self.next_u64_below(hi - lo + 1)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }

    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }
}

/// Stable stream slots.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum DemoStream {
    Customer = 0,
    Account = 1,
    Transaction = 2,
}
