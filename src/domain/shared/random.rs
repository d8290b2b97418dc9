//! Injectable random source
//!
//! Every random choice in the dialer (agent pick, caller-id pick, simulated
//! telephony outcome) goes through a [`RandomSource`] so tests can pin a seed.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;

pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Deterministic source
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Source seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded when a seed is configured, entropy otherwise
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    pub async fn next_u64(&self) -> u64 {
        self.rng.lock().await.gen()
    }

    /// Uniform index in `0..len`; `None` for an empty range
    pub async fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.lock().await.gen_range(0..len))
    }

    /// Uniform value in `low..=high`
    pub async fn between(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        self.rng.lock().await.gen_range(low..=high)
    }

    pub async fn weighted(&self, index: &WeightedIndex<u32>) -> usize {
        index.sample(&mut *self.rng.lock().await)
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomSource").finish_non_exhaustive()
    }
}
