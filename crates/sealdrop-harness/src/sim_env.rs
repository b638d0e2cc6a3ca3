//! Simulated environment with seeded randomness and a manual clock.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sealdrop_core::Environment;

/// Wall clock value a fresh `SimEnv` starts at (2023-11-14T22:13:20Z).
pub const DEFAULT_START_MILLIS: u64 = 1_700_000_000_000;

/// Deterministic environment for tests.
///
/// Clones share the RNG and the clock, so a relay and the test driving it
/// observe the same time.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    now_millis: Arc<AtomicU64>,
}

impl SimEnv {
    /// Create an environment from a seed, clock at [`DEFAULT_START_MILLIS`].
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            now_millis: Arc::new(AtomicU64::new(DEFAULT_START_MILLIS)),
        }
    }

    /// Move the clock forward.
    pub fn advance_millis(&self, millis: u64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute value, backwards included.
    pub fn set_millis(&self, millis: u64) {
        self.now_millis.store(millis, Ordering::SeqCst);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Environment for SimEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().expect("SimEnv RNG mutex poisoned").fill_bytes(buffer);
    }

    fn wall_clock_millis(&self) -> u64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);

        let mut left = [0u8; 32];
        let mut right = [0u8; 32];
        a.random_bytes(&mut left);
        b.random_bytes(&mut right);

        assert_eq!(left, right);
    }

    #[test]
    fn clones_share_rng_stream() {
        let env = SimEnv::with_seed(7);
        let clone = env.clone();

        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        env.random_bytes(&mut first);
        clone.random_bytes(&mut second);

        assert_ne!(first, second, "clone must continue the stream, not restart it");
    }

    #[test]
    fn clock_moves_only_when_told() {
        let env = SimEnv::default();
        assert_eq!(env.wall_clock_millis(), DEFAULT_START_MILLIS);
        assert_eq!(env.wall_clock_millis(), DEFAULT_START_MILLIS);

        env.clone().advance_millis(250);
        assert_eq!(env.wall_clock_millis(), DEFAULT_START_MILLIS + 250);

        env.set_millis(5);
        assert_eq!(env.wall_clock_millis(), 5);
    }
}
