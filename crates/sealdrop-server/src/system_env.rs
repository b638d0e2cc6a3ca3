//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` backs envelope ids with OS randomness and inbox timestamps with
//! the system wall clock. Production behavior is therefore non-deterministic;
//! tests use the seeded environment from the harness crate instead.

use sealdrop_core::Environment;

/// Production environment using the system clock and cryptographic RNG.
///
/// # Security
///
/// The RNG uses getrandom, which provides OS-level cryptographic randomness.
/// Envelope ids are the only capability protecting a download, so they must
/// come from a CSPRNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. A relay that cannot draw unpredictable ids
/// must not keep accepting uploads.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }

    #[allow(clippy::expect_used)]
    #[allow(clippy::cast_possible_truncation)]
    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_millis() as u64
    }
}
