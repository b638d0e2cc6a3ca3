//! Environment abstraction for deterministic testing.
//!
//! Decouples relay logic from system resources (wall clock, randomness).
//! Production uses the OS clock and RNG; simulation uses a seeded RNG and a
//! manually advanced clock so that generated ids and timestamps are
//! reproducible.

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG in production
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Milliseconds since the Unix epoch.
    ///
    /// Used for inbox timestamps. Not required to be monotonic across
    /// processes; the wall clock may step.
    fn wall_clock_millis(&self) -> u64;
}
