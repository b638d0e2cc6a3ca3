//! Deterministic simulation harness for sealdrop testing.
//!
//! Provides [`SimEnv`], an [`Environment`](sealdrop_core::Environment) whose
//! randomness comes from a seeded ChaCha RNG and whose clock only moves when
//! told to. Tests built on it produce the same envelope ids and inbox
//! timestamps on every run.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;

pub use sim_env::SimEnv;
