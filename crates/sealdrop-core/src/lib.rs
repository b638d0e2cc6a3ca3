//! Core types for the sealdrop relay.
//!
//! The relay stores data it cannot read: public keys, password-wrapped private
//! key backups and encrypted file envelopes. Everything in this crate is pure
//! data plus the [`Environment`] seam; storage and I/O live in
//! `sealdrop-server`.
//!
//! # Components
//!
//! - [`Environment`]: wall clock and randomness, swappable for deterministic
//!   simulation
//! - [`EnvelopeId`]: random identifier for an uploaded envelope
//! - [`EnvelopeBody`] / [`Envelope`]: the opaque upload payload
//! - [`InboxEntry`]: metadata pointer indexed under a recipient
//! - [`PrivateKeyBackup`]: client-encrypted private key, passed through verbatim

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod types;

pub use env::Environment;
pub use types::{Envelope, EnvelopeBody, EnvelopeId, InboxEntry, KeyListing, PrivateKeyBackup};
