//! Sealdrop relay server.
//!
//! A zero-knowledge relay for end-to-end encrypted file sharing. Clients
//! register a public key (and optionally a password-wrapped private key
//! backup) under a handle, upload files already encrypted to a recipient's
//! key, and later list and download what was sent to them. The relay stores
//! and returns opaque strings; it never sees a plaintext or a usable key.
//!
//! # Components
//!
//! - [`KeyRegistry`]: handle -> public key, plus the optional backup
//! - [`ContentStore`]: write-once envelopes under random UUIDv4 ids
//! - [`InboxIndex`]: per-recipient metadata pointing at envelopes
//! - [`Relay`]: facade composing the three over one [`Storage`]
//! - [`SystemEnv`]: production environment (wall clock, OS RNG)
//!
//! Storage backends live in [`storage`]: [`MemoryStorage`] for tests,
//! [`RedbStorage`] for persistence and [`ChaoticStorage`] for fault injection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod content_store;
mod error;
mod inbox;
mod key_registry;
mod relay;
pub mod storage;
mod system_env;

pub use content_store::{ContentStore, MAX_ID_ATTEMPTS};
pub use error::{RecordKind, RelayError};
pub use inbox::InboxIndex;
pub use key_registry::KeyRegistry;
pub use relay::{Relay, RelayConfig};
pub use storage::{ChaoticStorage, MemoryStorage, Namespace, RedbStorage, Storage, StorageError};
pub use system_env::SystemEnv;
