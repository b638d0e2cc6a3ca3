//! Storage abstraction for the relay.
//!
//! A namespaced byte key-value interface with get, put, create-if-absent and
//! prefix scan. The key registry, content store and inbox index each own one
//! or two [`Namespace`]s and never touch the others, so a handle can never
//! collide with an envelope id. The trait is synchronous; every backend is
//! plain local storage.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;
use serde::{Serialize, de::DeserializeOwned};

pub use self::redb::RedbStorage;

/// Disjoint keyspaces shared by the relay components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Handle -> public key (UTF-8).
    PublicKeys,
    /// Handle -> encrypted private key backup (JSON).
    PrivateKeyBackups,
    /// Envelope id (16 bytes) -> CBOR envelope body.
    Envelopes,
    /// Recipient partition prefix + envelope id -> CBOR inbox entry.
    Inbox,
}

impl Namespace {
    /// Every namespace, in table creation order.
    pub const ALL: [Namespace; 4] =
        [Self::PublicKeys, Self::PrivateKeyBackups, Self::Envelopes, Self::Inbox];

    /// Stable name, used as the redb table name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PublicKeys => "public_keys",
            Self::PrivateKeyBackups => "private_key_backups",
            Self::Envelopes => "envelopes",
            Self::Inbox => "inbox",
        }
    }
}

/// Storage abstraction for relay records
///
/// Must be Clone (shared by the three components), Send + Sync (requests are
/// served concurrently), and synchronous. Implementations share internal
/// state via Arc, so clones access the same underlying storage.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Load the value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, overwriting any existing value.
    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Store `value` under `key` only if the key is vacant.
    ///
    /// # Invariants
    ///
    /// - Atomic: of two concurrent calls for one key, at most one returns
    ///   `true`
    /// - Post: returns `false` and leaves the existing value untouched if the
    ///   key was present
    fn put_if_absent(&self, ns: Namespace, key: &[u8], value: &[u8])
    -> Result<bool, StorageError>;

    /// All `(key, value)` pairs whose key starts with `prefix`.
    ///
    /// Results are in ascending bytewise key order. An empty prefix scans the
    /// whole namespace.
    fn scan_prefix(
        &self,
        ns: Namespace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;
}

/// Encode a record as CBOR.
pub(crate) fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

/// Decode a CBOR record.
pub(crate) fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}
