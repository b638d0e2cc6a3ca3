//! Per-recipient inbox index.
//!
//! Each upload adds one [`InboxEntry`] to the recipient's partition. Entries
//! only point at envelopes by id; the index never reads envelope contents.
//!
//! # Key layout
//!
//! `[recipient length: u64 BE][recipient bytes][envelope id: 16 bytes]`
//!
//! The length prefix keeps partitions disjoint even when one recipient name is
//! a prefix of another ("neo" vs "neon"), and recipient strings are used only
//! as opaque bytes, never as paths.

use sealdrop_core::{EnvelopeId, InboxEntry};

use crate::{
    error::RelayError,
    storage::{Namespace, Storage, StorageError, decode_cbor, encode_cbor},
};

/// Index of inbox entries partitioned by recipient.
///
/// Clone shares the same underlying storage.
#[derive(Clone)]
pub struct InboxIndex<S: Storage> {
    storage: S,
}

impl<S: Storage> InboxIndex<S> {
    /// Create an inbox index over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Store `entry` in `recipient`'s partition, keyed by its id.
    ///
    /// The partition comes into existence with its first entry. Appending an
    /// id that is already present overwrites the previous entry.
    pub fn append(&self, recipient: &str, entry: &InboxEntry) -> Result<(), RelayError> {
        let key = entry_key(recipient, entry.id);
        self.storage.put(Namespace::Inbox, &key, &encode_cbor(entry)?)?;
        Ok(())
    }

    /// All entries for `recipient`, oldest first.
    ///
    /// Sorted by `timestamp`, ties broken by id. A recipient with no entries
    /// yields an empty list.
    pub fn list(&self, recipient: &str) -> Result<Vec<InboxEntry>, RelayError> {
        let mut entries = self
            .storage
            .scan_prefix(Namespace::Inbox, &partition_prefix(recipient))?
            .into_iter()
            .map(|(_, value)| decode_cbor::<InboxEntry>(&value))
            .collect::<Result<Vec<_>, StorageError>>()?;

        entries.sort_by_key(|entry| (entry.timestamp, entry.id));

        Ok(entries)
    }
}

/// Key prefix shared by every entry of one recipient.
fn partition_prefix(recipient: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(8 + recipient.len() + 16);
    prefix.extend_from_slice(&(recipient.len() as u64).to_be_bytes());
    prefix.extend_from_slice(recipient.as_bytes());
    prefix
}

/// Full key of one entry.
fn entry_key(recipient: &str, id: EnvelopeId) -> Vec<u8> {
    let mut key = partition_prefix(recipient);
    key.extend_from_slice(id.as_bytes());
    key
}
