//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! All records survive process restarts.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{Namespace, Storage, StorageError};

/// One table per namespace, raw byte keys and values.
///
/// - `public_keys`: handle bytes -> UTF-8 public key
/// - `private_key_backups`: handle bytes -> JSON backup
/// - `envelopes`: 16-byte id -> CBOR envelope body
/// - `inbox`: partition prefix + 16-byte id -> CBOR inbox entry
const fn table(ns: Namespace) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
    TableDefinition::new(ns.name())
}

fn io_error(err: impl std::fmt::Display) -> StorageError {
    StorageError::Io(err.to_string())
}

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates one table per [`Namespace`] if missing, so reads never hit an
    /// absent table.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        let txn = db.begin_write().map_err(io_error)?;
        for ns in Namespace::ALL {
            let _ = txn.open_table(table(ns)).map_err(io_error)?;
        }
        txn.commit().map_err(io_error)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Storage for RedbStorage {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let txn = self.db.begin_read().map_err(io_error)?;
        let table = txn.open_table(table(ns)).map_err(io_error)?;

        Ok(table.get(key).map_err(io_error)?.map(|value| value.value().to_vec()))
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io_error)?;

        {
            let mut table = txn.open_table(table(ns)).map_err(io_error)?;
            table.insert(key, value).map_err(io_error)?;
        }

        txn.commit().map_err(io_error)?;

        Ok(())
    }

    fn put_if_absent(
        &self,
        ns: Namespace,
        key: &[u8],
        value: &[u8],
    ) -> Result<bool, StorageError> {
        // Write transactions are serialized by redb, so the check and the
        // insert cannot interleave with another writer.
        let txn = self.db.begin_write().map_err(io_error)?;

        {
            let mut table = txn.open_table(table(ns)).map_err(io_error)?;

            if table.get(key).map_err(io_error)?.is_some() {
                return Ok(false);
            }

            table.insert(key, value).map_err(io_error)?;
        }

        txn.commit().map_err(io_error)?;

        Ok(true)
    }

    fn scan_prefix(
        &self,
        ns: Namespace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let txn = self.db.begin_read().map_err(io_error)?;
        let table = txn.open_table(table(ns)).map_err(io_error)?;

        let mut records = Vec::new();
        for result in table.range(prefix..).map_err(io_error)? {
            let (key, value) = result.map_err(io_error)?;

            if !key.value().starts_with(prefix) {
                break;
            }

            records.push((key.value().to_vec(), value.value().to_vec()));
        }

        Ok(records)
    }
}
