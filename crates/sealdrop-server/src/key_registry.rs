//! Key registry for public keys and private key backups.
//!
//! Stores one public key per handle, created once and never replaced. A
//! password-wrapped private key backup may be stored alongside it. The two are
//! separate records under the same handle, not one record with an optional
//! field: a handle can exist with a public key and no backup.

use sealdrop_core::{KeyListing, PrivateKeyBackup};

use crate::{
    error::{RecordKind, RelayError},
    storage::{Namespace, Storage, StorageError},
};

/// Registry of handles and their keys.
///
/// Clone shares the same underlying storage.
#[derive(Clone)]
pub struct KeyRegistry<S: Storage> {
    storage: S,
}

impl<S: Storage> KeyRegistry<S> {
    /// Create a registry over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Register a handle with its public key and an optional backup.
    ///
    /// The public key is created with `put_if_absent`, so of two concurrent
    /// registrations for one handle exactly one succeeds. The backup is
    /// written afterwards as an independent record; a JSON `null` backup is
    /// treated as absent.
    ///
    /// Returns `InvalidInput` if `handle` or `public_key` is empty and
    /// `Conflict` if the handle is taken.
    pub fn register(
        &self,
        handle: &str,
        public_key: &str,
        backup: Option<&PrivateKeyBackup>,
    ) -> Result<(), RelayError> {
        if handle.is_empty() {
            return Err(RelayError::InvalidInput("handle is required"));
        }
        if public_key.is_empty() {
            return Err(RelayError::InvalidInput("publicKey is required"));
        }

        let created = self.storage.put_if_absent(
            Namespace::PublicKeys,
            handle.as_bytes(),
            public_key.as_bytes(),
        )?;
        if !created {
            return Err(RelayError::Conflict(handle.to_string()));
        }

        if let Some(backup) = backup.filter(|backup| !backup.is_null()) {
            let bytes = serde_json::to_vec(backup)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.storage.put(Namespace::PrivateKeyBackups, handle.as_bytes(), &bytes)?;
        }

        Ok(())
    }

    /// Public key registered for `handle`.
    pub fn public_key(&self, handle: &str) -> Result<String, RelayError> {
        let Some(bytes) = self.storage.get(Namespace::PublicKeys, handle.as_bytes())? else {
            return Err(RelayError::NotFound {
                kind: RecordKind::PublicKey,
                key: handle.to_string(),
            });
        };

        Ok(utf8(bytes)?)
    }

    /// Private key backup stored for `handle`, exactly as uploaded.
    pub fn private_key_backup(&self, handle: &str) -> Result<PrivateKeyBackup, RelayError> {
        let Some(bytes) = self.storage.get(Namespace::PrivateKeyBackups, handle.as_bytes())?
        else {
            return Err(RelayError::NotFound {
                kind: RecordKind::PrivateKeyBackup,
                key: handle.to_string(),
            });
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()).into())
    }

    /// Whether `handle` has a public key.
    pub fn contains(&self, handle: &str) -> Result<bool, RelayError> {
        Ok(self.storage.get(Namespace::PublicKeys, handle.as_bytes())?.is_some())
    }

    /// Every registered handle with its public key, sorted by handle.
    pub fn list(&self) -> Result<Vec<KeyListing>, RelayError> {
        let listings = self
            .storage
            .scan_prefix(Namespace::PublicKeys, &[])?
            .into_iter()
            .map(|(handle, public_key)| {
                Ok(KeyListing { handle: utf8(handle)?, public_key: utf8(public_key)? })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(listings)
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String, StorageError> {
    String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;

    fn backup() -> PrivateKeyBackup {
        PrivateKeyBackup::new(json!({
            "salt": "c2FsdA==",
            "iv": "aXY=",
            "encryptedData": "ZGF0YQ==",
        }))
    }

    #[test]
    fn register_and_get_public_key() {
        let registry = KeyRegistry::new(MemoryStorage::new());

        registry.register("neo", "PK1", None).unwrap();

        assert_eq!(registry.public_key("neo").unwrap(), "PK1");
        assert!(registry.contains("neo").unwrap());
        assert!(!registry.contains("trinity").unwrap());
    }

    #[test]
    fn register_without_backup_has_no_backup() {
        let registry = KeyRegistry::new(MemoryStorage::new());

        registry.register("neo", "PK1", None).unwrap();

        assert_eq!(
            registry.private_key_backup("neo"),
            Err(RelayError::NotFound { kind: RecordKind::PrivateKeyBackup, key: "neo".into() })
        );
    }

    #[test]
    fn register_with_backup_returns_it_verbatim() {
        let registry = KeyRegistry::new(MemoryStorage::new());

        registry.register("neo", "PK1", Some(&backup())).unwrap();

        assert_eq!(registry.private_key_backup("neo").unwrap(), backup());
    }

    #[test]
    fn null_backup_is_not_stored() {
        let storage = MemoryStorage::new();
        let registry = KeyRegistry::new(storage.clone());

        let null = PrivateKeyBackup::new(serde_json::Value::Null);
        registry.register("neo", "PK1", Some(&null)).unwrap();

        assert_eq!(storage.record_count(Namespace::PrivateKeyBackups), 0);
        assert!(registry.private_key_backup("neo").is_err());
    }

    #[test]
    fn duplicate_handle_conflicts_and_keeps_original() {
        let registry = KeyRegistry::new(MemoryStorage::new());

        registry.register("neo", "PK1", None).unwrap();
        let result = registry.register("neo", "PK2", Some(&backup()));

        assert_eq!(result, Err(RelayError::Conflict("neo".into())));
        assert_eq!(registry.public_key("neo").unwrap(), "PK1");
        // The rejected registration must not attach a backup either
        assert!(registry.private_key_backup("neo").is_err());
    }

    #[test]
    fn empty_fields_are_rejected() {
        let storage = MemoryStorage::new();
        let registry = KeyRegistry::new(storage.clone());

        assert!(matches!(registry.register("", "PK1", None), Err(RelayError::InvalidInput(_))));
        assert!(matches!(registry.register("neo", "", None), Err(RelayError::InvalidInput(_))));
        assert_eq!(storage.record_count(Namespace::PublicKeys), 0);
    }

    #[test]
    fn unknown_handle_is_not_found() {
        let registry = KeyRegistry::new(MemoryStorage::new());

        assert_eq!(
            registry.public_key("ghost"),
            Err(RelayError::NotFound { kind: RecordKind::PublicKey, key: "ghost".into() })
        );
        assert!(matches!(
            registry.private_key_backup("ghost"),
            Err(RelayError::NotFound { kind: RecordKind::PrivateKeyBackup, .. })
        ));
    }

    #[test]
    fn list_is_sorted_by_handle() {
        let registry = KeyRegistry::new(MemoryStorage::new());

        registry.register("trinity", "PK2", None).unwrap();
        registry.register("morpheus", "PK3", None).unwrap();
        registry.register("neo", "PK1", Some(&backup())).unwrap();

        let handles: Vec<String> =
            registry.list().unwrap().into_iter().map(|listing| listing.handle).collect();
        assert_eq!(handles, vec!["morpheus", "neo", "trinity"]);
    }

    #[test]
    fn clone_shares_state() {
        let registry1 = KeyRegistry::new(MemoryStorage::new());
        let registry2 = registry1.clone();

        registry1.register("neo", "PK1", None).unwrap();

        assert_eq!(registry2.public_key("neo").unwrap(), "PK1");
    }
}
