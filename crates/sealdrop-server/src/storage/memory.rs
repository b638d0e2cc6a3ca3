use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use super::{Namespace, Storage, StorageError};

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory storage implementation for testing and simulation
///
/// One ordered map per namespace so prefix scans come back in key order like
/// the redb backend. All state is wrapped in `Arc<Mutex<>>` to allow Clone and
/// concurrent access; holding the single lock across check-and-insert makes
/// `put_if_absent` atomic.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<Namespace, Table>>>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a namespace.
    ///
    /// Useful for debugging and testing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn record_count(&self, ns: Namespace) -> usize {
        self.inner.lock().expect("Mutex poisoned").get(&ns).map_or(0, BTreeMap::len)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Namespace, Table>>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::Io("memory storage lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock()?.get(&ns).and_then(|table| table.get(key)).cloned())
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.lock()?.entry(ns).or_default().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_if_absent(
        &self,
        ns: Namespace,
        key: &[u8],
        value: &[u8],
    ) -> Result<bool, StorageError> {
        let mut inner = self.lock()?;
        let table = inner.entry(ns).or_default();

        if table.contains_key(key) {
            return Ok(false);
        }

        table.insert(key.to_vec(), value.to_vec());
        Ok(true)
    }

    fn scan_prefix(
        &self,
        ns: Namespace,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let inner = self.lock()?;
        let Some(table) = inner.get(&ns) else {
            return Ok(Vec::new());
        };

        Ok(table
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_storage_is_empty() {
        let storage = MemoryStorage::new();
        for ns in Namespace::ALL {
            assert_eq!(storage.record_count(ns), 0);
            assert_eq!(storage.get(ns, b"anything").unwrap(), None);
        }
    }

    #[test]
    fn test_put_and_get() {
        let storage = MemoryStorage::new();

        storage.put(Namespace::PublicKeys, b"neo", b"PK1").expect("put failed");

        assert_eq!(storage.get(Namespace::PublicKeys, b"neo").unwrap(), Some(b"PK1".to_vec()));
        assert_eq!(storage.record_count(Namespace::PublicKeys), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let storage = MemoryStorage::new();

        storage.put(Namespace::Inbox, b"k", b"v1").unwrap();
        storage.put(Namespace::Inbox, b"k", b"v2").unwrap();

        assert_eq!(storage.get(Namespace::Inbox, b"k").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(storage.record_count(Namespace::Inbox), 1);
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let storage = MemoryStorage::new();

        storage.put(Namespace::PublicKeys, b"same-key", b"key").unwrap();
        storage.put(Namespace::PrivateKeyBackups, b"same-key", b"backup").unwrap();

        assert_eq!(
            storage.get(Namespace::PublicKeys, b"same-key").unwrap(),
            Some(b"key".to_vec())
        );
        assert_eq!(
            storage.get(Namespace::PrivateKeyBackups, b"same-key").unwrap(),
            Some(b"backup".to_vec())
        );
        assert_eq!(storage.get(Namespace::Envelopes, b"same-key").unwrap(), None);
    }

    #[test]
    fn test_put_if_absent_keeps_first_value() {
        let storage = MemoryStorage::new();

        assert!(storage.put_if_absent(Namespace::PublicKeys, b"neo", b"first").unwrap());
        assert!(!storage.put_if_absent(Namespace::PublicKeys, b"neo", b"second").unwrap());

        assert_eq!(storage.get(Namespace::PublicKeys, b"neo").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn test_scan_prefix_in_key_order() {
        let storage = MemoryStorage::new();

        storage.put(Namespace::Inbox, b"b/2", b"x").unwrap();
        storage.put(Namespace::Inbox, b"a/1", b"y").unwrap();
        storage.put(Namespace::Inbox, b"b/1", b"z").unwrap();
        storage.put(Namespace::Inbox, b"c/1", b"w").unwrap();

        let scanned = storage.scan_prefix(Namespace::Inbox, b"b/").unwrap();
        let keys: Vec<&[u8]> = scanned.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![b"b/1".as_slice(), b"b/2".as_slice()]);

        assert_eq!(storage.scan_prefix(Namespace::Inbox, b"").unwrap().len(), 4);
        assert!(storage.scan_prefix(Namespace::Inbox, b"d").unwrap().is_empty());
        assert!(storage.scan_prefix(Namespace::Envelopes, b"").unwrap().is_empty());
    }

    #[test]
    fn test_clone_shares_state() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();

        clone.put(Namespace::Envelopes, b"id", b"body").unwrap();

        assert_eq!(storage.get(Namespace::Envelopes, b"id").unwrap(), Some(b"body".to_vec()));
    }

    #[test]
    fn test_concurrent_put_if_absent_single_winner() {
        let storage = MemoryStorage::new();

        let wins: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8u8)
                .map(|i| {
                    let storage = storage.clone();
                    scope.spawn(move || {
                        storage.put_if_absent(Namespace::PublicKeys, b"neo", &[i]).unwrap()
                    })
                })
                .collect();

            handles.into_iter().map(|h| usize::from(h.join().unwrap())).sum()
        });

        assert_eq!(wins, 1);
    }
}
