//! Relay facade.
//!
//! Owns the key registry, content store and inbox index over one shared
//! storage and exposes the client-facing operations. Every operation is a
//! single synchronous call; there is no session or cross-call state.

use sealdrop_core::{
    Envelope, EnvelopeBody, EnvelopeId, Environment, InboxEntry, KeyListing, PrivateKeyBackup,
};

use crate::{
    content_store::ContentStore,
    error::{RecordKind, RelayError},
    inbox::InboxIndex,
    key_registry::KeyRegistry,
    storage::Storage,
};

/// Library-level relay options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayConfig {
    /// Reject uploads addressed to a handle with no registered public key.
    ///
    /// Off by default: the relay accepts any recipient string.
    pub require_known_recipient: bool,
}

/// Zero-knowledge file relay.
///
/// Generic over the environment (randomness, wall clock) and the storage
/// backend, so the same code runs against [`SystemEnv`](crate::SystemEnv) and
/// redb in production and a seeded environment with memory or chaotic storage
/// in tests. Clone shares the same underlying storage.
#[derive(Clone)]
pub struct Relay<E: Environment, S: Storage> {
    env: E,
    storage: S,
    config: RelayConfig,
    keys: KeyRegistry<S>,
    content: ContentStore<S>,
    inbox: InboxIndex<S>,
}

impl<E: Environment, S: Storage> Relay<E, S> {
    /// Create a relay whose components all share `storage`.
    pub fn new(env: E, storage: S, config: RelayConfig) -> Self {
        Self {
            keys: KeyRegistry::new(storage.clone()),
            content: ContentStore::new(storage.clone()),
            inbox: InboxIndex::new(storage.clone()),
            env,
            storage,
            config,
        }
    }

    /// Register `handle` with its public key and optional private key backup.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `handle` or `public_key` is empty
    /// - `Conflict` if the handle is already registered; nothing is changed
    pub fn register(
        &self,
        handle: &str,
        public_key: &str,
        backup: Option<&PrivateKeyBackup>,
    ) -> Result<(), RelayError> {
        match self.keys.register(handle, public_key, backup) {
            Ok(()) => {
                let with_backup = backup.is_some_and(|backup| !backup.is_null());
                tracing::info!(handle, with_backup, "handle registered");
                Ok(())
            },
            Err(e) => {
                if e.is_client_error() {
                    tracing::warn!(handle, error = %e, "registration rejected");
                }
                Err(e)
            },
        }
    }

    /// Public key registered for `handle`.
    pub fn get_public_key(&self, handle: &str) -> Result<String, RelayError> {
        tracing::debug!(handle, "public key lookup");
        self.keys.public_key(handle)
    }

    /// Private key backup stored for `handle`, exactly as uploaded.
    pub fn get_encrypted_private_key(&self, handle: &str) -> Result<PrivateKeyBackup, RelayError> {
        tracing::debug!(handle, "private key backup lookup");
        self.keys.private_key_backup(handle)
    }

    /// Every registered handle with its public key, sorted by handle.
    pub fn list_keys(&self) -> Result<Vec<KeyListing>, RelayError> {
        self.keys.list()
    }

    /// Store an envelope and record it in the recipient's inbox.
    ///
    /// Fields are not validated. The envelope is written first and the inbox
    /// entry second; the two writes are not atomic. If the second write
    /// fails the error is returned and the envelope stays stored without an
    /// inbox entry pointing at it. The reverse (an entry with no envelope)
    /// cannot happen.
    ///
    /// # Errors
    ///
    /// - `NotFound` with [`RecordKind::Recipient`] if
    ///   [`RelayConfig::require_known_recipient`] is set and the recipient has
    ///   no public key
    pub fn upload_envelope(&self, body: &EnvelopeBody) -> Result<EnvelopeId, RelayError> {
        if self.config.require_known_recipient && !self.keys.contains(body.recipient())? {
            return Err(RelayError::NotFound {
                kind: RecordKind::Recipient,
                key: body.recipient().to_string(),
            });
        }

        let id = self.content.put(&self.env, body)?;

        let entry = InboxEntry::for_upload(id, body, self.env.wall_clock_millis());
        self.inbox.append(body.recipient(), &entry)?;

        tracing::info!(
            %id,
            sender = body.sender(),
            recipient = body.recipient(),
            size = body.file_data().len(),
            "envelope uploaded"
        );

        Ok(id)
    }

    /// Inbox entries for `recipient`, oldest first. Empty if there are none.
    pub fn list_inbox(&self, recipient: &str) -> Result<Vec<InboxEntry>, RelayError> {
        tracing::debug!(recipient, "inbox listing");
        self.inbox.list(recipient)
    }

    /// Full envelope stored under `id`.
    pub fn get_envelope(&self, id: EnvelopeId) -> Result<Envelope, RelayError> {
        tracing::debug!(%id, "envelope download");
        self.content.get(id)
    }

    /// Envelope named by its textual id, as a client sends it.
    ///
    /// Text that does not parse as an id cannot name a stored envelope, so it
    /// reports `NotFound` like any other unknown id.
    pub fn download(&self, id: &str) -> Result<Envelope, RelayError> {
        let Ok(parsed) = id.parse::<EnvelopeId>() else {
            tracing::debug!(id, "envelope download with malformed id");
            return Err(RelayError::NotFound { kind: RecordKind::Envelope, key: id.to_string() });
        };

        self.get_envelope(parsed)
    }

    /// Shared storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Environment used for ids and timestamps.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Active configuration.
    pub fn config(&self) -> RelayConfig {
        self.config
    }
}
