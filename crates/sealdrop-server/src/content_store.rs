//! Write-once store of encrypted envelopes keyed by random id.

use sealdrop_core::{Envelope, EnvelopeBody, EnvelopeId, Environment};

use crate::{
    error::{RecordKind, RelayError},
    storage::{Namespace, Storage, StorageError, decode_cbor, encode_cbor},
};

/// Fresh ids to draw before giving up on a put.
///
/// With 122 random bits a single retry is already beyond reach; the bound
/// only stops a broken RNG from spinning forever.
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Envelope storage.
///
/// Entries are never updated or deleted. Clone shares the same underlying
/// storage.
#[derive(Clone)]
pub struct ContentStore<S: Storage> {
    storage: S,
}

impl<S: Storage> ContentStore<S> {
    /// Create a content store over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Persist `body` under a newly generated id and return the id.
    ///
    /// The body is stored as sent, except that a client field named `id` is
    /// dropped: the id is the storage key and download reports it next to the
    /// body. An existing envelope is never overwritten: on collision a new id
    /// is drawn.
    pub fn put(
        &self,
        env: &impl Environment,
        body: &EnvelopeBody,
    ) -> Result<EnvelopeId, RelayError> {
        let bytes = if body.get("id").is_some() {
            let mut stripped = body.clone();
            stripped.remove("id");
            encode_cbor(&stripped)?
        } else {
            encode_cbor(body)?
        };

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = EnvelopeId::generate(env);
            if self.storage.put_if_absent(Namespace::Envelopes, id.as_bytes(), &bytes)? {
                return Ok(id);
            }
            tracing::warn!(%id, "envelope id collision, drawing a new id");
        }

        Err(StorageError::Io(format!("no free envelope id after {MAX_ID_ATTEMPTS} attempts"))
            .into())
    }

    /// Envelope stored under `id`.
    pub fn get(&self, id: EnvelopeId) -> Result<Envelope, RelayError> {
        let Some(bytes) = self.storage.get(Namespace::Envelopes, id.as_bytes())? else {
            return Err(RelayError::NotFound { kind: RecordKind::Envelope, key: id.to_string() });
        };

        Ok(Envelope { id, body: decode_cbor(&bytes)? })
    }
}
