//! Relay records.
//!
//! Every string field here is opaque: the relay stores and returns it verbatim
//! and never checks that a key parses or a ciphertext decrypts.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::Environment;

/// Identifier of a stored envelope.
///
/// A UUIDv4 built from 16 bytes of environment randomness. Ids are never
/// derived from a counter since the content store has no ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvelopeId(Uuid);

impl EnvelopeId {
    /// Draw a fresh random id from `env`.
    pub fn generate(env: &impl Environment) -> Self {
        let mut bytes = [0u8; 16];
        env.random_bytes(&mut bytes);
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Rebuild an id from its raw storage key.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Raw 16-byte form, used as the storage key.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EnvelopeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Upload payload as sent by a client, without the server-assigned id.
///
/// Kept as the client's JSON object, unknown fields (such as `fileType`)
/// included, and returned unchanged on download. Nothing is validated. The
/// relay itself only reads `sender`, `recipient` and `fileName`; a missing or
/// non-string field reads as `""` there but stays absent in the stored body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvelopeBody(Map<String, Value>);

impl EnvelopeBody {
    /// Sender handle (unverified).
    pub const SENDER: &'static str = "sender";
    /// Recipient handle; selects the inbox partition.
    pub const RECIPIENT: &'static str = "recipient";
    /// Symmetric file key, encrypted to the recipient's public key.
    pub const ENCRYPTED_KEY: &'static str = "encryptedKey";
    /// Initialization vector for the file cipher.
    pub const IV: &'static str = "iv";
    /// File ciphertext.
    pub const FILE_DATA: &'static str = "fileData";
    /// Original file name.
    pub const FILE_NAME: &'static str = "fileName";

    /// Wrap a client-supplied JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Set `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Raw value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String value of `name`, `""` if absent or not a string.
    pub fn text(&self, name: &str) -> &str {
        self.0.get(name).and_then(Value::as_str).unwrap_or_default()
    }

    /// See [`Self::SENDER`].
    pub fn sender(&self) -> &str {
        self.text(Self::SENDER)
    }

    /// See [`Self::RECIPIENT`].
    pub fn recipient(&self) -> &str {
        self.text(Self::RECIPIENT)
    }

    /// See [`Self::FILE_NAME`].
    pub fn file_name(&self) -> &str {
        self.text(Self::FILE_NAME)
    }

    /// See [`Self::FILE_DATA`].
    pub fn file_data(&self) -> &str {
        self.text(Self::FILE_DATA)
    }

    /// Borrow the whole object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EnvelopeBody {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
    }
}

/// A stored envelope together with its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Server-generated id.
    pub id: EnvelopeId,
    /// Payload exactly as uploaded, its fields inlined next to `id`.
    #[serde(flatten)]
    pub body: EnvelopeBody,
}

/// Inbox metadata pointing at one envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    /// Id of the envelope this entry points at.
    pub id: EnvelopeId,
    /// Sender copied from the envelope.
    pub sender: String,
    /// Recipient copied from the envelope.
    pub recipient: String,
    /// File name copied from the envelope.
    pub file_name: String,
    /// Upload time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl InboxEntry {
    /// Build the index entry for a freshly stored envelope.
    pub fn for_upload(id: EnvelopeId, body: &EnvelopeBody, timestamp: u64) -> Self {
        Self {
            id,
            sender: body.sender().to_string(),
            recipient: body.recipient().to_string(),
            file_name: body.file_name().to_string(),
            timestamp,
        }
    }
}

/// Password-wrapped private key uploaded at registration.
///
/// Clients send a JSON object (salt, iv, ciphertext); the relay keeps the
/// whole value and hands it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKeyBackup(serde_json::Value);

impl PrivateKeyBackup {
    /// Wrap a client-supplied JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// A JSON `null` backup means the client sent none.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Borrow the wrapped value.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// One row of the public key directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyListing {
    /// Registered handle.
    pub handle: String,
    /// Public key stored for the handle.
    pub public_key: String,
}
