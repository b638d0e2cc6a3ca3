//! Relay error types.
//!
//! `InvalidInput`, `Conflict` and `NotFound` are terminal answers to the
//! caller: retrying with the same input gives the same result. `Storage` is a
//! backend failure, propagated as-is and never retried or masked.

use std::fmt;

use thiserror::Error;

use crate::storage::StorageError;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Public key for a handle.
    PublicKey,
    /// Encrypted private key backup for a handle.
    PrivateKeyBackup,
    /// Envelope by id.
    Envelope,
    /// Registered recipient (only checked when uploads require one).
    Recipient,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PublicKey => "public key",
            Self::PrivateKeyBackup => "private key backup",
            Self::Envelope => "envelope",
            Self::Recipient => "recipient",
        };
        f.write_str(name)
    }
}

/// Errors returned by relay operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// A required field was empty.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The handle is already registered.
    #[error("handle already registered: {0}")]
    Conflict(String),

    /// Lookup by handle or id found nothing.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// What was looked up
        kind: RecordKind,
        /// Handle or id that was looked up
        key: String,
    },

    /// Backing storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RelayError {
    /// True for errors caused by the caller's input rather than the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_not_client_errors() {
        assert!(RelayError::InvalidInput("handle is required").is_client_error());
        assert!(RelayError::Conflict("neo".into()).is_client_error());
        assert!(
            RelayError::NotFound { kind: RecordKind::Envelope, key: "x".into() }.is_client_error()
        );
        assert!(!RelayError::from(StorageError::Io("disk gone".into())).is_client_error());
    }

    #[test]
    fn not_found_message_names_the_record() {
        let err = RelayError::NotFound { kind: RecordKind::PrivateKeyBackup, key: "neo".into() };
        assert_eq!(err.to_string(), "private key backup not found: neo");
    }
}
