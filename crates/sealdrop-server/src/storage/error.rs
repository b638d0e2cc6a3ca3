//! Storage error types.
//!
//! - `Serialization`: a record failed to encode or decode
//! - `Io`: the backing store (file, database, lock) failed

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, poisoned lock, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}
