use loam_types::ObjectId;

use crate::codec::DecodeError;
use crate::compress::CorruptionError;
use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The object exists but is not of the kind the caller asked for.
    #[error("object {id} is a {actual}, expected a {expected}")]
    WrongKind {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: content hashes to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// The decompressed bytes are not a valid canonical encoding.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The stored bytes are not a valid compressed stream.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
