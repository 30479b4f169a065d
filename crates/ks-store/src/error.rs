use ks_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// Attempted to write a null object ID.
    #[error("cannot store object with null ID")]
    NullObjectId,

    /// Storage backend is read-only or otherwise unavailable.
    #[error("store is read-only")]
    ReadOnly,

    /// Following replacements did not terminate.
    #[error("replace depth too high for object {0}")]
    ReplaceDepthExceeded(ObjectId),
}

impl StoreError {
    /// Returns `true` if the error indicates that stored data is damaged
    /// rather than that the backend is unreachable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptObject { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
