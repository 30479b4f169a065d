use thiserror::Error;

use crate::msg::{FsckMsgId, Severity};

/// A structural violation that the active policy did not ignore.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{id}: {message}")]
pub struct FsckError {
    /// Which check failed.
    pub id: FsckMsgId,
    /// Effective severity after policy resolution (`Warn` or `Error`).
    pub severity: Severity,
    /// Human-readable diagnostic.
    pub message: String,
}

/// Result alias for validation.
pub type FsckResult<T> = Result<T, FsckError>;

/// Errors raised while building a [`SeverityPolicy`](crate::SeverityPolicy).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("unknown fsck message id: {0:?}")]
    UnknownMessageId(String),

    #[error("invalid severity {value:?} for {id} (expected ignore, warn or error)")]
    UnknownSeverity { id: FsckMsgId, value: String },

    #[error("cannot demote {id} to {to}")]
    CannotDemote { id: FsckMsgId, to: Severity },
}
