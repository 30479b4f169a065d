use std::fmt;
use std::path::PathBuf;

use ks_fsck::{FsckError, PolicyError};
use ks_store::StoreError;
use ks_types::{ObjectId, ObjectKind};

/// Broad classification of a failed invocation.
///
/// Callers use this to decide how to present a failure (for example, which
/// exit status to use) without matching on every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The candidate tag is unacceptable; fixing the input can succeed.
    InvalidInput,
    /// The store holds data that does not match its address.
    StoreIntegrity,
    /// Reading input or talking to the store failed.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::StoreIntegrity => write!(f, "store integrity"),
            Self::Io => write!(f, "I/O failure"),
        }
    }
}

/// Why the tagged object cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// The tagged object (after replacement) is not in the store.
    #[error("could not read tagged object '{id}'")]
    Missing { id: ObjectId },

    /// The stored type differs from the declared type.
    #[error("object '{id}' tagged as '{declared}', but is a '{actual}' type")]
    TypeMismatch {
        id: ObjectId,
        declared: ObjectKind,
        actual: ObjectKind,
    },

    /// The stored bytes do not hash back to their address.
    #[error("store corruption: tagged object '{id}' {reason}")]
    ContentCorrupt { id: ObjectId, reason: String },

    /// Replacement chain for the tagged object did not terminate.
    #[error("replace depth too high for tagged object '{id}'")]
    ReplacementLoop { id: ObjectId },

    /// The store could not be read.
    #[error("could not read tagged object '{id}': {source}")]
    Store {
        id: ObjectId,
        #[source]
        source: StoreError,
    },
}

impl ReferenceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Missing { .. } | Self::TypeMismatch { .. } | Self::ReplacementLoop { .. } => {
                ErrorCategory::InvalidInput
            }
            Self::ContentCorrupt { .. } => ErrorCategory::StoreIntegrity,
            Self::Store { .. } => ErrorCategory::Io,
        }
    }
}

/// Errors from a tag commit.
#[derive(Debug, thiserror::Error)]
pub enum MktagError {
    /// The payload could not be read to the end.
    #[error("could not read tag input: {0}")]
    Input(#[source] std::io::Error),

    /// The payload failed structural validation.
    #[error("tag input does not pass strict fsck: {0}")]
    Validation(#[from] FsckError),

    /// The tagged object failed verification.
    #[error("tag input does not refer to a valid object: {0}")]
    Reference(#[from] ReferenceError),

    /// The final write failed. No retry is attempted.
    #[error("unable to write tag object: {0}")]
    StoreWriteFailure(#[source] StoreError),
}

impl MktagError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Input(_) | Self::StoreWriteFailure(_) => ErrorCategory::Io,
            Self::Validation(_) => ErrorCategory::InvalidInput,
            Self::Reference(e) => e.category(),
        }
    }
}

/// Result alias for tag commits.
pub type MktagResult<T> = Result<T, MktagError>;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("fsck.{key} must be a string (ignore, warn or error)")]
    NonStringValue { key: String },

    #[error("invalid fsck setting: {0}")]
    Policy(#[from] PolicyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_fsck::{FsckMsgId, Severity};

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_hash([n; 32])
    }

    #[test]
    fn categories() {
        let validation = MktagError::Validation(FsckError {
            id: FsckMsgId::MissingObject,
            severity: Severity::Error,
            message: "invalid format - expected 'object' line".into(),
        });
        assert_eq!(validation.category(), ErrorCategory::InvalidInput);

        let missing = MktagError::from(ReferenceError::Missing { id: oid(1) });
        assert_eq!(missing.category(), ErrorCategory::InvalidInput);

        let corrupt = MktagError::from(ReferenceError::ContentCorrupt {
            id: oid(1),
            reason: "hashes to something else".into(),
        });
        assert_eq!(corrupt.category(), ErrorCategory::StoreIntegrity);

        let write = MktagError::StoreWriteFailure(StoreError::ReadOnly);
        assert_eq!(write.category(), ErrorCategory::Io);
    }

    #[test]
    fn messages_name_the_object() {
        let err = ReferenceError::TypeMismatch {
            id: oid(2),
            declared: ObjectKind::Blob,
            actual: ObjectKind::Commit,
        };
        let text = MktagError::from(err).to_string();
        assert!(text.contains(&oid(2).to_hex()));
        assert!(text.contains("tagged as 'blob', but is a 'commit' type"));
    }

    #[test]
    fn corruption_message_is_distinct_from_bad_input() {
        let corrupt = ReferenceError::ContentCorrupt {
            id: oid(3),
            reason: "hashes to 00".into(),
        };
        assert!(corrupt.to_string().starts_with("store corruption"));
        assert!(!ReferenceError::Missing { id: oid(3) }
            .to_string()
            .contains("corruption"));
    }
}
