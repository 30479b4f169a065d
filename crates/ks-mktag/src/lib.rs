//! Validated tag admission for Keystone.
//!
//! A candidate tag is committed to the object store only after it passes two
//! checks on the exact same bytes:
//!
//! 1. **Structural validation** ([`ks_fsck::validate`]) under a strict
//!    [`SeverityPolicy`](ks_fsck::SeverityPolicy).
//! 2. **Reference verification** ([`ReferenceVerifier`]): the tagged object
//!    exists (after replacement), has the declared type, and its content
//!    hashes back to its address.
//!
//! The [`TagCommitter`] sequences these steps, stops at the first failure, and
//! writes at most once.
//!
//! # Quick Start
//!
//! ```rust
//! use ks_mktag::{mktag_policy, TagCommitter};
//! use ks_store::{InMemoryObjectStore, NoReplacements, ObjectStore, StoredObject};
//! use ks_types::ObjectKind;
//!
//! let store = InMemoryObjectStore::new();
//! let commit = store
//!     .write(&StoredObject::new(ObjectKind::Commit, b"tree x\n\ninitial\n".to_vec()))
//!     .unwrap();
//! let payload = format!(
//!     "object {commit}\ntype commit\ntag v1.0\ntagger Ada <ada@example.org> 1700000000 +0000\n\nRelease\n"
//! );
//!
//! let committer = TagCommitter::new(&store, NoReplacements, mktag_policy());
//! let tag_id = committer.commit(payload.as_bytes()).unwrap();
//! assert_eq!(store.read(&tag_id).unwrap().unwrap().data, payload.as_bytes());
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod verify;

pub use config::{CoreConfig, MktagConfig};
pub use error::{ConfigError, ErrorCategory, MktagError, MktagResult, ReferenceError};
pub use pipeline::{mktag_policy, CommitReport, Phase, PhaseRecord, TagCommitter};
pub use verify::{ReferenceVerifier, VerifiedReference};
