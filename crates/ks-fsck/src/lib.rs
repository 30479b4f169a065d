//! Structural validation for Keystone tag objects.
//!
//! A tag payload is a header block followed by a free-form message:
//!
//! ```text
//! object <hex digest>
//! type <blob|tree|commit|tag>
//! tag <name>
//! tagger <name> <<email>> <seconds> <+|-hhmm>
//!
//! <message, optionally carrying a signature block>
//! ```
//!
//! Every deviation from this shape is reported under a named message id
//! ([`FsckMsgId`]). A [`SeverityPolicy`] decides whether each report is
//! ignored or fails validation; the policy is plain configuration passed in by
//! the caller, never global state.
//!
//! # Quick Start
//!
//! ```rust
//! use ks_fsck::{validate, SeverityPolicy};
//! use ks_types::ObjectKind;
//!
//! let payload = format!(
//!     "object {}\ntype commit\ntag v1.0\ntagger Ada <ada@example.org> 1700000000 +0000\n\nRelease\n",
//!     "ab".repeat(32),
//! );
//! let tag = validate(payload.as_bytes(), &SeverityPolicy::strict()).unwrap();
//! assert_eq!(tag.kind, ObjectKind::Commit);
//! assert_eq!(tag.name, b"v1.0");
//! ```

pub mod error;
pub mod ident;
pub mod msg;
pub mod policy;
pub mod refname;
pub mod tag;

pub use error::{FsckError, FsckResult, PolicyError};
pub use msg::{FsckMsgId, Severity};
pub use policy::SeverityPolicy;
pub use refname::check_refname_format;
pub use tag::{validate, ParsedTag};
