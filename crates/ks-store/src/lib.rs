//! Content-addressed object storage for Keystone.
//!
//! Objects of every kind are immutable records keyed by the BLAKE3 digest of
//! their kind and bytes.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`]: `HashMap`-based, for tests and embedding
//! - [`FsObjectStore`]: zstd-compressed loose objects under a directory
//!
//! # Replacement
//!
//! Readers may consult a [`ReplacementResolver`] that maps one address to
//! another. The store itself never applies replacements on read; callers
//! resolve first and then read the resolved address.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod replace;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::StoredObject;
pub use replace::{NoReplacements, ReplacementMap, ReplacementResolver, MAX_REPLACE_DEPTH};
pub use traits::ObjectStore;
