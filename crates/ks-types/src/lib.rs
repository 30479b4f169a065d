//! Foundation types for Keystone.
//!
//! This crate provides the identifiers and enumerations shared by every other
//! Keystone crate.
//!
//! # Key Types
//!
//! - [`ObjectId`]: a 32-byte BLAKE3 content address
//! - [`ObjectKind`]: blob, tree, commit or tag

pub mod error;
pub mod kind;
pub mod object;

pub use error::TypeError;
pub use kind::ObjectKind;
pub use object::ObjectId;
