//! Cryptographic primitives for Keystone.
//!
//! An object's address is the BLAKE3 digest of its kind's domain tag, a colon,
//! and its bytes. Nothing here is custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
