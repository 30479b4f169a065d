//! Replacement indirection.
//!
//! A replacement maps one object address to another, so that readers are
//! served the replacement transparently. Resolution is an injected
//! capability rather than process-wide state: callers hand a
//! [`ReplacementResolver`] to whatever needs it.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use ks_types::ObjectId;

use tracing::warn;

use crate::error::{StoreError, StoreResult};

/// Maximum number of replacement hops followed before giving up.
pub const MAX_REPLACE_DEPTH: usize = 5;

/// Maps an object address to its registered replacement, if any.
pub trait ReplacementResolver: Send + Sync {
    /// The direct replacement for `id`, without following chains.
    fn lookup(&self, id: &ObjectId) -> Option<ObjectId>;

    /// Follow replacements from `id` to the address that should be read.
    ///
    /// Returns `id` itself when no replacement is registered. Chains are
    /// followed up to [`MAX_REPLACE_DEPTH`] hops; a longer chain (or a cycle)
    /// is an error.
    fn resolve(&self, id: &ObjectId) -> StoreResult<ObjectId> {
        let mut current = *id;
        for _ in 0..MAX_REPLACE_DEPTH {
            match self.lookup(&current) {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
        if self.lookup(&current).is_some() {
            return Err(StoreError::ReplaceDepthExceeded(*id));
        }
        Ok(current)
    }
}

impl<F> ReplacementResolver for F
where
    F: Fn(&ObjectId) -> Option<ObjectId> + Send + Sync,
{
    fn lookup(&self, id: &ObjectId) -> Option<ObjectId> {
        self(id)
    }
}

/// Resolver that never replaces anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReplacements;

impl ReplacementResolver for NoReplacements {
    fn lookup(&self, _id: &ObjectId) -> Option<ObjectId> {
        None
    }
}

/// Table-backed resolver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplacementMap {
    entries: HashMap<ObjectId, ObjectId>,
}

impl ReplacementMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `replacement` for `original`, returning the previous entry.
    pub fn insert(&mut self, original: ObjectId, replacement: ObjectId) -> Option<ObjectId> {
        self.entries.insert(original, replacement)
    }

    /// The direct replacement for `original`.
    pub fn get(&self, original: &ObjectId) -> Option<ObjectId> {
        self.entries.get(original).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load entries from a directory of `<original-hex>` files, each holding
    /// the replacement's hex digest. A missing directory yields an empty map;
    /// malformed entries are skipped.
    pub fn load_dir(dir: &Path) -> StoreResult<Self> {
        let mut map = Self::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(map),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some((original, replacement)) = parse_entry(&path)? {
                map.insert(original, replacement);
            }
        }
        Ok(map)
    }
}

/// Read one replacement file. Entries whose name or content is not a digest
/// are skipped with a warning.
fn parse_entry(path: &Path) -> StoreResult<Option<(ObjectId, ObjectId)>> {
    let Some(original) = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| ObjectId::from_hex(name).ok())
    else {
        warn!(path = %path.display(), "bad replacement name, skipping");
        return Ok(None);
    };
    let contents = fs::read(path)?;
    let target = std::str::from_utf8(&contents)
        .ok()
        .and_then(|text| ObjectId::from_hex(text.trim_end()).ok());
    if target.is_none() {
        warn!(path = %path.display(), "bad replacement target, skipping");
    }
    Ok(target.map(|replacement| (original, replacement)))
}

impl ReplacementResolver for ReplacementMap {
    fn lookup(&self, id: &ObjectId) -> Option<ObjectId> {
        self.get(id)
    }
}
