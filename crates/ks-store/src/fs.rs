use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use ks_types::{ObjectId, ObjectKind};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::replace::ReplacementMap;
use crate::traits::ObjectStore;

const OBJECTS_DIR: &str = "objects";
const REPLACE_DIR: &str = "replace";
const ZSTD_LEVEL: i32 = 3;

/// Loose-object store rooted at a directory.
///
/// Layout:
///
/// ```text
/// <root>/objects/ab/cdef...   zstd("<kind> <size>\0<data>")
/// <root>/replace/<original>   "<replacement>\n"
/// ```
///
/// Objects are written to a temporary file in the fan-out directory and then
/// linked into place without clobbering, so a concurrent writer of the same
/// object never observes a partial file.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (or lazily create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding replacement entries.
    pub fn replace_dir(&self) -> PathBuf {
        self.root.join(REPLACE_DIR)
    }

    /// Load every replacement entry registered in this store.
    pub fn load_replacements(&self) -> StoreResult<ReplacementMap> {
        ReplacementMap::load_dir(&self.replace_dir())
    }

    /// Register `replacement` to be served in place of `original`.
    pub fn add_replacement(&self, original: &ObjectId, replacement: &ObjectId) -> StoreResult<()> {
        let dir = self.replace_dir();
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(original.to_hex()), format!("{replacement}\n"))?;
        debug!(%original, %replacement, "replacement registered");
        Ok(())
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(OBJECTS_DIR).join(&hex[..2]).join(&hex[2..])
    }

    fn encode(object: &StoredObject) -> StoreResult<Vec<u8>> {
        let mut raw = Vec::with_capacity(object.data.len() + 16);
        raw.extend_from_slice(format!("{} {}\0", object.kind, object.data.len()).as_bytes());
        raw.extend_from_slice(&object.data);
        Ok(zstd::encode_all(raw.as_slice(), ZSTD_LEVEL)?)
    }

    fn decode(id: &ObjectId, compressed: &[u8]) -> StoreResult<StoredObject> {
        let corrupt = |reason: &str| StoreError::CorruptObject {
            id: *id,
            reason: reason.to_string(),
        };

        let raw = zstd::decode_all(compressed).map_err(|e| StoreError::CorruptObject {
            id: *id,
            reason: format!("decompression failed: {e}"),
        })?;
        let nul = raw
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| corrupt("missing header terminator"))?;
        let header = std::str::from_utf8(&raw[..nul]).map_err(|_| corrupt("non-UTF-8 header"))?;
        let (kind, size) = header
            .split_once(' ')
            .ok_or_else(|| corrupt("malformed header"))?;
        let kind = ObjectKind::from_name_bytes(kind.as_bytes())
            .ok_or_else(|| corrupt("unknown object type"))?;
        let size: usize = size.parse().map_err(|_| corrupt("bad size field"))?;

        let data = raw[nul + 1..].to_vec();
        if data.len() != size {
            return Err(corrupt(&format!(
                "size mismatch: header says {size}, found {}",
                data.len()
            )));
        }
        Ok(StoredObject::new(kind, data))
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::decode(id, &compressed).map(Some)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let path = self.object_path(&id);
        if path.exists() {
            debug!(id = %id.short_hex(), "object already present");
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| std::io::Error::new(ErrorKind::Other, "object path has no parent"))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&Self::encode(object)?)?;
        tmp.as_file().sync_all()?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => {}
            // Another writer got there first; content addressing makes the
            // existing file equivalent.
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.error.into()),
        }
        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "object written");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn write_and_read_roundtrip() {
        let (_dir, store) = temp_store();
        let obj = StoredObject::new(ObjectKind::Commit, b"tree 0000\n\ninitial\n".to_vec());
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap(), Some(obj));
        assert!(store.exists(&id).unwrap());
    }

    #[test]
    fn read_missing_returns_none() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_hash([4; 32]);
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn write_is_idempotent() {
        let (_dir, store) = temp_store();
        let obj = StoredObject::new(ObjectKind::Blob, b"twice".to_vec());
        let id1 = store.write(&obj).unwrap();
        let id2 = store.write(&obj).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn objects_use_fanout_layout() {
        let (dir, store) = temp_store();
        let id = store
            .write(&StoredObject::new(ObjectKind::Blob, b"fan".to_vec()))
            .unwrap();
        let hex = id.to_hex();
        assert!(dir.path().join("objects").join(&hex[..2]).join(&hex[2..]).is_file());
    }

    #[test]
    fn garbage_file_is_reported_corrupt() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_hash([0xee; 32]);
        let path = store.object_path(&id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"definitely not zstd").unwrap();

        let err = store.read(&id).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn size_mismatch_is_reported_corrupt() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_hash([0xdd; 32]);
        let path = store.object_path(&id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let encoded = zstd::encode_all(&b"blob 10\0short"[..], ZSTD_LEVEL).unwrap();
        fs::write(&path, encoded).unwrap();

        let err = store.read(&id).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
        assert!(err.to_string().contains("size mismatch"));
    }

    #[test]
    fn replacements_roundtrip_through_directory() {
        let (_dir, store) = temp_store();
        let original = ObjectId::from_hash([1; 32]);
        let replacement = ObjectId::from_hash([2; 32]);
        store.add_replacement(&original, &replacement).unwrap();

        let map = store.load_replacements().unwrap();
        assert_eq!(map.get(&original), Some(replacement));
        assert_eq!(map.len(), 1);
    }
}
