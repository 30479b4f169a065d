use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use ks_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Object store held entirely in memory.
///
/// Besides plain storage it exposes the hooks callers need to test their own
/// write discipline: a count of `write` calls, a read-only switch that makes
/// writes fail, and [`insert_at`](Self::insert_at) for planting records that
/// do not match their key.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
    write_calls: AtomicUsize,
    read_only: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `write` has been called, including failed calls.
    pub fn write_attempts(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// While set, every `write` fails with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Store `object` under `id` as given, without hashing.
    ///
    /// Not counted as a write attempt.
    pub fn insert_at(&self, id: ObjectId, object: StoredObject) {
        let mut objects = self.objects.write().expect("lock poisoned");
        objects.insert(id, object);
    }

    /// An ordered copy of everything stored, for before/after comparisons.
    pub fn snapshot(&self) -> BTreeMap<ObjectId, StoredObject> {
        let objects = self.objects.read().expect("lock poisoned");
        objects
            .iter()
            .map(|(id, object)| (*id, object.clone()))
            .collect()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.objects.read().expect("lock poisoned").get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }

        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        self.objects
            .write()
            .expect("lock poisoned")
            .entry(id)
            .or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.objects.read().expect("lock poisoned").contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("objects", &self.len())
            .field("write_attempts", &self.write_attempts())
            .finish()
    }
}
