use ks_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Storage keyed by content address.
///
/// Implementations hold records verbatim: `read` returns whatever sits under
/// the key without re-hashing it, so integrity is checked by callers that
/// care. Writing an object that is already present succeeds without change.
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `id`.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Store `object` and return its address.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        self.read(id).map(|found| found.is_some())
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        S::read(self, id)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        S::write(self, object)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        S::exists(self, id)
    }
}
