use ks_crypto::ContentHasher;
use ks_store::{ObjectStore, ReplacementResolver, StoreError};
use ks_types::{ObjectId, ObjectKind};
use tracing::{debug, warn};

use crate::error::ReferenceError;

/// A tagged object that passed verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifiedReference {
    /// The address named in the tag.
    pub requested: ObjectId,
    /// The address actually read, after replacement.
    pub resolved: ObjectId,
    /// The confirmed object type.
    pub kind: ObjectKind,
}

impl VerifiedReference {
    pub fn was_replaced(&self) -> bool {
        self.requested != self.resolved
    }
}

/// Checks that a tag's target exists, has the declared type, and is intact.
///
/// Verification only reads from the store.
pub struct ReferenceVerifier<'a, S: ?Sized, R: ?Sized> {
    store: &'a S,
    resolver: &'a R,
}

impl<'a, S, R> ReferenceVerifier<'a, S, R>
where
    S: ObjectStore + ?Sized,
    R: ReplacementResolver + ?Sized,
{
    pub fn new(store: &'a S, resolver: &'a R) -> Self {
        Self { store, resolver }
    }

    /// Verify the object at `id`, declared to be of type `declared`.
    ///
    /// Checks run in order: resolve replacement, fetch, compare type,
    /// recompute the digest. The first failing check is reported.
    pub fn verify(
        &self,
        id: &ObjectId,
        declared: ObjectKind,
    ) -> Result<VerifiedReference, ReferenceError> {
        let resolved = self.resolver.resolve(id).map_err(|e| match e {
            StoreError::ReplaceDepthExceeded(_) => ReferenceError::ReplacementLoop { id: *id },
            other => ReferenceError::Store {
                id: *id,
                source: other,
            },
        })?;
        if resolved != *id {
            debug!(requested = %id.short_hex(), resolved = %resolved.short_hex(), "tagged object replaced");
        }

        let object = match self.store.read(&resolved) {
            Ok(Some(object)) => object,
            Ok(None) => return Err(ReferenceError::Missing { id: *id }),
            Err(e) if e.is_corruption() => {
                warn!(id = %resolved, error = %e, "tagged object unreadable");
                return Err(ReferenceError::ContentCorrupt {
                    id: resolved,
                    reason: format!("cannot be decoded: {e}"),
                });
            }
            Err(e) => {
                return Err(ReferenceError::Store {
                    id: resolved,
                    source: e,
                })
            }
        };

        if object.kind != declared {
            return Err(ReferenceError::TypeMismatch {
                id: *id,
                declared,
                actual: object.kind,
            });
        }

        let computed = ContentHasher::for_kind(declared).hash(&object.data);
        if computed != resolved {
            warn!(id = %resolved, %computed, "tagged object does not match its address");
            return Err(ReferenceError::ContentCorrupt {
                id: resolved,
                reason: format!("hashes to {computed}"),
            });
        }

        Ok(VerifiedReference {
            requested: *id,
            resolved,
            kind: declared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_store::{InMemoryObjectStore, NoReplacements, ReplacementMap, StoredObject};

    fn store_with_commit() -> (InMemoryObjectStore, ObjectId) {
        let store = InMemoryObjectStore::new();
        let id = store
            .write(&StoredObject::new(ObjectKind::Commit, b"tree t\n\nfirst\n".to_vec()))
            .unwrap();
        (store, id)
    }

    #[test]
    fn passes_for_intact_object() {
        let (store, id) = store_with_commit();
        let verified = ReferenceVerifier::new(&store, &NoReplacements)
            .verify(&id, ObjectKind::Commit)
            .unwrap();
        assert_eq!(verified.resolved, id);
        assert!(!verified.was_replaced());
    }

    #[test]
    fn missing_object() {
        let (store, _) = store_with_commit();
        let absent = ObjectId::from_hash([0x42; 32]);
        let err = ReferenceVerifier::new(&store, &NoReplacements)
            .verify(&absent, ObjectKind::Commit)
            .unwrap_err();
        assert!(matches!(err, ReferenceError::Missing { id } if id == absent));
    }

    #[test]
    fn declared_type_must_match_exactly() {
        let (store, id) = store_with_commit();
        let verifier = ReferenceVerifier::new(&store, &NoReplacements);
        for declared in [ObjectKind::Blob, ObjectKind::Tree, ObjectKind::Tag] {
            let err = verifier.verify(&id, declared).unwrap_err();
            assert!(matches!(
                err,
                ReferenceError::TypeMismatch { actual: ObjectKind::Commit, .. }
            ));
        }
    }

    #[test]
    fn corrupt_content_detected() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_hash([0x10; 32]);
        store.insert_at(id, StoredObject::new(ObjectKind::Commit, b"bit rot".to_vec()));
        let err = ReferenceVerifier::new(&store, &NoReplacements)
            .verify(&id, ObjectKind::Commit)
            .unwrap_err();
        assert!(matches!(err, ReferenceError::ContentCorrupt { .. }));
        assert_eq!(err.category(), crate::ErrorCategory::StoreIntegrity);
    }

    #[test]
    fn replacement_is_followed() {
        let (store, original) = store_with_commit();
        let replacement = store
            .write(&StoredObject::new(ObjectKind::Commit, b"tree t\n\nrewritten\n".to_vec()))
            .unwrap();
        let mut map = ReplacementMap::new();
        map.insert(original, replacement);

        let verified = ReferenceVerifier::new(&store, &map)
            .verify(&original, ObjectKind::Commit)
            .unwrap();
        assert_eq!(verified.resolved, replacement);
        assert!(verified.was_replaced());
    }

    #[test]
    fn replacement_to_missing_object_is_missing() {
        let (store, original) = store_with_commit();
        let mut map = ReplacementMap::new();
        map.insert(original, ObjectId::from_hash([0x77; 32]));
        let err = ReferenceVerifier::new(&store, &map)
            .verify(&original, ObjectKind::Commit)
            .unwrap_err();
        assert!(matches!(err, ReferenceError::Missing { id } if id == original));
    }

    #[test]
    fn inconsistent_replacement_is_corrupt() {
        // A replacement mapping pointing at a record filed under the wrong key.
        let (store, original) = store_with_commit();
        let bogus = ObjectId::from_hash([0x99; 32]);
        store.insert_at(bogus, StoredObject::new(ObjectKind::Commit, b"other".to_vec()));
        let resolver = move |id: &ObjectId| (*id == original).then_some(bogus);

        let err = ReferenceVerifier::new(&store, &resolver)
            .verify(&original, ObjectKind::Commit)
            .unwrap_err();
        assert!(matches!(err, ReferenceError::ContentCorrupt { id, .. } if id == bogus));
    }

    #[test]
    fn replacement_loop() {
        let (store, original) = store_with_commit();
        let resolver = move |id: &ObjectId| Some(*id);
        let err = ReferenceVerifier::new(&store, &resolver)
            .verify(&original, ObjectKind::Commit)
            .unwrap_err();
        assert!(matches!(err, ReferenceError::ReplacementLoop { .. }));
    }

    #[test]
    fn verification_never_writes() {
        let (store, id) = store_with_commit();
        let before = store.write_attempts();
        let _ = ReferenceVerifier::new(&store, &NoReplacements).verify(&id, ObjectKind::Blob);
        let _ = ReferenceVerifier::new(&store, &NoReplacements).verify(&id, ObjectKind::Commit);
        assert_eq!(store.write_attempts(), before);
    }
}
