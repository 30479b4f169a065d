use ks_types::{ObjectId, ObjectKind};

/// BLAKE3 hasher bound to a domain tag.
///
/// The digest covers `domain ":" data`, so identical bytes stored as two
/// different kinds never share an address. Use [`ContentHasher::for_kind`] to
/// get the canonical hasher for an object kind.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    pub const BLOB: Self = Self::new("ks-blob-v1");
    pub const TREE: Self = Self::new("ks-tree-v1");
    pub const COMMIT: Self = Self::new("ks-commit-v1");
    pub const TAG: Self = Self::new("ks-tag-v1");

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn for_kind(kind: ObjectKind) -> &'static Self {
        match kind {
            ObjectKind::Blob => &Self::BLOB,
            ObjectKind::Tree => &Self::TREE,
            ObjectKind::Commit => &Self::COMMIT,
            ObjectKind::Tag => &Self::TAG,
        }
    }

    /// The address of `data` under this domain.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let digest = blake3::Hasher::new()
            .update(self.domain.as_bytes())
            .update(b":")
            .update(data)
            .finalize();
        ObjectId::from_hash(*digest.as_bytes())
    }

    /// Whether `data` hashes to `expected` under this domain.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}
