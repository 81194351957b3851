//! The unified lookup surface over loose and packed objects.
//!
//! Resolution order is fixed: the loose store first, then each registered
//! pack in registration order. A pack whose index does not know the hash is
//! skipped without touching the pack file; a pack that knows the hash but
//! fails to decode it is logged and skipped, so one corrupt pack cannot
//! shadow an object another source still holds.

pub mod loose;

use crate::{
    errors::GitError,
    hash::ObjectHash,
    internal::{
        object::{ObjectContents, types::ObjectType},
        pack::Pack,
        storage::loose::LooseStore,
    },
};

pub struct ObjectStorage {
    loose: LooseStore,
    packs: Vec<Pack>,
}

impl ObjectStorage {
    pub fn new(loose: LooseStore) -> ObjectStorage {
        ObjectStorage {
            loose,
            packs: Vec::new(),
        }
    }

    /// Register a pack. Packs are consulted in registration order.
    pub fn add_pack(&mut self, pack: Pack) {
        self.packs.push(pack);
    }

    pub fn loose(&self) -> &LooseStore {
        &self.loose
    }

    /// Find `hash` anywhere in the store.
    pub fn resolve(&self, hash: &ObjectHash) -> Result<ObjectContents, GitError> {
        match self.loose.read(hash) {
            Ok(contents) => return Ok(contents),
            Err(GitError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }

        for pack in &self.packs {
            if !pack.contains(hash) {
                continue;
            }
            match pack.get(hash) {
                Ok(contents) => return Ok(contents),
                Err(err) => {
                    tracing::warn!(%hash, %err, "pack lookup failed, trying next source");
                }
            }
        }
        Err(GitError::NotFound(hash.to_string()))
    }

    /// Store a new object loose, returning its address.
    pub fn store(&self, kind: ObjectType, payload: &[u8]) -> Result<ObjectHash, GitError> {
        self.loose.write(kind, payload)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::{
        errors::GitError,
        hash::ObjectHash,
        internal::{
            object::types::ObjectType,
            pack::{Pack, idx::PackIndex, tests::build_delta_pack},
            storage::{ObjectStorage, loose::LooseStore},
        },
    };

    fn storage_with_pack() -> (TempDir, ObjectStorage, ObjectHash, ObjectHash) {
        let dir = TempDir::new().unwrap();
        let mut storage = ObjectStorage::new(LooseStore::new(dir.path()));
        let (pack_bytes, idx_bytes, base_hash, delta_hash, _) = build_delta_pack();
        storage.add_pack(Pack::new(
            pack_bytes,
            PackIndex::from_bytes(&idx_bytes).unwrap(),
        ));
        (dir, storage, base_hash, delta_hash)
    }

    #[test]
    fn test_resolves_loose_before_packs() {
        let (_dir, storage, base_hash, _) = storage_with_pack();

        // same bytes loose and packed resolve to the same object
        let stored = storage.store(ObjectType::Blob, b"only loose").unwrap();
        assert_eq!(
            storage.resolve(&stored).unwrap().data,
            b"only loose"
        );

        // packed-only objects still resolve
        let contents = storage.resolve(&base_hash).unwrap();
        assert_eq!(contents.hash(), base_hash);
    }

    #[test]
    fn test_resolves_delta_through_pack() {
        let (_dir, storage, _, delta_hash) = storage_with_pack();
        let contents = storage.resolve(&delta_hash).unwrap();
        assert_eq!(contents.kind, ObjectType::Blob);
        assert_eq!(contents.hash(), delta_hash);
    }

    #[test]
    fn test_unknown_hash_is_not_found_everywhere() {
        let (_dir, storage, _, _) = storage_with_pack();
        let absent = ObjectHash([0x99; 20]);
        assert!(matches!(
            storage.resolve(&absent),
            Err(GitError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_then_resolve_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = ObjectStorage::new(LooseStore::new(dir.path()));
        let hash = storage.store(ObjectType::Blob, b"hello\n").unwrap();
        assert_eq!(
            hash.to_string(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
        assert_eq!(storage.resolve(&hash).unwrap().data, b"hello\n");
    }
}
