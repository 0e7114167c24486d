use std::collections::HashMap;
use std::sync::RwLock;

use loam_types::ObjectId;

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are held as canonical encodings
/// (uncompressed) behind a `RwLock` for safe concurrent access.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total encoded bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|bytes| bytes.len() as u64)
            .sum()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read_encoded(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write_encoded(&self, id: &ObjectId, encoded: &[u8]) -> StoreResult<bool> {
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: if already present, skip (content-addressing guarantees
        // the same ID always maps to the same content).
        if map.contains_key(id) {
            return Ok(false);
        }
        map.insert(*id, encoded.to_vec());
        Ok(true)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::error::StoreError;
    use crate::object::*;
    use chrono::{FixedOffset, TimeZone};
    use loam_types::Signature;
    use std::sync::Arc;

    fn make_blob(content: &[u8]) -> Object {
        Object::Blob(Blob::new(content.to_vec()))
    }

    fn make_commit(tree: ObjectId, parent: Option<ObjectId>) -> Object {
        let when = FixedOffset::east_opt(0).unwrap().timestamp_opt(1_000, 0).unwrap();
        let sig = Signature::new("Tester", "tester@example.com", when);
        Object::Commit(Commit {
            tree,
            parent,
            author: sig.clone(),
            committer: sig,
            message: "msg\n".into(),
        })
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.put(&obj).unwrap();
        assert_eq!(store.get(&id).unwrap(), obj);
    }

    #[test]
    fn put_and_get_tree() {
        let store = InMemoryObjectStore::new();
        let blob_id = store.put(&make_blob(b"hello")).unwrap();
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "hello.txt", blob_id),
            TreeEntry::new(EntryMode::Directory, "subdir", blob_id),
        ]);
        let id = store.put(&Object::Tree(tree)).unwrap();

        let tree = store.get_tree(&id).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.get("hello.txt").is_some());
    }

    #[test]
    fn put_and_get_commit_chain() {
        let store = InMemoryObjectStore::new();
        let tree_id = store.put(&Object::Tree(Tree::empty())).unwrap();
        let first = store.put(&make_commit(tree_id, None)).unwrap();
        let second = store.put(&make_commit(tree_id, Some(first))).unwrap();

        let commit = store.get_commit(&second).unwrap();
        assert_eq!(commit.parent, Some(first));
        assert_eq!(commit.tree, tree_id);
        assert!(store.get_commit(&first).unwrap().parent.is_none());
    }

    #[test]
    fn stored_bytes_are_canonical_encoding() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello\n");
        let id = store.put(&obj).unwrap();
        assert_eq!(store.read_encoded(&id).unwrap().unwrap(), codec::encode(&obj));
    }

    #[test]
    fn idempotent_put() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"same content");
        let id1 = store.put(&obj).unwrap();
        let id2 = store.put(&obj).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_hash([1; 20]);
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn put_batch_preserves_order() {
        let store = InMemoryObjectStore::new();
        let objects = vec![make_blob(b"a"), make_blob(b"b"), make_blob(b"a")];
        let ids = store.put_batch(&objects).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(store.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Metrics
    // -----------------------------------------------------------------------

    #[test]
    fn total_bytes_counts_encodings() {
        let store = InMemoryObjectStore::new();
        store.put(&make_blob(b"12345")).unwrap(); // "blob 5\0" + 5
        store.put(&make_blob(b"")).unwrap(); // "blob 0\0"
        assert_eq!(store.total_bytes(), 12 + 7);
    }

    #[test]
    fn all_ids_sorted() {
        let store = InMemoryObjectStore::new();
        for i in 0..10u8 {
            store.put(&make_blob(&[i])).unwrap();
        }
        let ids = store.all_ids();
        assert_eq!(ids.len(), 10);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_store() {
        let store = InMemoryObjectStore::new();
        assert!(store.is_empty());
        assert_eq!(store.total_bytes(), 0);
        assert!(format!("{store:?}").contains("object_count: 0"));
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_identical_writes_converge() {
        let store = Arc::new(InMemoryObjectStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.put(&make_blob(b"race")).unwrap())
            })
            .collect();
        let ids: Vec<ObjectId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.len(), 1);
    }
}
