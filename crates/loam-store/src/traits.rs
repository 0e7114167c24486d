use loam_crypto::ContentHasher;
use loam_types::ObjectId;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, Commit, Object, ObjectKind, StoredObject, Tree};

/// Content-addressed, append-only object store.
///
/// Backends only move canonical encodings in and out; encoding, hashing and
/// decoding live in the provided methods so every backend agrees on them.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. Content-addressing guarantees this:
///   the same encoding always produces the same ID.
/// - Writing an ID that already exists is a no-op, not an error.
/// - There is no update or delete.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read the canonical encoding stored under `id`.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read_encoded(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>>;

    /// Store a canonical encoding under `id`, which the caller has already
    /// computed from `encoded`.
    ///
    /// Returns `true` if the object was newly written, `false` if it was
    /// already present.
    fn write_encoded(&self, id: &ObjectId, encoded: &[u8]) -> StoreResult<bool>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Encode, hash and write a stored object, returning its ID.
    fn put_stored(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let encoded = codec::encode_stored(object);
        let id = ContentHasher::digest(&encoded);
        self.write_encoded(&id, &encoded)?;
        Ok(id)
    }

    /// Write an object and return its content-addressed ID. Idempotent.
    ///
    /// A tree with an entry name its payload cannot carry is rejected with
    /// [`DecodeError::Malformed`](crate::codec::DecodeError::Malformed) and
    /// nothing is written.
    fn put(&self, object: &Object) -> StoreResult<ObjectId> {
        object.validate()?;
        self.put_stored(&object.to_stored_object())
    }

    /// Write multiple objects and return their IDs in order.
    fn put_batch(&self, objects: &[Object]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.put(obj)).collect()
    }

    /// Read an object without decoding its payload.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        match self.read_encoded(id)? {
            Some(bytes) => Ok(Some(codec::decode_stored(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read and fully decode an object of any kind.
    fn get(&self, id: &ObjectId) -> StoreResult<Object> {
        let stored = self.read_required(id)?;
        Ok(Object::from_stored(&stored)?)
    }

    /// The kind of the object stored under `id`.
    fn kind_of(&self, id: &ObjectId) -> StoreResult<ObjectKind> {
        Ok(self.read_required(id)?.kind)
    }

    /// Read a blob, failing with [`StoreError::WrongKind`] for other kinds.
    fn get_blob(&self, id: &ObjectId) -> StoreResult<Blob> {
        Blob::from_stored_object(&self.read_required(id)?)
    }

    /// Read a tree, failing with [`StoreError::WrongKind`] for other kinds.
    fn get_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        Tree::from_stored_object(&self.read_required(id)?)
    }

    /// Read a commit, failing with [`StoreError::WrongKind`] for other kinds.
    fn get_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        Commit::from_stored_object(&self.read_required(id)?)
    }

    /// Like [`read`](ObjectStore::read) but a missing object is
    /// [`StoreError::NotFound`].
    fn read_required(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }
}
