use std::io;

use loam_types::ObjectId;
use sha1::{Digest, Sha1};

/// SHA-1 content hasher producing [`ObjectId`]s.
///
/// The digest is always taken over an object's canonical encoding
/// (`"<kind> <len>\0<payload>"`), never over the raw payload alone, so the
/// object kind and declared length participate in its identity. Use
/// [`ContentHasher::hash_object`] to hash a payload under its header without
/// building the concatenated buffer, or feed bytes incrementally through
/// [`update`](ContentHasher::update) / [`io::Write`].
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha1,
}

impl ContentHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self { inner: Sha1::new() }
    }

    /// Feed more bytes into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Consume the hasher and return the digest.
    pub fn finalize(self) -> ObjectId {
        let out = self.inner.finalize();
        let mut bytes = [0u8; ObjectId::LEN];
        bytes.copy_from_slice(&out);
        ObjectId::from_hash(bytes)
    }

    /// One-shot digest of an already-encoded object.
    pub fn digest(encoded: &[u8]) -> ObjectId {
        let mut hasher = Self::new();
        hasher.update(encoded);
        hasher.finalize()
    }

    /// Digest of `payload` framed by the `"<kind> <len>\0"` header.
    pub fn hash_object(kind: &str, payload: &[u8]) -> ObjectId {
        let mut hasher = Self::new();
        hasher.update(kind.as_bytes());
        hasher.update(b" ");
        hasher.update(payload.len().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(payload);
        hasher.finalize()
    }

    /// Verify that encoded bytes produce the expected object ID.
    pub fn verify(encoded: &[u8], expected: &ObjectId) -> bool {
        Self::digest(encoded) == *expected
    }
}

impl io::Write for ContentHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHasher").finish_non_exhaustive()
    }
}
