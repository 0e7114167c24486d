//! Content-addressed object storage for loam.
//!
//! This crate implements a hash-keyed object store laid out exactly like
//! git's `.git/objects/` directory. Every object -- blobs, trees, commits --
//! is stored as an immutable, zlib-compressed canonical encoding identified
//! by the SHA-1 digest of that encoding.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary data)
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- root tree, optional parent, author/committer, message
//!
//! # Layers
//!
//! - [`codec`] -- `"<kind> <len>\0<payload>"` framing and payload parsing
//! - [`compress`] -- zlib wrapping of encoded bytes
//! - [`ObjectStore`] -- `put`/`get` over any backend
//!
//! # Storage Backends
//!
//! - [`LooseObjectStore`] -- one file per object under a two-level fan-out
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writes are idempotent: an existing digest is never rewritten.
//! 3. The store is append-only: no update, no delete.
//! 4. Concurrent reads are always safe (objects are immutable).
//! 5. Malformed bytes surface as typed errors; nothing is repaired.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod codec;
pub mod compress;
pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use codec::{decode, encode, DecodeError};
pub use compress::{Compressor, CorruptionError};
pub use error::{StoreError, StoreResult};
pub use loose::{LooseObjectStore, LooseStoreOptions};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryMode, Object, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
