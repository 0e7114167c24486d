//! Object transfer between loam repositories.
//!
//! A pull copies the closure of a commit (its parent chain, trees and
//! blobs) from a [`RemoteTransport`] into a local object store using only
//! the store's read and write operations. Every received object is
//! re-hashed before it is written, and children are always written before
//! the objects that reference them, so an object that is already present
//! locally is trusted to have its whole closure present too.

pub mod error;
pub mod fetch;
pub mod transport;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use fetch::Fetcher;
pub use transport::{LocalTransport, RemoteTransport};
pub use types::{FetchResult, RefSpec, RefUpdate};
