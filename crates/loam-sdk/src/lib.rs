//! High-level API for loam.
//!
//! [`Repository`] ties the object store, the refs and the configuration
//! together around an explicit working directory. The pieces it uses are
//! public so they can be driven on their own:
//!
//! - [`TreeBuilder`] turns any [`Snapshot`] into persisted tree objects.
//! - [`render_object`] prints an object the way `git cat-file -p` does.
//! - [`RepositoryConfig`] is the `loam.toml` file in the metadata directory.

pub mod builder;
pub mod commit;
pub mod config;
pub mod error;
pub mod render;
pub mod repository;
pub mod snapshot;

pub use builder::TreeBuilder;
pub use commit::{CommitRequest, LogEntry};
pub use config::{RepositoryConfig, UserConfig, CONFIG_FILE, DEFAULT_METADATA_DIR};
pub use error::{SdkError, SdkResult};
pub use render::render_object;
pub use repository::Repository;
pub use snapshot::{EntryKind, FsSnapshot, MemorySnapshot, Snapshot, SnapshotEntry};

// Re-export key types
pub use loam_refs::Head;
pub use loam_store::{Blob, Commit, EntryMode, Object, ObjectKind, Tree, TreeEntry};
pub use loam_types::{Clock, FixedClock, ObjectId, Signature, SystemClock};
