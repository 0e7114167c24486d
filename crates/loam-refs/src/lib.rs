//! Reference handling for loam.
//!
//! References are the human-readable entry points into the commit chain,
//! stored as plain files in the metadata directory exactly as git stores
//! them:
//!
//! - `HEAD` holds `ref: refs/heads/main\n` (symbolic) or a bare hex digest
//!   (detached).
//! - `refs/heads/<branch>` holds the hex digest of the branch tip.
//!
//! Only one pointer moves: the branch HEAD names (or HEAD itself when
//! detached). Branch creation, deletion and tags are left to callers.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`Head`]
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- Ref name validation
//! - [`fs`] -- [`FsRefStore`], the on-disk implementation

pub mod error;
pub mod fs;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use names::{validate_branch_name, validate_ref_name};
pub use traits::RefStore;
pub use types::{Head, DEFAULT_BRANCH};
