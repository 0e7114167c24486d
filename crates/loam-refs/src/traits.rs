//! The [`RefStore`] trait defining the reference storage interface.

use loam_types::ObjectId;

use crate::error::{RefError, Result};
use crate::types::Head;

/// Storage backend for named references.
///
/// Ref names are full names (`refs/heads/main`). Implementations must be
/// thread-safe (`Send + Sync`) and replace a ref's value atomically.
pub trait RefStore: Send + Sync {
    /// Read a ref by its full name.
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>>;

    /// Create or update a ref.
    fn write_ref(&self, name: &str, id: &ObjectId) -> Result<()>;

    /// List all refs whose full name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>>;

    /// Read the current HEAD state.
    ///
    /// Returns `Ok(None)` if HEAD has not been set.
    fn head(&self) -> Result<Option<Head>>;

    /// Replace HEAD.
    fn set_head(&self, head: &Head) -> Result<()>;

    /// The commit HEAD currently resolves to.
    ///
    /// Returns `Ok(None)` when HEAD is unset or names a branch with no
    /// commits yet (an unborn branch).
    fn resolve_head(&self) -> Result<Option<ObjectId>> {
        match self.head()? {
            None => Ok(None),
            Some(Head::Detached(id)) => Ok(Some(id)),
            Some(Head::Symbolic(name)) => self.read_ref(&name),
        }
    }

    /// Move the pointer HEAD names to `id`: the branch for a symbolic HEAD,
    /// HEAD itself when detached.
    fn advance_head(&self, id: &ObjectId) -> Result<()> {
        match self.head()? {
            Some(Head::Symbolic(name)) => self.write_ref(&name, id),
            Some(Head::Detached(_)) => self.set_head(&Head::Detached(*id)),
            None => Err(RefError::NotFound {
                name: "HEAD".into(),
            }),
        }
    }
}
