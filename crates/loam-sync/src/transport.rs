use std::path::Path;
use std::sync::Arc;

use loam_refs::{FsRefStore, RefStore};
use loam_store::{LooseObjectStore, ObjectStore};
use loam_types::ObjectId;

use crate::error::{SyncError, SyncResult};

/// Read access to another repository.
pub trait RemoteTransport: Send + Sync {
    /// All refs the remote advertises, sorted by name.
    fn list_refs(&self) -> SyncResult<Vec<(String, ObjectId)>>;

    /// The canonical encoding of an object, or `None` if the remote lacks it.
    fn fetch_object(&self, id: &ObjectId) -> SyncResult<Option<Vec<u8>>>;
}

/// A repository reachable through the local filesystem.
pub struct LocalTransport {
    store: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
}

impl LocalTransport {
    pub fn new(store: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self { store, refs }
    }

    /// Open the repository at `path`: either a working directory containing
    /// `.git` or a metadata directory itself.
    pub fn open(path: &Path) -> SyncResult<Self> {
        let dotgit = path.join(".git");
        let git_dir = if dotgit.is_dir() { dotgit } else { path.to_path_buf() };
        let objects = git_dir.join("objects");
        if !objects.is_dir() {
            return Err(SyncError::Remote(format!(
                "not a repository: {}",
                path.display()
            )));
        }
        Ok(Self::new(
            Arc::new(LooseObjectStore::open(objects)?),
            Arc::new(FsRefStore::new(git_dir)),
        ))
    }
}

impl RemoteTransport for LocalTransport {
    fn list_refs(&self) -> SyncResult<Vec<(String, ObjectId)>> {
        Ok(self.refs.list_refs("refs/")?)
    }

    fn fetch_object(&self, id: &ObjectId) -> SyncResult<Option<Vec<u8>>> {
        Ok(self.store.read_encoded(id)?)
    }
}
