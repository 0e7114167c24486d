use std::collections::BTreeSet;
use std::path::Path;

use loam_store::{Blob, EntryMode, Object, ObjectStore, Tree, TreeEntry};
use loam_types::ObjectId;
use tracing::debug;

use crate::error::{SdkError, SdkResult};
use crate::snapshot::{EntryKind, Snapshot};

/// Persists a directory hierarchy as blob and tree objects.
///
/// Children are written before the tree that names them, and the walk stops
/// at the first error, so a tree is only ever stored once everything it
/// references is in the store.
pub struct TreeBuilder<'a> {
    store: &'a dyn ObjectStore,
    ignore: BTreeSet<String>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            ignore: BTreeSet::new(),
        }
    }

    /// Skip entries with any of these names, at every depth.
    pub fn with_ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }

    /// Build the tree for the directory at `rel` and return its ID.
    pub fn build(&self, snapshot: &dyn Snapshot, rel: &Path) -> SdkResult<ObjectId> {
        let listing = snapshot.list_dir(rel)?;
        let mut entries = Vec::with_capacity(listing.len());

        for entry in listing {
            let name = entry
                .name
                .to_str()
                .ok_or_else(|| SdkError::InvalidPath(rel.join(&entry.name).display().to_string()))?
                .to_owned();
            if self.ignore.contains(&name) {
                debug!(path = %rel.join(&name).display(), "ignored");
                continue;
            }

            let path = rel.join(&name);
            let (mode, id) = match entry.kind {
                EntryKind::File { executable } => {
                    let data = snapshot.read_file(&path)?;
                    let mode = if executable {
                        EntryMode::Executable
                    } else {
                        EntryMode::Regular
                    };
                    (mode, self.store.put(&Object::Blob(Blob::new(data)))?)
                }
                EntryKind::Symlink => {
                    let target = snapshot.read_link(&path)?;
                    (EntryMode::Symlink, self.store.put(&Object::Blob(Blob::new(target)))?)
                }
                EntryKind::Directory => (EntryMode::Directory, self.build(snapshot, &path)?),
            };
            entries.push(TreeEntry::new(mode, name, id));
        }

        let tree = Tree::new(entries);
        let count = tree.len();
        let id = self.store.put(&Object::Tree(tree))?;
        debug!(path = %rel.display(), entries = count, tree = %id, "wrote tree");
        Ok(id)
    }
}
