//! Read-only views of a directory hierarchy for the tree builder.
//!
//! Paths passed to a [`Snapshot`] are relative to its root; the empty path
//! names the root itself.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::SdkResult;
#[cfg(not(unix))]
use crate::error::SdkError;

/// What a directory entry is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File { executable: bool },
    Directory,
    Symlink,
}

/// One entry returned by [`Snapshot::list_dir`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

/// A directory hierarchy the tree builder can walk.
pub trait Snapshot {
    /// The immediate entries of the directory at `rel`, in any order.
    fn list_dir(&self, rel: &Path) -> SdkResult<Vec<SnapshotEntry>>;

    /// The full contents of the file at `rel`.
    fn read_file(&self, rel: &Path) -> SdkResult<Vec<u8>>;

    /// The target of the symbolic link at `rel`, as raw bytes.
    fn read_link(&self, rel: &Path) -> SdkResult<Vec<u8>>;
}

/// A snapshot backed by the real filesystem below `root`.
///
/// Symbolic links are reported as links, never followed. Entries that are
/// neither files, directories nor links (sockets, FIFOs) are skipped.
#[derive(Clone, Debug)]
pub struct FsSnapshot {
    root: PathBuf,
}

impl FsSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Snapshot for FsSnapshot {
    fn list_dir(&self, rel: &Path) -> SdkResult<Vec<SnapshotEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.root.join(rel))? {
            let entry = entry?;
            let meta = entry.path().symlink_metadata()?;
            let file_type = meta.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File {
                    executable: is_executable(&meta),
                }
            } else {
                warn!(path = %entry.path().display(), "skipping special file");
                continue;
            };
            entries.push(SnapshotEntry {
                name: entry.file_name(),
                kind,
            });
        }
        Ok(entries)
    }

    fn read_file(&self, rel: &Path) -> SdkResult<Vec<u8>> {
        Ok(fs::read(self.root.join(rel))?)
    }

    fn read_link(&self, rel: &Path) -> SdkResult<Vec<u8>> {
        let target = fs::read_link(self.root.join(rel))?;
        link_bytes(target)
    }
}

#[cfg(unix)]
fn link_bytes(target: PathBuf) -> SdkResult<Vec<u8>> {
    use std::os::unix::ffi::OsStringExt;
    Ok(target.into_os_string().into_vec())
}

#[cfg(not(unix))]
fn link_bytes(target: PathBuf) -> SdkResult<Vec<u8>> {
    target
        .into_os_string()
        .into_string()
        .map(String::into_bytes)
        .map_err(|raw| SdkError::InvalidPath(format!("symlink target {raw:?} is not UTF-8")))
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

#[derive(Clone, Debug)]
enum MemoryNode {
    File { data: Vec<u8>, executable: bool },
    Directory,
    Symlink(Vec<u8>),
}

/// An in-memory snapshot that lists entries in insertion order.
///
/// Missing parent directories are created on insert.
///
/// ```
/// use loam_sdk::MemorySnapshot;
///
/// let snap = MemorySnapshot::new()
///     .with_file("README", "hi\n")
///     .with_file("src/lib.rs", "")
///     .with_dir("empty");
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshot {
    nodes: Vec<(PathBuf, MemoryNode)>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(
            path.as_ref(),
            MemoryNode::File {
                data: data.into(),
                executable: false,
            },
        );
        self
    }

    pub fn with_executable(mut self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(
            path.as_ref(),
            MemoryNode::File {
                data: data.into(),
                executable: true,
            },
        );
        self
    }

    pub fn with_symlink(mut self, path: impl AsRef<Path>, target: impl Into<Vec<u8>>) -> Self {
        self.insert(path.as_ref(), MemoryNode::Symlink(target.into()));
        self
    }

    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert(path.as_ref(), MemoryNode::Directory);
        self
    }

    fn insert(&mut self, path: &Path, node: MemoryNode) {
        let mut missing: Vec<PathBuf> = path
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty() && self.find(p).is_none())
            .map(Path::to_path_buf)
            .collect();
        missing.reverse();
        for dir in missing {
            self.nodes.push((dir, MemoryNode::Directory));
        }
        match self.nodes.iter_mut().find(|(p, _)| p == path) {
            Some(slot) => slot.1 = node,
            None => self.nodes.push((path.to_path_buf(), node)),
        }
    }

    fn find(&self, path: &Path) -> Option<&MemoryNode> {
        self.nodes.iter().find(|(p, _)| p == path).map(|(_, n)| n)
    }
}

fn not_found(rel: &Path, what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{what} not found: {}", rel.display()),
    )
}

impl Snapshot for MemorySnapshot {
    fn list_dir(&self, rel: &Path) -> SdkResult<Vec<SnapshotEntry>> {
        if !rel.as_os_str().is_empty() && !matches!(self.find(rel), Some(MemoryNode::Directory)) {
            return Err(not_found(rel, "directory").into());
        }
        Ok(self
            .nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(rel))
            .filter_map(|(p, node)| {
                let kind = match node {
                    MemoryNode::File { executable, .. } => EntryKind::File {
                        executable: *executable,
                    },
                    MemoryNode::Directory => EntryKind::Directory,
                    MemoryNode::Symlink(_) => EntryKind::Symlink,
                };
                Some(SnapshotEntry {
                    name: p.file_name()?.to_os_string(),
                    kind,
                })
            })
            .collect())
    }

    fn read_file(&self, rel: &Path) -> SdkResult<Vec<u8>> {
        match self.find(rel) {
            Some(MemoryNode::File { data, .. }) => Ok(data.clone()),
            _ => Err(not_found(rel, "file").into()),
        }
    }

    fn read_link(&self, rel: &Path) -> SdkResult<Vec<u8>> {
        match self.find(rel) {
            Some(MemoryNode::Symlink(target)) => Ok(target.clone()),
            _ => Err(not_found(rel, "symlink").into()),
        }
    }
}
