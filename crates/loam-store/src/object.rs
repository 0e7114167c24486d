use std::cmp::Ordering;

use loam_crypto::ContentHasher;
use loam_types::{ObjectId, Signature};
use serde::{Deserialize, Serialize};

use crate::codec::DecodeError;
use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: ordered entries mapping names to object references.
    Tree,
    /// Snapshot metadata: root tree, optional parent, identities, message.
    Commit,
}

impl ObjectKind {
    /// The tag written in the encoding header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parse a header tag. Returns `None` for anything but the three kinds.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"blob" => Some(Self::Blob),
            b"tree" => Some(Self::Tree),
            b"commit" => Some(Self::Commit),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + undecoded payload + cached size.
///
/// `StoredObject` sits between raw bytes and a typed [`Object`]: the header
/// has been parsed and checked, the payload has not. The store itself never
/// looks past this layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes (everything after the header's `\0`).
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID: the digest of the canonical encoding.
    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::hash_object(self.kind.as_str(), &self.data)
    }

    fn expect_kind(&self, expected: ObjectKind) -> StoreResult<()> {
        if self.kind != expected {
            return Err(StoreError::WrongKind {
                id: self.compute_id(),
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
}

impl EntryMode {
    /// Octal mode value (for display/serialization).
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            _ => None,
        }
    }

    /// Mode as written inside a tree payload: octal, no leading zeros
    /// (`40000`, `100644`).
    pub fn tree_field(&self) -> String {
        format!("{:o}", self.mode_bits())
    }

    /// Parse the octal mode field of a tree entry. Accepts a leading zero.
    pub fn parse_field(field: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(field).ok()?;
        if text.is_empty() || !text.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return None;
        }
        u32::from_str_radix(text, 8).ok().and_then(Self::from_mode_bits)
    }

    /// The object kind an entry with this mode refers to.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Directory => ObjectKind::Tree,
            _ => ObjectKind::Blob,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Entry name: a single path segment, never containing `/` or `\0`.
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    /// Check that `name` is a single, non-empty path segment that the tree
    /// payload can carry: no `/` and no `\0`.
    pub fn check_name(name: &str) -> Result<(), DecodeError> {
        if name.is_empty() || name.contains('/') || name.contains('\0') {
            return Err(DecodeError::Malformed(format!("invalid tree entry name {name:?}")));
        }
        Ok(())
    }

    /// Tree ordering: byte-wise by name, where a directory compares as if
    /// its name ended in `/`. This is git's collation, so trees built here
    /// hash identically to trees built by git.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(other.sort_key())
    }

    fn sort_key(&self) -> impl Iterator<Item = u8> + '_ {
        let suffix: &[u8] = if self.mode.is_directory() { b"/" } else { b"" };
        self.name.bytes().chain(suffix.iter().copied())
    }
}

/// Directory listing object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries in tree order (see [`TreeEntry::cmp_by_name`]).
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted for deterministic hashing, whatever order the
    /// caller collected them in.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(TreeEntry::cmp_by_name);
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Serialize the entries as `"<mode> <name>\0<20 raw digest bytes>"`.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 48);
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.tree_field().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.object_id.as_bytes());
        }
        out
    }

    /// Parse a tree payload. Entries are kept in stored order.
    pub fn parse_payload(mut data: &[u8]) -> Result<Self, DecodeError> {
        let mut entries = Vec::new();
        while !data.is_empty() {
            let space = data
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| DecodeError::Malformed("tree entry missing mode separator".into()))?;
            let mode = EntryMode::parse_field(&data[..space]).ok_or_else(|| {
                DecodeError::Malformed(format!(
                    "invalid tree entry mode {:?}",
                    String::from_utf8_lossy(&data[..space])
                ))
            })?;
            data = &data[space + 1..];

            let nul = data
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| DecodeError::Malformed("tree entry name not terminated".into()))?;
            let name = std::str::from_utf8(&data[..nul])
                .map_err(|_| DecodeError::Malformed("tree entry name is not UTF-8".into()))?;
            TreeEntry::check_name(name)?;
            data = &data[nul + 1..];

            if data.len() < ObjectId::LEN {
                return Err(DecodeError::Malformed(format!(
                    "tree entry {name:?} has a short digest ({} of {} bytes)",
                    data.len(),
                    ObjectId::LEN
                )));
            }
            let (digest, rest) = data.split_at(ObjectId::LEN);
            let object_id = ObjectId::from_slice(digest)
                .map_err(|e| DecodeError::Malformed(e.to_string()))?;
            entries.push(TreeEntry::new(mode, name, object_id));
            data = rest;
        }
        Ok(Self { entries })
    }

    /// Check every entry name, so that the payload parses back to this tree.
    pub fn validate(&self) -> Result<(), DecodeError> {
        self.entries.iter().try_for_each(|e| TreeEntry::check_name(&e.name))
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Tree, self.to_payload())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        Ok(Self::parse_payload(&obj.data)?)
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Snapshot metadata: one root tree, at most one parent, two identities and
/// a free-text message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parent: Option<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    /// Serialize as the header block, a blank line, then the message verbatim.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = format!("tree {}\n", self.tree);
        if let Some(parent) = &self.parent {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }

    /// Parse a commit payload.
    ///
    /// Unknown headers (e.g. `gpgsig`, `encoding`) and their continuation
    /// lines are skipped. A second `parent` is rejected.
    pub fn parse_payload(data: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(data)
            .map_err(|_| DecodeError::Malformed("commit is not UTF-8".into()))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| DecodeError::Malformed("commit missing blank line before message".into()))?;

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            if line.starts_with(' ') {
                continue;
            }
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "tree" => {
                    if tree.replace(parse_id(value)?).is_some() {
                        return Err(DecodeError::Malformed("duplicate tree header".into()));
                    }
                }
                "parent" => {
                    if parent.replace(parse_id(value)?).is_some() {
                        return Err(DecodeError::Malformed("multiple parents are not supported".into()));
                    }
                }
                "author" => author = Some(parse_signature(value)?),
                "committer" => committer = Some(parse_signature(value)?),
                _ => {}
            }
        }

        let missing = |field: &str| DecodeError::Malformed(format!("commit missing {field} header"));
        Ok(Self {
            tree: tree.ok_or_else(|| missing("tree"))?,
            parent,
            author: author.ok_or_else(|| missing("author"))?,
            committer: committer.ok_or_else(|| missing("committer"))?,
            message: message.to_string(),
        })
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Commit, self.to_payload())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        Ok(Self::parse_payload(&obj.data)?)
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

fn parse_id(value: &str) -> Result<ObjectId, DecodeError> {
    ObjectId::from_hex(value).map_err(|e| DecodeError::Malformed(format!("bad object id {value:?}: {e}")))
}

fn parse_signature(value: &str) -> Result<Signature, DecodeError> {
    Signature::parse(value).map_err(|e| DecodeError::Malformed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Any of the three object kinds, fully decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Reject objects whose encoding would not decode back to them.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match self {
            Self::Tree(t) => t.validate(),
            Self::Blob(_) | Self::Commit(_) => Ok(()),
        }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        match self {
            Self::Blob(b) => b.to_stored_object(),
            Self::Tree(t) => t.to_stored_object(),
            Self::Commit(c) => c.to_stored_object(),
        }
    }

    /// Decode whatever kind the stored object carries.
    pub fn from_stored(obj: &StoredObject) -> Result<Self, DecodeError> {
        Ok(match obj.kind {
            ObjectKind::Blob => Self::Blob(Blob::new(obj.data.clone())),
            ObjectKind::Tree => Self::Tree(Tree::parse_payload(&obj.data)?),
            ObjectKind::Commit => Self::Commit(Commit::parse_payload(&obj.data)?),
        })
    }

    /// Compute the content-addressed ID of this object.
    pub fn compute_id(&self) -> ObjectId {
        self.to_stored_object().compute_id()
    }
}

impl From<Blob> for Object {
    fn from(b: Blob) -> Self {
        Self::Blob(b)
    }
}

impl From<Tree> for Object {
    fn from(t: Tree) -> Self {
        Self::Tree(t)
    }
}

impl From<Commit> for Object {
    fn from(c: Commit) -> Self {
        Self::Commit(c)
    }
}
