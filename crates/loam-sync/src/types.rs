use loam_types::ObjectId;
use serde::{Deserialize, Serialize};

/// Which remote ref to fetch and, optionally, which local ref to update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSpec {
    pub src: String,
    pub dst: Option<String>,
    pub force: bool,
}

impl RefSpec {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: Some(dst.into()),
            force: false,
        }
    }

    /// Parse `[+]<src>[:<dst>]`. Short names expand to `refs/heads/<name>`.
    ///
    /// Returns `None` for an empty source.
    pub fn parse(s: &str) -> Option<Self> {
        let (force, rest) = match s.strip_prefix('+') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };
        let (src, dst) = match rest.split_once(':') {
            Some((src, dst)) => (src, Some(dst)),
            None => (rest, None),
        };
        if src.is_empty() {
            return None;
        }
        Some(Self {
            src: expand(src),
            dst: dst.filter(|d| !d.is_empty()).map(expand),
            force,
        })
    }
}

fn expand(name: &str) -> String {
    if name.starts_with("refs/") {
        name.to_string()
    } else {
        format!("refs/heads/{name}")
    }
}

/// A local ref moved by a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefUpdate {
    pub name: String,
    pub old: Option<ObjectId>,
    pub new: ObjectId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchResult {
    /// Objects newly written to the local store.
    pub objects_received: usize,
    /// Encoded bytes received from the remote.
    pub bytes_transferred: u64,
    pub refs_updated: Vec<RefUpdate>,
}
