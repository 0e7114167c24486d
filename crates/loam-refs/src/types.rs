//! Core reference types.

use loam_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};

/// Branch HEAD names in a freshly initialized repository.
pub const DEFAULT_BRANCH: &str = "main";

const SYMBOLIC_PREFIX: &str = "ref: ";

/// The state of HEAD: either symbolic (naming a ref) or detached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Head {
    /// HEAD names a ref by its full name (e.g. `refs/heads/main`).
    Symbolic(String),
    /// HEAD is detached, pointing directly to a commit.
    Detached(ObjectId),
}

impl Head {
    /// HEAD naming `refs/heads/<branch>`.
    pub fn branch(branch: &str) -> Self {
        Self::Symbolic(format!("refs/heads/{branch}"))
    }

    /// The short branch name, if HEAD names a branch.
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            Self::Symbolic(name) => name.strip_prefix("refs/heads/"),
            Self::Detached(_) => None,
        }
    }

    /// Parse the contents of a `HEAD` file.
    pub fn parse(contents: &str) -> Result<Self> {
        let line = contents.trim_end_matches(['\n', '\r']);
        let malformed = |reason: &str| RefError::Malformed {
            name: "HEAD".into(),
            reason: reason.into(),
        };
        if let Some(target) = line.strip_prefix(SYMBOLIC_PREFIX) {
            let target = target.trim();
            if target.is_empty() {
                return Err(malformed("empty symbolic ref"));
            }
            return Ok(Self::Symbolic(target.to_string()));
        }
        ObjectId::from_hex(line)
            .map(Self::Detached)
            .map_err(|e| malformed(&e.to_string()))
    }

    /// The exact bytes written to the `HEAD` file.
    pub fn to_file_contents(&self) -> String {
        match self {
            Self::Symbolic(name) => format!("{SYMBOLIC_PREFIX}{name}\n"),
            Self::Detached(id) => format!("{id}\n"),
        }
    }
}
