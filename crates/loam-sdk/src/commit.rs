use loam_store::Commit;
use loam_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::config::UserConfig;

/// Everything needed to write a commit except its timestamp, which comes
/// from the repository's clock.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub tree: ObjectId,
    pub parent: Option<ObjectId>,
    pub message: String,
    /// Overrides the configured identity for both author and committer.
    pub author: Option<UserConfig>,
}

impl CommitRequest {
    pub fn new(tree: ObjectId, message: impl Into<String>) -> Self {
        Self {
            tree,
            parent: None,
            message: message.into(),
            author: None,
        }
    }

    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author = Some(UserConfig {
            name: name.into(),
            email: email.into(),
        });
        self
    }

    /// The message as stored: always newline-terminated unless empty.
    pub fn effective_message(&self) -> String {
        if self.message.is_empty() || self.message.ends_with('\n') {
            self.message.clone()
        } else {
            format!("{}\n", self.message)
        }
    }
}

/// One step of a first-parent history walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
}
