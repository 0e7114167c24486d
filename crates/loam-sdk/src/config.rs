use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Default name of the metadata directory inside a working directory.
pub const DEFAULT_METADATA_DIR: &str = ".git";

/// Name of the configuration file inside the metadata directory.
pub const CONFIG_FILE: &str = "loam.toml";

/// Repository settings, stored as `<metadata_dir>/loam.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Metadata directory name, relative to the working directory.
    pub metadata_dir: String,
    /// Entry names skipped at every depth when snapshotting the working
    /// directory. The metadata directory is always skipped.
    pub ignore: Vec<String>,
    /// zlib level for loose objects, 0-9.
    pub compression_level: u32,
    /// Re-hash objects when reading them back.
    pub verify_on_read: bool,
    /// Branch HEAD names after `init`.
    pub default_branch: String,
    /// Author and committer identity for new commits.
    pub user: Option<UserConfig>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            metadata_dir: DEFAULT_METADATA_DIR.into(),
            ignore: vec![".git".into(), "target".into(), "node_modules".into()],
            compression_level: 6,
            verify_on_read: false,
            default_branch: loam_refs::DEFAULT_BRANCH.into(),
            user: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub name: String,
    pub email: String,
}

impl RepositoryConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Load `loam.toml` from `metadata_dir`, or the defaults if the file
    /// does not exist.
    pub fn load_or_default(metadata_dir: &Path) -> SdkResult<Self> {
        match fs::read_to_string(metadata_dir.join(CONFIG_FILE)) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// The full ignore set, including the metadata directory itself.
    pub fn ignore_set(&self) -> BTreeSet<String> {
        let mut set: BTreeSet<String> = self.ignore.iter().cloned().collect();
        set.insert(self.metadata_dir.clone());
        set
    }
}
