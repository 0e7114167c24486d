//! On-disk ref storage in the git metadata layout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use loam_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::Head;

/// Refs stored as plain files under a metadata directory (`.git`).
///
/// Every write goes through a temporary file in the target directory that
/// is renamed over the destination, so a reader never sees a partial ref.
#[derive(Debug, Clone)]
pub struct FsRefStore {
    git_dir: PathBuf,
}

impl FsRefStore {
    /// Refs rooted at `git_dir`. Nothing is created until written.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    /// The metadata directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Create `refs/heads` and `refs/tags`, and point HEAD at
    /// `default_branch` unless HEAD already exists.
    ///
    /// Returns `true` if HEAD was written.
    pub fn init_layout(&self, default_branch: &str) -> Result<bool> {
        fs::create_dir_all(self.git_dir.join("refs").join("heads"))?;
        fs::create_dir_all(self.git_dir.join("refs").join("tags"))?;
        if self.head_path().try_exists()? {
            debug!(git_dir = %self.git_dir.display(), "HEAD already present");
            return Ok(false);
        }
        self.set_head(&Head::branch(default_branch))?;
        Ok(true)
    }

    fn head_path(&self) -> PathBuf {
        self.git_dir.join("HEAD")
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.git_dir.clone(), |path, part| path.join(part))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let dir = path.parent().unwrap_or(&self.git_dir);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read_optional(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn collect(&self, dir: &Path, name: &str, out: &mut Vec<(String, ObjectId)>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let child = format!("{name}/{file_name}");
            if entry.file_type()?.is_dir() {
                self.collect(&entry.path(), &child, out)?;
            } else if validate_ref_name(&child).is_ok() {
                if let Some(id) = self.read_ref(&child)? {
                    out.push((child, id));
                }
            }
        }
        Ok(())
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>> {
        validate_ref_name(name)?;
        let Some(contents) = Self::read_optional(&self.ref_path(name))? else {
            return Ok(None);
        };
        ObjectId::from_hex(contents.trim())
            .map(Some)
            .map_err(|e| RefError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    fn write_ref(&self, name: &str, id: &ObjectId) -> Result<()> {
        validate_ref_name(name)?;
        self.write_atomic(&self.ref_path(name), &format!("{id}\n"))?;
        debug!(name, target = %id, "updated ref");
        Ok(())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>> {
        let mut refs = Vec::new();
        self.collect(&self.git_dir.join("refs"), "refs", &mut refs)?;
        refs.retain(|(name, _)| name.starts_with(prefix));
        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    fn head(&self) -> Result<Option<Head>> {
        Self::read_optional(&self.head_path())?
            .map(|contents| Head::parse(&contents))
            .transpose()
    }

    fn set_head(&self, head: &Head) -> Result<()> {
        if let Head::Symbolic(name) = head {
            validate_ref_name(name)?;
        }
        self.write_atomic(&self.head_path(), &head.to_file_contents())?;
        debug!(head = %head.to_file_contents().trim_end(), "updated HEAD");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_BRANCH;

    fn temp_refs() -> (tempfile::TempDir, FsRefStore) {
        let dir = tempfile::tempdir().unwrap();
        let refs = FsRefStore::new(dir.path().join(".git"));
        (dir, refs)
    }

    fn id(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 20])
    }

    #[test]
    fn init_writes_default_head() {
        let (_dir, refs) = temp_refs();
        assert!(refs.init_layout(DEFAULT_BRANCH).unwrap());
        let head = fs::read_to_string(refs.git_dir().join("HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/main\n");
        assert!(refs.git_dir().join("refs/heads").is_dir());
        assert!(refs.git_dir().join("refs/tags").is_dir());
    }

    #[test]
    fn init_keeps_existing_head() {
        let (_dir, refs) = temp_refs();
        refs.init_layout("main").unwrap();
        refs.set_head(&Head::branch("dev")).unwrap();
        assert!(!refs.init_layout("main").unwrap());
        assert_eq!(refs.head().unwrap(), Some(Head::branch("dev")));
    }

    #[test]
    fn unborn_branch_resolves_to_none() {
        let (_dir, refs) = temp_refs();
        refs.init_layout("main").unwrap();
        assert_eq!(refs.resolve_head().unwrap(), None);
    }

    #[test]
    fn missing_head_is_none() {
        let (_dir, refs) = temp_refs();
        assert_eq!(refs.head().unwrap(), None);
        assert_eq!(refs.resolve_head().unwrap(), None);
    }

    #[test]
    fn write_and_read_ref() {
        let (_dir, refs) = temp_refs();
        refs.write_ref("refs/heads/feature/x", &id(3)).unwrap();
        assert_eq!(refs.read_ref("refs/heads/feature/x").unwrap(), Some(id(3)));
        let on_disk = fs::read_to_string(refs.git_dir().join("refs/heads/feature/x")).unwrap();
        assert_eq!(on_disk, format!("{}\n", id(3)));
    }

    #[test]
    fn advance_symbolic_head_moves_branch() {
        let (_dir, refs) = temp_refs();
        refs.init_layout("main").unwrap();
        refs.advance_head(&id(1)).unwrap();
        refs.advance_head(&id(2)).unwrap();
        assert_eq!(refs.read_ref("refs/heads/main").unwrap(), Some(id(2)));
        assert_eq!(refs.resolve_head().unwrap(), Some(id(2)));
        assert_eq!(refs.head().unwrap(), Some(Head::branch("main")));
    }

    #[test]
    fn advance_detached_head_moves_head() {
        let (_dir, refs) = temp_refs();
        refs.set_head(&Head::Detached(id(1))).unwrap();
        refs.advance_head(&id(2)).unwrap();
        assert_eq!(refs.head().unwrap(), Some(Head::Detached(id(2))));
        assert!(refs.list_refs("refs/").unwrap().is_empty());
    }

    #[test]
    fn advance_without_head_fails() {
        let (_dir, refs) = temp_refs();
        let err = refs.advance_head(&id(1)).unwrap_err();
        assert!(matches!(err, RefError::NotFound { .. }));
    }

    #[test]
    fn list_refs_sorted_and_filtered() {
        let (_dir, refs) = temp_refs();
        refs.write_ref("refs/heads/main", &id(1)).unwrap();
        refs.write_ref("refs/heads/dev", &id(2)).unwrap();
        refs.write_ref("refs/tags/v1", &id(3)).unwrap();

        let heads = refs.list_refs("refs/heads/").unwrap();
        assert_eq!(
            heads,
            vec![
                ("refs/heads/dev".to_string(), id(2)),
                ("refs/heads/main".to_string(), id(1)),
            ]
        );
        assert_eq!(refs.list_refs("refs/").unwrap().len(), 3);
    }

    #[test]
    fn malformed_ref_file() {
        let (_dir, refs) = temp_refs();
        refs.init_layout("main").unwrap();
        fs::write(refs.git_dir().join("refs/heads/main"), "not a digest\n").unwrap();
        assert!(matches!(
            refs.read_ref("refs/heads/main"),
            Err(RefError::Malformed { .. })
        ));
    }

    #[test]
    fn invalid_names_rejected() {
        let (_dir, refs) = temp_refs();
        assert!(matches!(
            refs.write_ref("refs/heads/../../evil", &id(1)),
            Err(RefError::InvalidRefName { .. })
        ));
        assert!(refs.set_head(&Head::Symbolic("HEAD".into())).is_err());
    }
}
