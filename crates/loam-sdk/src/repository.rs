use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use loam_refs::{FsRefStore, Head, RefStore};
use loam_store::{
    Blob, Commit, LooseObjectStore, LooseStoreOptions, Object, ObjectKind, ObjectStore, TreeEntry,
};
use loam_types::{Clock, ObjectId, Signature, SystemClock};
use tracing::info;

use crate::builder::TreeBuilder;
use crate::commit::{CommitRequest, LogEntry};
use crate::config::{RepositoryConfig, CONFIG_FILE, DEFAULT_METADATA_DIR};
use crate::error::{SdkError, SdkResult};
use crate::snapshot::{FsSnapshot, Snapshot};

/// A working directory plus its metadata directory.
///
/// The location is always explicit: nothing is discovered from the current
/// directory or the executable's path.
pub struct Repository {
    work_dir: PathBuf,
    git_dir: PathBuf,
    config: RepositoryConfig,
    store: Arc<dyn ObjectStore>,
    refs: FsRefStore,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Initialize a repository in `work_dir` with the default configuration.
    pub fn init(work_dir: impl Into<PathBuf>) -> SdkResult<Self> {
        Self::init_with(work_dir, RepositoryConfig::default())
    }

    /// Initialize a repository in `work_dir`.
    ///
    /// Creates `objects/`, `refs/heads`, `refs/tags`, `HEAD` and
    /// `loam.toml`. Re-running it on an existing repository creates whatever
    /// is missing and never overwrites `HEAD` or the config file.
    pub fn init_with(work_dir: impl Into<PathBuf>, config: RepositoryConfig) -> SdkResult<Self> {
        let work_dir = work_dir.into();
        let git_dir = work_dir.join(&config.metadata_dir);
        fs::create_dir_all(&git_dir)?;

        let refs = FsRefStore::new(&git_dir);
        let wrote_head = refs.init_layout(&config.default_branch)?;

        let config_path = git_dir.join(CONFIG_FILE);
        if !config_path.try_exists()? {
            fs::write(&config_path, config.to_toml()?)?;
        }

        let repo = Self::assemble(work_dir, git_dir, config, refs)?;
        if wrote_head {
            info!(path = %repo.git_dir.display(), "initialized empty repository");
        } else {
            info!(path = %repo.git_dir.display(), "reinitialized existing repository");
        }
        Ok(repo)
    }

    /// Open the repository whose metadata lives in `work_dir/.git`.
    pub fn open(work_dir: impl Into<PathBuf>) -> SdkResult<Self> {
        Self::open_in(work_dir, DEFAULT_METADATA_DIR)
    }

    /// Open a repository with a non-default metadata directory name.
    pub fn open_in(work_dir: impl Into<PathBuf>, metadata_dir: &str) -> SdkResult<Self> {
        let work_dir = work_dir.into();
        let git_dir = work_dir.join(metadata_dir);
        if !git_dir.join("objects").is_dir() || !git_dir.join("HEAD").is_file() {
            return Err(SdkError::NotInitialized(work_dir.display().to_string()));
        }
        let mut config = RepositoryConfig::load_or_default(&git_dir)?;
        config.metadata_dir = metadata_dir.to_string();
        let refs = FsRefStore::new(&git_dir);
        Self::assemble(work_dir, git_dir, config, refs)
    }

    fn assemble(
        work_dir: PathBuf,
        git_dir: PathBuf,
        config: RepositoryConfig,
        refs: FsRefStore,
    ) -> SdkResult<Self> {
        let options = LooseStoreOptions {
            compression_level: config.compression_level,
            verify_on_read: config.verify_on_read,
        };
        let store = LooseObjectStore::open_with(git_dir.join("objects"), options)?;
        Ok(Self {
            work_dir,
            git_dir,
            config,
            store: Arc::new(store),
            refs,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock commits take their timestamp from.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ---- Content operations ----

    /// Compute the blob ID for `data`, storing it when `write` is set.
    pub fn hash_object(&self, data: &[u8], write: bool) -> SdkResult<ObjectId> {
        let object = Object::Blob(Blob::new(data.to_vec()));
        if write {
            Ok(self.store.put(&object)?)
        } else {
            Ok(object.compute_id())
        }
    }

    /// Read a blob's bytes; other kinds fail with `WrongKind`.
    pub fn read_blob(&self, id: &ObjectId) -> SdkResult<Vec<u8>> {
        Ok(self.store.get_blob(id)?.data)
    }

    /// The immediate entries of a tree, in stored order.
    pub fn list_tree(&self, id: &ObjectId) -> SdkResult<Vec<TreeEntry>> {
        Ok(self.store.get_tree(id)?.entries)
    }

    /// Fetch and decode an object of any kind.
    pub fn cat_object(&self, id: &ObjectId) -> SdkResult<Object> {
        Ok(self.store.get(id)?)
    }

    pub fn object_kind(&self, id: &ObjectId) -> SdkResult<ObjectKind> {
        Ok(self.store.kind_of(id)?)
    }

    /// Payload size in bytes, as recorded in the object header.
    pub fn object_size(&self, id: &ObjectId) -> SdkResult<u64> {
        Ok(self.store.read_required(id)?.size)
    }

    // ---- Trees and commits ----

    /// Snapshot the working directory into tree objects.
    pub fn write_tree(&self) -> SdkResult<ObjectId> {
        self.build_tree(&FsSnapshot::new(&self.work_dir))
    }

    /// Build and store the tree for an arbitrary snapshot, applying the
    /// configured ignore set.
    pub fn build_tree(&self, snapshot: &dyn Snapshot) -> SdkResult<ObjectId> {
        TreeBuilder::new(self.store.as_ref())
            .with_ignore(self.config.ignore_set())
            .build(snapshot, Path::new(""))
    }

    /// Write a commit object without touching any ref.
    ///
    /// The tree (and parent, if given) must already be stored with the
    /// right kinds.
    pub fn commit_tree(&self, request: CommitRequest) -> SdkResult<ObjectId> {
        self.store.get_tree(&request.tree)?;
        if let Some(parent) = &request.parent {
            self.store.get_commit(parent)?;
        }

        let identity = request
            .author
            .clone()
            .or_else(|| self.config.user.clone())
            .ok_or(SdkError::MissingIdentity)?;
        let signature = Signature::new(identity.name, identity.email, self.clock.now());

        let commit = Commit {
            tree: request.tree,
            parent: request.parent,
            author: signature.clone(),
            committer: signature,
            message: request.effective_message(),
        };
        Ok(self.store.put(&Object::Commit(commit))?)
    }

    /// Commit the working directory on top of HEAD and advance the branch
    /// HEAD names.
    pub fn commit(&self, message: impl Into<String>) -> SdkResult<ObjectId> {
        let tree = self.write_tree()?;
        let mut request = CommitRequest::new(tree, message);
        if let Some(parent) = self.refs.resolve_head()? {
            request = request.with_parent(parent);
        }
        let id = self.commit_tree(request)?;
        self.refs.advance_head(&id)?;

        let branch = self.head()?.and_then(|h| h.branch_name().map(str::to_owned));
        info!(commit = %id, tree = %tree, branch = branch.as_deref().unwrap_or("(detached)"), "committed");
        Ok(id)
    }

    /// Walk first parents from HEAD, newest first, at most `limit` commits.
    pub fn log(&self, limit: usize) -> SdkResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut next = self.refs.resolve_head()?;
        while let Some(id) = next {
            if entries.len() >= limit {
                break;
            }
            let commit = self.store.get_commit(&id)?;
            next = commit.parent;
            entries.push(LogEntry { id, commit });
        }
        Ok(entries)
    }

    // ---- Accessors ----

    pub fn head(&self) -> SdkResult<Option<Head>> {
        Ok(self.refs.head()?)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn refs(&self) -> &FsRefStore {
        &self.refs
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("work_dir", &self.work_dir)
            .field("git_dir", &self.git_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;
    use crate::snapshot::MemorySnapshot;
    use chrono::{FixedOffset, TimeZone};
    use loam_store::{EntryMode, StoreError};
    use loam_types::FixedClock;

    const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    fn with_user() -> RepositoryConfig {
        RepositoryConfig {
            user: Some(UserConfig {
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
            }),
            ..Default::default()
        }
    }

    fn fixed_clock(seconds: i64) -> Arc<dyn Clock> {
        let when = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .timestamp_opt(seconds, 0)
            .unwrap();
        Arc::new(FixedClock(when))
    }

    fn temp_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_with(dir.path(), with_user())
            .unwrap()
            .with_clock(fixed_clock(1_700_000_000));
        (dir, repo)
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    #[test]
    fn init_creates_git_layout() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let git = dir.path().join(".git");
        assert_eq!(fs::read_to_string(git.join("HEAD")).unwrap(), "ref: refs/heads/main\n");
        assert!(git.join("objects").is_dir());
        assert!(git.join("refs").join("heads").is_dir());
        assert!(git.join(CONFIG_FILE).is_file());
    }

    #[test]
    fn reinit_keeps_head() {
        let (dir, repo) = temp_repo();
        repo.refs().set_head(&Head::branch("dev")).unwrap();
        let again = Repository::init(dir.path()).unwrap();
        assert_eq!(again.head().unwrap(), Some(Head::branch("dev")));
    }

    #[test]
    fn open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::open(dir.path()).unwrap_err();
        assert!(matches!(err, SdkError::NotInitialized(_)));
    }

    #[test]
    fn open_loads_config_file() {
        let (dir, _repo) = temp_repo();
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.config().user.as_ref().unwrap().name, "Ada Lovelace");
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    #[test]
    fn hello_blob_roundtrip() {
        let (dir, repo) = temp_repo();
        let id = repo.hash_object(b"hello\n", true).unwrap();
        assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert!(dir
            .path()
            .join(".git/objects/ce/013625030ba8dba906f756967f9e9ca394464a")
            .is_file());
        assert_eq!(repo.read_blob(&id).unwrap(), b"hello\n");
        assert_eq!(repo.cat_object(&id).unwrap(), Object::Blob(Blob::new(b"hello\n".to_vec())));
        assert_eq!(repo.object_size(&id).unwrap(), 6);
    }

    #[test]
    fn hash_without_write_stores_nothing() {
        let (_dir, repo) = temp_repo();
        let id = repo.hash_object(b"", false).unwrap();
        assert_eq!(id.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
        assert!(!repo.store().exists(&id).unwrap());
    }

    #[test]
    fn missing_object_is_not_found() {
        let (_dir, repo) = temp_repo();
        let id = ObjectId::from_hash([0xab; 20]);
        assert!(matches!(
            repo.cat_object(&id),
            Err(SdkError::Store(StoreError::NotFound(_)))
        ));
        assert!(matches!(
            repo.list_tree(&id),
            Err(SdkError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn read_blob_rejects_tree() {
        let (_dir, repo) = temp_repo();
        let tree = repo.write_tree().unwrap();
        assert!(matches!(
            repo.read_blob(&tree),
            Err(SdkError::Store(StoreError::WrongKind { .. }))
        ));
        assert_eq!(repo.object_kind(&tree).unwrap(), ObjectKind::Tree);
    }

    // -----------------------------------------------------------------------
    // Trees
    // -----------------------------------------------------------------------

    #[test]
    fn empty_work_dir_writes_empty_tree() {
        let (_dir, repo) = temp_repo();
        let id = repo.write_tree().unwrap();
        assert_eq!(id.to_hex(), EMPTY_TREE);
        assert!(repo.list_tree(&id).unwrap().is_empty());
    }

    #[test]
    fn write_tree_skips_metadata_and_ignored() {
        let (dir, repo) = temp_repo();
        fs::write(dir.path().join("b.txt"), "b\n").unwrap();
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        fs::write(dir.path().join("target/debug/app"), "bin").unwrap();

        let id = repo.write_tree().unwrap();
        let entries = repo.list_tree(&id).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "src"]);
        assert_eq!(entries[2].mode, EntryMode::Directory);
        assert_eq!(repo.write_tree().unwrap(), id);
    }

    #[test]
    fn build_tree_from_memory_snapshot() {
        let (_dir, repo) = temp_repo();
        let snap = MemorySnapshot::new()
            .with_file("hello.txt", "hello\n")
            .with_file(".git/config", "ignored");
        let id = repo.build_tree(&snap).unwrap();
        let entries = repo.list_tree(&id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].object_id.to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    #[test]
    fn commit_tree_uses_clock_and_identity() {
        let (_dir, repo) = temp_repo();
        let tree = repo.write_tree().unwrap();
        let id = repo.commit_tree(CommitRequest::new(tree, "first")).unwrap();

        let commit = repo.store().get_commit(&id).unwrap();
        assert_eq!(commit.tree, tree);
        assert_eq!(commit.parent, None);
        assert_eq!(commit.message, "first\n");
        assert_eq!(commit.author.name(), "Ada Lovelace");
        assert_eq!(commit.committer.timestamp(), 1_700_000_000);
        assert_eq!(commit.committer.offset_seconds(), -5 * 3600);
        // commit-tree never moves a ref
        assert_eq!(repo.refs().resolve_head().unwrap(), None);
    }

    #[test]
    fn commit_tree_is_deterministic_under_fixed_clock() {
        let (_dir, repo) = temp_repo();
        let tree = repo.write_tree().unwrap();
        let a = repo.commit_tree(CommitRequest::new(tree, "same")).unwrap();
        let b = repo.commit_tree(CommitRequest::new(tree, "same")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn later_clock_changes_commit_id() {
        let (dir, repo) = temp_repo();
        let tree = repo.write_tree().unwrap();
        let a = repo.commit_tree(CommitRequest::new(tree, "same")).unwrap();
        let later = Repository::open(dir.path())
            .unwrap()
            .with_clock(fixed_clock(1_700_000_060));
        let b = later.commit_tree(CommitRequest::new(tree, "same")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn commit_tree_validates_inputs() {
        let (_dir, repo) = temp_repo();
        let blob = repo.hash_object(b"x", true).unwrap();
        assert!(matches!(
            repo.commit_tree(CommitRequest::new(blob, "bad")),
            Err(SdkError::Store(StoreError::WrongKind { .. }))
        ));
        let tree = repo.write_tree().unwrap();
        let missing = ObjectId::from_hash([9; 20]);
        assert!(matches!(
            repo.commit_tree(CommitRequest::new(tree, "bad").with_parent(missing)),
            Err(SdkError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn commit_requires_identity() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let tree = repo.write_tree().unwrap();
        assert!(matches!(
            repo.commit_tree(CommitRequest::new(tree, "x")),
            Err(SdkError::MissingIdentity)
        ));
        let id = repo
            .commit_tree(CommitRequest::new(tree, "x").with_author("Bob", "bob@example.com"))
            .unwrap();
        assert_eq!(repo.store().get_commit(&id).unwrap().author.name(), "Bob");
    }

    #[test]
    fn commit_advances_branch_and_chains_parents() {
        let (dir, repo) = temp_repo();
        fs::write(dir.path().join("file.txt"), "v1\n").unwrap();
        let first = repo.commit("first").unwrap();
        fs::write(dir.path().join("file.txt"), "v2\n").unwrap();
        let second = repo.commit("second").unwrap();

        let on_disk = fs::read_to_string(dir.path().join(".git/refs/heads/main")).unwrap();
        assert_eq!(on_disk, format!("{second}\n"));
        assert_eq!(repo.store().get_commit(&second).unwrap().parent, Some(first));

        let log = repo.log(10).unwrap();
        let ids: Vec<ObjectId> = log.iter().map(|e| e.id).collect();
        assert_eq!(ids, [second, first]);
        assert_eq!(log[0].commit.summary(), "second");
        assert_eq!(repo.log(1).unwrap().len(), 1);
    }

    #[test]
    fn log_on_unborn_branch_is_empty() {
        let (_dir, repo) = temp_repo();
        assert!(repo.log(10).unwrap().is_empty());
    }
}
