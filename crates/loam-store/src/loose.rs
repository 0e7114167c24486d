//! Loose-object storage on the local filesystem.
//!
//! Each object lives in its own file at `objects/<2 hex>/<38 hex>`, holding
//! the zlib-compressed canonical encoding. The first two hex characters of
//! the digest pick a fan-out directory, which keeps any one directory's entry
//! count bounded.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use loam_crypto::ContentHasher;
use loam_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::compress::Compressor;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Options for opening a [`LooseObjectStore`].
#[derive(Clone, Copy, Debug)]
pub struct LooseStoreOptions {
    /// zlib level used for new objects (0-9).
    pub compression_level: u32,
    /// Re-hash every object on read and fail with
    /// [`StoreError::HashMismatch`] if the content does not match its name.
    pub verify_on_read: bool,
}

impl Default for LooseStoreOptions {
    fn default() -> Self {
        Self {
            compression_level: Compressor::DEFAULT_LEVEL,
            verify_on_read: false,
        }
    }
}

/// Filesystem-backed object store using git's loose-object layout.
///
/// Writes go to a temporary file inside the fan-out directory and are then
/// linked into place without clobbering, so readers never observe a partial
/// object and two writers racing on the same digest both succeed.
pub struct LooseObjectStore {
    objects_dir: PathBuf,
    compressor: Compressor,
    verify_on_read: bool,
}

impl LooseObjectStore {
    /// Open (creating if needed) the store rooted at `objects_dir`.
    pub fn open(objects_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with(objects_dir, LooseStoreOptions::default())
    }

    /// Open with explicit options.
    pub fn open_with(objects_dir: impl Into<PathBuf>, options: LooseStoreOptions) -> StoreResult<Self> {
        let objects_dir = objects_dir.into();
        fs::create_dir_all(&objects_dir)?;
        Ok(Self {
            objects_dir,
            compressor: Compressor::new(options.compression_level),
            verify_on_read: options.verify_on_read,
        })
    }

    /// The directory holding the fan-out subdirectories.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Location of the file for `id`: `<objects>/<2 hex>/<38 hex>`.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        let (dir, file) = hex.split_at(2);
        self.objects_dir.join(dir).join(file)
    }

    /// Every object ID present, sorted. Stray files that are not named like
    /// objects (temp files, `pack/`, `info/`) are skipped.
    pub fn all_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        for dir in fs::read_dir(&self.objects_dir)? {
            let dir = dir?;
            let prefix = dir.file_name();
            let Some(prefix) = prefix.to_str().filter(|p| is_hex(p, 2)) else {
                continue;
            };
            if !dir.file_type()?.is_dir() {
                continue;
            }
            for file in fs::read_dir(dir.path())? {
                let file = file?;
                let name = file.file_name();
                let Some(rest) = name.to_str().filter(|n| is_hex(n, ObjectId::HEX_LEN - 2)) else {
                    continue;
                };
                if let Ok(id) = ObjectId::from_hex(&format!("{prefix}{rest}")) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl ObjectStore for LooseObjectStore {
    fn read_encoded(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let encoded = self.compressor.decompress(&compressed)?;
        if self.verify_on_read {
            let computed = ContentHasher::digest(&encoded);
            if computed != *id {
                return Err(StoreError::HashMismatch { id: *id, computed });
            }
        }
        Ok(Some(encoded))
    }

    fn write_encoded(&self, id: &ObjectId, encoded: &[u8]) -> StoreResult<bool> {
        let path = self.object_path(id);
        if path.try_exists()? {
            debug!(object = %id, "object already present, skipping write");
            return Ok(false);
        }

        // Fan-out directory creation tolerates "already exists".
        let dir = path.parent().unwrap_or(&self.objects_dir);
        fs::create_dir_all(dir)?;

        let compressed = self.compressor.compress(encoded)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&compressed)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(object = %id, bytes = compressed.len(), "wrote loose object");
                Ok(true)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(object = %id, "object appeared concurrently, keeping existing file");
                Ok(false)
            }
            Err(e) => Err(e.error.into()),
        }
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).try_exists()?)
    }
}

impl std::fmt::Debug for LooseObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LooseObjectStore")
            .field("objects_dir", &self.objects_dir)
            .field("compression_level", &self.compressor.level())
            .field("verify_on_read", &self.verify_on_read)
            .finish()
    }
}

fn is_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}
