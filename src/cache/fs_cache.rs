//! cache::fs_cache
//!
//! Directory-backed cache shared between processes.
//!
//! # Storage
//!
//! - `<dir>/blobs/<algorithm>/<hex>.json` - one [`BlobInfo`] per blob
//! - `<dir>/lock` - OS-level lock file
//!
//! Readers take a shared lock, writers an exclusive one, so two `gitsnap`
//! processes inspecting the same content never observe a half-written entry.
//! Writes also go through a temp file and a rename.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::{ArtifactCache, BlobInfo, CacheError, BLOB_SCHEMA_VERSION};
use crate::core::types::ContentId;

/// Name of the lock file inside the cache directory.
const LOCK_FILE: &str = "lock";

/// Held lock on the cache directory; released on drop.
struct DirLock {
    file: File,
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Cache storing blobs as JSON files.
#[derive(Debug, Clone)]
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    /// Open (creating if needed) a cache rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::WriteError` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(root.join("blobs")).map_err(|e| {
            CacheError::WriteError(format!("cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &ContentId) -> PathBuf {
        self.root
            .join("blobs")
            .join(id.algorithm())
            .join(format!("{}.json", id.hex()))
    }

    fn lock(&self, exclusive: bool) -> Result<DirLock, CacheError> {
        let path = self.root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| CacheError::WriteError(format!("cannot open lock file: {}", e)))?;
        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        };
        locked.map_err(|e| CacheError::ReadError(format!("cannot lock cache: {}", e)))?;
        Ok(DirLock { file })
    }

    fn read_entry(&self, id: &ContentId) -> Result<Option<BlobInfo>, CacheError> {
        let path = self.blob_path(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::ReadError(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::Corrupt {
                id: id.to_string(),
                message: e.to_string(),
            })
    }
}

impl ArtifactCache for FsCache {
    fn missing_blobs(&self, blob_ids: &[ContentId]) -> Result<Vec<ContentId>, CacheError> {
        let _guard = self.lock(false)?;
        let mut missing = Vec::new();
        for id in blob_ids {
            let present = match self.read_entry(id) {
                Ok(Some(info)) => info.schema_version == BLOB_SCHEMA_VERSION,
                Ok(None) => false,
                Err(CacheError::Corrupt { message, .. }) => {
                    tracing::warn!(%id, %message, "ignoring corrupt cache entry");
                    false
                }
                Err(e) => return Err(e),
            };
            if !present {
                missing.push(id.clone());
            }
        }
        Ok(missing)
    }

    fn put_blob(&self, id: &ContentId, info: &BlobInfo) -> Result<(), CacheError> {
        let content = serde_json::to_string_pretty(info)
            .map_err(|e| CacheError::WriteError(format!("cannot serialize blob: {}", e)))?;

        let path = self.blob_path(id);
        let _guard = self.lock(true)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)
                .map_err(|e| CacheError::WriteError(format!("cannot create temp file: {}", e)))?;
            file.write_all(content.as_bytes())
                .map_err(|e| CacheError::WriteError(format!("cannot write blob: {}", e)))?;
            file.sync_all()
                .map_err(|e| CacheError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }
        fs::rename(&temp_path, &path)
            .map_err(|e| CacheError::WriteError(format!("cannot rename temp file: {}", e)))?;

        tracing::debug!(%id, path = %path.display(), "stored blob");
        Ok(())
    }

    fn get_blob(&self, id: &ContentId) -> Result<Option<BlobInfo>, CacheError> {
        let _guard = self.lock(false)?;
        self.read_entry(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::identity::FileDigest;
    use tempfile::TempDir;

    fn info(id: &ContentId) -> BlobInfo {
        BlobInfo::new(
            id.clone(),
            vec![FileDigest {
                path: "README.md".into(),
                digest: ContentId::sha256_of(b"hello"),
                size: 5,
            }],
        )
    }

    #[test]
    fn put_then_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = FsCache::open(dir.path()).unwrap();
        let id = ContentId::sha256_of(b"tree");

        assert_eq!(cache.get_blob(&id).unwrap(), None);
        cache.put_blob(&id, &info(&id)).unwrap();
        assert_eq!(cache.get_blob(&id).unwrap(), Some(info(&id)));

        let expected = dir
            .path()
            .join("blobs/sha256")
            .join(format!("{}.json", id.hex()));
        assert!(expected.exists());
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let id = ContentId::sha256_of(b"tree");
        FsCache::open(dir.path())
            .unwrap()
            .put_blob(&id, &info(&id))
            .unwrap();

        let reopened = FsCache::open(dir.path()).unwrap();
        assert!(reopened.missing_blobs(&[id.clone()]).unwrap().is_empty());
    }

    #[test]
    fn missing_blobs_reports_absent_and_corrupt() {
        let dir = TempDir::new().unwrap();
        let cache = FsCache::open(dir.path()).unwrap();
        let stored = ContentId::sha256_of(b"stored");
        let absent = ContentId::sha256_of(b"absent");
        let corrupt = ContentId::sha256_of(b"corrupt");

        cache.put_blob(&stored, &info(&stored)).unwrap();
        cache.put_blob(&corrupt, &info(&corrupt)).unwrap();
        fs::write(cache.blob_path(&corrupt), "{ not json").unwrap();

        let missing = cache
            .missing_blobs(&[stored, absent.clone(), corrupt.clone()])
            .unwrap();
        assert_eq!(missing, vec![absent, corrupt.clone()]);

        assert!(matches!(
            cache.get_blob(&corrupt),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/cache");
        let cache = FsCache::open(&nested).unwrap();
        assert!(nested.join("blobs").is_dir());
        assert_eq!(cache.root(), nested);
    }
}
