//! cache::memory
//!
//! In-process cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{ArtifactCache, BlobInfo, CacheError, BLOB_SCHEMA_VERSION};
use crate::core::types::ContentId;

/// Cache backed by a mutex-guarded map. Contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    blobs: Mutex<HashMap<ContentId, BlobInfo>>,
}

impl MemoryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContentId, BlobInfo>> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl ArtifactCache for MemoryCache {
    fn missing_blobs(&self, blob_ids: &[ContentId]) -> Result<Vec<ContentId>, CacheError> {
        let blobs = self.lock();
        Ok(blob_ids
            .iter()
            .filter(|id| {
                blobs
                    .get(*id)
                    .map_or(true, |info| info.schema_version != BLOB_SCHEMA_VERSION)
            })
            .cloned()
            .collect())
    }

    fn put_blob(&self, id: &ContentId, info: &BlobInfo) -> Result<(), CacheError> {
        self.lock().insert(id.clone(), info.clone());
        Ok(())
    }

    fn get_blob(&self, id: &ContentId) -> Result<Option<BlobInfo>, CacheError> {
        Ok(self.lock().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let cache = MemoryCache::new();
        let id = ContentId::sha256_of(b"tree");
        assert!(cache.is_empty());
        assert_eq!(cache.get_blob(&id).unwrap(), None);

        let info = BlobInfo::new(id.clone(), vec![]);
        cache.put_blob(&id, &info).unwrap();
        assert_eq!(cache.get_blob(&id).unwrap(), Some(info));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_blobs_keeps_order() {
        let cache = MemoryCache::new();
        let a = ContentId::sha256_of(b"a");
        let b = ContentId::sha256_of(b"b");
        let c = ContentId::sha256_of(b"c");
        cache.put_blob(&b, &BlobInfo::new(b.clone(), vec![])).unwrap();

        let missing = cache
            .missing_blobs(&[c.clone(), b.clone(), a.clone()])
            .unwrap();
        assert_eq!(missing, vec![c, a]);
    }

    #[test]
    fn stale_schema_counts_as_missing() {
        let cache = MemoryCache::new();
        let id = ContentId::sha256_of(b"old");
        let mut info = BlobInfo::new(id.clone(), vec![]);
        info.schema_version = 0;
        cache.put_blob(&id, &info).unwrap();
        assert_eq!(cache.missing_blobs(&[id.clone()]).unwrap(), vec![id]);
    }
}
