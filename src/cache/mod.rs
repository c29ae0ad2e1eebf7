//! cache
//!
//! Content-addressed store for analysis inputs.
//!
//! # Design
//!
//! The artifact never decides what is cached; it asks the store which of its
//! blob ids are missing and writes a [`BlobInfo`] only for those. A warm cache
//! therefore turns a repeated inspection of unchanged content into a lookup.
//!
//! Keys are [`ContentId`]s. Values carry a schema version so that a store
//! written by an older release can be detected and refilled instead of
//! misread.
//!
//! # Implementations
//!
//! - [`MemoryCache`] - process-local, for tests and one-shot runs
//! - [`FsCache`] - JSON files in a directory, safe across processes

mod fs_cache;
mod memory;

pub use fs_cache::FsCache;
pub use memory::MemoryCache;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::identity::FileDigest;
use crate::core::types::ContentId;

/// Version of the [`BlobInfo`] layout.
pub const BLOB_SCHEMA_VERSION: u32 = 1;

/// Errors from cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to read from the store.
    #[error("failed to read cache entry: {0}")]
    ReadError(String),

    /// Failed to write to the store.
    #[error("failed to write cache entry: {0}")]
    WriteError(String),

    /// A stored entry could not be decoded.
    #[error("corrupt cache entry {id}: {message}")]
    Corrupt {
        /// Key of the entry
        id: String,
        /// Decoder's description
        message: String,
    },
}

/// What the cache remembers about one blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    /// Layout version, [`BLOB_SCHEMA_VERSION`] when written by this release
    pub schema_version: u32,
    /// Identity of the blob
    pub digest: ContentId,
    /// Files in the blob, sorted by path
    pub files: Vec<FileDigest>,
}

impl BlobInfo {
    /// A blob record at the current schema version.
    pub fn new(digest: ContentId, files: Vec<FileDigest>) -> Self {
        Self {
            schema_version: BLOB_SCHEMA_VERSION,
            digest,
            files,
        }
    }
}

/// A store keyed by content identity.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait ArtifactCache: Send + Sync + std::fmt::Debug {
    /// Return the subset of `blob_ids` the store does not hold, in input
    /// order. Entries at an older schema version count as missing.
    fn missing_blobs(&self, blob_ids: &[ContentId]) -> Result<Vec<ContentId>, CacheError>;

    /// Store `info` under `id`, replacing any previous entry.
    fn put_blob(&self, id: &ContentId, info: &BlobInfo) -> Result<(), CacheError>;

    /// Fetch the entry stored under `id`.
    fn get_blob(&self, id: &ContentId) -> Result<Option<BlobInfo>, CacheError>;
}
