//! artifact::identity
//!
//! Content identity of an acquired working tree.
//!
//! # Algorithm
//!
//! 1. Enumerate the tree through a [`Walker`] (`.git` is never included).
//! 2. Digest every entry: regular files by their bytes, symlinks by their
//!    target path. Links are never followed.
//! 3. Sort entries by the raw bytes of their `/`-separated relative path.
//! 4. Feed `<kind> <path>\0<entry digest>\n` for each entry, in order, into
//!    one SHA-256 and render it as `sha256:<hex>`.
//!
//! Paths are hashed as raw bytes, not through their lossy UTF-8 rendering,
//! so two names that are not valid UTF-8 never collapse into one.
//!
//! The result depends only on paths and bytes: not on where the tree lives,
//! how it was obtained, timestamps, permissions, or walk order. Empty
//! directories contribute nothing.
//!
//! # Example
//!
//! ```
//! use gitsnap::artifact::identity::compute_identity;
//! use gitsnap::core::context::OpContext;
//! use gitsnap::walker::FsWalker;
//!
//! let a = tempfile::TempDir::new().unwrap();
//! let b = tempfile::TempDir::new().unwrap();
//! std::fs::write(a.path().join("file"), "same").unwrap();
//! std::fs::write(b.path().join("file"), "same").unwrap();
//!
//! let ctx = OpContext::new();
//! let walker = FsWalker::new();
//! let first = compute_identity(a.path(), &walker, &ctx).unwrap();
//! let second = compute_identity(b.path(), &walker, &ctx).unwrap();
//! assert_eq!(first.id, second.id);
//! assert!(first.id.as_str().starts_with("sha256:"));
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::context::OpContext;
use crate::core::types::ContentId;
use crate::walker::{EntryKind, FileEntry, WalkError, Walker};

/// Digest of one file in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// Path relative to the tree root, `/`-separated
    pub path: String,
    /// `sha256:<hex>` of the file bytes (or link target)
    pub digest: ContentId,
    /// Size in bytes
    pub size: u64,
}

/// Identity of a whole tree plus the per-file digests it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDigest {
    /// Identity of the tree
    pub id: ContentId,
    /// Per-file digests, sorted by path
    pub files: Vec<FileDigest>,
}

/// Errors from identity computation.
pub type IdentityError = WalkError;

fn digest_entry(entry: &FileEntry) -> io::Result<ContentId> {
    let mut hasher = Sha256::new();
    match entry.kind {
        EntryKind::File => {
            let mut reader = BufReader::new(File::open(&entry.abs_path)?);
            io::copy(&mut reader, &mut hasher)?;
        }
        EntryKind::Symlink => {
            let target = std::fs::read_link(&entry.abs_path)?;
            hasher.update(target.as_os_str().as_encoded_bytes());
        }
    }
    Ok(ContentId::from_sha256(hasher))
}

/// Raw bytes of `entry`'s path below `root`, components joined by `/`.
fn path_key(root: &Path, entry: &FileEntry) -> Vec<u8> {
    let rel = entry.abs_path.strip_prefix(root).unwrap_or(&entry.abs_path);
    let mut key = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            if !key.is_empty() {
                key.push(b'/');
            }
            key.extend_from_slice(part.as_encoded_bytes());
        }
    }
    key
}

/// An entry waiting to be combined: sort key, kind, digest.
type Pending = (Vec<u8>, EntryKind, FileDigest);

/// Combine sorted per-file digests into the tree identity.
fn combine(entries: &[Pending]) -> ContentId {
    let mut hasher = Sha256::new();
    for (key, kind, file) in entries {
        hasher.update(kind.tag().as_bytes());
        hasher.update(b" ");
        hasher.update(key);
        hasher.update(b"\0");
        hasher.update(file.digest.as_str().as_bytes());
        hasher.update(b"\n");
    }
    ContentId::from_sha256(hasher)
}

/// Compute the content identity of the tree rooted at `root`.
///
/// Checks `ctx` before each file, so a cancelled context stops hashing a
/// large tree promptly.
///
/// # Errors
///
/// - [`WalkError::NotADirectory`] if `root` is not a directory
/// - [`WalkError::Io`] if a file cannot be read
/// - [`WalkError::Aborted`] if `ctx` is cancelled or past its deadline
pub fn compute_identity(
    root: &Path,
    walker: &dyn Walker,
    ctx: &OpContext,
) -> Result<TreeDigest, IdentityError> {
    let mut entries = Vec::new();
    walker.walk(root, &mut |entry| {
        ctx.check()
            .map_err(|e| WalkError::Aborted(e.to_string()))?;
        let digest = digest_entry(entry).map_err(|source| WalkError::Io {
            path: entry.abs_path.clone(),
            source,
        })?;
        entries.push((
            path_key(root, entry),
            entry.kind,
            FileDigest {
                path: entry.rel_path.clone(),
                digest,
                size: entry.size,
            },
        ));
        Ok(())
    })?;

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let id = combine(&entries);
    tracing::debug!(root = %root.display(), files = entries.len(), %id, "computed tree identity");

    Ok(TreeDigest {
        id,
        files: entries.into_iter().map(|(_, _, file)| file).collect(),
    })
}
