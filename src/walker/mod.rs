//! walker
//!
//! Filesystem enumeration for acquired working trees.
//!
//! # Design
//!
//! The [`Walker`] trait is the seam between acquisition and analysis: the
//! artifact hands a root directory to a walker and receives one
//! [`FileEntry`] per regular file or symlink. Implementations choose what to
//! skip; the order they report entries in does not matter, since consumers
//! that need determinism sort by [`FileEntry::rel_path`].
//!
//! [`FsWalker`] is the default implementation.

mod fs;

pub use fs::FsWalker;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from walking a tree.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The root does not exist or is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Reading a directory entry or file failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The visitor asked to stop.
    #[error("walk aborted: {0}")]
    Aborted(String),
}

/// Kind of a reported entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// Regular file; its contents are read.
    File,
    /// Symbolic link; its target path is read, never followed.
    Symlink,
}

impl EntryKind {
    /// Short tag used when hashing.
    pub fn tag(self) -> &'static str {
        match self {
            EntryKind::File => "blob",
            EntryKind::Symlink => "link",
        }
    }
}

/// One file reported by a walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the root, `/`-separated
    pub rel_path: String,
    /// Absolute path on disk
    pub abs_path: PathBuf,
    /// File or symlink
    pub kind: EntryKind,
    /// Size in bytes (link length for symlinks)
    pub size: u64,
}

/// Enumerates the files of a tree.
///
/// Implementations must be thread-safe (Send + Sync): one walker is shared by
/// every artifact an acquirer produces.
pub trait Walker: Send + Sync + std::fmt::Debug {
    /// Call `visit` for each file under `root`. An error from `visit` stops
    /// the walk and is returned.
    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(&FileEntry) -> Result<(), WalkError>,
    ) -> Result<(), WalkError>;
}
