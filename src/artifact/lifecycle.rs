//! artifact::lifecycle
//!
//! Ownership of working trees and their release.
//!
//! # Model
//!
//! A [`WorkTree`] is either `Borrowed` (the caller's own directory, never
//! deleted) or `Owned` (a private temporary directory created for a clone).
//! Release is one match over that variant.
//!
//! Every acquisition attempt hands back a [`Cleanup`] handle, including failed
//! ones, from the moment any temporary directory exists. The handle is:
//!
//! - idempotent: the first [`Cleanup::run`] releases, later calls do nothing
//! - safe on partial initialization: a handle that never received a tree
//!   (or received a borrowed one) is a no-op
//! - infallible: deletion errors are logged, never returned or panicked on
//!
//! The artifact keeps its own clone of the handle. Dropping every clone
//! without calling `run` still deletes an owned tree, so forgetting to clean
//! up never leaks disk space past the artifact's lifetime.
//!
//! # Example
//!
//! ```
//! use gitsnap::artifact::lifecycle::{Cleanup, WorkTree};
//!
//! let tree = WorkTree::temporary(None, "example-").unwrap();
//! let path = tree.path().to_path_buf();
//! let cleanup = Cleanup::owning(tree);
//!
//! assert!(path.exists());
//! cleanup.run();
//! cleanup.run(); // no-op
//! assert!(!path.exists());
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::TempDir;

/// Where an acquisition's files live and who owns them.
#[derive(Debug)]
pub enum WorkTree {
    /// A private temporary directory; deleted on release.
    Owned(TempDir),
    /// The caller's directory; never touched on release.
    Borrowed(PathBuf),
}

impl WorkTree {
    /// Create a private temporary directory, under `parent` if given.
    pub fn temporary(parent: Option<&Path>, prefix: &str) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self::Owned(dir))
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        match self {
            Self::Owned(dir) => dir.path(),
            Self::Borrowed(path) => path,
        }
    }

    /// Whether releasing this tree deletes anything.
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Release the tree: delete owned directories, forget borrowed ones.
    fn release(self) -> io::Result<()> {
        match self {
            Self::Owned(dir) => {
                let path = dir.path().to_path_buf();
                match dir.close() {
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(io::Error::new(
                        e.kind(),
                        format!("cannot remove {}: {}", path.display(), e),
                    )),
                    Ok(()) => Ok(()),
                }
            }
            Self::Borrowed(_) => Ok(()),
        }
    }
}

/// Release handle bound to one acquisition.
///
/// Cheap to clone; all clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct Cleanup {
    slot: Arc<Mutex<Option<WorkTree>>>,
}

impl Cleanup {
    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self::default()
    }

    /// A handle that releases `tree`.
    pub fn owning(tree: WorkTree) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(tree))),
        }
    }

    /// Lock the slot, recovering from poisoning: a panic elsewhere must not
    /// turn cleanup into a second failure.
    fn lock(&self) -> MutexGuard<'_, Option<WorkTree>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Root of the tree this handle guards, if it has not been released.
    pub fn path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|tree| tree.path().to_path_buf())
    }

    /// Whether the handle guards a temporary directory that still exists.
    pub fn owns_temporary(&self) -> bool {
        self.lock().as_ref().is_some_and(WorkTree::is_owned)
    }

    /// Whether the handle has been run (or never held anything).
    pub fn is_released(&self) -> bool {
        self.lock().is_none()
    }

    /// Release the guarded tree. Safe to call any number of times.
    pub fn run(&self) {
        let tree = self.lock().take();
        let Some(tree) = tree else {
            return;
        };
        let path = tree.path().to_path_buf();
        let owned = tree.is_owned();
        match tree.release() {
            Ok(()) if owned => tracing::debug!(path = %path.display(), "removed temporary tree"),
            Ok(()) => {}
            Err(err) => tracing::warn!(error = %err, "failed to remove temporary tree"),
        }
    }
}
