//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`. We use the `git2` crate exclusively (no shelling out to the git
//! CLI).
//!
//! # Responsibilities
//!
//! - Cloning a remote into a private directory
//! - Listing remote refs and fetching a single refspec
//! - Resolving commits and checking out a tree
//! - Describing a working tree (HEAD, branch, tags, commit, remote URL)
//!
//! # Invariants
//!
//! - Every network or checkout step honours an [`OpContext`](crate::core::context::OpContext)
//! - All operations return strong types (Oid, BranchName, RefName)
//!
//! # Example
//!
//! ```ignore
//! use gitsnap::core::context::OpContext;
//! use gitsnap::git::Git;
//! use std::path::Path;
//!
//! let ctx = OpContext::new();
//! let git = Git::clone_into("https://github.com/org/repo", Path::new("/tmp/x"), &ctx, false)?;
//! println!("HEAD is {}", git.head_oid()?.short(7));
//! ```

mod interface;

pub use interface::{CommitInfo, Git, GitError};
