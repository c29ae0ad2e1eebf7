//! gitsnap - Materialize repository references into content-addressed artifacts
//!
//! gitsnap resolves a repository reference (a local directory or a remote
//! URL, optionally qualified by a branch, tag or commit) into a working tree
//! on disk, computes a stable content identity for it, and guarantees that
//! any temporary clone is released again.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to artifact)
//! - [`artifact`] - Normalization, acquisition, identity and lifecycle
//! - [`core`] - Domain types, operation context and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`walker`] - Enumeration of working tree files
//! - [`cache`] - Content-addressed store for blob records
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! 1. Every acquisition attempt yields a cleanup handle, including failed ones
//! 2. A caller's local directory is never modified or deleted
//! 3. The content identity depends only on the bytes in the working tree
//!
//! # Example
//!
//! ```no_run
//! use gitsnap::artifact::{Acquirer, ArtifactOptions};
//! use gitsnap::core::context::OpContext;
//!
//! let acquirer = Acquirer::new(None).unwrap();
//! let ctx = OpContext::new();
//! let (result, cleanup) = acquirer.acquire("github.com/org/repo", &ArtifactOptions::default(), &ctx);
//! if let Ok(artifact) = result {
//!     let reference = artifact.inspect(&ctx).unwrap();
//!     println!("{}", reference.id);
//! }
//! cleanup.run();
//! ```

pub mod artifact;
pub mod cache;
pub mod cli;
pub mod core;
pub mod git;
pub mod ui;
pub mod walker;
