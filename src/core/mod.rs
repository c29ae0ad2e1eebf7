//! core
//!
//! Core domain types, operation context and configuration for gitsnap.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, TagName, Oid, RefName, ContentId
//! - [`context`] - Cancellation and deadlines for long-running operations
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod context;
pub mod types;
