//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting, progress and display
//!
//! # Design
//!
//! All terminal output goes through this module so quiet mode and the
//! stdout/stderr split are handled in one place. Diagnostics for developers
//! go through `tracing` instead.

pub mod output;
