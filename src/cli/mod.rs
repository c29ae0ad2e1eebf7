//! cli
//!
//! Command-line interface layer for gitsnap.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and let flags override it
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! handlers in [`commands`], which drive [`crate::artifact`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use args::{Command, ConfigAction};

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`, after tracing is
/// installed.
pub fn run(cli: Cli) -> Result<()> {
    // `config init` creates the file `--config` names; nothing to load yet.
    let creating = matches!(
        cli.command,
        Command::Config {
            action: ConfigAction::Init { .. }
        }
    );
    let config = match &cli.config {
        _ if creating => Config::default(),
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    let ctx = commands::Context {
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        config,
        config_override: cli.config.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
