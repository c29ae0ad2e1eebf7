//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls into the library to do the work
//! 3. Formats and displays output

mod completion;
mod config_cmd;
mod inspect;
mod normalize;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use config_cmd::{init as config_init, show as config_show};
pub use inspect::{inspect, InspectRequest};
pub use normalize::normalize;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::args::{Command, ConfigAction};
use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// State shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output verbosity from `--quiet` / `--debug`
    pub verbosity: Verbosity,
    /// Loaded configuration
    pub config: Config,
    /// Config file named by `--config`, if any
    pub config_override: Option<PathBuf>,
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Inspect {
            target,
            branch,
            tag,
            commit,
            no_progress,
            cache_dir,
            timeout,
            json,
        } => inspect(
            ctx,
            InspectRequest {
                target,
                branch,
                tag,
                commit,
                no_progress,
                cache_dir,
                timeout,
                json,
            },
        ),
        Command::Normalize { reference } => normalize(ctx, &reference),
        Command::Config { action } => match action {
            ConfigAction::Show => config_show(ctx),
            ConfigAction::Init { force } => config_init(ctx, force),
        },
        Command::Completion { shell } => completion(shell),
    }
}
