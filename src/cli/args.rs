//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gitsnap - Materialize repository references into content-addressed artifacts
#[derive(Parser, Debug)]
#[command(name = "gitsnap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Acquire a repository and print its content identity
    #[command(
        name = "inspect",
        long_about = "Acquire a repository and print its content identity.\n\n\
            TARGET is either an existing local directory, which is used in place, \
            or a repository URL, which is cloned into a private temporary directory \
            that is removed before the command exits. URLs without a scheme get \
            https:// prefixed.",
        after_help = "\
EXAMPLES:
    # Identity of a local checkout
    gitsnap inspect .

    # Clone a remote at a tag
    gitsnap inspect github.com/org/repo --tag v1.0.0

    # Machine-readable output, no progress line
    gitsnap inspect https://github.com/org/repo --commit 6ac152f --json --no-progress"
    )]
    Inspect {
        /// Local directory or repository URL
        target: String,

        /// Check out this branch
        #[arg(long, conflicts_with_all = ["tag", "commit"])]
        branch: Option<String>,

        /// Check out this tag
        #[arg(long, conflicts_with = "commit")]
        tag: Option<String>,

        /// Check out this commit
        #[arg(long)]
        commit: Option<String>,

        /// Do not print clone progress
        #[arg(long)]
        no_progress: bool,

        /// Store blob records in this directory
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,

        /// Give up after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Print the reference as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical URL for a repository reference
    #[command(name = "normalize")]
    Normalize {
        /// Repository reference, e.g. github.com/org/repo
        reference: String,
    },

    /// Show or create the configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for gitsnap commands.",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    gitsnap completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    gitsnap completion zsh >> ~/.zshrc

    # Fish
    gitsnap completion fish > ~/.config/fish/completions/gitsnap.fish

    # PowerShell
    gitsnap completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration and where it was loaded from
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
