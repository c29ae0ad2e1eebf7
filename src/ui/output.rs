//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout, everything else (warnings, errors, clone progress)
//! to stderr, so `gitsnap inspect --json` stays pipeable. Output respects the
//! quiet flag.

use std::fmt::Display;
use std::io::Write;

use crate::artifact::Reference;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Redraw the clone progress line on stderr.
///
/// Ends the line once every object has been received.
pub fn transfer_progress(received: usize, total: usize) {
    let mut stderr = std::io::stderr().lock();
    let percent = (received * 100).checked_div(total).unwrap_or(0);
    let _ = write!(
        stderr,
        "\rReceiving objects: {:3}% ({}/{})",
        percent, received, total
    );
    if total > 0 && received == total {
        let _ = writeln!(stderr);
    }
    let _ = stderr.flush();
}

/// Render a reference for humans.
pub fn format_reference(reference: &Reference) -> String {
    let mut lines = vec![
        format!("name:     {}", reference.name),
        format!("type:     {}", reference.artifact_type),
        format!("id:       {}", reference.id),
    ];
    lines.push(format!(
        "blob ids: {}",
        reference
            .blob_ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));

    if let Some(meta) = &reference.repo_metadata {
        if let Some(url) = &meta.repo_url {
            lines.push(format!("repo url: {}", url));
        }
        if let Some(branch) = &meta.branch {
            lines.push(format!("branch:   {}", branch));
        }
        if !meta.tags.is_empty() {
            lines.push(format!("tags:     {}", meta.tags.join(", ")));
        }
        if let Some(commit) = &meta.commit {
            lines.push(format!("commit:   {}", commit));
        }
        if let Some(msg) = &meta.commit_msg {
            lines.push(format!("message:  {}", msg));
        }
        if let Some(time) = &meta.commit_time {
            lines.push(format!("date:     {}", time.to_rfc3339()));
        }
        if let Some(author) = &meta.author {
            lines.push(format!("author:   {}", author));
        }
    }

    lines.join("\n")
}
