//! config command - Show or create the configuration file

use super::Context;
use crate::core::config::{Config, FileConfig};
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Print the effective configuration.
pub fn show(ctx: &Context) -> Result<()> {
    let source = match ctx.config.loaded_from() {
        Some(path) => path.display().to_string(),
        None => "(defaults)".to_string(),
    };
    let body = toml::to_string_pretty(&ctx.config.file).context("Failed to render config")?;

    output::print(format!("# source: {}", source), ctx.verbosity);
    output::print(format!("# progress = {}", ctx.config.progress()), ctx.verbosity);
    if !body.trim().is_empty() {
        output::print(body.trim_end(), ctx.verbosity);
    }
    Ok(())
}

/// Write a default config file to `--config` or the canonical location.
pub fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = match &ctx.config_override {
        Some(path) => path.clone(),
        None => Config::default_path().context("Failed to locate config path")?,
    };
    if path.exists() && !force {
        bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let defaults = FileConfig {
        progress: Some(true),
        ..FileConfig::default()
    };
    Config::write(&path, &defaults).context("Failed to write config")?;

    output::print(format!("Wrote {}", path.display()), ctx.verbosity);
    Ok(())
}
