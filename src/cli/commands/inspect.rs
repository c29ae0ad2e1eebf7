//! inspect command - Acquire a reference and print its identity

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::Context;
use crate::artifact::{Acquirer, ArtifactOptions};
use crate::cache::FsCache;
use crate::core::context::OpContext;
use crate::core::types::RefSelector;
use crate::ui::output::{self, Verbosity};
use anyhow::{bail, Context as _, Result};

/// Arguments of `gitsnap inspect`.
#[derive(Debug, Clone, Default)]
pub struct InspectRequest {
    pub target: String,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub commit: Option<String>,
    pub no_progress: bool,
    pub cache_dir: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub json: bool,
}

/// Acquire `request.target`, inspect it, release it, print the reference.
///
/// The temporary clone (if any) is removed before returning, whether or not
/// acquisition or inspection succeeded.
pub fn inspect(ctx: &Context, request: InspectRequest) -> Result<()> {
    let selector = RefSelector::from_parts(
        request.branch.as_deref(),
        request.tag.as_deref(),
        request.commit.as_deref(),
    )?;

    let timeout = match request.timeout {
        Some(0) => bail!("--timeout must be greater than zero"),
        Some(secs) => Some(Duration::from_secs(secs)),
        None => ctx.config.timeout(),
    };
    let op = match timeout {
        Some(timeout) => OpContext::with_timeout(timeout),
        None => OpContext::new(),
    };

    let mut acquirer = Acquirer::from_config(&ctx.config).context("Failed to set up acquisition")?;
    if let Some(dir) = &request.cache_dir {
        let cache = FsCache::open(dir)
            .with_context(|| format!("Failed to open cache at {}", dir.display()))?;
        acquirer = acquirer.with_cache(Arc::new(cache));
    }

    let options = ArtifactOptions {
        selector,
        no_progress: request.no_progress || ctx.verbosity == Verbosity::Quiet,
    };

    let (acquired, cleanup) = acquirer.acquire(&request.target, &options, &op);
    let inspected = acquired.and_then(|artifact| artifact.inspect(&op));
    cleanup.run();
    let reference = inspected?;

    if request.json {
        let json = serde_json::to_string_pretty(&reference).context("Failed to serialize")?;
        println!("{}", json);
    } else {
        output::print(output::format_reference(&reference), ctx.verbosity);
    }
    Ok(())
}
