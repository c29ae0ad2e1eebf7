//! normalize command - Print the canonical URL of a reference

use super::Context;
use crate::artifact::normalize::{normalize_url, redact};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print the canonical URL for `reference`, password removed.
pub fn normalize(ctx: &Context, reference: &str) -> Result<()> {
    let url = normalize_url(reference).context("url parse error")?;
    output::print(redact(&url), ctx.verbosity);
    Ok(())
}
