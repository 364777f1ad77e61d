//! Preflight command - verify host tools before building.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::preflight;

/// Execute the preflight command.
pub fn cmd_preflight(workdir: &Path, strict: bool) -> Result<()> {
    let config = Config::load(workdir);
    preflight::report(&config, strict)
}
