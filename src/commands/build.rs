//! Build command - runs the full pipeline.

use anyhow::Result;
use std::path::Path;

use crate::build;
use crate::config::Config;
use crate::pipeline::BuildContext;

/// CLI-level build options layered over the environment configuration.
pub struct BuildOptions {
    /// Kernel git URL override.
    pub source: Option<String>,
    /// Kernel branch override.
    pub branch: Option<String>,
    /// Downstream compiler job count, already warned about if malformed.
    pub jobs: String,
}

/// Execute the build command.
pub fn cmd_build(workdir: &Path, options: BuildOptions) -> Result<()> {
    let mut config = Config::load(workdir);
    if let Some(source) = options.source {
        config.kernel_git_url = source;
    }
    if let Some(branch) = options.branch {
        config.kernel_branch = branch;
    }

    let ctx = BuildContext {
        workdir: workdir.to_path_buf(),
        config,
        jobs: options.jobs,
    };

    build::run_full(&ctx)
}
