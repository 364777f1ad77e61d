//! Show command - configuration and build status.

use anyhow::Result;
use std::path::Path;

use crate::build;
use crate::config::Config;
use crate::pipeline::BuildContext;

/// What to show.
pub enum ShowTarget {
    /// Effective configuration.
    Config,
    /// Which pipeline stages are satisfied.
    Status,
}

/// Execute the show command.
pub fn cmd_show(workdir: &Path, target: ShowTarget) -> Result<()> {
    let config = Config::load(workdir);

    match target {
        ShowTarget::Config => {
            config.print();
        }
        ShowTarget::Status => {
            let ctx = BuildContext {
                workdir: workdir.to_path_buf(),
                config,
                jobs: "1".to_string(),
            };
            build::report_status(&ctx);
        }
    }
    Ok(())
}
