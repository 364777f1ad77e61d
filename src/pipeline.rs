//! Resumable stage sequencing.
//!
//! A stage is satisfied when its marker path exists. Re-running the pipeline
//! against the same working directory skips every satisfied stage and picks
//! up at the first unsatisfied one. Satisfaction is an existence check only:
//! a corrupted-but-present artifact counts as complete. That matches the
//! resume contract (re-runs must be cheap) and is a known limitation.
//!
//! The runner is fail-fast. The first stage error aborts the run with no
//! rollback; the working directory is left as-is for a later resume.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Explicit directory context threaded through every stage action.
///
/// Stages never rely on the process working directory; everything they touch
/// is derived from these paths.
pub struct BuildContext {
    /// Root of all intermediate artifacts. Created once, reused across runs,
    /// never deleted by the pipeline.
    pub workdir: PathBuf,
    /// Loaded configuration (triple, staging root, URLs).
    pub config: Config,
    /// Downstream compiler job count, passed through unmanaged.
    ///
    /// Kept as a string: a malformed value is warned about at CLI parse time
    /// but still forwarded to make verbatim.
    pub jobs: String,
}

impl BuildContext {
    /// Kernel source tree location.
    pub fn kernel_src(&self) -> PathBuf {
        self.workdir.join("linux")
    }

    /// Busybox source tree location.
    pub fn busybox_src(&self) -> PathBuf {
        self.workdir.join("busybox")
    }

    /// Root of the initramfs filesystem tree under assembly.
    pub fn ramdisk_root(&self) -> PathBuf {
        self.workdir.join("initramfs-root")
    }

    /// `-j<jobs>` argument for make.
    pub fn jobs_arg(&self) -> String {
        format!("-j{}", self.jobs)
    }
}

/// One resumable unit of the pipeline.
pub struct Stage {
    name: &'static str,
    /// Marker whose existence means this stage is already done.
    marker: PathBuf,
    action: Box<dyn Fn(&BuildContext) -> Result<()>>,
}

impl Stage {
    pub fn new(
        name: &'static str,
        marker: PathBuf,
        action: impl Fn(&BuildContext) -> Result<()> + 'static,
    ) -> Self {
        Self {
            name,
            marker,
            action: Box::new(action),
        }
    }

    /// Whether the stage's marker artifact already exists.
    pub fn is_satisfied(&self) -> bool {
        self.marker.exists()
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

/// Run a named sub-pipeline to completion.
///
/// Each stage's outcome is checked explicitly: the action must succeed AND
/// leave its marker behind, otherwise the run aborts.
pub fn run_stages(ctx: &BuildContext, pipeline_name: &str, stages: &[Stage]) -> Result<()> {
    println!("=== {} ===", pipeline_name);

    for stage in stages {
        if stage.is_satisfied() {
            println!("  [SKIP] {} (already done)", stage.name);
            continue;
        }

        println!("  [RUN] {}", stage.name);
        (stage.action)(ctx)?;

        if !stage.is_satisfied() {
            bail!(
                "Stage '{}' completed without producing {}.\n\
                 The build cannot resume past this point; fix the stage and re-run.",
                stage.name,
                stage.marker.display()
            );
        }
    }

    println!("=== {} complete ===\n", pipeline_name);
    Ok(())
}

/// Ensure the working directory exists. It is reused across runs and never
/// deleted here.
pub fn ensure_workdir(workdir: &Path) -> Result<()> {
    std::fs::create_dir_all(workdir)?;
    Ok(())
}
