//! Build orchestration: wires stage definitions into the two sub-pipelines.
//!
//! Stage order per target:
//! - kernel: download -> configure -> compile -> compile modules -> install
//! - userland: download -> configure -> compile -> install into ramdisk tree
//!
//! then ramdisk assembly and the final boot install. Every stage is gated by
//! a marker artifact; see `pipeline` for the resume contract.

pub mod kernel;
pub mod userland;

use anyhow::Result;

use crate::install;
use crate::pipeline::{ensure_workdir, run_stages, BuildContext, Stage};
use crate::ramdisk;

/// Stages of the kernel sub-pipeline.
pub fn kernel_stages(ctx: &BuildContext) -> Vec<Stage> {
    vec![
        Stage::new("download kernel source", ctx.kernel_src(), kernel::download),
        Stage::new("configure kernel", kernel::config_path(ctx), kernel::configure),
        Stage::new("compile kernel", kernel::zimage_path(ctx), kernel::compile),
        Stage::new(
            "compile kernel modules",
            kernel::modules_marker(ctx),
            kernel::compile_modules,
        ),
        Stage::new(
            "install kernel to staging",
            install::staged_kernel_path(ctx),
            install::install_kernel,
        ),
    ]
}

/// Stages of the minimal-userland (busybox) sub-pipeline.
pub fn userland_stages(ctx: &BuildContext) -> Vec<Stage> {
    vec![
        Stage::new("download busybox source", ctx.busybox_src(), userland::download),
        Stage::new("configure busybox", userland::config_path(ctx), userland::configure),
        Stage::new("compile busybox", userland::busybox_binary(ctx), userland::compile),
        Stage::new(
            "install busybox into ramdisk tree",
            userland::installed_busybox(ctx),
            userland::install,
        ),
    ]
}

/// Ramdisk assembly and final boot install.
pub fn ramdisk_stages(ctx: &BuildContext) -> Vec<Stage> {
    vec![
        Stage::new("assemble ramdisk image", ramdisk::image_path(ctx), ramdisk::assemble),
        Stage::new(
            "install ramdisk to staging",
            install::staged_ramdisk_path(ctx),
            install::install_ramdisk,
        ),
    ]
}

/// Run the whole build: both sub-pipelines plus ramdisk assembly.
///
/// Fail-fast; any stage error aborts the run. Re-invoking resumes from the
/// first unsatisfied stage.
pub fn run_full(ctx: &BuildContext) -> Result<()> {
    ensure_workdir(&ctx.workdir)?;

    run_stages(ctx, "Kernel", &kernel_stages(ctx))?;
    run_stages(ctx, "Userland", &userland_stages(ctx))?;
    run_stages(ctx, "Ramdisk", &ramdisk_stages(ctx))?;

    println!("Build complete. Boot artifacts staged under {}", ctx.config.staging_root.display());
    Ok(())
}

/// Print which stages are satisfied, without running anything.
pub fn report_status(ctx: &BuildContext) {
    for (name, stages) in [
        ("Kernel", kernel_stages(ctx)),
        ("Userland", userland_stages(ctx)),
        ("Ramdisk", ramdisk_stages(ctx)),
    ] {
        println!("{}:", name);
        for stage in &stages {
            let mark = if stage.is_satisfied() { "done" } else { "pending" };
            println!("  [{}] {}", mark, stage.name());
        }
    }
}
