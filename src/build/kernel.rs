//! Kernel stage actions: clone, configure, cross-compile, modules.
//!
//! The kernel's own build system does the heavy lifting; these actions invoke
//! it with explicit `ARCH`/`CROSS_COMPILE` parameters and an out-of-tree
//! build directory, so nothing depends on ambient process state.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::kconfig::KconfigFile;
use crate::pipeline::BuildContext;
use crate::process::Cmd;

/// Config options patched on top of the board defconfig before compiling.
///
/// devtmpfs is what rdinit mounts at /dev; gzip'd initrd support matches the
/// ramdisk image the assembler produces.
const ENABLED_OPTIONS: &[&str] = &[
    "CONFIG_DEVTMPFS",
    "CONFIG_BLK_DEV_INITRD",
    "CONFIG_RD_GZIP",
];

/// Options disabled to keep the image reproducible across rebuilds.
const DISABLED_OPTIONS: &[&str] = &["CONFIG_LOCALVERSION_AUTO"];

/// Out-of-tree kernel build directory.
pub fn build_dir(ctx: &BuildContext) -> PathBuf {
    ctx.workdir.join("kernel-build")
}

/// Marker: persisted kernel configuration.
pub fn config_path(ctx: &BuildContext) -> PathBuf {
    build_dir(ctx).join(".config")
}

/// Marker: compiled kernel image.
pub fn zimage_path(ctx: &BuildContext) -> PathBuf {
    build_dir(ctx).join("arch/arm/boot/zImage")
}

/// Marker: module build output listing, produced by `make modules`.
pub fn modules_marker(ctx: &BuildContext) -> PathBuf {
    build_dir(ctx).join("modules.order")
}

/// A `make` invocation against the kernel source with cross parameters set.
fn kernel_make(ctx: &BuildContext) -> Cmd {
    Cmd::new("make")
        .args(["-C", &ctx.kernel_src().to_string_lossy()])
        .arg(format!("O={}", build_dir(ctx).display()))
        .env("ARCH", "arm")
        .env("CROSS_COMPILE", ctx.config.cross_prefix())
}

/// Shallow-clone the kernel source tree into the working directory.
pub fn download(ctx: &BuildContext) -> Result<()> {
    let dest = ctx.kernel_src();
    println!(
        "Cloning {} (branch {})...",
        ctx.config.kernel_git_url, ctx.config.kernel_branch
    );

    Cmd::new("git")
        .args(["clone", "--depth", "1", "--branch", &ctx.config.kernel_branch])
        .arg(&ctx.config.kernel_git_url)
        .arg_path(&dest)
        .error_msg("Kernel clone failed")
        .run_interactive()?;
    Ok(())
}

/// Generate the board defconfig, patch it, and resolve dependencies.
pub fn configure(ctx: &BuildContext) -> Result<()> {
    let src = ctx.kernel_src();
    if !src.join("Makefile").exists() {
        bail!(
            "Kernel source at {} has no Makefile; the tree looks incomplete",
            src.display()
        );
    }

    fs::create_dir_all(build_dir(ctx))?;

    println!("  Generating base config from {}...", ctx.config.kernel_defconfig);
    kernel_make(ctx)
        .arg(&ctx.config.kernel_defconfig)
        .error_msg("make defconfig failed")
        .run()?;

    println!("  Patching kernel config...");
    let mut config = KconfigFile::load(&config_path(ctx))?;
    for key in ENABLED_OPTIONS {
        config.enable(key);
    }
    for key in DISABLED_OPTIONS {
        config.clear(key);
    }
    config.save()?;

    // Resolve dependencies of the patched options without prompting.
    kernel_make(ctx)
        .arg("olddefconfig")
        .error_msg("make olddefconfig failed")
        .run()?;

    Ok(())
}

/// Cross-compile the kernel image and device trees.
pub fn compile(ctx: &BuildContext) -> Result<()> {
    println!("  Building zImage and device trees...");
    kernel_make(ctx)
        .arg(ctx.jobs_arg())
        .args(["zImage", "dtbs"])
        .error_msg("Kernel build failed")
        .run_interactive()?;
    Ok(())
}

/// Cross-compile loadable modules.
pub fn compile_modules(ctx: &BuildContext) -> Result<()> {
    println!("  Building modules...");
    kernel_make(ctx)
        .arg(ctx.jobs_arg())
        .arg("modules")
        .error_msg("Module build failed")
        .run_interactive()?;
    Ok(())
}

/// Read the kernel version string from the build directory.
pub fn version(ctx: &BuildContext) -> Result<String> {
    let release_path = build_dir(ctx).join("include/config/kernel.release");
    let release = fs::read_to_string(&release_path).with_context(|| {
        format!(
            "Could not read kernel version from {}; has the kernel been configured?",
            release_path.display()
        )
    })?;
    Ok(release.trim().to_string())
}

/// Locate the board's device-tree blob in the build output.
///
/// dts files moved into per-vendor subdirectories in newer kernels, so the
/// blob is searched for rather than addressed at a fixed path.
pub fn find_dtb(ctx: &BuildContext) -> Result<PathBuf> {
    let dts_dir = build_dir(ctx).join("arch/arm/boot/dts");
    let wanted = &ctx.config.board_dtb;

    for entry in walkdir::WalkDir::new(&dts_dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && entry.file_name().to_string_lossy() == *wanted {
            return Ok(entry.path().to_path_buf());
        }
    }

    bail!(
        "Device-tree blob {} not found under {}.\n\
         Check BOARD_DTB against the dtbs the kernel actually built.",
        wanted,
        dts_dir.display()
    )
}
