//! Minimal-userland (busybox) stage actions.
//!
//! Busybox is built statically and installed straight into the ramdisk tree
//! via `CONFIG_PREFIX`, giving the initramfs its utility set.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::kconfig::KconfigFile;
use crate::pipeline::BuildContext;
use crate::process::Cmd;

/// Marker: persisted busybox configuration.
pub fn config_path(ctx: &BuildContext) -> PathBuf {
    ctx.busybox_src().join(".config")
}

/// Marker: compiled busybox binary.
pub fn busybox_binary(ctx: &BuildContext) -> PathBuf {
    ctx.busybox_src().join("busybox")
}

/// Marker: busybox installed into the ramdisk tree.
pub fn installed_busybox(ctx: &BuildContext) -> PathBuf {
    ctx.ramdisk_root().join("bin/busybox")
}

/// A `make` invocation in the busybox tree with cross parameters set.
fn busybox_make(ctx: &BuildContext) -> Cmd {
    Cmd::new("make")
        .args(["-C", &ctx.busybox_src().to_string_lossy()])
        .env("ARCH", "arm")
        .env("CROSS_COMPILE", ctx.config.cross_prefix())
}

/// Shallow-clone the busybox source tree.
pub fn download(ctx: &BuildContext) -> Result<()> {
    println!("Cloning {}...", ctx.config.busybox_git_url);
    Cmd::new("git")
        .args(["clone", "--depth", "1"])
        .arg(&ctx.config.busybox_git_url)
        .arg_path(&ctx.busybox_src())
        .error_msg("Busybox clone failed")
        .run_interactive()?;
    Ok(())
}

/// Generate the default config and force a static link.
pub fn configure(ctx: &BuildContext) -> Result<()> {
    let src = ctx.busybox_src();
    if !src.join("Makefile").exists() {
        bail!(
            "Busybox source at {} has no Makefile; the tree looks incomplete",
            src.display()
        );
    }

    println!("  Generating busybox defconfig...");
    busybox_make(ctx)
        .arg("defconfig")
        .error_msg("busybox defconfig failed")
        .run()?;

    println!("  Forcing static link...");
    let mut config = KconfigFile::load(&config_path(ctx))?;
    config.enable("CONFIG_STATIC");
    config.save()?;

    Ok(())
}

/// Cross-compile busybox.
pub fn compile(ctx: &BuildContext) -> Result<()> {
    println!("  Building busybox...");
    busybox_make(ctx)
        .arg(ctx.jobs_arg())
        .error_msg("Busybox build failed")
        .run_interactive()?;
    Ok(())
}

/// Install busybox and its applet links into the ramdisk tree.
pub fn install(ctx: &BuildContext) -> Result<()> {
    let tree = ctx.ramdisk_root();
    crate::ramdisk::create_tree(&tree)?;

    println!("  Installing busybox into {}...", tree.display());
    busybox_make(ctx)
        .arg(format!("CONFIG_PREFIX={}", tree.display()))
        .arg("install")
        .error_msg("Busybox install failed")
        .run()?;
    Ok(())
}
