//! Artifact installation into the staging root.
//!
//! Copies the kernel image, device-tree blob and ramdisk image into
//! `<staging>/boot/` and delegates module installation to the kernel build
//! system with `INSTALL_MOD_PATH`. Copies are independent of each other;
//! a failure aborts the run without undoing earlier copies.

use anyhow::{bail, Result};
use std::fs;
use std::path::PathBuf;

use crate::build::kernel;
use crate::pipeline::BuildContext;
use crate::process::Cmd;
use crate::ramdisk;

/// Marker: kernel image staged for the bootloader.
pub fn staged_kernel_path(ctx: &BuildContext) -> PathBuf {
    ctx.config.staging_root.join("boot/zImage")
}

/// Marker: ramdisk image staged for the bootloader.
pub fn staged_ramdisk_path(ctx: &BuildContext) -> PathBuf {
    ctx.config.staging_root.join("boot/uInitrd")
}

/// Install kernel image, device-tree blob and modules into the staging root.
pub fn install_kernel(ctx: &BuildContext) -> Result<()> {
    let zimage = kernel::zimage_path(ctx);
    if !zimage.exists() {
        bail!(
            "Kernel not built; expected {}.\nRe-run the build to resume.",
            zimage.display()
        );
    }

    let staging = &ctx.config.staging_root;
    let boot_dir = staging.join("boot");
    fs::create_dir_all(&boot_dir)?;

    fs::copy(&zimage, boot_dir.join("zImage"))?;
    println!("  Installed boot/zImage");

    let dtb = kernel::find_dtb(ctx)?;
    fs::copy(&dtb, boot_dir.join(&ctx.config.board_dtb))?;
    println!("  Installed boot/{}", ctx.config.board_dtb);

    let version = kernel::version(ctx)?;
    println!("  Installing modules for {}...", version);
    Cmd::new("make")
        .args(["-C", &ctx.kernel_src().to_string_lossy()])
        .arg(format!("O={}", kernel::build_dir(ctx).display()))
        .arg(format!("INSTALL_MOD_PATH={}", staging.display()))
        .arg("modules_install")
        .env("ARCH", "arm")
        .env("CROSS_COMPILE", ctx.config.cross_prefix())
        .error_msg("Module install failed")
        .run_interactive()?;

    let modules_dir = staging.join("lib/modules").join(&version);
    if !modules_dir.exists() {
        bail!(
            "modules_install finished but {} does not exist",
            modules_dir.display()
        );
    }

    // modules_install leaves symlinks back into the source tree; the staging
    // root should not reference build machine paths.
    let _ = fs::remove_file(modules_dir.join("source"));
    let _ = fs::remove_file(modules_dir.join("build"));

    let module_count = walkdir::WalkDir::new(&modules_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "ko" || ext == "xz" || ext == "gz")
                .unwrap_or(false)
        })
        .count();
    println!("  Installed {} kernel modules", module_count);

    Ok(())
}

/// Copy the assembled ramdisk image into the staging boot directory.
pub fn install_ramdisk(ctx: &BuildContext) -> Result<()> {
    let image = ramdisk::image_path(ctx);
    if !image.exists() {
        bail!(
            "Ramdisk image not assembled; expected {}.\nRe-run the build to resume.",
            image.display()
        );
    }

    let dest = staged_ramdisk_path(ctx);
    fs::create_dir_all(dest.parent().unwrap())?;
    fs::copy(&image, &dest)?;
    println!("  Installed boot/uInitrd");
    Ok(())
}
