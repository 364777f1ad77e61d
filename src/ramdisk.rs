//! Ramdisk assembly: filesystem tree -> cpio -> gzip -> U-Boot image.
//!
//! The tree gets busybox from the userland install stage and `rdinit` as its
//! `/init` entry point. Serialization is a null-delimited file listing piped
//! into cpio's newc format, gzip-compressed, then wrapped in a U-Boot legacy
//! image header (arch=arm, os=linux, type=ramdisk, comp=gzip, load/entry=0)
//! so the bootloader can load it directly.

use anyhow::{bail, Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::pipeline::BuildContext;
use crate::process::{shell_in, Cmd};

/// Directories of the minimal boot filesystem: binaries, devices, config,
/// libraries, root-mount point, process-info, kernel-object, root home.
pub const RAMDISK_DIRS: &[&str] = &["bin", "dev", "etc", "lib", "mnt/root", "proc", "sys", "root"];

/// Name stamped into the U-Boot image header.
const IMAGE_NAME: &str = "boardbuild initramfs";

/// Marker: the finished boot-loadable ramdisk image.
pub fn image_path(ctx: &BuildContext) -> PathBuf {
    ctx.workdir.join("uInitrd")
}

/// Create the minimal directory structure. Idempotent.
pub fn create_tree(root: &Path) -> Result<()> {
    for dir in RAMDISK_DIRS {
        fs::create_dir_all(root.join(dir))?;
    }
    Ok(())
}

/// Copy the prebuilt static rdinit binary in as the tree's `/init`.
fn install_init(ctx: &BuildContext, root: &Path) -> Result<()> {
    let src = &ctx.config.rdinit_binary;
    if !src.exists() {
        bail!(
            "rdinit binary not found at {}.\n\
             Cross-build it for the target triple and point RDINIT_BINARY at it.",
            src.display()
        );
    }

    let init_dst = root.join("init");
    fs::copy(src, &init_dst)
        .with_context(|| format!("Failed to copy {} into ramdisk tree", src.display()))?;

    let mut perms = fs::metadata(&init_dst)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&init_dst, perms)?;
    Ok(())
}

/// Assemble the complete ramdisk image.
pub fn assemble(ctx: &BuildContext) -> Result<()> {
    println!("=== Assembling ramdisk ===");

    let root = ctx.ramdisk_root();
    create_tree(&root)?;

    if !root.join("bin/busybox").exists() {
        bail!(
            "Busybox missing from ramdisk tree at {}.\n\
             The userland sub-pipeline must run first.",
            root.display()
        );
    }

    install_init(ctx, &root)?;

    // Archive the tree. Null-delimited listing keeps odd filenames intact.
    println!("  Building cpio archive...");
    let cpio = ctx.workdir.join("ramdisk.cpio");
    shell_in(
        &format!(
            "find . -print0 | cpio --null -o -H newc > \"{}\"",
            cpio.display()
        ),
        &root,
    )
    .context("cpio archive creation failed")?;

    println!("  Compressing...");
    Cmd::new("gzip")
        .args(["-9", "-f"])
        .arg_path(&cpio)
        .error_msg("gzip failed")
        .run()?;
    let cpio_gz = ctx.workdir.join("ramdisk.cpio.gz");

    println!("  Wrapping in U-Boot image header...");
    let image = image_path(ctx);
    Cmd::new("mkimage")
        .args(["-A", "arm", "-O", "linux", "-T", "ramdisk", "-C", "gzip"])
        .args(["-a", "0", "-e", "0"])
        .args(["-n", IMAGE_NAME])
        .arg("-d")
        .arg_path(&cpio_gz)
        .arg_path(&image)
        .error_msg("mkimage failed")
        .run()?;

    let size = fs::metadata(&image)?.len();
    println!("  Ramdisk image: {} ({} KB)", image.display(), size / 1024);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tree_layout() {
        let dir = tempfile::tempdir().unwrap();
        create_tree(dir.path()).unwrap();

        for sub in ["bin", "dev", "etc", "lib", "mnt/root", "proc", "sys", "root"] {
            assert!(dir.path().join(sub).is_dir(), "missing {}", sub);
        }
    }

    #[test]
    fn test_create_tree_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        create_tree(dir.path()).unwrap();
        create_tree(dir.path()).unwrap();
    }
}
