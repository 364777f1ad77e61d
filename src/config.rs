//! Configuration management for boardbuild.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over the .env file.
//!
//! The target triple (`CROSS_TRIPLE`) selects both the cross-compiler prefix
//! (`<triple>-gcc` etc.) and the default staging root; `STAGING_ROOT`
//! overrides the latter.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default git URL for the Linux kernel.
pub const DEFAULT_KERNEL_GIT_URL: &str =
    "https://git.kernel.org/pub/scm/linux/kernel/git/stable/linux.git";

/// Default git URL for busybox, the minimal userland.
pub const DEFAULT_BUSYBOX_GIT_URL: &str = "https://git.busybox.net/busybox";

/// Default cross-compilation target triple.
pub const DEFAULT_CROSS_TRIPLE: &str = "arm-linux-gnueabihf";

/// Default kernel defconfig for the board family.
pub const DEFAULT_KERNEL_DEFCONFIG: &str = "multi_v7_defconfig";

/// Default device-tree blob name (BeagleBone Black).
pub const DEFAULT_BOARD_DTB: &str = "am335x-boneblack.dtb";

/// boardbuild configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cross-compilation target triple (e.g. "arm-linux-gnueabihf").
    pub cross_triple: String,
    /// Staging root where boot artifacts and modules land.
    pub staging_root: PathBuf,
    /// Git URL for the Linux kernel.
    pub kernel_git_url: String,
    /// Git branch for the kernel clone.
    pub kernel_branch: String,
    /// Git URL for busybox.
    pub busybox_git_url: String,
    /// Kernel defconfig target.
    pub kernel_defconfig: String,
    /// Device-tree blob filename under arch/arm/boot/dts.
    pub board_dtb: String,
    /// Path to the prebuilt static rdinit binary embedded in the ramdisk.
    pub rdinit_binary: PathBuf,
}

impl Config {
    /// Load configuration from .env file and environment.
    ///
    /// `.env` is looked up next to the working directory; real environment
    /// variables win over file entries.
    pub fn load(workdir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = workdir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((key, value)) = line.split_once('=') {
                        let value = value.trim().trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.trim().to_string(), value.to_string());
                    }
                }
            }
        }

        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let cross_triple = env_vars
            .get("CROSS_TRIPLE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CROSS_TRIPLE.to_string());

        let staging_root = env_vars
            .get("STAGING_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| workdir.join("staging"));

        let rdinit_binary = env_vars
            .get("RDINIT_BINARY")
            .map(PathBuf::from)
            .unwrap_or_else(|| workdir.join("rdinit"));

        Self {
            cross_triple,
            staging_root,
            kernel_git_url: env_vars
                .get("KERNEL_GIT_URL")
                .cloned()
                .unwrap_or_else(|| DEFAULT_KERNEL_GIT_URL.to_string()),
            kernel_branch: env_vars
                .get("KERNEL_BRANCH")
                .cloned()
                .unwrap_or_else(|| "master".to_string()),
            busybox_git_url: env_vars
                .get("BUSYBOX_GIT_URL")
                .cloned()
                .unwrap_or_else(|| DEFAULT_BUSYBOX_GIT_URL.to_string()),
            kernel_defconfig: env_vars
                .get("KERNEL_DEFCONFIG")
                .cloned()
                .unwrap_or_else(|| DEFAULT_KERNEL_DEFCONFIG.to_string()),
            board_dtb: env_vars
                .get("BOARD_DTB")
                .cloned()
                .unwrap_or_else(|| DEFAULT_BOARD_DTB.to_string()),
            rdinit_binary,
        }
    }

    /// Cross-compiler prefix derived from the triple ("arm-linux-gnueabihf-").
    pub fn cross_prefix(&self) -> String {
        format!("{}-", self.cross_triple)
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  CROSS_TRIPLE: {}", self.cross_triple);
        println!("  STAGING_ROOT: {}", self.staging_root.display());
        println!("  KERNEL_GIT_URL: {}", self.kernel_git_url);
        println!("  KERNEL_BRANCH: {}", self.kernel_branch);
        println!("  BUSYBOX_GIT_URL: {}", self.busybox_git_url);
        println!("  KERNEL_DEFCONFIG: {}", self.kernel_defconfig);
        println!("  BOARD_DTB: {}", self.board_dtb);
        println!("  RDINIT_BINARY: {}", self.rdinit_binary.display());
    }
}
