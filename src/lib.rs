//! boardbuild library exports.
//!
//! Exposes internal components for the two binaries (`boardbuild`, `rdinit`)
//! and for integration testing.

pub mod build;
pub mod commands;
pub mod config;
pub mod init;
pub mod install;
pub mod kconfig;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod ramdisk;
