//! Shared test helpers.
//!
//! Each test gets an isolated working directory; nothing touches the host
//! network or toolchain.
#![allow(dead_code)]

use boardbuild::config::Config;
use boardbuild::pipeline::BuildContext;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated build environment rooted in a tempdir.
pub struct TestEnv {
    _tmp: TempDir,
    pub workdir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create tempdir");
        let workdir = tmp.path().join("work");
        std::fs::create_dir_all(&workdir).unwrap();
        Self {
            _tmp: tmp,
            workdir,
        }
    }

    /// Build context over this environment with a fixed job count.
    pub fn ctx(&self) -> BuildContext {
        BuildContext {
            workdir: self.workdir.clone(),
            config: Config::load(&self.workdir),
            jobs: "2".to_string(),
        }
    }
}

pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "expected file at {}", path.display());
}

pub fn assert_dir_exists(path: &Path) {
    assert!(path.is_dir(), "expected directory at {}", path.display());
}
