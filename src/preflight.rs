//! Host tool validation before a build.
//!
//! Catches a missing cross toolchain or image tool up front instead of an
//! hour into a kernel compile.

use anyhow::{bail, Result};

use crate::config::Config;

/// Host tools every build needs.
const REQUIRED_TOOLS: &[&str] = &["git", "make", "cpio", "gzip", "mkimage"];

/// One preflight check result.
pub struct Check {
    pub name: String,
    pub found: Option<std::path::PathBuf>,
}

/// Run all checks and return them, without failing.
pub fn run_checks(config: &Config) -> Vec<Check> {
    let mut checks: Vec<Check> = REQUIRED_TOOLS
        .iter()
        .map(|tool| Check {
            name: tool.to_string(),
            found: which::which(tool).ok(),
        })
        .collect();

    let cross_gcc = format!("{}gcc", config.cross_prefix());
    checks.push(Check {
        found: which::which(&cross_gcc).ok(),
        name: cross_gcc,
    });

    checks
}

/// Print check results; in strict mode, fail if anything is missing.
pub fn report(config: &Config, strict: bool) -> Result<()> {
    let checks = run_checks(config);
    let mut missing = Vec::new();

    println!("Preflight checks:");
    for check in &checks {
        match &check.found {
            Some(path) => println!("  [OK]      {} ({})", check.name, path.display()),
            None => {
                println!("  [MISSING] {}", check.name);
                missing.push(check.name.clone());
            }
        }
    }

    if !missing.is_empty() {
        if strict {
            bail!("Missing host tools: {}", missing.join(", "));
        }
        eprintln!(
            "[WARN] Missing host tools: {}. The build will fail when it needs them.",
            missing.join(", ")
        );
    }
    Ok(())
}
