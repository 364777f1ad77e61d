//! boardbuild - cross-build pipeline for an embedded ARM board.
//!
//! Builds a Linux kernel, its modules, a device-tree blob and a busybox
//! initramfs (with `rdinit` as its PID 1), then stages everything for the
//! bootloader. Interrupted builds resume: re-run and already-finished stages
//! are skipped.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use boardbuild::commands::{self, build::BuildOptions};

#[derive(Parser)]
#[command(name = "boardbuild")]
#[command(about = "Cross-builds kernel, modules, DTB and initramfs for an ARM board")]
#[command(
    after_help = "QUICK START:\n  boardbuild preflight   Check host tools\n  boardbuild build       Build everything (resumable)\n  boardbuild show status What is left to do"
)]
struct Cli {
    /// Working directory for all intermediate artifacts
    #[arg(short, long, default_value = "build", global = true)]
    workdir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the build pipeline (kernel + userland + ramdisk)
    Build {
        /// Kernel git URL (overrides KERNEL_GIT_URL)
        #[arg(short, long)]
        source: Option<String>,

        /// Kernel branch (overrides KERNEL_BRANCH)
        #[arg(short, long)]
        branch: Option<String>,

        /// Downstream compiler job count (default: host CPU count)
        #[arg(short, long)]
        jobs: Option<String>,
    },

    /// Show configuration or build status
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Verify host tools before building
    Preflight {
        /// Fail if any tool is missing (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show effective configuration
    Config,
    /// Show which stages are satisfied
    Status,
}

/// Default job count from host parallelism.
fn default_jobs() -> String {
    match std::thread::available_parallelism() {
        Ok(n) => n.get().to_string(),
        Err(e) => {
            eprintln!("[WARN] Could not detect CPU count ({}), using 4 cores", e);
            "4".to_string()
        }
    }
}

/// Validate the job count weakly: a malformed value gets a warning but is
/// still passed through to make verbatim.
fn check_jobs(jobs: &str) {
    if jobs.parse::<u32>().is_err() {
        eprintln!(
            "[WARN] job count '{}' is not a number; passing it to make anyway",
            jobs
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Build {
            source,
            branch,
            jobs,
        } => {
            let jobs = jobs.unwrap_or_else(default_jobs);
            check_jobs(&jobs);
            commands::cmd_build(
                &cli.workdir,
                BuildOptions {
                    source,
                    branch,
                    jobs,
                },
            )?;
        }

        Commands::Show { what } => {
            let target = match what {
                ShowTarget::Config => commands::ShowTarget::Config,
                ShowTarget::Status => commands::ShowTarget::Status,
            };
            commands::cmd_show(&cli.workdir, target)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(&cli.workdir, strict)?;
        }
    }

    Ok(())
}
