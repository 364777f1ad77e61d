//! Command layer between the CLI and the build modules.

pub mod build;
pub mod preflight;
pub mod show;

pub use build::cmd_build;
pub use preflight::cmd_preflight;
pub use show::{cmd_show, ShowTarget};
