//! Kernel command-line parsing.
//!
//! The boot parameter string is tokenized on whitespace. Exactly two
//! directives matter to rdinit: `root=<spec>` and `ro`. Everything else is
//! the kernel's business and is ignored. A repeated `root=` is not rejected;
//! the last occurrence wins.

/// The boot parameters rdinit acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootArgs {
    /// Root device specifier from the last `root=` token, if any.
    pub root: Option<String>,
    /// Whether `ro` requested a read-only root mount.
    pub read_only: bool,
}

impl BootArgs {
    /// Parse a full kernel command line.
    pub fn parse(cmdline: &str) -> Self {
        let mut args = BootArgs::default();
        for token in cmdline.split_whitespace() {
            if let Some(spec) = token.strip_prefix("root=") {
                args.root = Some(spec.to_string());
            } else if token == "ro" {
                args.read_only = true;
            }
        }
        args
    }
}
