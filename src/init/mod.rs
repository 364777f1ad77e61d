//! The embedded init program.
//!
//! `rdinit` is the executable entry point of the generated ramdisk: the only
//! process running after kernel boot. It mounts the virtual filesystems,
//! populates /dev, parses the kernel command line, mounts the real root and
//! hands off to its init. On any failure it drops to a rescue shell; nothing
//! restarts PID 1.
//!
//! The pure pieces (command-line parsing, device-specifier resolution, the
//! handoff decision) live in their own modules so they are testable on the
//! build host.

pub mod boot;
pub mod cmdline;
pub mod device;
