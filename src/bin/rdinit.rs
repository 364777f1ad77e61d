//! rdinit - the init program embedded in the generated ramdisk.
//!
//! Runs as PID 1 immediately after kernel boot: mounts the virtual
//! filesystems, populates /dev, parses the kernel command line, mounts the
//! real root and switches to its init. Any failure ends in the rescue shell.
//!
//! Cross-compile statically for the target triple; the ramdisk assembler
//! installs the binary as `/init`.

use boardbuild::init::boot;

fn main() {
    // run() only comes back if even the rescue shell could not be executed.
    // PID 1 exiting panics the kernel; there is nothing else to do but say
    // why on the console.
    if let Err(e) = boot::run() {
        eprintln!("rdinit: unrecoverable: {:#}", e);
    }
}
