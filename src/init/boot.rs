//! The PID-1 boot state machine.
//!
//! Strictly sequential, no supervisor, no retries. Two terminal states:
//!
//! - handoff: the process image is replaced by the real root's init
//!   (unobservable from here);
//! - rescue shell: the explicit, named fallback `rescue_shell()` that every
//!   failed step transitions to. A human on the console is the only further
//!   recovery path.
//!
//! The virtual-filesystem mounts at the top of boot are deliberately not
//! fatal: their failures are printed and the sequence continues, failing
//! later at the root mount or handoff if they mattered.

use anyhow::{Context, Result};
use nix::mount::{mount, MsFlags};
use nix::unistd::execv;
use std::convert::Infallible;
use std::ffi::CString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::cmdline::BootArgs;
use super::device::{DeviceSpec, FindfsResolver};
use crate::process::Cmd;

/// Where the real root filesystem gets mounted.
pub const NEW_ROOT: &str = "/mnt/root";

/// Init path expected under the new root, relative to it.
pub const TARGET_INIT: &str = "sbin/init";

/// Virtual filesystems mounted before anything else: (source, fstype, target).
const VIRTUAL_MOUNTS: &[(&str, &str, &str)] = &[
    ("proc", "proc", "/proc"),
    ("sysfs", "sysfs", "/sys"),
    ("devtmpfs", "devtmpfs", "/dev"),
];

/// Outcome of the handoff precondition check.
#[derive(Debug, PartialEq, Eq)]
pub enum HandoffDecision {
    /// An executable init exists under the new root; proceed to root-switch.
    Proceed(PathBuf),
    /// No usable init; the only remaining transition is the rescue shell.
    NoInit(PathBuf),
}

/// Check whether the mounted root carries an executable init.
///
/// The root-switch must not be attempted when this returns `NoInit`.
pub fn decide_handoff(new_root: &Path) -> HandoffDecision {
    let init = new_root.join(TARGET_INIT);
    let executable = fs::metadata(&init)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false);
    if executable {
        HandoffDecision::Proceed(init)
    } else {
        HandoffDecision::NoInit(init)
    }
}

/// Run the boot sequence. Returns only if even the rescue shell cannot be
/// executed; PID 1 returning from main panics the kernel.
pub fn run() -> Result<Infallible> {
    println!("rdinit: starting");

    mount_virtual_filesystems();
    populate_devices();

    let cmdline = match fs::read_to_string("/proc/cmdline") {
        Ok(c) => c,
        Err(e) => return rescue_shell(&format!("cannot read /proc/cmdline: {}", e)),
    };
    let args = BootArgs::parse(&cmdline);

    let Some(spec) = args.root else {
        return rescue_shell("no root= on kernel command line");
    };

    let device = match DeviceSpec::parse(&spec).resolve(&FindfsResolver) {
        Ok(dev) => dev,
        Err(e) => return rescue_shell(&format!("cannot resolve root '{}': {:#}", spec, e)),
    };

    if let Err(e) = mount_root(&device, args.read_only) {
        return rescue_shell(&format!(
            "cannot mount {} at {}: {:#}",
            device.display(),
            NEW_ROOT,
            e
        ));
    }

    match decide_handoff(Path::new(NEW_ROOT)) {
        HandoffDecision::NoInit(path) => {
            rescue_shell(&format!("no init found at {}", path.display()))
        }
        HandoffDecision::Proceed(_) => {
            if let Err(e) = move_mounts(Path::new(NEW_ROOT)) {
                return rescue_shell(&format!("cannot move mounts under new root: {:#}", e));
            }
            match switch_root() {
                // execv replaced the process; this arm is unreachable.
                Ok(never) => Ok(never),
                Err(e) => rescue_shell(&format!("root switch failed: {:#}", e)),
            }
        }
    }
}

/// Mount proc, sysfs and devtmpfs. Failures are warnings, not fatal.
fn mount_virtual_filesystems() {
    for (source, fstype, target) in VIRTUAL_MOUNTS {
        let result = mount(
            Some(*source),
            *target,
            Some(*fstype),
            MsFlags::empty(),
            None::<&str>,
        );
        if let Err(e) = result {
            eprintln!("rdinit: [WARN] mount {} on {} failed: {}", fstype, target, e);
        }
    }
}

/// Scan sysfs and create device nodes so the root device becomes visible.
///
/// Applets are addressed absolutely: PID 1 starts without a usable PATH.
fn populate_devices() {
    match Cmd::new("/sbin/mdev").arg("-s").allow_fail().run() {
        Ok(result) if !result.success() => {
            eprintln!("rdinit: [WARN] mdev -s exited with {}", result.code());
        }
        Ok(_) => {}
        Err(e) => eprintln!("rdinit: [WARN] mdev -s did not run: {:#}", e),
    }
}

/// Mount the resolved root device at NEW_ROOT.
///
/// Delegated to the mount applet so the filesystem type is probed rather
/// than guessed here.
fn mount_root(device: &Path, read_only: bool) -> Result<()> {
    let mut cmd = Cmd::new("/bin/mount");
    if read_only {
        cmd = cmd.args(["-o", "ro"]);
    }
    cmd.arg_path(device)
        .arg(NEW_ROOT)
        .error_msg("mount of real root failed")
        .run()?;
    Ok(())
}

/// Move (not remount) the virtual filesystems under the new root.
fn move_mounts(new_root: &Path) -> Result<()> {
    for (_, _, target) in VIRTUAL_MOUNTS {
        let dest = new_root.join(target.trim_start_matches('/'));
        mount(
            Some(*target),
            &dest,
            None::<&str>,
            MsFlags::MS_MOVE,
            None::<&str>,
        )
        .with_context(|| format!("move {} -> {}", target, dest.display()))?;
    }
    Ok(())
}

/// Replace this process with the real root's init via switch_root.
///
/// Does not return on success.
fn switch_root() -> Result<Infallible> {
    println!("rdinit: switching root to {}", NEW_ROOT);
    let program = CString::new("/sbin/switch_root")?;
    let argv = [
        CString::new("switch_root")?,
        CString::new(NEW_ROOT)?,
        CString::new(format!("/{}", TARGET_INIT))?,
    ];
    let argv_refs: Vec<&std::ffi::CStr> = argv.iter().map(|a| a.as_c_str()).collect();
    let never = execv(&program, &argv_refs).context("execv switch_root")?;
    Ok(never)
}

/// Terminal transition: print the diagnostic and become an interactive shell.
///
/// Every failed step in the sequence ends here. Returns only if the shell
/// itself cannot be executed.
pub fn rescue_shell(reason: &str) -> Result<Infallible> {
    eprintln!("rdinit: {}", reason);
    eprintln!("rdinit: dropping to rescue shell");
    let program = CString::new("/bin/sh")?;
    let argv = [CString::new("sh")?];
    let argv_refs: Vec<&std::ffi::CStr> = argv.iter().map(|a| a.as_c_str()).collect();
    let never = execv(&program, &argv_refs).context("execv rescue shell")?;
    Ok(never)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_handoff_refused_when_init_missing() {
        let root = tempfile::tempdir().unwrap();
        let decision = decide_handoff(root.path());
        assert_eq!(
            decision,
            HandoffDecision::NoInit(root.path().join("sbin/init"))
        );
    }

    #[test]
    fn test_handoff_refused_when_init_not_executable() {
        let root = tempfile::tempdir().unwrap();
        let init = root.path().join("sbin/init");
        fs::create_dir_all(init.parent().unwrap()).unwrap();
        fs::write(&init, "#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&init).unwrap().permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&init, perms).unwrap();

        assert_eq!(decide_handoff(root.path()), HandoffDecision::NoInit(init));
    }

    #[test]
    fn test_handoff_proceeds_for_executable_init() {
        let root = tempfile::tempdir().unwrap();
        let init = root.path().join("sbin/init");
        fs::create_dir_all(init.parent().unwrap()).unwrap();
        fs::write(&init, "#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&init).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&init, perms).unwrap();

        assert_eq!(decide_handoff(root.path()), HandoffDecision::Proceed(init));
    }

    #[test]
    fn test_handoff_refused_for_directory() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("sbin/init")).unwrap();
        assert!(matches!(
            decide_handoff(root.path()),
            HandoffDecision::NoInit(_)
        ));
    }
}
