//! Functionality related to process management.

use alloc::{format, string::String};
use core::time::Duration;

use crate::{
    Errno, NixString, SyscallNum, fs,
    ipc::{SigInfoRaw, Signo},
    syscall, syscall_result, thread,
};

mod types;

// RE-EXPORTS
pub use types::{ChildCode, ExitStatus, WaitIdType, WaitInfo, WaitOptions};

/// `PR_SET_PDEATHSIG`: signal delivered when the parent dies.
const PR_SET_PDEATHSIG: usize = 1;
/// `PR_SET_NAME`: rename the calling thread.
const PR_SET_NAME: usize = 15;

/// How often a [`new_root`] change-directory attempt is retried before giving up.
const NEW_ROOT_RETRIES: u32 = 20;
/// Spacing between [`new_root`] retries.
const NEW_ROOT_RETRY_SPACING: Duration = Duration::from_millis(50);

/// Creates a child process. Wrapper around the
/// [fork](https://www.man7.org/linux/man-pages/man2/fork.2.html) Linux syscall.
///
/// On success, the PID of the child process is returned in the parent, and 0 is returned in the
/// child.
///
/// # Errors
///
/// This function returns an [`Errno`] if the underlying syscall fails.
pub fn fork() -> Result<usize, Errno> {
    // SAFETY: This syscall has no arguments, and errors are handled gracefully.
    unsafe { syscall_result!(SyscallNum::Fork) }
}

/// Cause normal process termination. Wrapper around the
/// [exit](https://www.man7.org/linux/man-pages/man3/exit.3.html) Linux syscall.
///
/// Returns the least significant byte of the given `status` to the parent process.
pub fn exit(exit_status: ExitStatus) -> ! {
    // SAFETY: The only user-defined argument, `status`, is already the right type.
    unsafe {
        syscall!(SyscallNum::Exit, exit_status.code());
    }
    unreachable!("failed to exit somehow")
}

/// Gets the process ID of the calling process.
#[must_use]
pub fn getpid() -> i32 {
    // SAFETY: This syscall has no arguments and never fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    unsafe {
        syscall!(SyscallNum::Getpid) as i32
    }
}

/// Gets the real user ID of the calling process.
#[must_use]
pub fn getuid() -> u32 {
    // SAFETY: This syscall has no arguments and never fails.
    #[allow(clippy::cast_possible_truncation)]
    unsafe {
        syscall!(SyscallNum::Getuid) as u32
    }
}

/// Starts a new session with the calling process as its leader. Wrapper around the
/// [`setsid(2)`](https://www.man7.org/linux/man-pages/man2/setsid.2.html) Linux syscall.
///
/// # Errors
///
/// This function returns [`Errno::Eperm`] if the caller is already a process group leader.
pub fn new_session() -> Result<(), Errno> {
    // SAFETY: This syscall has no arguments, and errors are handled gracefully.
    unsafe {
        syscall_result!(SyscallNum::Setsid)?;
    }
    Ok(())
}

/// Sends the given signal to the process with the given PID. Wrapper around the
/// [`kill(2)`](https://www.man7.org/linux/man-pages/man2/kill.2.html) Linux syscall.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `kill` syscall.
pub fn kill(pid: i32, signo: Signo) -> Result<(), Errno> {
    // SAFETY: Both arguments are plain integers validated by the kernel.
    unsafe {
        syscall_result!(SyscallNum::Kill, pid, signo as i32)?;
    }
    Ok(())
}

/// Waits for a state change of a child process selected by `id_type`/`id`, per the given
/// [`WaitOptions`].
///
/// Wrapper around the [`waitid(2)`](https://www.man7.org/linux/man-pages/man2/waitid.2.html)
/// Linux syscall. Returns [`None`] when [`WaitOptions::WNOHANG`] was given and no child changed
/// state.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `waitid` syscall;
/// [`Errno::Echild`] means there is no matching child left to wait for.
pub fn wait(
    id_type: WaitIdType,
    id: usize,
    options: WaitOptions,
) -> Result<Option<WaitInfo>, Errno> {
    let mut info = SigInfoRaw::default();

    // SAFETY: The signal info pointer is valid for the duration of the call; the other arguments
    // are plain integers.
    unsafe {
        syscall_result!(
            SyscallNum::Waitid,
            id_type as u32,
            id,
            &raw mut info,
            options.bits(),
            0
        )?;
    }

    if info.pid == 0 {
        // WNOHANG and nothing happened yet.
        return Ok(None);
    }
    Ok(Some(info.try_into()?))
}

/// Renames the calling process (as shown by `ps` and friends) to the given name, truncated by
/// the kernel to its 15-byte limit.
///
/// Wrapper around [`prctl(2)`](https://www.man7.org/linux/man-pages/man2/prctl.2.html) with
/// `PR_SET_NAME`.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `prctl` syscall.
pub fn set_process_name(name: &str) -> Result<(), Errno> {
    let ns_name: NixString = name.into();

    // SAFETY: The name is null-terminated by its NixString type.
    unsafe {
        syscall_result!(SyscallNum::Prctl, PR_SET_NAME, ns_name.as_ptr(), 0, 0, 0)?;
    }
    Ok(())
}

/// Arranges for the given signal to be delivered to the calling process when its parent dies.
///
/// Wrapper around [`prctl(2)`](https://www.man7.org/linux/man-pages/man2/prctl.2.html) with
/// `PR_SET_PDEATHSIG`.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `prctl` syscall.
pub fn set_parent_death_signal(signo: Signo) -> Result<(), Errno> {
    // SAFETY: Both arguments are plain integers.
    unsafe {
        syscall_result!(SyscallNum::Prctl, PR_SET_PDEATHSIG, signo as i32, 0, 0, 0)?;
    }
    Ok(())
}

/// Moves the process into a new root directory, tolerating a root that is still being mounted.
///
/// The change-directory step is retried for a while on `ENOENT`/`EIO` since init scripts issue
/// the request as the new root comes up. Follows with `chroot(".")` and `chdir("/")`.
///
/// # Errors
///
/// This function returns the last [`Errno`] if the directory never becomes enterable, and
/// propagates any [`Errno`]s from the `chroot` and final `chdir` steps.
pub fn new_root(root: &str) -> Result<(), Errno> {
    let ns_root: NixString = root.into();

    let mut tries = 0;
    loop {
        // SAFETY: The path is null-terminated by its NixString type.
        match unsafe { syscall_result!(SyscallNum::Chdir, ns_root.as_ptr()) } {
            Ok(_) => break,
            Err(errno @ (Errno::Enoent | Errno::Eio)) => {
                tries += 1;
                if tries > NEW_ROOT_RETRIES {
                    return Err(errno);
                }
                let _ = thread::sleep(&NEW_ROOT_RETRY_SPACING);
            }
            Err(errno) => return Err(errno),
        }
    }

    let dot: NixString = ".".into();
    // SAFETY: The path is null-terminated by its NixString type.
    unsafe {
        syscall_result!(SyscallNum::Chroot, dot.as_ptr())?;
    }

    let slash: NixString = "/".into();
    // SAFETY: The path is null-terminated by its NixString type.
    unsafe {
        syscall_result!(SyscallNum::Chdir, slash.as_ptr())?;
    }
    Ok(())
}

/// Resolves the executable path of the process with the given PID via `/proc/<pid>/exe`.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from reading the link; notably [`Errno::Enoent`] when
/// the process is already gone.
pub fn exe_of(pid: i32) -> Result<String, Errno> {
    fs::readlink(format!("/proc/{pid}/exe"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;

    #[test_case]
    fn own_pid_is_positive() {
        assert!(getpid() > 0);
    }

    #[test_case]
    fn kill_needs_a_target() {
        assert_err!(kill(0x3fff_fffe, Signo::SigTerm), Errno::Esrch);
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn exe_of_self() {
        let exe = exe_of(getpid()).unwrap();
        assert!(exe.starts_with('/'));
    }
}
