//! Functionality related to inter-process communication.

use core::fmt::Display;
use core::time::Duration;

use num_enum::TryFromPrimitive;

use crate::{Errno, SyscallNum, syscall_result, thread::TimeSpec};

/// `SA_RESTORER`: the signal frame is torn down by the handler-supplied trampoline.
const SA_RESTORER: usize = 0x0400_0000;
/// `SA_RESTART`: restart interruptible syscalls after the handler returns.
const SA_RESTART: usize = 0x1000_0000;

/// The kernel-side size of a signal set, in bytes.
const SIGSET_SIZE: usize = 8;

/// `SIG_DFL`: the default disposition.
const SIG_DFL: usize = 0;
/// `SIG_IGN`: ignore the signal.
const SIG_IGN: usize = 1;

// The handler trampoline rt_sigaction requires on x86_64: signal handlers return into this stub,
// which re-enters the kernel to tear the signal frame down.
core::arch::global_asm! {
    ".global __signal_restorer",
    "__signal_restorer:",
    "mov rax, 15", // rt_sigreturn
    "syscall",
}
unsafe extern "C" {
    fn __signal_restorer();
}

/// The raw signal info obtained directly from the kernel.
///
/// See [`sigaction(2)`](https://www.man7.org/linux/man-pages/man2/sigaction.2.html) for more
/// information.
#[repr(C)]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct SigInfoRaw {
    /// Signal number
    pub signo: i32,
    /// Errno value
    pub errno: u32,
    /// Signal code
    pub code: i32,
    /// Trap number that caused hardware-generated signal
    pub trapno: i32,
    /// Sending process ID
    pub pid: i32,
    /// Real user ID of sending process
    pub uid: u32,
    /// Exit value or signal
    pub status: i32,
    // We don't really care about the other stuff...
    #[doc(hidden)]
    pub _pad: [i32; 24],
    #[doc(hidden)]
    pub _align: [u64; 0],
}

/// The number of a specific IPC signal.
/// [`signal(7)`](https://www.man7.org/linux/man-pages/man7/signal.7.html) provides more info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(i32)]
#[non_exhaustive]
pub enum Signo {
    /// Controlling terminal hangup
    SigHup = 1,
    /// Keyboard interrupt
    SigInt = 2,
    /// Quit from keyboard
    SigQuit = 3,
    /// Illegal instruction
    SigIll = 4,
    /// Trace/breakpoint trap
    SigTrap = 5,
    /// Abort
    SigAbrt = 6,
    /// Bus error (bad memory access)
    SigBus = 7,
    /// Erroneous arithmetic operation
    SigFpe = 8,
    /// Kill signal
    SigKill = 9,
    /// User-defined signal 1
    SigUsr1 = 10,
    /// Invalid memory reference
    SigSegv = 11,
    /// User-defined signal 2
    SigUsr2 = 12,
    /// Broken pipe (write to pipe with no readers)
    SigPipe = 13,
    /// Timer signal
    SigAlrm = 14,
    /// Termination signal
    SigTerm = 15,
    /// Stack fault on coprocessor
    SigStkflt = 16,
    /// Child stopped or terminated
    SigChld = 17,
    /// Continue if stopped
    SigCont = 18,
    /// Stop process
    SigStop = 19,
    /// Stop typed at terminal
    SigTstp = 20,
    /// Background process terminal input
    SigTtin = 21,
    /// Background process terminal output
    SigTtou = 22,
    /// Urgent socket condition
    SigUrg = 23,
    /// CPU time limit exceeded
    SigXcpu = 24,
    /// File size limit exceeded
    SigXfsz = 25,
    /// Virtual alarm clock
    SigVtalrm = 26,
    /// Profiling timer expired
    SigProf = 27,
    /// Window resize signal
    SigWinch = 28,
    /// I/O now possible
    SigIo = 29,
    /// Power failure
    SigPwr = 30,
    /// Bad system call
    SigSys = 31,
}
impl Display for Signo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        #[allow(clippy::enum_glob_use)]
        use Signo::*;
        let s = match self {
            SigHup => "SIGHUP",
            SigInt => "SIGINT",
            SigQuit => "SIGQUIT",
            SigIll => "SIGILL",
            SigTrap => "SIGTRAP",
            SigAbrt => "SIGABRT",
            SigBus => "SIGBUS",
            SigFpe => "SIGFPE",
            SigKill => "SIGKILL",
            SigUsr1 => "SIGUSR1",
            SigSegv => "SIGSEGV",
            SigUsr2 => "SIGUSR2",
            SigPipe => "SIGPIPE",
            SigAlrm => "SIGALRM",
            SigTerm => "SIGTERM",
            SigStkflt => "SIGSTKFLT",
            SigChld => "SIGCHLD",
            SigCont => "SIGCONT",
            SigStop => "SIGSTOP",
            SigTstp => "SIGTSTP",
            SigTtin => "SIGTTIN",
            SigTtou => "SIGTTOU",
            SigUrg => "SIGURG",
            SigXcpu => "SIGXCPU",
            SigXfsz => "SIGXFSZ",
            SigVtalrm => "SIGVTALRM",
            SigProf => "SIGPROF",
            SigWinch => "SIGWINCH",
            SigIo => "SIGIO",
            SigPwr => "SIGPWR",
            SigSys => "SIGSYS",
        };
        write!(f, "{s}")
    }
}

/// A set of signals, as consumed by the masking syscalls.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SigSet(u64);
impl SigSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a set containing every signal.
    #[must_use]
    pub const fn filled() -> Self {
        Self(u64::MAX)
    }

    /// Adds the given signal to the set.
    pub fn add(&mut self, signo: Signo) -> &mut Self {
        self.0 |= Self::bit(signo);
        self
    }

    /// Removes the given signal from the set.
    pub fn remove(&mut self, signo: Signo) -> &mut Self {
        self.0 &= !Self::bit(signo);
        self
    }

    /// Whether the given signal is in the set.
    #[must_use]
    pub fn contains(&self, signo: Signo) -> bool {
        self.0 & Self::bit(signo) != 0
    }

    #[allow(clippy::cast_sign_loss)]
    const fn bit(signo: Signo) -> u64 {
        1 << ((signo as i32 - 1) as u64)
    }

    pub(crate) fn as_ptr(&self) -> *const u64 {
        &raw const self.0
    }
}

/// What to do when a signal arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigDisposition {
    /// Restore the kernel's default reaction.
    Default,
    /// Discard the signal on delivery.
    Ignore,
    /// Run the given handler. It must be async-signal-safe: no allocation, no stream locks;
    /// atomic flag writes only.
    Handler(extern "C" fn(i32)),
}

/// The raw structure consumed by
/// [`rt_sigaction(2)`](https://www.man7.org/linux/man-pages/man2/rt_sigaction.2.html) on x86_64.
#[repr(C)]
struct SigActionRaw {
    handler: usize,
    flags: usize,
    restorer: usize,
    mask: u64,
}

/// Installs the given disposition for the given signal.
///
/// Wrapper around the
/// [`rt_sigaction(2)`](https://www.man7.org/linux/man-pages/man2/rt_sigaction.2.html) Linux
/// syscall. Handlers are installed with `SA_RESTART` so that the daemon's slow syscalls resume
/// on their own.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `rt_sigaction` syscall.
pub fn set_signal(signo: Signo, disposition: SigDisposition) -> Result<(), Errno> {
    let act = SigActionRaw {
        handler: match disposition {
            SigDisposition::Default => SIG_DFL,
            SigDisposition::Ignore => SIG_IGN,
            SigDisposition::Handler(handler) => handler as usize,
        },
        flags: SA_RESTORER | SA_RESTART,
        restorer: __signal_restorer as usize,
        mask: 0,
    };

    // SAFETY: The action structure matches the kernel layout and lives for the duration of the
    // call; the restorer stub performs rt_sigreturn as the ABI demands.
    unsafe {
        syscall_result!(
            SyscallNum::RtSigaction,
            signo as i32,
            &raw const act,
            0,
            SIGSET_SIZE
        )?;
    }
    Ok(())
}

/// Waits for one of the signals in `set` for at most `timeout`.
///
/// Wrapper around the
/// [`rt_sigtimedwait(2)`](https://www.man7.org/linux/man-pages/man2/rt_sigtimedwait.2.html)
/// Linux syscall.
///
/// # Errors
///
/// This function returns [`Errno::Eagain`] when the timeout passes without a matching signal and
/// propagates any other [`Errno`]s from the underlying syscall.
pub fn wait_for_signal(set: &SigSet, timeout: &Duration) -> Result<Signo, Errno> {
    let ts = TimeSpec::from(timeout);

    // SAFETY: The set and timespec pointers are valid for the duration of the call; the signal
    // info output is not requested.
    let signum = unsafe {
        syscall_result!(
            SyscallNum::RtSigtimedwait,
            set.as_ptr(),
            0,
            ts.as_ptr(),
            SIGSET_SIZE
        )?
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    Signo::try_from(signum as i32).map_err(|_| Errno::Einval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn sigset_membership() {
        let mut set = SigSet::empty();
        set.add(Signo::SigChld).add(Signo::SigTerm);
        assert!(set.contains(Signo::SigChld));
        assert!(set.contains(Signo::SigTerm));
        assert!(!set.contains(Signo::SigIo));

        set.remove(Signo::SigChld);
        assert!(!set.contains(Signo::SigChld));
    }

    #[test_case]
    fn filled_set_has_everything() {
        let set = SigSet::filled();
        assert!(set.contains(Signo::SigHup));
        assert!(set.contains(Signo::SigSys));
    }

    #[test_case]
    fn timed_wait_times_out() {
        let mut set = SigSet::empty();
        set.add(Signo::SigUsr2);
        let timeout = Duration::from_millis(1);
        assert_eq!(wait_for_signal(&set, &timeout), Err(Errno::Eagain));
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn ignore_then_default() {
        set_signal(Signo::SigUsr1, SigDisposition::Ignore).unwrap();
        set_signal(Signo::SigUsr1, SigDisposition::Default).unwrap();
    }
}
