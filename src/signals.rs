//! The signal router: async signals land in atomic flags the event loop reads between polls.
//!
//! Handlers are the only code that runs outside the loop, so they do nothing but store into the
//! statics below. Everything stateful happens on the main thread.

use core::sync::atomic::{AtomicI32, Ordering};

use crate::ipc::{self, SigDisposition, Signo};

/// The filesystem-ready signal is not even armed yet.
const FS_READY_UNARMED: i32 = -1;
/// The filesystem-ready signal is armed and has not fired.
const FS_READY_ARMED: i32 = 0;

/// Termination signal received (or injected by the QUIT command); 0 while running.
static SIGNALED: AtomicI32 = AtomicI32::new(0);

/// State of the one-shot "filesystem may be ready" signal (SIGIO).
static FS_READY: AtomicI32 = AtomicI32::new(FS_READY_UNARMED);

/// Nonzero once the log has been told to pause (SIGSYS or the CLOSE command).
static LOG_PAUSE: AtomicI32 = AtomicI32::new(0);

/// Count of child-exit signals seen since the last reset.
static CHILD_EVENTS: AtomicI32 = AtomicI32::new(0);

extern "C" fn term_handler(sig: i32) {
    SIGNALED.store(sig, Ordering::Relaxed);
}

extern "C" fn fs_ready_handler(sig: i32) {
    // One shot: the first delivery turns the signal off for good.
    if FS_READY.load(Ordering::Relaxed) == FS_READY_ARMED {
        let _ = ipc::set_signal(Signo::SigIo, SigDisposition::Ignore);
    }
    FS_READY.store(sig, Ordering::Relaxed);
}

extern "C" fn log_pause_handler(sig: i32) {
    LOG_PAUSE.store(sig, Ordering::Relaxed);
}

extern "C" fn child_handler(_sig: i32) {
    CHILD_EVENTS.fetch_add(1, Ordering::Relaxed);
}

/// Installs the daemon's baseline dispositions: termination signals set the shutdown flag,
/// SIGSYS pauses the log, SIGPIPE is ignored.
///
/// # Errors
///
/// Propagates any [`Errno`] from installing a disposition.
pub fn install_base_handlers() -> Result<(), crate::Errno> {
    ipc::set_signal(Signo::SigTerm, SigDisposition::Handler(term_handler))?;
    ipc::set_signal(Signo::SigQuit, SigDisposition::Handler(term_handler))?;
    ipc::set_signal(Signo::SigSys, SigDisposition::Handler(log_pause_handler))?;
    ipc::set_signal(Signo::SigPipe, SigDisposition::Ignore)?;
    Ok(())
}

/// The termination signal observed so far, or 0.
#[must_use]
pub fn signaled() -> i32 {
    SIGNALED.load(Ordering::Relaxed)
}

/// Injects a termination signal, as the QUIT command does.
pub fn raise_signaled(signo: Signo) {
    SIGNALED.store(signo as i32, Ordering::Relaxed);
}

/// Arms the one-shot filesystem-ready signal (SIGIO). No effect once armed or delivered.
pub fn arm_fs_ready() {
    if FS_READY.load(Ordering::Relaxed) == FS_READY_UNARMED {
        FS_READY.store(FS_READY_ARMED, Ordering::Relaxed);
        let _ = ipc::set_signal(Signo::SigIo, SigDisposition::Handler(fs_ready_handler));
    }
}

/// Whether the filesystem-ready signal has been delivered (or permanently retired).
#[must_use]
pub fn fs_ready_delivered() -> bool {
    FS_READY.load(Ordering::Relaxed) > FS_READY_ARMED
}

/// Whether the filesystem-ready signal is armed but still pending.
#[must_use]
pub fn fs_ready_pending() -> bool {
    FS_READY.load(Ordering::Relaxed) == FS_READY_ARMED
}

/// Whether the filesystem-ready signal has not been armed yet.
#[must_use]
pub fn fs_ready_unarmed() -> bool {
    FS_READY.load(Ordering::Relaxed) == FS_READY_UNARMED
}

/// Retires the filesystem-ready signal for good: further SIGIO is ignored. Used once the log
/// file is open (or the READY command promises it never will be).
pub fn retire_fs_ready() {
    let _ = ipc::set_signal(Signo::SigIo, SigDisposition::Ignore);
    FS_READY.store(Signo::SigIo as i32, Ordering::Relaxed);
}

/// Whether a log pause has been requested (SIGSYS or the CLOSE command).
#[must_use]
pub fn log_pause_requested() -> bool {
    LOG_PAUSE.load(Ordering::Relaxed) != 0
}

/// Requests a log pause and retires SIGSYS, as the CLOSE command does.
pub fn request_log_pause() {
    if LOG_PAUSE.load(Ordering::Relaxed) == 0 {
        let _ = ipc::set_signal(Signo::SigSys, SigDisposition::Ignore);
    }
    LOG_PAUSE.store(Signo::SigSys as i32, Ordering::Relaxed);
}

/// Routes SIGCHLD into the child-event counter while prompters run.
///
/// # Errors
///
/// Propagates any [`Errno`] from installing the disposition.
pub fn watch_children() -> Result<(), crate::Errno> {
    ipc::set_signal(Signo::SigChld, SigDisposition::Handler(child_handler))
}

/// How many child-exit signals have landed so far.
#[must_use]
pub fn child_events() -> i32 {
    CHILD_EVENTS.load(Ordering::Relaxed)
}

/// The signal mask installed around the poll wait: everything deferred except the signals the
/// loop itself reacts to.
#[must_use]
pub fn poll_mask() -> ipc::SigSet {
    let mut mask = ipc::SigSet::filled();
    mask.remove(Signo::SigQuit)
        .remove(Signo::SigTerm)
        .remove(Signo::SigSys)
        .remove(Signo::SigIo);
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn quit_command_injects_sigterm() {
        assert_eq!(signaled(), 0);
        raise_signaled(Signo::SigTerm);
        assert_eq!(signaled(), Signo::SigTerm as i32);
        SIGNALED.store(0, Ordering::Relaxed);
    }

    #[test_case]
    fn fs_ready_walks_one_way() {
        assert!(fs_ready_unarmed());
        arm_fs_ready();
        assert!(fs_ready_pending());
        assert!(!fs_ready_delivered());

        retire_fs_ready();
        assert!(fs_ready_delivered());
        FS_READY.store(FS_READY_UNARMED, Ordering::Relaxed);
    }

    #[test_case]
    fn child_counter_starts_quiet() {
        assert_eq!(child_events(), 0);
    }

    #[test_case]
    fn pause_latches() {
        assert!(!log_pause_requested());
        request_log_pause();
        assert!(log_pause_requested());
        LOG_PAUSE.store(0, Ordering::Relaxed);
    }

    #[test_case]
    fn poll_mask_keeps_loop_signals() {
        let mask = poll_mask();
        assert!(!mask.contains(Signo::SigTerm));
        assert!(!mask.contains(Signo::SigQuit));
        assert!(!mask.contains(Signo::SigSys));
        assert!(!mask.contains(Signo::SigIo));
        assert!(mask.contains(Signo::SigHup));
        assert!(mask.contains(Signo::SigChld));
    }
}
