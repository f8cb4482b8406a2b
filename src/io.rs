//! Deadlock-free reads and writes for the relay paths.
//!
//! Every sink write here is bounded: a terminal that stops accepting data reports a stall
//! instead of wedging the event loop, and the caller decides what to do with the leftovers.

use core::time::Duration;

use crate::{
    Errno, SyscallNum, eprintln,
    fs::FileDescriptor,
    socket, syscall_result, term, thread,
};

/// How long a stalled write waits for the descriptor to become writable again before giving up.
const WRITE_STALL_WAIT: i32 = 100;

/// How many times a read may consecutively error before the descriptor is declared broken.
const READ_REPEAT_LIMIT: u32 = 1000;

/// Pause between retries of an interrupted byte-wise read.
const READ_RETRY_PAUSE: Duration = Duration::from_millis(250);

/// `POLLIN`
const POLLIN: i16 = 0x1;
/// `POLLPRI`
const POLLPRI: i16 = 0x2;
/// `POLLOUT`
const POLLOUT: i16 = 0x4;

/// A hook invoked when a sink write fails with `EIO`, giving the owner one chance to rebind the
/// descriptor (e.g. reopen a rotated virtual console). Returns whether the write may be retried.
pub type Reconnect = fn(FileDescriptor) -> bool;

/// The outcome of a bounded sink write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Bytes the sink accepted.
    pub accepted: usize,
    /// The sink filled up; the caller should mark it blocked and re-arm its watchdog.
    pub stalled: bool,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
struct PollFd {
    fd: i32,
    events: i16,
    revents: i16,
}

fn poll_one(fd: FileDescriptor, events: i16, timeout_ms: i32) -> bool {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let mut pfd = PollFd {
        fd: fd.raw() as i32,
        events,
        revents: 0,
    };

    // SAFETY: The pollfd array pointer is valid for one element for the duration of the call.
    match unsafe { syscall_result!(SyscallNum::Poll, &raw mut pfd, 1, timeout_ms) } {
        Ok(n) => n > 0 && (pfd.revents & events) != 0,
        Err(_) => false,
    }
}

/// Whether the given descriptor has input ready within `timeout_ms` milliseconds.
#[must_use]
pub fn can_read(fd: FileDescriptor, timeout_ms: i32) -> bool {
    poll_one(fd, POLLIN | POLLPRI, timeout_ms)
}

/// Whether the given descriptor accepts output within `timeout_ms` milliseconds.
#[must_use]
pub fn can_write(fd: FileDescriptor, timeout_ms: i32) -> bool {
    poll_one(fd, POLLOUT, timeout_ms)
}

fn write_chunk(fd: FileDescriptor, bytes: &[u8], max: usize) -> Result<usize, Errno> {
    let len = if max == 0 { 1 } else { bytes.len().min(max) };
    // SAFETY: The buffer pointer and clamped length match an initialized slice.
    unsafe { syscall_result!(SyscallNum::Write, fd.raw(), bytes.as_ptr(), len) }
}

/// Writes the whole buffer to the given descriptor, at most `max` bytes per syscall, surviving
/// the rough edges of early boot.
///
/// `EPIPE` drops the rest of the message; `EINTR` retries; `EAGAIN` waits up to 100 ms for the
/// descriptor to drain and otherwise reports a stall and drops the rest; `EIO` goes through the
/// reconnect hook. When `socket` is set the bytes go out with `send(2)` and `MSG_NOSIGNAL`, with
/// `MSG_MORE` while a later frame part follows.
///
/// Returns whether the descriptor stalled.
///
/// # Errors
///
/// This function returns an [`Errno`] only for unrecoverable write failures (including `EIO`
/// with no working reconnect hook).
pub fn safeout(
    fd: FileDescriptor,
    bytes: &[u8],
    max: usize,
    socket: bool,
    reconnect: Option<Reconnect>,
) -> Result<bool, Errno> {
    let mut rest = bytes;

    while !rest.is_empty() {
        let written = if socket {
            let len = if max == 0 { 1 } else { rest.len().min(max) };
            let more = rest.len() > len;
            socket::send_some(fd, &rest[..len], more)
        } else {
            write_chunk(fd, rest, max)
        };

        match written {
            Ok(n) => rest = &rest[n..],
            Err(Errno::Epipe) => break, // Drop the rest of the message
            Err(Errno::Eintr) => {}
            Err(Errno::Eagain) => {
                // Avoid high load: wait a while if the device is not ready
                if can_write(fd, WRITE_STALL_WAIT) {
                    continue;
                }
                return Ok(true); // Drop the rest of the message
            }
            Err(Errno::Eio) => match reconnect {
                Some(hook) if hook(fd) => {}
                _ => return Err(Errno::Eio),
            },
            Err(errno) => return Err(errno),
        }
    }
    Ok(false)
}

/// Copies as much of the buffer as the sink accepts, at most `max` bytes per syscall.
///
/// Unlike [`safeout`] this never escalates: any failure ends the attempt and the report says how
/// far the copy got. A stall report tells the caller to mark the sink blocked.
#[must_use]
pub fn copyout(
    fd: FileDescriptor,
    bytes: &[u8],
    max: usize,
    reconnect: Option<Reconnect>,
) -> WriteReport {
    let mut report = WriteReport::default();

    while report.accepted < bytes.len() {
        match write_chunk(fd, &bytes[report.accepted..], max) {
            Ok(n) => report.accepted += n,
            Err(Errno::Eintr) => {}
            Err(Errno::Eagain) => {
                report.stalled = true;
                break;
            }
            Err(Errno::Eio) => match reconnect {
                Some(hook) if hook(fd) => {}
                _ => {
                    eprintln!("blogd: can not write to fd {fd}");
                    break;
                }
            },
            Err(_) => {
                eprintln!("blogd: can not write to fd {fd}");
                break;
            }
        }
    }

    report
}

/// Reads up to one buffer from the given descriptor without ever blocking the loop.
///
/// When the input queue length is known (`FIONREAD`) the read is sized to it; otherwise a
/// zero-timeout readiness probe guards a single read. `EINTR` and `EAGAIN` retry, a broken pipe
/// reads as empty, and a descriptor that keeps erroring is eventually given up on.
///
/// # Errors
///
/// This function returns an [`Errno`] for persistent or unexpected read failures.
pub fn safein(fd: FileDescriptor, buf: &mut [u8]) -> Result<usize, Errno> {
    let queued = term::pending_input(fd).unwrap_or(0);

    if queued == 0 {
        loop {
            // Avoid deadlock: do not read if nothing is in there
            if !can_read(fd, 0) {
                return Ok(0);
            }

            // SAFETY: The buffer pointer and length match an initialized slice.
            match unsafe {
                syscall_result!(SyscallNum::Read, fd.raw(), buf.as_mut_ptr(), buf.len())
            } {
                Ok(n) => return Ok(n),
                Err(Errno::Eintr | Errno::Eagain) => {}
                // Do not fail on a broken FIFO
                Err(Errno::Epipe) => return Ok(0),
                Err(errno) => return Err(errno),
            }
        }
    }

    let mut want = queued.min(buf.len());
    let mut got = 0;
    let mut repeated = 0;

    while want > 0 {
        // SAFETY: The remaining-buffer pointer and length match an initialized slice.
        match unsafe {
            syscall_result!(SyscallNum::Read, fd.raw(), buf[got..].as_mut_ptr(), want)
        } {
            Ok(0) => break,
            Ok(n) => {
                repeated = 0;
                got += n;
                want -= n;
            }
            Err(errno @ (Errno::Eintr | Errno::Eagain)) => {
                repeated += 1;
                if repeated > READ_REPEAT_LIMIT {
                    return Err(errno);
                }
            }
            Err(errno) => return Err(errno),
        }
    }

    Ok(got)
}

/// Reads exactly one byte, pausing briefly on an interrupted or momentarily empty line.
///
/// Returns [`None`] at end of input.
///
/// # Errors
///
/// This function propagates any non-retryable [`Errno`]s from the underlying read.
pub fn read_byte_patient(fd: FileDescriptor) -> Result<Option<u8>, Errno> {
    let mut byte: u8 = 0;
    loop {
        // SAFETY: The byte pointer is valid for one byte for the duration of the call.
        match unsafe { syscall_result!(SyscallNum::Read, fd.raw(), &raw mut byte, 1) } {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte)),
            Err(Errno::Eintr | Errno::Eagain) => {
                let _ = thread::sleep(&READ_RETRY_PAUSE);
            }
            Err(errno) => return Err(errno),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OpenOptions;

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn devnull_always_writable() {
        let null = OpenOptions::new().write_only().open("/dev/null").unwrap();
        assert!(can_write(null.fd(), 0));
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn quiet_pty_is_not_readable() {
        let mut tio = crate::term::Termios::default();
        tio.make_raw();
        let pair = crate::term::open_pty(&tio, &crate::term::WinSize::default()).unwrap();
        assert!(!can_read(pair.slave.fd(), 0));
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn copyout_accepts_everything_on_devnull() {
        let null = OpenOptions::new().write_only().open("/dev/null").unwrap();
        let report = copyout(null.fd(), b"0123456789", 3, None);
        assert_eq!(report, WriteReport { accepted: 10, stalled: false });
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn safeout_completes_on_devnull() {
        let null = OpenOptions::new().write_only().open("/dev/null").unwrap();
        assert_eq!(safeout(null.fd(), b"hello", 2, false, None), Ok(false));
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn safein_reads_whats_there() {
        let mut tio = crate::term::Termios::default();
        tio.make_raw();
        let pair = crate::term::open_pty(&tio, &crate::term::WinSize::default()).unwrap();

        pair.master.write(b"boot\n").unwrap();
        // Give the line discipline a moment to shuttle the bytes over.
        while !can_read(pair.slave.fd(), 10) {}

        let mut buf = [0_u8; 32];
        let n = safein(pair.slave.fd(), &mut buf).unwrap();
        assert_eq!(&buf[..n], b"boot\n");
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn safein_empty_is_zero() {
        let mut tio = crate::term::Termios::default();
        tio.make_raw();
        let pair = crate::term::open_pty(&tio, &crate::term::WinSize::default()).unwrap();

        let mut buf = [0_u8; 8];
        assert_eq!(safein(pair.slave.fd(), &mut buf), Ok(0));
    }
}
