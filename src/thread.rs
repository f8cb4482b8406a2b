//! Functionality related to pausing the calling thread.

use core::time::Duration;

use crate::{Errno, SyscallNum, syscall_result};

/// The raw time value consumed by the timed syscalls.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TimeSpec {
    sec: i64,
    nsec: i64,
}
impl TimeSpec {
    pub(crate) fn as_ptr(&self) -> *const Self {
        self
    }
}
impl From<&Duration> for TimeSpec {
    #[allow(clippy::cast_possible_wrap)]
    fn from(duration: &Duration) -> Self {
        Self {
            sec: duration.as_secs() as i64,
            nsec: i64::from(duration.subsec_nanos()),
        }
    }
}

/// Suspends the calling thread for (at least) the given duration.
///
/// Wrapper around the [`nanosleep(2)`](https://www.man7.org/linux/man-pages/man2/nanosleep.2.html)
/// Linux syscall. An interrupting signal resumes the sleep with the time that remained.
///
/// # Errors
///
/// This function propagates any non-`EINTR` [`Errno`]s from the underlying `nanosleep` syscall.
pub fn sleep(duration: &Duration) -> Result<(), Errno> {
    let mut request = TimeSpec::from(duration);
    let mut remain = TimeSpec::default();

    loop {
        // SAFETY: Both timespec pointers are valid for the duration of the call.
        match unsafe {
            syscall_result!(SyscallNum::Nanosleep, request.as_ptr(), &raw mut remain)
        } {
            Ok(_) => return Ok(()),
            Err(Errno::Eintr) => request = remain,
            Err(errno) => return Err(errno),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn short_sleep() {
        sleep(&Duration::from_millis(1)).unwrap();
    }

    #[test_case]
    fn timespec_split() {
        let ts = TimeSpec::from(&Duration::from_millis(1500));
        assert_eq!(ts, TimeSpec { sec: 1, nsec: 500_000_000 });
    }
}
