//! The kernel log interface: ring buffer queries, dumps, and console printk gating.

use lazy_static::lazy_static;

use crate::{Errno, SyscallNum, syscall_result};

/// `SYSLOG_ACTION_READ_ALL`: read the whole ring buffer, non-destructively.
const ACTION_READ_ALL: usize = 3;
/// `SYSLOG_ACTION_CONSOLE_OFF`: disable printk's to console.
const ACTION_CONSOLE_OFF: usize = 6;
/// `SYSLOG_ACTION_CONSOLE_ON`: enable printk's to console.
const ACTION_CONSOLE_ON: usize = 7;
/// `SYSLOG_ACTION_SIZE_UNREAD`: number of unread characters in the log buffer.
const ACTION_SIZE_UNREAD: usize = 9;
/// `SYSLOG_ACTION_SIZE_BUFFER`: total size of the log buffer.
const ACTION_SIZE_BUFFER: usize = 10;

/// Ring size assumed when the kernel won't say.
const BUFFER_SIZE_FALLBACK: usize = 1 << 17;

/// Ceiling on the ring dump; everything the daemon holds is locked RAM.
const BUFFER_SIZE_LIMIT: usize = 1 << 21;

lazy_static! {
    /// The size of the kernel's log ring buffer, probed once.
    pub static ref RING_BUFFER_SIZE: usize = ring_buffer_size();
}

fn ring_buffer_size() -> usize {
    // SAFETY: This action takes no buffer.
    match unsafe { syscall_result!(SyscallNum::Syslog, ACTION_SIZE_BUFFER, 0, 0) } {
        Ok(size) if size > 0 => size.min(BUFFER_SIZE_LIMIT),
        _ => BUFFER_SIZE_FALLBACK,
    }
}

/// Reads the entire kernel ring buffer into `buf`, returning the number of bytes delivered. The
/// ring itself is left unread for other consumers.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying
/// [`syslog(2)`](https://www.man7.org/linux/man-pages/man2/syslog.2.html) syscall.
pub fn read_all(buf: &mut [u8]) -> Result<usize, Errno> {
    // SAFETY: The buffer pointer and length match an initialized slice.
    unsafe { syscall_result!(SyscallNum::Syslog, ACTION_READ_ALL, buf.as_mut_ptr(), buf.len()) }
}

/// The number of kernel log characters not yet picked up by any reader.
#[must_use]
pub fn unread() -> usize {
    // SAFETY: This action takes no buffer.
    unsafe { syscall_result!(SyscallNum::Syslog, ACTION_SIZE_UNREAD, 0, 0) }.unwrap_or(0)
}

/// Stops the kernel from printing its messages to the consoles. Used while a passphrase prompt
/// owns them.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying syscall.
pub fn console_off() -> Result<(), Errno> {
    // SAFETY: This action takes no buffer.
    unsafe {
        syscall_result!(SyscallNum::Syslog, ACTION_CONSOLE_OFF, 0, 0)?;
    }
    Ok(())
}

/// Lets the kernel print to the consoles again.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying syscall.
pub fn console_on() -> Result<(), Errno> {
    // SAFETY: This action takes no buffer.
    unsafe {
        syscall_result!(SyscallNum::Syslog, ACTION_CONSOLE_ON, 0, 0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn ring_size_is_sane() {
        // Either the kernel answered or the fallback is in effect; both are nonzero.
        assert!(*RING_BUFFER_SIZE > 0);
    }
}
