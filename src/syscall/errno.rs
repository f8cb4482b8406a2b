//! The [`Errno`] type: error numbers returned by failed Linux syscalls.

use core::fmt::Display;

use num_enum::TryFromPrimitive;

/// The kernel reports failure by returning a value in the top page of the
/// address space; anything above this is an encoded error number.
const ERRNO_FLOOR: usize = usize::MAX - 4095;

/// An error number returned by a failed Linux syscall.
///
/// See [`errno(3)`](https://www.man7.org/linux/man-pages/man3/errno.3.html) for the meaning of
/// the individual values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(usize)]
#[non_exhaustive]
pub enum Errno {
    /// Operation not permitted
    Eperm = 1,
    /// No such file or directory
    Enoent = 2,
    /// No such process
    Esrch = 3,
    /// Interrupted system call
    Eintr = 4,
    /// Input/output error
    Eio = 5,
    /// No such device or address
    Enxio = 6,
    /// Argument list too long
    E2big = 7,
    /// Exec format error
    Enoexec = 8,
    /// Bad file descriptor
    Ebadf = 9,
    /// No child processes
    Echild = 10,
    /// Resource temporarily unavailable
    Eagain = 11,
    /// Cannot allocate memory
    Enomem = 12,
    /// Permission denied
    Eacces = 13,
    /// Bad address
    Efault = 14,
    /// Block device required
    Enotblk = 15,
    /// Device or resource busy
    Ebusy = 16,
    /// File exists
    Eexist = 17,
    /// Invalid cross-device link
    Exdev = 18,
    /// No such device
    Enodev = 19,
    /// Not a directory
    Enotdir = 20,
    /// Is a directory
    Eisdir = 21,
    /// Invalid argument
    Einval = 22,
    /// Too many open files in system
    Enfile = 23,
    /// Too many open files
    Emfile = 24,
    /// Inappropriate ioctl for device
    Enotty = 25,
    /// Text file busy
    Etxtbsy = 26,
    /// File too large
    Efbig = 27,
    /// No space left on device
    Enospc = 28,
    /// Illegal seek
    Espipe = 29,
    /// Read-only file system
    Erofs = 30,
    /// Too many links
    Emlink = 31,
    /// Broken pipe
    Epipe = 32,
    /// Numerical argument out of domain
    Edom = 33,
    /// Numerical result out of range
    Erange = 34,
    /// Resource deadlock avoided
    Edeadlk = 35,
    /// File name too long
    Enametoolong = 36,
    /// No locks available
    Enolck = 37,
    /// Function not implemented
    Enosys = 38,
    /// Directory not empty
    Enotempty = 39,
    /// Too many levels of symbolic links
    Eloop = 40,
    /// No message of desired type
    Enomsg = 42,
    /// Identifier removed
    Eidrm = 43,
    /// Invalid or incomplete multibyte or wide character
    Eilseq = 84,
    /// Value too large for defined data type
    Eoverflow = 75,
    /// Protocol error
    Eproto = 71,
    /// Bad message
    Ebadmsg = 74,
    /// File descriptor in bad state
    Ebadfd = 77,
    /// Socket operation on non-socket
    Enotsock = 88,
    /// Destination address required
    Edestaddrreq = 89,
    /// Message too long
    Emsgsize = 90,
    /// Protocol not supported
    Eprotonosupport = 93,
    /// Operation not supported
    Eopnotsupp = 95,
    /// Address family not supported by protocol
    Eafnosupport = 97,
    /// Address already in use
    Eaddrinuse = 98,
    /// Cannot assign requested address
    Eaddrnotavail = 99,
    /// Network is down
    Enetdown = 100,
    /// Software caused connection abort
    Econnaborted = 103,
    /// Connection reset by peer
    Econnreset = 104,
    /// No buffer space available
    Enobufs = 105,
    /// Transport endpoint is already connected
    Eisconn = 106,
    /// Transport endpoint is not connected
    Enotconn = 107,
    /// Connection timed out
    Etimedout = 110,
    /// Connection refused
    Econnrefused = 111,
    /// Operation already in progress
    Ealready = 114,
    /// Operation now in progress
    Einprogress = 115,
    /// Operation canceled
    Ecanceled = 125,
}
impl Errno {
    /// Decodes a raw syscall return value into a [`Result`].
    ///
    /// Success values pass through within the [`Ok`]; kernel error returns come back as an
    /// [`Errno`] within the [`Err`]. An error number this enum does not know is reported as
    /// [`Errno::Einval`].
    #[doc(hidden)]
    pub fn __from_ret(ret: usize) -> Result<usize, Self> {
        if ret >= ERRNO_FLOOR {
            Err(Self::try_from(ret.wrapping_neg()).unwrap_or(Self::Einval))
        } else {
            Ok(ret)
        }
    }

    /// Gets a human-readable description of this [`Errno`].
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eperm => "Operation not permitted",
            Self::Enoent => "No such file or directory",
            Self::Esrch => "No such process",
            Self::Eintr => "Interrupted system call",
            Self::Eio => "Input/output error",
            Self::Enxio => "No such device or address",
            Self::E2big => "Argument list too long",
            Self::Enoexec => "Exec format error",
            Self::Ebadf => "Bad file descriptor",
            Self::Echild => "No child processes",
            Self::Eagain => "Resource temporarily unavailable",
            Self::Enomem => "Cannot allocate memory",
            Self::Eacces => "Permission denied",
            Self::Efault => "Bad address",
            Self::Enotblk => "Block device required",
            Self::Ebusy => "Device or resource busy",
            Self::Eexist => "File exists",
            Self::Exdev => "Invalid cross-device link",
            Self::Enodev => "No such device",
            Self::Enotdir => "Not a directory",
            Self::Eisdir => "Is a directory",
            Self::Einval => "Invalid argument",
            Self::Enfile => "Too many open files in system",
            Self::Emfile => "Too many open files",
            Self::Enotty => "Inappropriate ioctl for device",
            Self::Etxtbsy => "Text file busy",
            Self::Efbig => "File too large",
            Self::Enospc => "No space left on device",
            Self::Espipe => "Illegal seek",
            Self::Erofs => "Read-only file system",
            Self::Emlink => "Too many links",
            Self::Epipe => "Broken pipe",
            Self::Edom => "Numerical argument out of domain",
            Self::Erange => "Numerical result out of range",
            Self::Edeadlk => "Resource deadlock avoided",
            Self::Enametoolong => "File name too long",
            Self::Enolck => "No locks available",
            Self::Enosys => "Function not implemented",
            Self::Enotempty => "Directory not empty",
            Self::Eloop => "Too many levels of symbolic links",
            Self::Enomsg => "No message of desired type",
            Self::Eidrm => "Identifier removed",
            Self::Eilseq => "Invalid or incomplete multibyte or wide character",
            Self::Eoverflow => "Value too large for defined data type",
            Self::Eproto => "Protocol error",
            Self::Ebadmsg => "Bad message",
            Self::Ebadfd => "File descriptor in bad state",
            Self::Enotsock => "Socket operation on non-socket",
            Self::Edestaddrreq => "Destination address required",
            Self::Emsgsize => "Message too long",
            Self::Eprotonosupport => "Protocol not supported",
            Self::Eopnotsupp => "Operation not supported",
            Self::Eafnosupport => "Address family not supported by protocol",
            Self::Eaddrinuse => "Address already in use",
            Self::Eaddrnotavail => "Cannot assign requested address",
            Self::Enetdown => "Network is down",
            Self::Econnaborted => "Software caused connection abort",
            Self::Econnreset => "Connection reset by peer",
            Self::Enobufs => "No buffer space available",
            Self::Eisconn => "Transport endpoint is already connected",
            Self::Enotconn => "Transport endpoint is not connected",
            Self::Etimedout => "Connection timed out",
            Self::Econnrefused => "Connection refused",
            Self::Ealready => "Operation already in progress",
            Self::Einprogress => "Operation now in progress",
            Self::Ecanceled => "Operation canceled",
        }
    }
}
impl Display for Errno {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn ok_passthrough() {
        assert_eq!(Errno::__from_ret(0), Ok(0));
        assert_eq!(Errno::__from_ret(4096), Ok(4096));
    }

    #[test_case]
    fn err_decode() {
        assert_eq!(Errno::__from_ret(2_usize.wrapping_neg()), Err(Errno::Enoent));
        assert_eq!(
            Errno::__from_ret(11_usize.wrapping_neg()),
            Err(Errno::Eagain)
        );
    }

    #[test_case]
    fn unknown_code_is_einval() {
        assert_eq!(
            Errno::__from_ret(4095_usize.wrapping_neg()),
            Err(Errno::Einval)
        );
    }
}
