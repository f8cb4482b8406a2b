//! The control socket: an abstract-namespace Unix stream socket with credential-checked peers.

use crate::{
    Errno, SyscallNum,
    fs::{File, FileDescriptor},
    syscall_result,
};

/// The abstract-namespace address of the daemon's control socket (the leading NUL is supplied
/// when the address structure is built).
const SOCKET_NAME: &[u8] = b"/run/blogd/socket";

/// `AF_UNIX`
const AF_UNIX: u16 = 1;
/// `SOCK_STREAM`
const SOCK_STREAM: usize = 1;
/// `SOCK_NONBLOCK`
const SOCK_NONBLOCK: usize = 0x800;
/// `SOCK_CLOEXEC`
const SOCK_CLOEXEC: usize = 0x8_0000;

/// Connection backlog of the listening socket.
const BACKLOG: usize = 5;

/// `SOL_SOCKET`
const SOL_SOCKET: usize = 1;
/// `SO_PEERCRED`
const SO_PEERCRED: usize = 17;

/// `MSG_NOSIGNAL`: report a closed peer as `EPIPE` instead of raising SIGPIPE.
const MSG_NOSIGNAL: usize = 0x4000;
/// `MSG_MORE`: more frame parts follow; hold the segment.
const MSG_MORE: usize = 0x8000;

/// Size of the path field in `sockaddr_un`.
const UN_PATH_SIZE: usize = 108;

#[repr(C)]
struct SockAddrUn {
    family: u16,
    path: [u8; UN_PATH_SIZE],
}
impl SockAddrUn {
    /// The abstract control address and the byte count that selects exactly it.
    fn control() -> (Self, usize) {
        let mut addr = Self {
            family: AF_UNIX,
            path: [0; UN_PATH_SIZE],
        };
        // path[0] stays NUL: abstract namespace.
        addr.path[1..1 + SOCKET_NAME.len()].copy_from_slice(SOCKET_NAME);
        (addr, 2 + 1 + SOCKET_NAME.len())
    }
}

/// The identity of the process on the other end of a connection.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeerCredentials {
    /// The peer's process ID.
    pub pid: i32,
    /// The peer's effective user ID.
    pub uid: u32,
    /// The peer's effective group ID.
    pub gid: u32,
}

fn stream_socket() -> Result<File, Errno> {
    // SAFETY: Statically-chosen arguments.
    let fd = unsafe {
        syscall_result!(
            SyscallNum::Socket,
            AF_UNIX as usize,
            SOCK_STREAM | SOCK_CLOEXEC | SOCK_NONBLOCK,
            0
        )?
    };
    Ok(File::__new(fd.into()))
}

/// Creates the daemon's listening control socket.
///
/// # Errors
///
/// Propagates any [`Errno`]s from socket creation, bind, or listen; notably
/// [`Errno::Eaddrinuse`] when another daemon instance already owns the address.
pub fn listen() -> Result<File, Errno> {
    let socket = stream_socket()?;
    let (addr, len) = SockAddrUn::control();

    // SAFETY: The address structure outlives both calls and `len` covers exactly the bytes the
    // kernel may read.
    unsafe {
        syscall_result!(SyscallNum::Bind, socket.fd().raw(), &raw const addr, len)?;
        syscall_result!(SyscallNum::Listen, socket.fd().raw(), BACKLOG)?;
    }
    Ok(socket)
}

/// Connects to a running daemon's control socket.
///
/// # Errors
///
/// Propagates any [`Errno`]s from socket creation or connect; [`Errno::Econnrefused`] means no
/// daemon is listening.
pub fn connect() -> Result<File, Errno> {
    let socket = stream_socket()?;
    let (addr, len) = SockAddrUn::control();

    // SAFETY: The address structure outlives the call and `len` covers exactly the bytes the
    // kernel may read.
    unsafe {
        syscall_result!(SyscallNum::Connect, socket.fd().raw(), &raw const addr, len)?;
    }
    Ok(socket)
}

/// Accepts one waiting client off the listening socket, non-blocking and close-on-exec.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the underlying
/// [`accept4(2)`](https://www.man7.org/linux/man-pages/man2/accept4.2.html) call.
pub fn accept(listener: &File) -> Result<File, Errno> {
    // SAFETY: No peer-address output is requested.
    let fd = unsafe {
        syscall_result!(
            SyscallNum::Accept4,
            listener.fd().raw(),
            0,
            0,
            SOCK_CLOEXEC | SOCK_NONBLOCK
        )?
    };
    Ok(File::__new(fd.into()))
}

/// Queries the kernel for the identity of the peer behind a connection.
///
/// # Errors
///
/// Returns [`Errno::Eproto`] if the kernel hands back a short answer and propagates any
/// [`Errno`]s from the underlying `getsockopt` call.
pub fn peer_credentials(conn: FileDescriptor) -> Result<PeerCredentials, Errno> {
    let mut cred = PeerCredentials::default();
    let mut len: u32 = core::mem::size_of::<PeerCredentials>() as u32;

    // SAFETY: The credential structure and its length output are valid for the duration of the
    // call.
    unsafe {
        syscall_result!(
            SyscallNum::Getsockopt,
            conn.raw(),
            SOL_SOCKET,
            SO_PEERCRED,
            &raw mut cred,
            &raw mut len
        )?;
    }

    if len as usize != core::mem::size_of::<PeerCredentials>() {
        return Err(Errno::Eproto);
    }
    Ok(cred)
}

/// Sends bytes on a connection without ever raising SIGPIPE, flagging the segment as partial
/// while `more` holds.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the underlying `sendto` call.
pub(crate) fn send_some(fd: FileDescriptor, bytes: &[u8], more: bool) -> Result<usize, Errno> {
    let mut flags = MSG_NOSIGNAL;
    if more {
        flags |= MSG_MORE;
    }

    // SAFETY: The buffer pointer and length match an initialized slice; no destination address
    // is given on a connected socket.
    unsafe {
        syscall_result!(
            SyscallNum::Sendto,
            fd.raw(),
            bytes.as_ptr(),
            bytes.len(),
            flags,
            0,
            0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn listen_accept_roundtrip() {
        let listener = listen().unwrap();
        let client = connect().unwrap();
        let served = accept(&listener).unwrap();

        client.write(b"hi").unwrap();
        let mut buf = [0_u8; 4];
        // The bytes may take a beat to cross.
        while !crate::io::can_read(served.fd(), 50) {}
        assert_eq!(served.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"hi");
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn peer_is_us() {
        let listener = listen().unwrap();
        let _client = connect().unwrap();
        let served = accept(&listener).unwrap();

        let cred = peer_credentials(served.fd()).unwrap();
        assert_eq!(cred.pid, crate::process::getpid());
    }

    #[test_case]
    fn connect_without_daemon() {
        // Nothing listens while this test runs the client side alone.
        assert_err!(connect(), Errno::Econnrefused);
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn second_listener_collides() {
        let _first = listen().unwrap();
        assert_err!(listen(), Errno::Eaddrinuse);
    }
}
