//! The readiness registry: one epoll instance, one handler token per watched descriptor.

use alloc::vec::Vec;

use crate::{
    Errno, SyscallNum,
    fs::{File, FileDescriptor},
    ipc::SigSet,
    syscall_result,
};

/// `EPOLL_CLOEXEC`
const EPOLL_CLOEXEC: usize = 0x8_0000;

/// `EPOLL_CTL_ADD`
const CTL_ADD: usize = 1;
/// `EPOLL_CTL_DEL`
const CTL_DEL: usize = 2;
/// `EPOLL_CTL_MOD`
const CTL_MOD: usize = 3;

/// The kernel-side size of a signal set, in bytes.
const SIGSET_SIZE: usize = 8;

bitflags::bitflags! {
    /// Readiness event bits, as consumed and produced by
    /// [`epoll_ctl(2)`](https://www.man7.org/linux/man-pages/man2/epoll_ctl.2.html).
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EpollEvents: u32 {
        /// The descriptor is readable.
        const IN = 0x001;
        /// Priority data is readable.
        const PRI = 0x002;
        /// The descriptor is writable.
        const OUT = 0x004;
        /// An error condition is pending.
        const ERR = 0x008;
        /// The peer hung up.
        const HUP = 0x010;
        /// The peer closed its writing half.
        const RDHUP = 0x2000;
        /// Disarm the watch after its first event.
        const ONESHOT = 1 << 30;
    }
}

/// The handler a ready descriptor is routed to. Carried by each watch so that the owning context
/// can dispatch without function pointers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// The capture source produced console traffic.
    CaptureInput,
    /// The log fifo produced auxiliary traffic.
    FifoInput,
    /// The control socket has a client waiting.
    SocketAccept,
    /// An accepted control connection sent a command.
    ClientCommand,
    /// An accepted control connection became writable for the deferred password reply.
    PasswordAnswer,
    /// A blocked sink became writable again.
    SinkWatchdog,
}

/// One readiness event handed back by [`Registry::wait`].
#[derive(Copy, Clone, Debug)]
pub struct Ready {
    /// The descriptor that became ready.
    pub fd: FileDescriptor,
    /// The handler token registered for it.
    pub token: Token,
    /// What the kernel reported.
    pub events: EpollEvents,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Default)]
struct EpollEventRaw {
    events: u32,
    data: u64,
}

#[derive(Debug)]
struct Watch {
    fd: FileDescriptor,
    token: Token,
}

/// An ordered set of watched descriptors over a single epoll instance.
///
/// Every descriptor in the kernel set has exactly one entry here; entries keep insertion order.
#[derive(Debug)]
pub struct Registry {
    epoll: File,
    watches: Vec<Watch>,
}
impl Registry {
    /// Creates an empty registry.
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s from
    /// [`epoll_create1(2)`](https://www.man7.org/linux/man-pages/man2/epoll_create1.2.html).
    pub fn new() -> Result<Self, Errno> {
        // SAFETY: Statically-chosen flag argument.
        let epfd = unsafe { syscall_result!(SyscallNum::EpollCreate1, EPOLL_CLOEXEC)? };
        Ok(Self {
            epoll: File::__new(epfd.into()),
            watches: Vec::new(),
        })
    }

    fn ctl(&self, op: usize, fd: FileDescriptor, events: EpollEvents) -> Result<(), Errno> {
        let mut ev = EpollEventRaw {
            events: events.bits(),
            data: fd.raw() as u64,
        };
        let ev_ptr = if op == CTL_DEL {
            core::ptr::null_mut()
        } else {
            &raw mut ev
        };

        // SAFETY: The event pointer is valid (or null for deletion) for the duration of the call.
        unsafe {
            syscall_result!(SyscallNum::EpollCtl, self.epoll.fd().raw(), op, fd.raw(), ev_ptr)?;
        }
        Ok(())
    }

    fn position(&self, fd: FileDescriptor) -> Option<usize> {
        self.watches.iter().position(|watch| watch.fd == fd)
    }

    /// Watches the given descriptor for input (readable, priority, peer shutdown).
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s from the underlying `epoll_ctl` call.
    pub fn add_read(&mut self, fd: FileDescriptor, token: Token) -> Result<(), Errno> {
        self.ctl(CTL_ADD, fd, EpollEvents::IN | EpollEvents::PRI | EpollEvents::RDHUP)?;
        self.watches.push(Watch { fd, token });
        Ok(())
    }

    /// Watches the given descriptor for one shot of writability (or error).
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s from the underlying `epoll_ctl` call.
    pub fn add_write(&mut self, fd: FileDescriptor, token: Token) -> Result<(), Errno> {
        self.ctl(
            CTL_ADD,
            fd,
            EpollEvents::OUT | EpollEvents::ONESHOT | EpollEvents::PRI | EpollEvents::ERR,
        )?;
        self.watches.push(Watch { fd, token });
        Ok(())
    }

    /// Converts an already-watched descriptor into a one-shot writability watch routed to the
    /// given token.
    ///
    /// # Errors
    ///
    /// This function returns [`Errno::Enoent`] if the descriptor is not watched and propagates
    /// any [`Errno`]s from the underlying `epoll_ctl` call.
    pub fn answer_once(&mut self, fd: FileDescriptor, token: Token) -> Result<(), Errno> {
        let position = self.position(fd).ok_or(Errno::Enoent)?;
        self.ctl(CTL_MOD, fd, EpollEvents::OUT | EpollEvents::ONESHOT)?;
        self.watches[position].token = token;
        Ok(())
    }

    /// Re-arms a disarmed one-shot watch on the given descriptor.
    ///
    /// # Errors
    ///
    /// This function returns [`Errno::Enoent`] if the descriptor is not watched and propagates
    /// any [`Errno`]s from the underlying `epoll_ctl` call.
    pub fn reenable(&mut self, fd: FileDescriptor) -> Result<(), Errno> {
        self.position(fd).ok_or(Errno::Enoent)?;
        self.ctl(CTL_MOD, fd, EpollEvents::OUT | EpollEvents::ONESHOT)
    }

    /// Stops watching the given descriptor.
    ///
    /// The kernel-side removal happens before any later add can reuse the slot.
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s from the underlying `epoll_ctl` call.
    pub fn delete(&mut self, fd: FileDescriptor) -> Result<(), Errno> {
        if let Some(position) = self.position(fd) {
            self.watches.remove(position);
        }
        self.ctl(CTL_DEL, fd, EpollEvents::empty())
    }

    /// Whether the given descriptor is currently watched.
    #[must_use]
    pub fn watches(&self, fd: FileDescriptor) -> bool {
        self.position(fd).is_some()
    }

    /// The number of watched descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// The watched descriptors in insertion order. Used by forked children to drop everything
    /// the daemon holds open.
    pub fn fds(&self) -> impl Iterator<Item = FileDescriptor> + '_ {
        self.watches.iter().map(|watch| watch.fd)
    }

    /// The descriptor of the epoll instance itself.
    #[must_use]
    pub fn epoll_fd(&self) -> FileDescriptor {
        self.epoll.fd()
    }

    /// Waits up to `timeout_ms` milliseconds for readiness, with the given signal mask installed
    /// for the duration of the wait.
    ///
    /// Ready descriptors land in `out` in the order the kernel reported them. Returns `true` if
    /// anything was delivered or the wait was interrupted by a signal.
    ///
    /// # Errors
    ///
    /// This function propagates any non-`EINTR` [`Errno`]s from the underlying
    /// [`epoll_pwait(2)`](https://www.man7.org/linux/man-pages/man2/epoll_pwait.2.html) call;
    /// those are fatal to the event loop.
    pub fn wait(
        &self,
        timeout_ms: i32,
        mask: &SigSet,
        out: &mut Vec<Ready>,
    ) -> Result<bool, Errno> {
        out.clear();

        let capacity = self.watches.len().max(1);
        let mut events = alloc::vec![EpollEventRaw::default(); capacity];

        // SAFETY: The event buffer matches the advertised capacity; the mask pointer is valid for
        // the duration of the call.
        let nfds = match unsafe {
            syscall_result!(
                SyscallNum::EpollPwait,
                self.epoll.fd().raw(),
                events.as_mut_ptr(),
                capacity,
                timeout_ms,
                mask.as_ptr(),
                SIGSET_SIZE
            )
        } {
            Ok(n) => n,
            Err(Errno::Eintr) => return Ok(true),
            Err(errno) => return Err(errno),
        };

        for event in &events[..nfds] {
            let fd = FileDescriptor::from(usize::try_from(event.data).unwrap_or(usize::MAX));
            let Some(position) = self.position(fd) else {
                continue;
            };
            out.push(Ready {
                fd,
                token: self.watches[position].token,
                events: EpollEvents::from_bits_truncate(event.events),
            });
        }

        Ok(!out.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OpenOptions;

    fn ready_pty() -> crate::term::PtyPair {
        let mut tio = crate::term::Termios::default();
        tio.make_raw();
        #[allow(clippy::unwrap_used)]
        crate::term::open_pty(&tio, &crate::term::WinSize::default()).unwrap()
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn one_watch_per_fd() {
        let pair = ready_pty();
        let mut registry = Registry::new().unwrap();

        registry.add_read(pair.slave.fd(), Token::CaptureInput).unwrap();
        assert!(registry.watches(pair.slave.fd()));
        assert_eq!(registry.len(), 1);

        registry.delete(pair.slave.fd()).unwrap();
        assert!(!registry.watches(pair.slave.fd()));
        assert!(registry.is_empty());

        // The kernel slot is free again.
        registry.add_read(pair.slave.fd(), Token::CaptureInput).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn readable_event_is_routed() {
        let pair = ready_pty();
        let mut registry = Registry::new().unwrap();
        registry.add_read(pair.slave.fd(), Token::CaptureInput).unwrap();

        pair.master.write(b"x").unwrap();

        let mut ready = alloc::vec::Vec::new();
        let ran = registry.wait(1000, &SigSet::empty(), &mut ready).unwrap();
        assert!(ran);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].fd, pair.slave.fd());
        assert_eq!(ready[0].token, Token::CaptureInput);
        assert!(ready[0].events.contains(EpollEvents::IN));
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn oneshot_write_disarms_until_reenabled() {
        let null = OpenOptions::new().write_only().open("/dev/null").unwrap();
        let mut registry = Registry::new().unwrap();
        registry.add_write(null.fd(), Token::SinkWatchdog).unwrap();

        let mut ready = alloc::vec::Vec::new();
        assert!(registry.wait(100, &SigSet::empty(), &mut ready).unwrap());
        assert_eq!(ready[0].token, Token::SinkWatchdog);

        // One-shot: no further event until re-armed.
        assert!(!registry.wait(20, &SigSet::empty(), &mut ready).unwrap());

        registry.reenable(null.fd()).unwrap();
        assert!(registry.wait(100, &SigSet::empty(), &mut ready).unwrap());
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn answer_once_swaps_token() {
        let null = OpenOptions::new().write_only().open("/dev/null").unwrap();
        let mut registry = Registry::new().unwrap();
        registry.add_read(null.fd(), Token::ClientCommand).unwrap();

        registry.answer_once(null.fd(), Token::PasswordAnswer).unwrap();

        let mut ready = alloc::vec::Vec::new();
        assert!(registry.wait(100, &SigSet::empty(), &mut ready).unwrap());
        assert_eq!(ready[0].token, Token::PasswordAnswer);
        assert!(ready[0].events.contains(EpollEvents::OUT));
    }

    #[test_case]
    fn empty_registry_times_out() {
        #[allow(clippy::unwrap_used)]
        let registry = Registry::new().unwrap();
        let mut ready = alloc::vec::Vec::new();
        #[allow(clippy::unwrap_used)]
        let ran = registry.wait(10, &SigSet::empty(), &mut ready).unwrap();
        assert!(!ran);
    }
}
