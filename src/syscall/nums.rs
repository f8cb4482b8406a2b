//! The [`SyscallNum`] type: x86_64 Linux syscall numbers.

/// The number of a Linux syscall on x86_64, as listed in the kernel's
/// [syscall table](https://github.com/torvalds/linux/blob/master/arch/x86/entry/syscalls/syscall_64.tbl).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
#[allow(dead_code)]
pub enum SyscallNum {
    /// [`read(2)`](https://www.man7.org/linux/man-pages/man2/read.2.html)
    Read = 0,
    /// [`write(2)`](https://www.man7.org/linux/man-pages/man2/write.2.html)
    Write = 1,
    /// [`open(2)`](https://www.man7.org/linux/man-pages/man2/open.2.html)
    Open = 2,
    /// [`close(2)`](https://www.man7.org/linux/man-pages/man2/close.2.html)
    Close = 3,
    /// [`stat(2)`](https://www.man7.org/linux/man-pages/man2/stat.2.html)
    Stat = 4,
    /// [`fstat(2)`](https://www.man7.org/linux/man-pages/man2/fstat.2.html)
    Fstat = 5,
    /// [`lstat(2)`](https://www.man7.org/linux/man-pages/man2/lstat.2.html)
    Lstat = 6,
    /// [`poll(2)`](https://www.man7.org/linux/man-pages/man2/poll.2.html)
    Poll = 7,
    /// [`lseek(2)`](https://www.man7.org/linux/man-pages/man2/lseek.2.html)
    Lseek = 8,
    /// [`mmap(2)`](https://www.man7.org/linux/man-pages/man2/mmap.2.html)
    Mmap = 9,
    /// [`munmap(2)`](https://www.man7.org/linux/man-pages/man2/munmap.2.html)
    Munmap = 11,
    /// [`rt_sigaction(2)`](https://www.man7.org/linux/man-pages/man2/rt_sigaction.2.html)
    RtSigaction = 13,
    /// [`rt_sigprocmask(2)`](https://www.man7.org/linux/man-pages/man2/rt_sigprocmask.2.html)
    RtSigprocmask = 14,
    /// [`ioctl(2)`](https://www.man7.org/linux/man-pages/man2/ioctl.2.html)
    Ioctl = 16,
    /// [`access(2)`](https://www.man7.org/linux/man-pages/man2/access.2.html)
    Access = 21,
    /// [`dup(2)`](https://www.man7.org/linux/man-pages/man2/dup.2.html)
    Dup = 32,
    /// [`dup2(2)`](https://www.man7.org/linux/man-pages/man2/dup2.2.html)
    Dup2 = 33,
    /// [`nanosleep(2)`](https://www.man7.org/linux/man-pages/man2/nanosleep.2.html)
    Nanosleep = 35,
    /// [`getpid(2)`](https://www.man7.org/linux/man-pages/man2/getpid.2.html)
    Getpid = 39,
    /// [`socket(2)`](https://www.man7.org/linux/man-pages/man2/socket.2.html)
    Socket = 41,
    /// [`connect(2)`](https://www.man7.org/linux/man-pages/man2/connect.2.html)
    Connect = 42,
    /// [`sendto(2)`](https://www.man7.org/linux/man-pages/man2/sendto.2.html)
    Sendto = 44,
    /// [`bind(2)`](https://www.man7.org/linux/man-pages/man2/bind.2.html)
    Bind = 49,
    /// [`listen(2)`](https://www.man7.org/linux/man-pages/man2/listen.2.html)
    Listen = 50,
    /// [`getsockopt(2)`](https://www.man7.org/linux/man-pages/man2/getsockopt.2.html)
    Getsockopt = 55,
    /// [`fork(2)`](https://www.man7.org/linux/man-pages/man2/fork.2.html)
    Fork = 57,
    /// [`execve(2)`](https://www.man7.org/linux/man-pages/man2/execve.2.html)
    Execve = 59,
    /// [`exit(2)`](https://www.man7.org/linux/man-pages/man2/exit.2.html)
    Exit = 60,
    /// [`wait4(2)`](https://www.man7.org/linux/man-pages/man2/wait4.2.html)
    Wait4 = 61,
    /// [`kill(2)`](https://www.man7.org/linux/man-pages/man2/kill.2.html)
    Kill = 62,
    /// [`fcntl(2)`](https://www.man7.org/linux/man-pages/man2/fcntl.2.html)
    Fcntl = 72,
    /// [`chdir(2)`](https://www.man7.org/linux/man-pages/man2/chdir.2.html)
    Chdir = 80,
    /// [`rename(2)`](https://www.man7.org/linux/man-pages/man2/rename.2.html)
    Rename = 82,
    /// [`mkdir(2)`](https://www.man7.org/linux/man-pages/man2/mkdir.2.html)
    Mkdir = 83,
    /// [`rmdir(2)`](https://www.man7.org/linux/man-pages/man2/rmdir.2.html)
    Rmdir = 84,
    /// [`unlink(2)`](https://www.man7.org/linux/man-pages/man2/unlink.2.html)
    Unlink = 87,
    /// [`readlink(2)`](https://www.man7.org/linux/man-pages/man2/readlink.2.html)
    Readlink = 89,
    /// [`getuid(2)`](https://www.man7.org/linux/man-pages/man2/getuid.2.html)
    Getuid = 102,
    /// [`syslog(2)`](https://www.man7.org/linux/man-pages/man2/syslog.2.html)
    Syslog = 103,
    /// [`setsid(2)`](https://www.man7.org/linux/man-pages/man2/setsid.2.html)
    Setsid = 112,
    /// [`rt_sigtimedwait(2)`](https://www.man7.org/linux/man-pages/man2/rt_sigtimedwait.2.html)
    RtSigtimedwait = 128,
    /// [`mknod(2)`](https://www.man7.org/linux/man-pages/man2/mknod.2.html)
    Mknod = 133,
    /// [`statfs(2)`](https://www.man7.org/linux/man-pages/man2/statfs.2.html)
    Statfs = 137,
    /// [`mlockall(2)`](https://www.man7.org/linux/man-pages/man2/mlockall.2.html)
    Mlockall = 151,
    /// [`prctl(2)`](https://www.man7.org/linux/man-pages/man2/prctl.2.html)
    Prctl = 157,
    /// [`chroot(2)`](https://www.man7.org/linux/man-pages/man2/chroot.2.html)
    Chroot = 161,
    /// [`getdents64(2)`](https://www.man7.org/linux/man-pages/man2/getdents.2.html)
    Getdents64 = 217,
    /// [`epoll_ctl(2)`](https://www.man7.org/linux/man-pages/man2/epoll_ctl.2.html)
    EpollCtl = 233,
    /// [`waitid(2)`](https://www.man7.org/linux/man-pages/man2/waitid.2.html)
    Waitid = 247,
    /// [`epoll_pwait(2)`](https://www.man7.org/linux/man-pages/man2/epoll_pwait.2.html)
    EpollPwait = 281,
    /// [`accept4(2)`](https://www.man7.org/linux/man-pages/man2/accept4.2.html)
    Accept4 = 288,
    /// [`epoll_create1(2)`](https://www.man7.org/linux/man-pages/man2/epoll_create1.2.html)
    EpollCreate1 = 291,
}
