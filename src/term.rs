//! Terminal control: termios attributes, window sizes, console redirection, and pseudo-terminal
//! pairs.

use alloc::{format, string::String};

use crate::{
    Errno, SyscallNum,
    fs::{File, FileDescriptor, OpenOptions},
    syscall_result,
};

mod termios;

// RE-EXPORTS
pub use termios::{
    ControlCharIndex, ControlModeFlags, InputModeFlags, LocalModeFlags, OutputModeFlags, Termios,
};

/// `TCGETS`: fetch the termios of a terminal.
const TCGETS: usize = 0x5401;
/// `TCSETS`: replace the termios of a terminal immediately (`TCSANOW`).
const TCSETS: usize = 0x5402;
/// `TCSBRK`: with a nonzero argument, wait until all queued output is transmitted.
const TCSBRK: usize = 0x5409;
/// `TCFLSH`: discard queued data; argument 0 flushes input.
const TCFLSH: usize = 0x540B;
/// `TIOCSCTTY`: make a terminal the controlling terminal of the caller.
const TIOCSCTTY: usize = 0x540E;
/// `TIOCGWINSZ`: fetch the window size of a terminal.
const TIOCGWINSZ: usize = 0x5413;
/// `TIOCSWINSZ`: replace the window size of a terminal.
const TIOCSWINSZ: usize = 0x5414;
/// `FIONREAD`: number of bytes waiting in the input queue.
const FIONREAD: usize = 0x541B;
/// `TIOCCONS`: redirect kernel console output to (or away from) a terminal.
const TIOCCONS: usize = 0x541D;
/// `TIOCSLCKTRMIOS`: replace the termios lock mask of a terminal.
const TIOCSLCKTRMIOS: usize = 0x5457;
/// `TIOCSPTLCK`: lock or unlock the slave of a pty master.
const TIOCSPTLCK: usize = 0x4004_5431;
/// `TIOCGPTN`: fetch the index of the slave of a pty master.
const TIOCGPTN: usize = 0x8004_5430;

/// The fallback text screen geometry when a console reports no window size.
const FALLBACK_ROWS: u16 = 24;
/// See [`FALLBACK_ROWS`].
const FALLBACK_COLS: u16 = 80;

/// The size of a terminal's window, as moved by the `TIOCGWINSZ`/`TIOCSWINSZ` ioctls.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WinSize {
    /// Rows of text.
    pub rows: u16,
    /// Columns of text.
    pub cols: u16,
    /// Horizontal pixels; unused on text consoles.
    pub xpixel: u16,
    /// Vertical pixels; unused on text consoles.
    pub ypixel: u16,
}
impl WinSize {
    /// Replaces a zero geometry with the classic 80×24 screen.
    pub fn or_fallback(&mut self) -> &mut Self {
        if self.rows == 0 {
            self.rows = FALLBACK_ROWS;
        }
        if self.cols == 0 {
            self.cols = FALLBACK_COLS;
        }
        self
    }
}

/// A connected pseudo-terminal pair, master side and slave side, plus the slave's path.
#[derive(Debug)]
pub struct PtyPair {
    /// The master side; reads give back everything written to the slave.
    pub master: File,
    /// The slave side; behaves like a terminal device.
    pub slave: File,
    /// The filesystem path of the slave device.
    pub name: String,
}

/// Issues a terminal ioctl with a plain integer argument.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the underlying
/// [`ioctl(2)`](https://man7.org/linux/man-pages/man2/ioctl.2.html) syscall.
fn ioctl_int(fd: FileDescriptor, request: usize, arg: usize) -> Result<usize, Errno> {
    // SAFETY: The request selects an integer-argument ioctl, so no pointer is involved.
    unsafe { syscall_result!(SyscallNum::Ioctl, fd.raw(), request, arg) }
}

/// Issues a terminal ioctl whose argument is a pointer to `T`.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the underlying
/// [`ioctl(2)`](https://man7.org/linux/man-pages/man2/ioctl.2.html) syscall.
fn ioctl_ptr<T>(fd: FileDescriptor, request: usize, arg: *mut T) -> Result<usize, Errno> {
    // SAFETY: The caller matches `T` to the structure the request expects; the pointer is valid
    // for the duration of the call.
    unsafe { syscall_result!(SyscallNum::Ioctl, fd.raw(), request, arg) }
}

/// Fetches the terminal attributes of the given descriptor.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TCGETS` ioctl; notably [`Errno::Enotty`] when the
/// descriptor is not a terminal.
pub fn attributes(fd: FileDescriptor) -> Result<Termios, Errno> {
    let mut tio = Termios::default();
    ioctl_ptr(fd, TCGETS, &raw mut tio)?;
    Ok(tio)
}

/// Replaces the terminal attributes of the given descriptor immediately.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TCSETS` ioctl.
pub fn set_attributes(fd: FileDescriptor, tio: &Termios) -> Result<(), Errno> {
    let mut copy = tio.clone();
    ioctl_ptr(fd, TCSETS, &raw mut copy)?;
    Ok(())
}

/// Locks every terminal attribute of the given descriptor against change by other processes.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TIOCSLCKTRMIOS` ioctl.
pub fn lock_attributes(fd: FileDescriptor) -> Result<(), Errno> {
    let mut lock = Termios::all_locked();
    ioctl_ptr(fd, TIOCSLCKTRMIOS, &raw mut lock)?;
    Ok(())
}

/// Waits until everything queued on the given terminal has been transmitted. The `tcdrain(3)`
/// operation.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TCSBRK` ioctl.
pub fn drain(fd: FileDescriptor) -> Result<(), Errno> {
    ioctl_int(fd, TCSBRK, 1)?;
    Ok(())
}

/// Discards input queued on the given terminal that no one has read yet.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TCFLSH` ioctl.
pub fn flush_input(fd: FileDescriptor) -> Result<(), Errno> {
    ioctl_int(fd, TCFLSH, 0)?;
    Ok(())
}

/// The number of bytes waiting unread in the input queue of the given descriptor.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `FIONREAD` ioctl.
pub fn pending_input(fd: FileDescriptor) -> Result<usize, Errno> {
    let mut count: i32 = 0;
    ioctl_ptr(fd, FIONREAD, &raw mut count)?;
    #[allow(clippy::cast_sign_loss)]
    Ok(count.max(0) as usize)
}

/// Fetches the window size of the given terminal.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TIOCGWINSZ` ioctl.
pub fn window_size(fd: FileDescriptor) -> Result<WinSize, Errno> {
    let mut wz = WinSize::default();
    ioctl_ptr(fd, TIOCGWINSZ, &raw mut wz)?;
    Ok(wz)
}

/// Replaces the window size of the given terminal.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TIOCSWINSZ` ioctl.
pub fn set_window_size(fd: FileDescriptor, wz: &WinSize) -> Result<(), Errno> {
    let mut copy = *wz;
    ioctl_ptr(fd, TIOCSWINSZ, &raw mut copy)?;
    Ok(())
}

/// Points kernel console output at the given terminal, or back at the real console when the
/// descriptor already is the console device.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TIOCCONS` ioctl; [`Errno::Eperm`] when output is already
/// redirected elsewhere.
pub fn redirect_console(fd: FileDescriptor) -> Result<(), Errno> {
    ioctl_int(fd, TIOCCONS, 0)?;
    Ok(())
}

/// Makes the given terminal the controlling terminal of the calling session leader.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the `TIOCSCTTY` ioctl.
pub fn set_controlling(fd: FileDescriptor) -> Result<(), Errno> {
    ioctl_int(fd, TIOCSCTTY, 0)?;
    Ok(())
}

/// Opens a connected pseudo-terminal pair, applying the given attributes and window size to the
/// slave side before handing the pair back.
///
/// The master is opened from `/dev/ptmx`; the slave is resolved via `TIOCGPTN` and unlocked with
/// `TIOCSPTLCK`, the classic `openpty(3)` sequence.
///
/// # Errors
///
/// Propagates any [`Errno`]s from the opens and ioctls involved.
pub fn open_pty(tio: &Termios, wz: &WinSize) -> Result<PtyPair, Errno> {
    let master = OpenOptions::new()
        .read_write()
        .no_ctty(true)
        .open("/dev/ptmx")?;

    let mut unlock: i32 = 0;
    ioctl_ptr(master.fd(), TIOCSPTLCK, &raw mut unlock)?;

    let mut index: i32 = 0;
    ioctl_ptr(master.fd(), TIOCGPTN, &raw mut index)?;
    let name = format!("/dev/pts/{index}");

    let slave = OpenOptions::new()
        .read_write()
        .no_ctty(true)
        .open(name.as_str())?;

    set_attributes(slave.fd(), tio)?;
    set_window_size(slave.fd(), wz)?;

    Ok(PtyPair {
        master,
        slave,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn winsize_fallback() {
        let mut wz = WinSize::default();
        wz.or_fallback();
        assert_eq!((wz.rows, wz.cols), (24, 80));

        let mut wz = WinSize {
            rows: 50,
            cols: 132,
            ..WinSize::default()
        };
        wz.or_fallback();
        assert_eq!((wz.rows, wz.cols), (50, 132));
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn pty_pair_attributes_stick() {
        let mut tio = Termios::default();
        tio.make_raw();
        tio.set_speed_38400();
        let wz = WinSize {
            rows: 24,
            cols: 80,
            ..WinSize::default()
        };

        let pair = open_pty(&tio, &wz).unwrap();
        assert!(pair.name.starts_with("/dev/pts/"));

        let slave_tio = attributes(pair.slave.fd()).unwrap();
        assert!(!slave_tio.local_modes().contains(LocalModeFlags::ECHO));
        assert_eq!(window_size(pair.slave.fd()).unwrap(), wz);
    }

    #[test_case]
    fn regular_file_is_not_a_tty() {
        use crate::assert_err;
        let file = OpenOptions::new().open("/proc/self/stat");
        if let Ok(file) = file {
            assert_err!(attributes(file.fd()), Errno::Enotty);
        }
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn pending_input_counts_bytes() {
        let mut tio = Termios::default();
        tio.make_raw();
        let pair = open_pty(&tio, &WinSize::default()).unwrap();

        pair.master.write(b"abc").unwrap();
        // Raw mode passes the bytes straight to the slave's input queue.
        let mut seen = 0;
        for _ in 0..100 {
            seen = pending_input(pair.slave.fd()).unwrap();
            if seen == 3 {
                break;
            }
            crate::thread::sleep(&core::time::Duration::from_millis(1)).unwrap();
        }
        assert_eq!(seen, 3);
    }
}
