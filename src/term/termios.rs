//! The [`termios`](https://www.man7.org/linux/man-pages/man3/termios.3.html) data structure, which
//! provides a general terminal interface.

/// Number of control characters in the kernel's `termios`.
const NCCS: usize = 19;

/// `B38400`: the baud rate the capture pty is pinned to.
const B38400: u32 = 0o000_017;
/// Mask of the baud bits within the control modes.
const CBAUD: u32 = 0o010_017;
/// Mask of the input-baud bits within the control modes.
const CIBAUD: u32 = CBAUD << 16;
/// `CS8`: eight bits per character.
const CS8: u32 = 0o000_060;

/// A general terminal interface matching the kernel's
/// [`termios`](https://www.man7.org/linux/man-pages/man3/termios.3.html) structure on x86_64, as
/// moved by the `TCGETS`/`TCSETS` ioctl family.
#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Termios {
    iflag: u32,
    oflag: u32,
    cflag: u32,
    lflag: u32,
    line: u8,
    cc: [u8; NCCS],
}
impl Termios {
    /// A termios with every bit and control character set, as consumed by `TIOCSLCKTRMIOS` to
    /// lock every attribute of a terminal against change.
    #[must_use]
    pub fn all_locked() -> Self {
        Self {
            iflag: u32::MAX,
            oflag: u32::MAX,
            cflag: u32::MAX,
            lflag: u32::MAX,
            line: u8::MAX,
            cc: [u8::MAX; NCCS],
        }
    }

    /// The input mode flags.
    #[must_use]
    pub fn input_modes(&self) -> InputModeFlags {
        InputModeFlags::from_bits_truncate(self.iflag)
    }

    /// The output mode flags.
    #[must_use]
    pub fn output_modes(&self) -> OutputModeFlags {
        OutputModeFlags::from_bits_truncate(self.oflag)
    }

    /// The control mode flags.
    #[must_use]
    pub fn control_modes(&self) -> ControlModeFlags {
        ControlModeFlags::from_bits_truncate(self.cflag)
    }

    /// The local mode flags.
    #[must_use]
    pub fn local_modes(&self) -> LocalModeFlags {
        LocalModeFlags::from_bits_truncate(self.lflag)
    }

    /// Sets or clears one local mode flag.
    pub fn set_local_mode(&mut self, flag: LocalModeFlags, value: bool) -> &mut Self {
        if value {
            self.lflag |= flag.bits();
        } else {
            self.lflag &= !flag.bits();
        }
        self
    }

    /// The control character at the given index.
    #[must_use]
    pub fn control_char(&self, index: ControlCharIndex) -> u8 {
        self.cc[index as usize]
    }

    /// Replaces the control character at the given index.
    pub fn set_control_char(&mut self, index: ControlCharIndex, value: u8) -> &mut Self {
        self.cc[index as usize] = value;
        self
    }

    /// Switches the terminal to raw mode: no input or output translation, no echo, no canonical
    /// line assembly, eight bits per character. The classic `cfmakeraw(3)` recipe.
    pub fn make_raw(&mut self) -> &mut Self {
        self.iflag &= !(InputModeFlags::IGNBRK
            | InputModeFlags::BRKINT
            | InputModeFlags::PARMRK
            | InputModeFlags::ISTRIP
            | InputModeFlags::INLCR
            | InputModeFlags::IGNCR
            | InputModeFlags::ICRNL
            | InputModeFlags::IXON)
            .bits();
        self.oflag &= !OutputModeFlags::OPOST.bits();
        self.lflag &= !(LocalModeFlags::ECHO
            | LocalModeFlags::ECHONL
            | LocalModeFlags::ICANON
            | LocalModeFlags::ISIG
            | LocalModeFlags::IEXTEN)
            .bits();
        self.cflag &= !(ControlModeFlags::CSIZE | ControlModeFlags::PARENB).bits();
        self.cflag |= CS8;
        self
    }

    /// Pins both transfer directions to 38400 baud.
    pub fn set_speed_38400(&mut self) -> &mut Self {
        self.cflag &= !(CBAUD | CIBAUD);
        self.cflag |= B38400;
        self
    }

    /// Whether a parity bit is in play on this line.
    #[must_use]
    pub fn uses_parity(&self) -> bool {
        self.control_modes()
            .intersects(ControlModeFlags::PARENB | ControlModeFlags::PARODD)
    }
}

/// An index corresponding to a particular control character within [`Termios`].
#[repr(usize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlCharIndex {
    /// Interrupt character (INTR).
    Intr = 0,
    /// Quit character (QUIT).
    Quit = 1,
    /// Erase character (ERASE). Erases the previous not-yet-erased character.
    Erase = 2,
    /// Kill character (KILL). Erases the input since the last EOF or beginning-of-line.
    Kill = 3,
    /// End-of-file character (EOF). Causes the pending tty buffer to be sent to the waiting user
    /// program without waiting for end-of-line.
    Eof = 4,
    /// Timeout in deciseconds for noncanonical read (TIME).
    Time = 5,
    /// Minimum number of characters for noncanonical read (MIN).
    Min = 6,
    /// Start character (START). Restarts output stopped by the Stop character.
    Start = 8,
    /// Stop character (STOP). Stop output until Start character is typed.
    Stop = 9,
    /// Suspend character (SUSP).
    Susp = 10,
    /// Additional end-of-line character (EOL).
    Eol = 11,
}

bitflags::bitflags! {
    /// All the different input mode flags within the
    /// [`termios`](https://www.man7.org/linux/man-pages/man3/termios.3.html) data structure.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct InputModeFlags: u32 {
        /// Ignore BREAK condition on input.
        const IGNBRK = 0x0000_0001;
        /// A BREAK flushes the queues and raises `SIGINT` on the foreground process group.
        const BRKINT = 0x0000_0002;
        /// Ignore framing errors and parity errors.
        const IGNPAR = 0x0000_0004;
        /// Mark input bytes with parity/framing errors when passed into the program.
        const PARMRK = 0x0000_0008;
        /// Enable input parity checking.
        const INPCK = 0x0000_0010;
        /// Strip off eighth bit.
        const ISTRIP = 0x0000_0020;
        /// Translate NL to CR on input.
        const INLCR = 0x0000_0040;
        /// Ignore CR on input.
        const IGNCR = 0x0000_0080;
        /// Translate CR to NL on input (unless `IGNCR` is set).
        const ICRNL = 0x0000_0100;
        /// Enable XON/XOFF flow control on output.
        const IXON = 0x0000_0400;
        /// Typing any character will restart stopped output.
        const IXANY = 0x0000_0800;
        /// Enable XON/XOFF flow control on input.
        const IXOFF = 0x0000_1000;
        /// Input is UTF-8. Allows character-erase to be correctly performed in cooked mode.
        const IUTF8 = 0x0000_4000;
    }
}

bitflags::bitflags! {
    /// All the different output mode flags within the
    /// [`termios`](https://www.man7.org/linux/man-pages/man3/termios.3.html) data structure.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct OutputModeFlags: u32 {
        /// Enable implementation-defined output processing.
        const OPOST = 0x0000_0001;
        /// Map NL to CR-NL on output.
        const ONLCR = 0x0000_0004;
        /// Map CR to NL on output.
        const OCRNL = 0x0000_0008;
        /// Don't output CR at column 0.
        const ONOCR = 0x0000_0010;
        /// NL performs the CR function.
        const ONLRET = 0x0000_0020;
    }
}

bitflags::bitflags! {
    /// All the different control mode flags within the
    /// [`termios`](https://www.man7.org/linux/man-pages/man3/termios.3.html) data structure.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ControlModeFlags: u32 {
        /// Character size mask. Values are `CS5`, `CS6`, `CS7`, or `CS8`.
        const CSIZE = 0x0000_0030;
        /// Set two stop bits instead of one.
        const CSTOPB = 0x0000_0040;
        /// Enable receiver.
        const CREAD = 0x0000_0080;
        /// Enable parity generation on output and parity checking for input.
        const PARENB = 0x0000_0100;
        /// If set, then parity for input and output is odd; otherwise, even parity is used.
        const PARODD = 0x0000_0200;
        /// Lower modem control lines after last process closes the device.
        const HUPCL = 0x0000_0400;
        /// Ignore modem control lines.
        const CLOCAL = 0x0000_0800;
    }
}

bitflags::bitflags! {
    /// All the different local mode flags within the
    /// [`termios`](https://www.man7.org/linux/man-pages/man3/termios.3.html) data structure.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct LocalModeFlags: u32 {
        /// When any of the characters INTR, QUIT, SUSP, or DSUSP are received, generate the
        /// corresponding signal.
        const ISIG = 0x0000_0001;
        /// Enable canonical mode.
        const ICANON = 0x0000_0002;
        /// Echo input characters.
        const ECHO = 0x0000_0008;
        /// If `ICANON` is also set, the ERASE character erases the preceding input character.
        const ECHOE = 0x0000_0010;
        /// If `ICANON` is also set, the KILL character erases the current line.
        const ECHOK = 0x0000_0020;
        /// If `ICANON` is also set, echo the NL character even if ECHO is not set.
        const ECHONL = 0x0000_0040;
        /// Disable flushing the queues when generating the INT, QUIT, and SUSP signals.
        const NOFLSH = 0x0000_0080;
        /// Send `SIGTTOU` to a background process which tries to write to its controlling
        /// terminal.
        const TOSTOP = 0x0000_0100;
        /// Enable implementation-defined input processing.
        const IEXTEN = 0x0000_8000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn raw_mode_drops_line_assembly() {
        let mut tio = Termios::default();
        tio.set_local_mode(LocalModeFlags::ICANON, true)
            .set_local_mode(LocalModeFlags::ECHO, true);
        tio.make_raw();

        assert!(!tio.local_modes().contains(LocalModeFlags::ICANON));
        assert!(!tio.local_modes().contains(LocalModeFlags::ECHO));
        assert!(!tio.output_modes().contains(OutputModeFlags::OPOST));
    }

    #[test_case]
    fn speed_is_pinned() {
        let mut tio = Termios::default();
        tio.set_speed_38400();
        assert_eq!(tio.cflag & CBAUD, B38400);
        assert_eq!(tio.cflag & CIBAUD, 0);
    }

    #[test_case]
    fn control_chars_round_trip() {
        let mut tio = Termios::default();
        tio.set_control_char(ControlCharIndex::Min, 1)
            .set_control_char(ControlCharIndex::Time, 0);
        assert_eq!(tio.control_char(ControlCharIndex::Min), 1);
        assert_eq!(tio.control_char(ControlCharIndex::Time), 0);
    }

    #[test_case]
    fn locked_is_saturated() {
        let locked = Termios::all_locked();
        assert_eq!(locked.iflag, u32::MAX);
        assert_eq!(locked.cc, [u8::MAX; NCCS]);
    }
}
