//! The console set: every terminal device registered as a kernel console, held as an ordered
//! list of write sinks.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::{
    Errno, devices, eprintln,
    fs::{File, FileDescriptor, OpenFlags, OpenOptions},
    term::{self, Termios},
};

/// Where the kernel lists its registered consoles.
const PROC_CONSOLES: &str = "/proc/consoles";

/// The device opened when `/proc/consoles` names nothing usable.
const FALLBACK_CONSOLE: &str = "/dev/console";

/// `TTYAUX_MAJOR`, the major of `/dev/console`.
const TTYAUX_MAJOR: u32 = 5;

/// The most a canonical-mode line accepts; sink writes are chunked to this.
const POSIX_MAX_CANON: usize = 255;

/// `TTY_MAJOR`: virtual terminals live below minor 64, serial lines at and above it.
const TTY_MAJOR: u32 = 4;

bitflags::bitflags! {
    /// Capability flags of one kernel console, as shown in the flag column of
    /// `/proc/consoles`.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ConsoleFlags: u16 {
        /// `E`: the console is enabled.
        const ENABLED = 0x0001;
        /// `C`: the console is the preferred console device.
        const CONSDEV = 0x0002;
        /// `B`: a boot (early) console.
        const BOOT = 0x0004;
        /// `p`: the kernel replays its buffer when this console registers.
        const PRINTBUFFER = 0x0008;
        /// `b`: a braille device.
        const BRAILLE = 0x0010;
        /// `a`: safe to call in any context.
        const ANYTIME = 0x0020;
        /// The line is a serial one; prompts get the loud formatting.
        const SERIAL = 0x0040;
    }
}
impl ConsoleFlags {
    fn from_proc_char(c: char) -> Option<Self> {
        match c {
            'E' => Some(Self::ENABLED),
            'C' => Some(Self::CONSDEV),
            'B' => Some(Self::BOOT),
            'p' => Some(Self::PRINTBUFFER),
            'b' => Some(Self::BRAILLE),
            'a' => Some(Self::ANYTIME),
            _ => None,
        }
    }
}

/// One registered console: a terminal device the relay duplicates its traffic onto.
#[derive(Debug)]
pub struct Console {
    /// The resolved device path.
    pub tty: String,
    /// The open write side, or [`None`] while the device is unusable.
    pub file: Option<File>,
    /// Capability flags.
    pub flags: ConsoleFlags,
    /// The packed device number.
    pub dev: u64,
    /// Ceiling on bytes handed to the device per write.
    pub max_canon: usize,
    /// The pid of a live passphrase prompter on this console.
    pub prompter: Option<i32>,
    /// Terminal attributes locked against change while the daemon runs.
    pub locked_tio: Termios,
    /// Terminal attributes as found at startup.
    pub original_tio: Termios,
    /// Terminal attributes currently in effect.
    pub current_tio: Termios,
}
impl Console {
    fn new(tty: String, flags: ConsoleFlags, dev: u64) -> Self {
        Self {
            tty,
            file: None,
            flags,
            dev,
            max_canon: POSIX_MAX_CANON,
            prompter: None,
            locked_tio: Termios::default(),
            original_tio: Termios::default(),
            current_tio: Termios::default(),
        }
    }

    /// The descriptor of the open write side, if any.
    #[must_use]
    pub fn fd(&self) -> Option<FileDescriptor> {
        self.file.as_ref().map(File::fd)
    }

    /// Opens the device write-only and snapshots its terminal attributes. Returns whether the
    /// console is usable.
    fn init_io(&mut self) -> bool {
        let file = match OpenOptions::new()
            .write_only()
            .non_blocking(true)
            .no_ctty(true)
            .open(self.tty.as_str())
        {
            Ok(file) => file,
            Err(Errno::Eacces) => {
                crate::fatal!("blogd: can not open {}: {}", self.tty, Errno::Eacces);
            }
            Err(errno) => {
                eprintln!("blogd: can not open {}: {errno}", self.tty);
                return false;
            }
        };

        if let Ok(tio) = term::attributes(file.fd()) {
            self.locked_tio = tio.clone();
            self.original_tio = tio.clone();
            self.current_tio = tio;
        }

        // The non-blocking bit only guards the open; writes go through the bounded paths.
        match file.status_flags() {
            Ok(mut flags) => {
                flags.remove(OpenFlags::O_NONBLOCK);
                flags.insert(OpenFlags::O_NOCTTY);
                if file.set_status_flags(flags).is_err() {
                    eprintln!("blogd: can not set terminal flags of {}", self.tty);
                }
            }
            Err(_) => eprintln!("blogd: can not get terminal flags of {}", self.tty),
        }

        self.file = Some(file);
        true
    }
}

/// The ordered, append-only collection of console sinks.
#[derive(Debug, Default)]
pub struct Consoles(Vec<Console>);
impl Consoles {
    /// Builds a set out of ready-made consoles, for exercising the relay against pty stand-ins.
    #[cfg(test)]
    pub(crate) fn from_vec(consoles: Vec<Console>) -> Self {
        Self(consoles)
    }

    /// Collects every enabled console from `/proc/consoles`, resolving device numbers to paths
    /// and opening each device when `io` is set. Falls back to `/dev/console` when the kernel
    /// lists nothing usable.
    ///
    /// # Errors
    ///
    /// This function returns an [`Errno`] only when even the fallback console cannot be set up;
    /// the daemon has nowhere to write without it.
    pub fn discover(io: bool) -> Result<Self, Errno> {
        let mut consoles = Self::default();

        if let Ok(listing) = read_proc_consoles() {
            for entry in parse_consoles(listing.as_str()) {
                let tty = match devices::resolve(entry.dev) {
                    Ok(tty) => tty,
                    Err(errno) => {
                        eprintln!(
                            "blogd: can not determine real path of {}:{}: {errno}",
                            devices::major(entry.dev),
                            devices::minor(entry.dev)
                        );
                        continue;
                    }
                };
                consoles.push(Console::new(tty, entry.flags, entry.dev), io);
            }
        }

        if consoles.0.is_empty() {
            let dev = devices::makedev(TTYAUX_MAJOR, 1);
            consoles.push(
                Console::new(
                    FALLBACK_CONSOLE.to_string(),
                    ConsoleFlags::ENABLED | ConsoleFlags::CONSDEV,
                    dev,
                ),
                io,
            );
        }

        if consoles.0.is_empty() {
            return Err(Errno::Enodev);
        }
        Ok(consoles)
    }

    fn push(&mut self, mut console: Console, io: bool) {
        if io && !console.init_io() {
            return;
        }
        // A single preferred console: later claimants lose the tag.
        if console.flags.contains(ConsoleFlags::CONSDEV)
            && self.consdev().is_some()
        {
            console.flags.remove(ConsoleFlags::CONSDEV);
        }
        self.0.push(console);
    }

    /// The console at the given position, in registration order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Console> {
        self.0.get(index)
    }

    /// The console at the given position, mutably.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Console> {
        self.0.get_mut(index)
    }

    /// The consoles in registration order.
    pub fn iter(&self) -> core::slice::Iter<'_, Console> {
        self.0.iter()
    }

    /// The consoles in registration order, mutably.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Console> {
        self.0.iter_mut()
    }

    /// How many consoles are registered (usable or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The console tagged as the system console device.
    #[must_use]
    pub fn consdev(&self) -> Option<&Console> {
        self.0
            .iter()
            .find(|c| c.flags.contains(ConsoleFlags::CONSDEV))
    }

    /// The open descriptor of the system console device.
    #[must_use]
    pub fn consdev_fd(&self) -> Option<FileDescriptor> {
        self.consdev().and_then(Console::fd)
    }
}
impl<'a> IntoIterator for &'a Consoles {
    type Item = &'a Console;
    type IntoIter = core::slice::Iter<'a, Console>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One line of `/proc/consoles`, parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ConsoleEntry {
    pub flags: ConsoleFlags,
    pub dev: u64,
}

fn read_proc_consoles() -> Result<String, Errno> {
    let file = OpenOptions::new().close_on_exec(true).open(PROC_CONSOLES)?;
    let mut listing = String::new();
    let mut buf = [0_u8; 4096];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        listing.push_str(str::from_utf8(&buf[..n]).map_err(|_| Errno::Eilseq)?);
    }
    Ok(listing)
}

/// Parses the text of `/proc/consoles`, keeping enabled consoles with a tty binding.
///
/// A line reads like `ttyS0  -W- (EC p a)  4:64`; consoles without the trailing
/// `major:minor` column have no tty bound and are skipped, as are disabled ones.
pub(crate) fn parse_consoles(listing: &str) -> Vec<ConsoleEntry> {
    let mut entries = Vec::new();

    for line in listing.lines() {
        let Some(open) = line.find('(') else {
            continue;
        };
        let Some(close) = line[open..].find(')').map(|i| open + i) else {
            continue;
        };
        let flag_field = &line[open + 1..close];

        if !flag_field.contains('E') {
            continue;
        }

        let mut flags = ConsoleFlags::empty();
        for c in flag_field.chars() {
            if let Some(flag) = ConsoleFlags::from_proc_char(c) {
                flags |= flag;
            }
        }

        let Some((maj, min)) = parse_dev_column(&line[close + 1..]) else {
            continue;
        };

        if maj == TTY_MAJOR && min >= 64 {
            flags |= ConsoleFlags::SERIAL;
        }

        entries.push(ConsoleEntry {
            flags,
            dev: devices::makedev(maj, min),
        });
    }

    entries
}

fn parse_dev_column(rest: &str) -> Option<(u32, u32)> {
    let column = rest.split_whitespace().next()?;
    let (maj, min) = column.split_once(':')?;
    Some((maj.parse().ok()?, min.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
tty0                 -WU (EC p  )    4:1
ttyS0                -W- (E  p a)    4:64
netcon0              -W- (-  -  )
brl0                 -W- (E  b  )  253:0
";

    #[test_case]
    fn parses_enabled_consoles() {
        let entries = parse_consoles(LISTING);
        assert_eq!(entries.len(), 3);

        assert!(entries[0].flags.contains(ConsoleFlags::ENABLED | ConsoleFlags::CONSDEV));
        assert!(entries[0].flags.contains(ConsoleFlags::PRINTBUFFER));
        assert_eq!(entries[0].dev, devices::makedev(4, 1));

        assert!(entries[1].flags.contains(ConsoleFlags::SERIAL));
        assert!(entries[1].flags.contains(ConsoleFlags::ANYTIME));
        assert!(!entries[1].flags.contains(ConsoleFlags::CONSDEV));
        assert_eq!(entries[1].dev, devices::makedev(4, 64));

        assert!(entries[2].flags.contains(ConsoleFlags::BRAILLE));
    }

    #[test_case]
    fn skips_unbound_and_disabled() {
        // netcon0 has no device column; a disabled console has no E flag.
        let entries = parse_consoles("ttyX  -W- (-  -  )  4:2\nnet0 -W- (E)\n");
        assert!(entries.is_empty());
    }

    #[test_case]
    fn virtual_terminal_is_not_serial() {
        let entries = parse_consoles("tty1  -W- (E    )  4:1\n");
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].flags.contains(ConsoleFlags::SERIAL));
    }

    #[test_case]
    fn empty_listing_parses_to_nothing() {
        assert!(parse_consoles("").is_empty());
    }
}
