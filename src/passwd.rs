//! Passphrase entry: the byte-wise read loop a prompter child runs on its console, and the
//! helpers around it.

use alloc::{format, string::String};

use crate::{Errno, eprintln, fs::FileDescriptor, io};

/// Ceiling on a passphrase: the shared area holds this many bytes, the read loop accepts one
/// less.
pub const MAX_PASSLEN: usize = 128;

/// The byte every cached passphrase byte is folded with while at rest.
const SCRAMBLE_KEY: u8 = 42;

/// Carriage return.
const CR: u8 = 13;
/// Line feed.
const NL: u8 = 10;
/// Backspace.
const BS: u8 = 8;
/// The classic erase character (DEL).
const CERASE: u8 = 0o177;
/// The classic line-kill character (^U).
const CKILL: u8 = 0o25;
/// The classic end-of-file character (^D).
const CEOF: u8 = 0o4;

/// Bold red, as loud as a boot console gets.
pub(crate) const PROMPT_LOUD: &str = "\x1b[1m\x1b[31m";
/// Back to normal attributes.
pub(crate) const PROMPT_NORM: &str = "\x1b[m";

/// Folds the passphrase bytes with the scramble key, in place. Applying it twice restores the
/// original, so the same call obfuscates and reveals.
pub fn scramble(bytes: &mut [u8]) {
    for byte in bytes {
        *byte ^= SCRAMBLE_KEY;
    }
}

/// Normalizes a prompt: one trailing space and/or colon comes off, the prompter re-adds its own.
#[must_use]
pub fn trim_prompt(prompt: &str) -> &str {
    prompt
        .strip_suffix(' ')
        .unwrap_or(prompt)
        .strip_suffix(':')
        .unwrap_or_else(|| prompt.strip_suffix(' ').unwrap_or(prompt))
}

/// Shapes the prompt for one console: serial lines scroll, so lead with a fresh line; virtual
/// terminals get the carriage-return overwrite.
#[must_use]
pub fn format_prompt(prompt: &str, serial: bool) -> String {
    if serial {
        format!("{PROMPT_LOUD}\n\r{prompt}: {PROMPT_NORM}")
    } else {
        format!("{PROMPT_LOUD}\r{prompt}: {PROMPT_NORM}")
    }
}

/// Reads a passphrase from the given terminal, one byte at a time.
///
/// CR or NL finishes the entry; BS and DEL rub out the previous byte (echoing a backspace);
/// ^U kills the line; ^D or a NUL byte cancels, reading as an empty entry. On a line that is
/// not eight-bit clean the high bit is stripped. Returns the passphrase length; zero means the
/// caller should prompt again.
///
/// # Errors
///
/// Returns [`Errno::Eoverflow`] when the entry would exceed the buffer, and propagates any
/// hard read [`Errno`]s (logged with the console's name).
pub fn read_passphrase(
    fd: FileDescriptor,
    pass: &mut [u8; MAX_PASSLEN],
    eightbit: bool,
    tty: &str,
) -> Result<usize, Errno> {
    let mut len = 0;
    pass[0] = 0;

    loop {
        let byte = match io::read_byte_patient(fd) {
            Ok(Some(byte)) => byte,
            Ok(None) => {
                pass[len] = 0;
                return Ok(0);
            }
            Err(errno) => {
                eprintln!("blogd: cannot read passphrase on {tty}: {errno}");
                return Err(errno);
            }
        };

        let ascval = if eightbit { byte } else { byte & 0o177 };

        match ascval {
            0 | CEOF => {
                pass[len] = 0;
                return Ok(0);
            }
            CR | NL => {
                pass[len] = 0;
                return Ok(len);
            }
            BS | CERASE => {
                if len > 0 {
                    len -= 1;
                    put_byte(fd, BS);
                }
            }
            CKILL => {
                while len > 0 {
                    len -= 1;
                    put_byte(fd, BS);
                }
            }
            _ => {
                if len >= MAX_PASSLEN - 1 {
                    return Err(Errno::Eoverflow);
                }
                pass[len] = ascval;
                len += 1;
            }
        }
    }
}

fn put_byte(fd: FileDescriptor, byte: u8) {
    let _ = io::safeout(fd, &[byte], 1, false, None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn scramble_round_trips() {
        let mut bytes = *b"secret";
        scramble(&mut bytes);
        assert_ne!(&bytes, b"secret");
        scramble(&mut bytes);
        assert_eq!(&bytes, b"secret");
    }

    #[test_case]
    fn prompt_trimming() {
        assert_eq!(trim_prompt("Passphrase: "), "Passphrase");
        assert_eq!(trim_prompt("Passphrase:"), "Passphrase");
        assert_eq!(trim_prompt("Passphrase"), "Passphrase");
        assert_eq!(trim_prompt("luks "), "luks");
    }

    #[test_case]
    fn prompt_formatting() {
        let vt = format_prompt("luks", false);
        assert!(vt.starts_with(PROMPT_LOUD));
        assert!(vt.contains("\rluks: "));
        assert!(!vt.contains('\n'));

        let serial = format_prompt("luks", true);
        assert!(serial.contains("\n\rluks: "));
    }

    fn feed(input: &[u8]) -> (Result<usize, Errno>, [u8; MAX_PASSLEN]) {
        #[allow(clippy::unwrap_used)]
        let pair = {
            let mut tio = crate::term::Termios::default();
            tio.make_raw();
            crate::term::open_pty(&tio, &crate::term::WinSize::default()).unwrap()
        };

        #[allow(clippy::unwrap_used)]
        pair.master.write(input).unwrap();
        while !io::can_read(pair.slave.fd(), 10) {}

        let mut pass = [0_u8; MAX_PASSLEN];
        let result = read_passphrase(pair.slave.fd(), &mut pass, true, "/dev/pts/test");
        (result, pass)
    }

    #[test_case]
    fn newline_finishes() {
        let (result, pass) = feed(b"secret\n");
        assert_eq!(result, Ok(6));
        assert_eq!(&pass[..7], b"secret\0");
    }

    #[test_case]
    fn carriage_return_finishes() {
        let (result, pass) = feed(b"pw\r");
        assert_eq!(result, Ok(2));
        assert_eq!(&pass[..3], b"pw\0");
    }

    #[test_case]
    fn backspace_rubs_out() {
        let (result, pass) = feed(b"secrex\x08t\n");
        assert_eq!(result, Ok(6));
        assert_eq!(&pass[..6], b"secret");
    }

    #[test_case]
    fn line_kill_starts_over() {
        let (result, pass) = feed(b"wrong\x15right\n");
        assert_eq!(result, Ok(5));
        assert_eq!(&pass[..5], b"right");
    }

    #[test_case]
    fn eof_cancels() {
        let (result, _) = feed(b"half\x04");
        assert_eq!(result, Ok(0));
    }

    #[test_case]
    fn empty_entry_reads_zero() {
        let (result, _) = feed(b"\n");
        assert_eq!(result, Ok(0));
    }

    #[test_case]
    fn longest_accepted_entry() {
        let mut input = [b'a'; MAX_PASSLEN - 1].to_vec();
        input.push(b'\n');
        let (result, pass) = feed(&input);
        assert_eq!(result, Ok(MAX_PASSLEN - 1));
        assert_eq!(pass[MAX_PASSLEN - 1], 0);
    }

    #[test_case]
    fn one_byte_too_many_overflows() {
        let input = [b'a'; MAX_PASSLEN].to_vec();
        let (result, _) = feed(&input);
        assert_eq!(result, Err(Errno::Eoverflow));
    }
}
