//! The passphrase round: one forked prompter per console, first answer wins, losers reaped.

use alloc::string::String;
use core::time::Duration;

use crate::{
    Errno,
    console::ConsoleFlags,
    daemon::Daemon,
    eprintln, fatal, fs,
    fs::{FileDescriptor, OpenOptions},
    io, ipc,
    ipc::{SigDisposition, SigSet, Signo},
    klog,
    passwd::{self, MAX_PASSLEN},
    process,
    process::{ExitStatus, WaitIdType, WaitOptions},
    signals, term,
};

/// How many 1 ms beats the round waits for the kernel log queue to drain first.
const KLOG_DRAIN_BEATS: u32 = 200;

/// How long one reap cycle listens for a child-exit signal.
const REAP_WAIT: Duration = Duration::from_millis(50);

impl Daemon {
    /// Runs one prompt round across every usable console. On return the shared area holds the
    /// winning passphrase (scrambled) or nothing, every prompter is reaped, and the consoles
    /// are back to normal duty.
    pub(crate) fn ask_for_password(&mut self) {
        let Some(prompt) = self.prompt.clone() else {
            return;
        };
        if prompt.is_empty() || self.password.is_none() {
            return;
        }
        let prompt = String::from(passwd::trim_prompt(prompt.as_str()));

        let _ = signals::watch_children();

        // Let the kernel finish talking before the prompt takes the consoles.
        let mut beats = KLOG_DRAIN_BEATS;
        while beats > 0 && klog::unread() > 0 {
            let _ = crate::thread::sleep(&Duration::from_millis(1));
            beats -= 1;
        }

        self.asking = true; // Show only our question on the consoles
        let _ = klog::console_off();

        for index in 0..self.consoles_len() {
            let Some(sink) = self.console_fd(index) else {
                continue;
            };
            let _ = term::drain(sink);

            match process::fork() {
                Err(errno) => fatal!("blogd: failed to fork prompter: {errno}"),
                Ok(0) => self.prompter_child(index, prompt.as_str()),
                Ok(pid) => {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    self.set_prompter(index, pid as i32);
                }
            }
        }

        // Wait on the first answer, whichever console it comes from.
        let mut winner: i32 = -1;
        loop {
            match process::wait(WaitIdType::All, 0, WaitOptions::WEXITED) {
                Ok(Some(info)) => {
                    winner = info.child_pid;
                    break;
                }
                Ok(None) | Err(Errno::Echild) => break,
                Err(Errno::Eintr) => {}
                Err(errno) => {
                    eprintln!("blogd: can not wait on prompter: {errno}");
                    break;
                }
            }
        }

        self.asking = false; // Now throw out any collected messages if any
        let _ = klog::console_on();

        // The winner is done; everyone else gets terminated and reaped.
        let mut live = 0;
        for console in self.consoles.iter_mut() {
            let Some(pid) = console.prompter else { continue };
            if pid == winner {
                console.prompter = None;
            } else {
                let _ = process::kill(pid, Signo::SigTerm);
                live += 1;
            }
        }

        let mut chld = SigSet::empty();
        chld.add(Signo::SigChld);

        while live > 0 {
            match process::wait(
                WaitIdType::All,
                0,
                WaitOptions::WEXITED | WaitOptions::WNOHANG,
            ) {
                Ok(Some(info)) => {
                    for console in self.consoles.iter_mut() {
                        if console.prompter == Some(info.child_pid) {
                            console.prompter = None;
                            live -= 1;
                        }
                    }
                    continue;
                }
                Ok(None) => {}
                Err(Errno::Echild) => break,
                Err(Errno::Eintr) => continue,
                Err(_) => break,
            }

            // Nothing reaped this beat; give the exit signal a moment to land.
            let _ = ipc::wait_for_signal(&chld, &REAP_WAIT);
        }

        let _ = ipc::set_signal(Signo::SigChld, SigDisposition::Default);
    }

    fn consoles_len(&self) -> usize {
        self.consoles.len()
    }

    fn console_fd(&self, index: usize) -> Option<FileDescriptor> {
        self.consoles.get(index).and_then(crate::console::Console::fd)
    }

    fn set_prompter(&mut self, index: usize, pid: i32) {
        if let Some(console) = self.consoles.get_mut(index) {
            console.prompter = Some(pid);
        }
    }

    /// The prompter: runs in a forked child that owns exactly one console, prints the prompt,
    /// collects the passphrase into the shared area, and exits. Never returns.
    fn prompter_child(&mut self, index: usize, prompt: &str) -> ! {
        self.close_inherited();

        let (tty, serial, max_canon, current_tio) = {
            #[allow(clippy::unwrap_used)] // the caller picked the index off the live list
            let console = self.consoles.get(index).unwrap();
            (
                console.tty.clone(),
                console.flags.contains(ConsoleFlags::SERIAL),
                console.max_canon,
                console.current_tio.clone(),
            )
        };

        // Wire the console over the standard streams, then drop every console descriptor.
        let _ = fs::dup2(FileDescriptor::STDOUT, FileDescriptor::STDERR);
        if let Some(sink) = self.console_fd(index) {
            let _ = fs::dup2(sink, FileDescriptor::STDIN);
            let _ = fs::dup2(sink, FileDescriptor::STDOUT);
        }
        for console in self.consoles.iter_mut() {
            console.file = None;
        }

        // Detach into a session of our own, dying with the daemon, looking like a login.
        let _ = process::new_session();
        let _ = ipc::set_signal(Signo::SigHup, SigDisposition::Default);
        let _ = process::set_parent_death_signal(Signo::SigHup);
        let _ = process::set_process_name("login");
        let _ = ipc::set_signal(Signo::SigChld, SigDisposition::Default);
        let _ = ipc::set_signal(Signo::SigInt, SigDisposition::Default);
        let _ = ipc::set_signal(Signo::SigTerm, SigDisposition::Default);
        let _ = ipc::set_signal(Signo::SigSys, SigDisposition::Default);
        let _ = ipc::set_signal(Signo::SigQuit, SigDisposition::Ignore);

        // The console becomes our controlling terminal.
        let Ok(tty_file) = OpenOptions::new().read_write().open(tty.as_str()) else {
            process::exit(ExitStatus::ExitFailure(1));
        };
        if term::set_controlling(tty_file.fd()).is_err() {
            process::exit(ExitStatus::ExitFailure(1));
        }
        let _ = fs::dup2(tty_file.fd(), FileDescriptor::STDIN);
        let _ = fs::dup2(tty_file.fd(), FileDescriptor::STDOUT);
        drop(tty_file);

        let eightbit = !serial || !current_tio.uses_parity();

        loop {
            let _ = term::flush_input(FileDescriptor::STDIN);

            let message = passwd::format_prompt(prompt, serial);
            let _ = io::safeout(
                FileDescriptor::STDOUT,
                message.as_bytes(),
                max_canon,
                false,
                None,
            );

            // We read byte for byte, invisibly, but let the final newline echo.
            let mut quiet = current_tio.clone();
            quiet
                .set_local_mode(term::LocalModeFlags::ECHO, false)
                .set_local_mode(term::LocalModeFlags::ECHONL, true)
                .set_control_char(term::ControlCharIndex::Time, 0)
                .set_control_char(term::ControlCharIndex::Min, 1);
            if term::set_attributes(FileDescriptor::STDIN, &quiet).is_err() {
                eprintln!("blogd: can not make input invisible on {tty}");
            }

            let mut entry = [0_u8; MAX_PASSLEN];
            let outcome =
                passwd::read_passphrase(FileDescriptor::STDIN, &mut entry, eightbit, tty.as_str());

            let _ = term::set_attributes(FileDescriptor::STDIN, &current_tio);
            let _ = io::safeout(FileDescriptor::STDOUT, b"\n", max_canon, false, None);

            match outcome {
                Ok(0) => continue, // Empty entry: ask again
                Ok(len) => {
                    self.store_password(&mut entry, len);
                    process::exit(ExitStatus::ExitSuccess);
                }
                Err(_) => {
                    // The answer path reads the length word, not our exit status, so a failed
                    // read must be recorded there too.
                    self.store_no_password();
                    process::exit(ExitStatus::ExitFailure(1));
                }
            }
        }
    }

    /// Puts one collected passphrase into the shared area, scrambled, length word last.
    fn store_password(&mut self, entry: &mut [u8; MAX_PASSLEN], len: usize) {
        let Some(region) = &mut self.password else {
            return;
        };

        passwd::scramble(&mut entry[..len]);

        let bytes = region.bytes_mut();
        bytes[..len].copy_from_slice(&entry[..len]);
        bytes[len..MAX_PASSLEN].fill(0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        bytes[MAX_PASSLEN..].copy_from_slice(&(len as i32).to_le_bytes());

        entry.fill(0);
    }

    /// Records a failed read in the shared area: a negative length word and nothing cached.
    fn store_no_password(&mut self) {
        let Some(region) = &mut self.password else {
            return;
        };

        let bytes = region.bytes_mut();
        bytes[..MAX_PASSLEN].fill(0);
        bytes[MAX_PASSLEN..].copy_from_slice(&(-1_i32).to_le_bytes());
    }

    /// Closes every descriptor the daemon proper holds, console sinks excepted (the caller
    /// still wires its own console over the standard streams); runs in a freshly forked
    /// prompter.
    fn close_inherited(&mut self) {
        if let Some(fifo) = &self.fifo {
            fs::close_raw(fifo.fd());
        }
        if let Some(listener) = &self.listener {
            fs::close_raw(listener.fd());
        }
        if let Some(log_fd) = self.log.fd() {
            fs::close_raw(log_fd);
        }
        for client in &self.clients {
            fs::close_raw(client.fd());
        }
        if let Some(capture_fd) = self.capture {
            fs::close_raw(capture_fd);
        }
        fs::close_raw(self.registry.epoll_fd());

        self.blocked.clear();
        self.reconnect = None;
    }
}
