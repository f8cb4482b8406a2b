//! The daemon context: every descriptor the relay owns, the event loop, and the fan-out core.

use alloc::{format, string::String, vec::Vec};

use crate::{
    Errno, eprintln, fatal, fs,
    buffer::HoldBuffer,
    console::Consoles,
    fs::{File, FileDescriptor, FilePermissions, FileType, OpenOptions},
    io::{self, Reconnect},
    ipc::SigSet,
    logfile::{BootLog, OpenOutcome},
    memory::{self, SharedRegion},
    poll::{EpollEvents, Ready, Registry, Token},
    signals, term,
    term::WinSize,
};

mod ask;
mod control;

/// One read cycle off the capture source or fifo moves at most this much.
pub const TRANS_BUFFER_SIZE: usize = 8192;

/// Capacity of the hold buffer that carries deferred console output.
const HOLD_BUFFER_SIZE: usize = 4 * TRANS_BUFFER_SIZE;

/// The named pipe auxiliary producers write log entries into.
const FIFO_PATH: &str = "/dev/blog";

/// Idle ceiling of one steady-state loop cycle.
const POLL_TIMEOUT_MS: i32 = 5000;

/// How long a sink gets to become writable before it is declared blocked.
const SINK_PROBE_MS: i32 = 50;

/// Shutdown drains late input for at most this many short cycles.
const SHUTDOWN_CYCLES: u32 = 20;
/// Length of one shutdown drain cycle.
const SHUTDOWN_POLL_MS: i32 = 150;

/// Everything the daemon owns, threaded through the handlers instead of file-scope state.
#[derive(Debug)]
pub struct Daemon {
    pub(crate) consoles: Consoles,
    pub(crate) registry: Registry,
    pub(crate) hold: HoldBuffer,
    pub(crate) log: BootLog,
    pub(crate) fifo: Option<File>,
    pub(crate) listener: Option<File>,
    pub(crate) clients: Vec<File>,
    /// The capture source descriptor while the console is hijacked.
    pub(crate) capture: Option<FileDescriptor>,
    /// Sinks that returned "try later"; spared from fan-out until their watchdog fires.
    pub(crate) blocked: Vec<FileDescriptor>,
    /// A passphrase prompt currently owns the consoles.
    pub(crate) asking: bool,
    /// FINAL latched: logging goes to the rotated name from here on.
    pub(crate) final_latch: bool,
    pub(crate) prompt: Option<String>,
    pub(crate) password: Option<SharedRegion>,
    pub(crate) reconnect: Option<Reconnect>,
    poll_mask: SigSet,
    last_winsize: WinSize,
    ready_buf: Vec<Ready>,
    /// Read errors are tolerated (not fatal) during the shutdown drain.
    tolerant: bool,
}

impl Daemon {
    /// Builds a context around a discovered console set.
    ///
    /// # Errors
    ///
    /// Returns an [`Errno`] when the event registry cannot be created; the daemon cannot run
    /// without one.
    pub fn new(consoles: Consoles) -> Result<Self, Errno> {
        Ok(Self {
            consoles,
            registry: Registry::new()?,
            hold: HoldBuffer::new(HOLD_BUFFER_SIZE),
            log: BootLog::new(),
            fifo: None,
            listener: None,
            clients: Vec::new(),
            capture: None,
            blocked: Vec::new(),
            asking: false,
            final_latch: false,
            prompt: None,
            password: None,
            reconnect: None,
            poll_mask: signals::poll_mask(),
            last_winsize: WinSize::default(),
            ready_buf: Vec::new(),
            tolerant: false,
        })
    }

    /// Wires up the watched descriptors: the log fifo (created on demand), the control socket,
    /// and a one-shot writability watchdog per console sink. Locks all future memory into RAM
    /// afterwards. The capture source is wired separately by [`Self::reactivate_capture`].
    ///
    /// # Errors
    ///
    /// Propagates any [`Errno`]s from registering descriptors.
    pub fn prepare_io(
        &mut self,
        reconnect: Option<Reconnect>,
        listener: Option<File>,
    ) -> Result<(), Errno> {
        self.reconnect = reconnect;
        self.listener = listener;

        if self.fifo.is_none() {
            self.fifo = open_fifo();
        }

        if let Some(fifo) = &self.fifo {
            self.registry.add_read(fifo.fd(), Token::FifoInput)?;
        }
        if let Some(listener) = &self.listener {
            self.registry.add_read(listener.fd(), Token::SocketAccept)?;
        }
        for console in self.consoles.iter() {
            if let Some(fd) = console.fd() {
                self.registry.add_write(fd, Token::SinkWatchdog)?;
            }
        }

        let _ = memory::lock_all_future();
        Ok(())
    }

    /// One steady-state cycle: move the log toward its file when the filesystem allows, poll for
    /// traffic, honor a requested pause.
    pub fn safe_io(&mut self) {
        if signals::fs_ready_pending() || signals::log_pause_requested() {
            // Armed and waiting, or told to leave the disk alone.
        } else if !self.log.is_open() {
            let ready = if signals::fs_ready_unarmed() {
                self.log.fs_ready()
            } else {
                true
            };
            if ready {
                match self.log.try_open(self.final_latch) {
                    Ok(OpenOutcome::Opened) => signals::retire_fs_ready(),
                    Ok(_) => {}
                    Err(errno) => fatal!("blogd: can not open boot log: {errno}"),
                }
            }
        }

        if signals::fs_ready_unarmed() {
            signals::arm_fs_ready();
            self.log.mark_at_boot();
        }

        if self.log.is_open() {
            self.log.start();
        }

        self.more_input(POLL_TIMEOUT_MS, false);

        if signals::log_pause_requested() && self.log.is_open() {
            // Stop writing logs to disk; the sanitizer keeps running in memory.
            self.log.stop();
            self.log.close();
        }
    }

    /// Polls once and runs the handlers of whatever became ready, in kernel report order.
    /// Returns whether anything ran (a signal interruption counts).
    pub fn more_input(&mut self, timeout_ms: i32, tolerant: bool) -> bool {
        let mut ready = core::mem::take(&mut self.ready_buf);

        let ran = match self.registry.wait(timeout_ms, &self.poll_mask, &mut ready) {
            Ok(ran) => ran,
            Err(errno) => fatal!("blogd: can not wait for events: {errno}"),
        };

        self.tolerant = tolerant;
        for event in &ready {
            if event
                .events
                .intersects(EpollEvents::IN | EpollEvents::OUT)
            {
                self.handle(*event);
                continue;
            }
            if event
                .events
                .intersects(EpollEvents::RDHUP | EpollEvents::HUP)
            {
                eprintln!("blogd: poll returns RDHUP or HUP");
                continue;
            }
            if event.events.contains(EpollEvents::ERR) {
                eprintln!("blogd: poll returns error");
            }
        }
        self.tolerant = false;

        self.ready_buf = ready;
        ran
    }

    fn handle(&mut self, event: Ready) {
        match event.token {
            Token::CaptureInput => self.capture_input(event.fd),
            Token::FifoInput => self.fifo_input(event.fd),
            Token::SocketAccept => self.socket_accept(),
            Token::ClientCommand => self.client_command(event.fd),
            Token::PasswordAnswer => self.password_answer(event.fd),
            Token::SinkWatchdog => self.sink_watchdog(event.fd),
        }
    }

    /// The capture handler: one read, window-size sync, sanitized log copy, then delivery to
    /// every sink (or the hold buffer while delivery is deferred).
    fn capture_input(&mut self, fd: FileDescriptor) {
        let mut trans = [0_u8; TRANS_BUFFER_SIZE];
        let cnt = match io::safein(fd, &mut trans) {
            Ok(cnt) => cnt,
            Err(errno) => {
                if self.tolerant || signals::signaled() != 0 {
                    return;
                }
                if fd == FileDescriptor::STDIN && errno == Errno::Eio {
                    eprintln!("blogd: \x1b[1m\x1b[31msystem console stolen!\x1b[m");
                }
                fatal!("blogd: can not read from fd {fd}: {errno}");
            }
        };
        if cnt == 0 {
            return;
        }
        let chunk = &trans[..cnt];

        self.sync_window_size(fd);
        self.log.parse(chunk);

        // Probe every sink; ones that will not take a write now go on the blocked list and get
        // their one-shot watchdog armed.
        let mut alerts: Vec<String> = Vec::new();
        for console in self.consoles.iter() {
            let Some(sink) = console.fd() else { continue };
            if self.blocked.contains(&sink) {
                break; // Wait on the watchdog event
            }
            if io::can_write(sink, SINK_PROBE_MS) {
                continue;
            }
            self.blocked.push(sink);
            let _ = self.registry.reenable(sink);
            alerts.push(format!("blogd: console device {} is blocked", console.tty));
        }
        for alert in &alerts {
            self.log.note(alert);
        }

        // While a passphrase prompt or a blocked device defers delivery, the traffic waits in
        // the hold buffer; whatever exceeds its room is dropped.
        if self.asking || !self.blocked.is_empty() {
            let _ = self.hold.append(chunk);
        } else if self.drain_hold() {
            self.fan_out(chunk);
        }

        self.log.flush();
    }

    /// The fifo handler: auxiliary producers land in the log only, no sink fan-out.
    fn fifo_input(&mut self, fd: FileDescriptor) {
        let mut trans = [0_u8; TRANS_BUFFER_SIZE];
        match io::safein(fd, &mut trans) {
            Ok(0) | Err(_) => {}
            Ok(cnt) => {
                self.log.parse(&trans[..cnt]);
                self.log.flush();
            }
        }
    }

    /// A blocked sink's watchdog fired: it is writable again.
    fn sink_watchdog(&mut self, fd: FileDescriptor) {
        self.blocked.retain(|&blocked| blocked != fd);
    }

    fn sync_window_size(&mut self, capture_fd: FileDescriptor) {
        let Some(consdev) = self.consoles.consdev_fd() else {
            return;
        };
        let Ok(wz) = term::window_size(consdev) else {
            return;
        };
        if wz != self.last_winsize {
            let _ = term::set_window_size(capture_fd, &wz);
            self.last_winsize = wz;
        }
    }

    /// Delivers held-back bytes to every sink, oldest first, advancing only as far as every sink
    /// followed. Returns whether the buffer is empty now.
    fn drain_hold(&mut self) -> bool {
        let sinks = self.sink_list();

        while self.hold.available() > 0 {
            let mut len = self.hold.available().min(TRANS_BUFFER_SIZE);

            for &(sink, max_canon) in &sinks {
                let report = io::copyout(sink, self.hold.peek(len), max_canon, self.reconnect);
                if report.stalled {
                    self.mark_blocked(sink);
                }
                if report.accepted < 1 {
                    return false; // Leave the remainder for the next cycle
                }
                len = report.accepted;
                let _ = term::drain(sink);
            }

            self.hold.consume(len);
        }
        true
    }

    /// Writes one fresh chunk to every sink in list order. A sink that takes nothing sends the
    /// chunk to the hold buffer; sinks before it already got their copy.
    fn fan_out(&mut self, chunk: &[u8]) {
        let sinks = self.sink_list();

        for &(sink, max_canon) in &sinks {
            let report = io::copyout(sink, chunk, max_canon, self.reconnect);
            if report.stalled {
                self.mark_blocked(sink);
            }
            if report.accepted < 1 {
                let _ = self.hold.append(chunk);
                break;
            }
            let _ = term::drain(sink);
        }
    }

    fn sink_list(&self) -> Vec<(FileDescriptor, usize)> {
        self.consoles
            .iter()
            .filter_map(|console| console.fd().map(|fd| (fd, console.max_canon)))
            .collect()
    }

    fn mark_blocked(&mut self, fd: FileDescriptor) {
        if !self.blocked.contains(&fd) {
            self.blocked.push(fd);
        }
        let _ = self.registry.reenable(fd);
    }

    /// Hands the system console back to the kernel: drop the capture watch, clear the console
    /// redirect, park the standard streams on the console device.
    pub fn deactivate_capture(&mut self) {
        let Some(capture_fd) = self.capture else {
            return;
        };
        let Some(consdev) = self.consoles.consdev_fd() else {
            return;
        };

        let _ = self.registry.delete(capture_fd);
        let _ = term::redirect_console(consdev);
        fs::close_raw(capture_fd);
        let _ = fs::dup2(consdev, FileDescriptor::STDIN);
        let _ = fs::dup2(FileDescriptor::STDIN, FileDescriptor::STDOUT);
        let _ = fs::dup2(FileDescriptor::STDIN, FileDescriptor::STDERR);
        self.capture = None;
    }

    /// Hijacks the system console: a fresh pty pair shaped like the console device, kernel
    /// output redirected into the slave, the master installed as the capture source on stdin.
    ///
    /// # Errors
    ///
    /// Propagates any [`Errno`]s from the pty setup or redirection; those are fatal to the
    /// caller since the daemon has no capture source without them.
    pub fn reactivate_capture(&mut self) -> Result<(), Errno> {
        if self.capture.is_some() {
            return Ok(());
        }
        let Some(consdev) = self.consoles.consdev() else {
            return Ok(());
        };
        let Some(consdev_fd) = consdev.fd() else {
            return Ok(());
        };

        let mut wz = term::window_size(consdev_fd)?;
        wz.or_fallback();

        let mut tio = consdev.original_tio.clone();
        tio.make_raw();
        tio.set_speed_38400();
        tio.set_local_mode(term::LocalModeFlags::ECHO, false)
            .set_local_mode(term::LocalModeFlags::ISIG, true)
            .set_control_char(term::ControlCharIndex::Time, 0)
            .set_control_char(term::ControlCharIndex::Min, 1);

        let pair = term::open_pty(&tio, &wz)?;
        let _ = term::lock_attributes(pair.slave.fd());
        term::redirect_console(pair.slave.fd())?;

        fs::dup2(pair.master.fd(), FileDescriptor::STDIN)?;
        fs::dup2(pair.slave.fd(), FileDescriptor::STDOUT)?;
        fs::dup2(pair.slave.fd(), FileDescriptor::STDERR)?;
        drop(pair); // the duplicated ends stay open

        self.registry
            .add_read(FileDescriptor::STDIN, Token::CaptureInput)?;
        self.capture = Some(FileDescriptor::STDIN);
        Ok(())
    }

    /// Orderly shutdown: settle the sinks, absorb late input for a bounded while, then release
    /// everything and wipe the password area.
    pub fn close_io(&mut self) {
        if !self.log.is_open() && !signals::log_pause_requested() {
            eprintln!("blogd: no message logging because /var file system is not accessible");
        }

        for console in self.consoles.iter() {
            if let Some(fd) = console.fd() {
                let _ = term::drain(fd);
            }
        }

        self.log.finish();
        self.log.flush();

        // Repeat as long as input keeps arriving, but no more than ~3 seconds.
        let mut cycles = SHUTDOWN_CYCLES;
        loop {
            if cycles == 0 {
                break;
            }
            cycles -= 1;

            let ran = self.more_input(SHUTDOWN_POLL_MS, true);
            if let Some(capture_fd) = self.capture {
                let _ = term::drain(capture_fd);
            }
            self.log.flush();

            if !ran {
                break;
            }
        }

        self.log.stop();
        self.log.close();

        if let Some(fifo) = self.fifo.take() {
            let _ = self.registry.delete(fifo.fd());
        }
        if let Some(listener) = self.listener.take() {
            let _ = self.registry.delete(listener.fd());
        }
        for client in self.clients.drain(..) {
            let _ = self.registry.delete(client.fd());
        }
        if let Some(capture_fd) = self.capture.take() {
            let _ = self.registry.delete(capture_fd);
            fs::close_raw(capture_fd);
        }

        if let Some(password) = &mut self.password {
            password.zeroize();
        }

        for console in self.consoles.iter() {
            if let Some(fd) = console.fd() {
                let _ = term::drain(fd);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        console::{Console, ConsoleFlags},
        io, process, protocol, socket,
        term::{self, PtyPair, Termios},
    };

    fn test_pty() -> PtyPair {
        let mut tio = Termios::default();
        tio.make_raw();
        #[allow(clippy::unwrap_used)]
        term::open_pty(&tio, &term::WinSize::default()).unwrap()
    }

    /// A console stand-in whose write side is a pty slave; its master plays the terminal.
    fn sink_console(pair: PtyPair, nonblocking: bool) -> (Console, File) {
        if nonblocking {
            #[allow(clippy::unwrap_used)]
            {
                let mut flags = pair.slave.status_flags().unwrap();
                flags.insert(crate::fs::OpenFlags::O_NONBLOCK);
                pair.slave.set_status_flags(flags).unwrap();
            }
        }
        let console = Console {
            tty: pair.name,
            file: Some(pair.slave),
            flags: ConsoleFlags::ENABLED,
            dev: 0,
            max_canon: 255,
            prompter: None,
            locked_tio: Termios::default(),
            original_tio: Termios::default(),
            current_tio: Termios::default(),
        };
        (console, pair.master)
    }

    fn read_available(master: &File) -> alloc::vec::Vec<u8> {
        let mut out = alloc::vec::Vec::new();
        let mut buf = [0_u8; 4096];
        while io::can_read(master.fd(), 20) {
            #[allow(clippy::unwrap_used)]
            let n = master.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    fn relay_over_two_sinks() -> (Daemon, File, File, PtyPair) {
        let (console_a, master_a) = sink_console(test_pty(), false);
        let (console_b, master_b) = sink_console(test_pty(), false);
        let consoles = Consoles::from_vec(alloc::vec![console_a, console_b]);

        #[allow(clippy::unwrap_used)]
        let mut daemon = Daemon::new(consoles).unwrap();

        let capture = test_pty();
        #[allow(clippy::unwrap_used)]
        daemon
            .registry
            .add_read(capture.slave.fd(), Token::CaptureInput)
            .unwrap();
        daemon.capture = Some(capture.slave.fd());

        (daemon, master_a, master_b, capture)
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn dual_sink_fan_out_in_order() {
        let (mut daemon, master_a, master_b, capture) = relay_over_two_sinks();

        capture.master.write(b"hello\n").unwrap();
        while !io::can_read(daemon.capture.unwrap(), 20) {}
        assert!(daemon.more_input(1000, false));

        assert_eq!(read_available(&master_a), b"hello\n");
        assert_eq!(read_available(&master_b), b"hello\n");
        // The sanitized copy reached the log pipeline too.
        assert_eq!(daemon.log.backlog_text(), b"hello\n");
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn asking_mode_defers_and_drains() {
        let (mut daemon, master_a, master_b, capture) = relay_over_two_sinks();

        daemon.asking = true;
        capture.master.write(b"held ").unwrap();
        while !io::can_read(daemon.capture.unwrap(), 20) {}
        daemon.more_input(1000, false);

        // Suppressed: the sinks saw nothing, the hold buffer has it all.
        assert!(read_available(&master_a).is_empty());
        assert_eq!(daemon.hold.peek(64), b"held ");

        daemon.asking = false;
        capture.master.write(b"released").unwrap();
        while !io::can_read(daemon.capture.unwrap(), 20) {}
        daemon.more_input(1000, false);

        // Hold-buffer contents strictly precede the fresh chunk, on every sink.
        assert_eq!(read_available(&master_a), b"held released");
        assert_eq!(read_available(&master_b), b"held released");
        assert!(daemon.hold.is_empty());
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn blocked_sink_gets_chunk_after_watchdog() {
        let (console_a, master_a) = sink_console(test_pty(), false);
        let (console_b, master_b) = sink_console(test_pty(), true);
        let sink_b = console_b.fd().unwrap();
        let consoles = Consoles::from_vec(alloc::vec![console_a, console_b]);

        let mut daemon = Daemon::new(consoles).unwrap();
        let capture = test_pty();
        daemon
            .registry
            .add_read(capture.slave.fd(), Token::CaptureInput)
            .unwrap();
        daemon.capture = Some(capture.slave.fd());
        daemon.registry.add_write(sink_b, Token::SinkWatchdog).unwrap();
        // Swallow the initial one-shot writability event.
        daemon.more_input(200, false);

        // Stuff sink B until it refuses more.
        let filler = alloc::vec![b'#'; 1 << 18];
        let report = io::copyout(sink_b, &filler, usize::MAX, None);
        assert!(report.stalled);

        capture.master.write(b"to the log\n").unwrap();
        while !io::can_read(daemon.capture.unwrap(), 20) {}
        daemon.more_input(1000, false);

        // A blocked device defers everyone; the chunk waits in the hold buffer and the log
        // carries the alert.
        assert!(daemon.blocked.contains(&sink_b));
        assert_eq!(daemon.hold.peek(64), b"to the log\n");
        assert!(read_available(&master_a).is_empty());
        let log_tail = daemon.log.backlog_text();
        assert!(
            log_tail
                .windows(b"is blocked".len())
                .any(|window| window == b"is blocked")
        );

        // Relieve B; its watchdog clears the block on the next cycle.
        let _ = read_available(&master_b);
        daemon.more_input(1000, false);
        assert!(!daemon.blocked.contains(&sink_b));

        // The next chunk is preceded by the held one.
        capture.master.write(b"fresh\n").unwrap();
        while !io::can_read(daemon.capture.unwrap(), 20) {}
        daemon.more_input(1000, false);
        assert_eq!(read_available(&master_a), b"to the log\nfresh\n");
    }

    fn control_round(frame: &[u8]) -> [u8; 2] {
        let (console_a, _master_a) = sink_console(test_pty(), false);
        let consoles = Consoles::from_vec(alloc::vec![console_a]);
        #[allow(clippy::unwrap_used)]
        let mut daemon = Daemon::new(consoles).unwrap();

        #[allow(clippy::unwrap_used)]
        let listener = socket::listen().unwrap();
        #[allow(clippy::unwrap_used)]
        daemon
            .registry
            .add_read(listener.fd(), Token::SocketAccept)
            .unwrap();
        daemon.listener = Some(listener);

        #[allow(clippy::unwrap_used)]
        let client = socket::connect().unwrap();
        #[allow(clippy::unwrap_used)]
        client.write(frame).unwrap();

        // One cycle accepts, the next serves the command.
        daemon.more_input(1000, false);
        daemon.more_input(1000, false);

        let mut answer = [0_u8; 2];
        assert!(io::can_read(client.fd(), 1000));
        #[allow(clippy::unwrap_used)]
        client.read(&mut answer).unwrap();
        answer
    }

    #[test_case]
    fn ping_over_the_socket() {
        let answer = control_round(&protocol::command_frame(protocol::MAGIC_PING, None));
        if process::getuid() == 0 {
            assert_eq!(answer[0], protocol::ANSWER_ACK);
        } else {
            // The daemon refuses peers that are not root.
            assert_eq!(answer[0], protocol::ANSWER_NCK);
        }
    }

    #[test_case]
    fn unknown_magic_is_refused() {
        let answer = control_round(&protocol::command_frame(b'Z', None));
        assert_eq!(answer[0], protocol::ANSWER_NCK);
    }

    #[test_case]
    fn cached_password_before_any_prompt() {
        if process::getuid() != 0 {
            return; // the authentication path is covered above
        }
        let answer = control_round(&protocol::command_frame(protocol::MAGIC_CACHED_PWD, None));
        assert_eq!(answer[0], protocol::ANSWER_ENQ);
    }

    #[test_case]
    #[allow(clippy::unwrap_used)]
    fn failed_round_never_replays_stale_password() {
        use crate::passwd::MAX_PASSLEN;

        let (console_a, _master_a) = sink_console(test_pty(), false);
        let mut daemon = Daemon::new(Consoles::from_vec(alloc::vec![console_a])).unwrap();

        // A prior round left a cached passphrase; the one after it collapsed with a read
        // error, which the prompter records as a negative length word.
        daemon.password = Some(SharedRegion::new(MAX_PASSLEN + 4).unwrap());
        {
            let region = daemon.password.as_mut().unwrap();
            let bytes = region.bytes_mut();
            bytes[..6].copy_from_slice(b"secret");
            bytes[MAX_PASSLEN..].copy_from_slice(&(-1_i32).to_le_bytes());
        }

        let listener = socket::listen().unwrap();
        let client = socket::connect().unwrap();
        let served = socket::accept(&listener).unwrap();

        assert!(!daemon.answer_password(served.fd()));

        assert!(io::can_read(client.fd(), 1000));
        let mut answer = [0_u8; 2];
        client.read(&mut answer).unwrap();
        assert_eq!(answer[0], protocol::ANSWER_ENQ);
    }
}

/// Opens the log fifo, creating it first when the device tree does not carry one yet.
fn open_fifo() -> Option<File> {
    if let Err(Errno::Enoent) = fs::stat(FIFO_PATH) {
        let _ = fs::mkfifo(FIFO_PATH, FilePermissions::OWNER_ONLY);
    }

    match fs::stat(FIFO_PATH) {
        Ok(st) if st.file_type == FileType::Fifo => {}
        _ => return None,
    }

    match OpenOptions::new()
        .read_write()
        .no_ctty(true)
        .close_on_exec(true)
        .open(FIFO_PATH)
    {
        Ok(fifo) => Some(fifo),
        Err(errno) => {
            eprintln!("blogd: can not open named fifo {FIFO_PATH}: {errno}");
            None
        }
    }
}
