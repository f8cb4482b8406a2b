//! The control server: accepting clients, reading framed commands, and carrying them out.

use alloc::{string::String, vec};

use crate::{
    daemon::Daemon,
    eprintln, fatal,
    fs::FileDescriptor,
    io,
    ipc::Signo,
    passwd::{self, MAX_PASSLEN},
    poll::Token,
    process, protocol, signals, socket,
};

/// Little-endian length word trailing the password bytes in the shared area.
const LEN_WORD: usize = 4;

impl Daemon {
    /// A client is waiting on the listening socket: accept it and watch for its command.
    pub(crate) fn socket_accept(&mut self) {
        let Some(listener) = &self.listener else {
            return;
        };
        match socket::accept(listener) {
            Ok(conn) => {
                if self.registry.add_read(conn.fd(), Token::ClientCommand).is_ok() {
                    self.clients.push(conn);
                }
            }
            Err(errno) => eprintln!("blogd: can not connect on UNIX socket: {errno}"),
        }
    }

    fn drop_client(&mut self, fd: FileDescriptor) {
        let _ = self.registry.delete(fd);
        self.clients.retain(|client| client.fd() != fd);
    }

    fn reply(&self, fd: FileDescriptor, byte: u8) {
        // Replies carry a trailing NUL, matching what the client reads.
        let _ = io::safeout(fd, &[byte, 0], usize::MAX, true, None);
    }

    /// An accepted connection produced its command: authenticate the peer, act, reply.
    pub(crate) fn client_command(&mut self, fd: FileDescriptor) {
        let mut keep_open = false;

        if let Some((magic, arg)) = self.read_frame(fd)
            && self.authenticate(fd)
        {
            keep_open = self.dispatch(fd, magic, arg);
        }

        if !keep_open {
            self.drop_client(fd);
        }
    }

    fn read_frame(&mut self, fd: FileDescriptor) -> Option<(u8, Option<String>)> {
        let mut magic = [0_u8; 2];
        match io::safein(fd, &mut magic) {
            Ok(2) => {}
            Ok(_) | Err(_) => {
                eprintln!("blogd: can not read request magic from UNIX socket");
                return None;
            }
        }

        if magic[1] != protocol::HAS_ARG {
            return Some((magic[0], None));
        }

        let mut alen = [0_u8; 1];
        match io::safein(fd, &mut alen) {
            Ok(1) => {}
            Ok(_) | Err(_) => {
                eprintln!("blogd: can not get message length from UNIX socket");
                return None;
            }
        }

        let mut arg = vec![0_u8; alen[0] as usize];
        match io::safein(fd, &mut arg) {
            Ok(n) if n == arg.len() => {}
            Ok(_) | Err(_) => {
                eprintln!("blogd: can not get message from UNIX socket");
                return None;
            }
        }

        // Chop at the first NUL a C-side client sends along.
        let end = arg.iter().position(|&b| b == 0).unwrap_or(arg.len());
        arg.truncate(end);
        let arg = String::from_utf8(arg).ok()?;
        Some((magic[0], Some(arg)))
    }

    /// Only root may steer the daemon; anyone else gets a NACK and a log line naming them.
    fn authenticate(&mut self, fd: FileDescriptor) -> bool {
        let cred = match socket::peer_credentials(fd) {
            Ok(cred) => cred,
            Err(errno) => {
                eprintln!("blogd: can not get credentials from UNIX socket: {errno}");
                return false;
            }
        };

        if cred.uid != 0 {
            self.reply(fd, protocol::ANSWER_NCK);
            match process::exe_of(cred.pid) {
                Ok(exe) => eprintln!("blogd: connection from {exe} of user {}", cred.uid),
                Err(_) => eprintln!(
                    "blogd: connection from pid {} user {}",
                    cred.pid, cred.uid
                ),
            }
            return false;
        }
        true
    }

    /// Carries one command out. Returns whether the connection stays open for a later reply.
    fn dispatch(&mut self, fd: FileDescriptor, magic: u8, arg: Option<String>) -> bool {
        match magic {
            protocol::MAGIC_ASK_PWD => {
                if self.password.is_none() {
                    match crate::memory::SharedRegion::new(MAX_PASSLEN + LEN_WORD) {
                        Ok(region) => self.password = Some(region),
                        Err(errno) => {
                            fatal!("blogd: can not allocate password area: {errno}")
                        }
                    }
                }
                if let Some(region) = &mut self.password {
                    // A fresh round starts with nothing cached: clear the length word too, so a
                    // round that yields no answer can never serve the previous one.
                    let bytes = region.bytes_mut();
                    bytes[0] = 0;
                    bytes[MAX_PASSLEN..].fill(0);
                }
                self.prompt = arg;

                // Reply once the connection can take it; the prompt round runs then.
                if self
                    .registry
                    .answer_once(fd, Token::PasswordAnswer)
                    .is_err()
                {
                    self.reply(fd, protocol::ANSWER_NCK);
                    return false;
                }
                true
            }

            protocol::MAGIC_CACHED_PWD => {
                // With nothing cached the connection stays open: the client follows up with a
                // prompt request on it.
                !self.answer_password(fd)
            }

            protocol::MAGIC_CHROOT => {
                let root = arg.unwrap_or_default();
                if root.is_empty() {
                    self.reply(fd, protocol::ANSWER_NCK);
                    return false;
                }
                if let Err(errno) = process::new_root(root.as_str()) {
                    fatal!("blogd: can not change root to {root}: {errno}");
                }
                self.reply(fd, protocol::ANSWER_ACK);
                false
            }

            protocol::MAGIC_SYS_INIT => {
                self.reply(fd, protocol::ANSWER_ACK);
                // The system is up: the log is open by now or never will be.
                signals::retire_fs_ready();
                false
            }

            protocol::MAGIC_QUIT => {
                self.reply(fd, protocol::ANSWER_ACK);
                if !(signals::log_pause_requested()
                    && signals::signaled() == Signo::SigTerm as i32)
                {
                    signals::raise_signaled(Signo::SigTerm);
                }
                false
            }

            protocol::MAGIC_FINAL => {
                self.reply(fd, protocol::ANSWER_ACK);
                if !self.final_latch {
                    self.final_latch = true;
                    if let Err(errno) = self.log.rotate() {
                        fatal!(
                            "blogd: can not rename {}: {errno}",
                            crate::logfile::BOOT_LOGFILE
                        );
                    }
                }
                false
            }

            protocol::MAGIC_CLOSE => {
                self.reply(fd, protocol::ANSWER_ACK);
                signals::request_log_pause();
                false
            }

            protocol::MAGIC_DEACTIVATE => {
                self.deactivate_capture();
                self.reply(fd, protocol::ANSWER_ACK);
                false
            }

            protocol::MAGIC_REACTIVATE => {
                if let Err(errno) = self.reactivate_capture() {
                    fatal!("blogd: can not take over system console: {errno}");
                }
                self.reply(fd, protocol::ANSWER_ACK);
                false
            }

            protocol::MAGIC_PING => {
                self.reply(fd, protocol::ANSWER_ACK);
                false
            }

            magic if protocol::LEGACY_MAGICS.contains(&magic) => {
                self.reply(fd, protocol::ANSWER_ACK);
                false
            }

            _ => {
                self.reply(fd, protocol::ANSWER_NCK);
                false
            }
        }
    }

    /// The deferred password path: the requesting connection became writable, so run the prompt
    /// round now and answer with its outcome.
    pub(crate) fn password_answer(&mut self, fd: FileDescriptor) {
        self.ask_for_password();
        self.answer_password(fd);
        self.drop_client(fd);
    }

    /// Answers with the cached password (scrambled at rest, revealed only for the wire) or ENQ
    /// when there is none. Returns whether a password went out.
    pub(crate) fn answer_password(&mut self, fd: FileDescriptor) -> bool {
        let cached_len = self.cached_password_len();

        let Some(len) = cached_len else {
            self.reply(fd, protocol::ANSWER_ENQ);
            return false;
        };

        let reply = {
            #[allow(clippy::unwrap_used)] // cached_password_len proved the region exists
            let region = self.password.as_mut().unwrap();
            let mut plain = [0_u8; MAX_PASSLEN];
            plain[..len].copy_from_slice(&region.bytes()[..len]);
            passwd::scramble(&mut plain[..len]);

            let reply = protocol::password_reply(&plain[..len]);
            plain.fill(0);
            reply
        };

        let _ = io::safeout(fd, &reply, usize::MAX, true, None);
        self.prompt = None;
        true
    }

    fn cached_password_len(&self) -> Option<usize> {
        let region = self.password.as_ref()?;
        let bytes = region.bytes();
        let raw = i32::from_le_bytes([
            bytes[MAX_PASSLEN],
            bytes[MAX_PASSLEN + 1],
            bytes[MAX_PASSLEN + 2],
            bytes[MAX_PASSLEN + 3],
        ]);
        if raw <= 0 {
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        Some((raw as usize).min(MAX_PASSLEN - 1))
    }
}
