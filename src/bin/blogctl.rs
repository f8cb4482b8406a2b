//! The control client for the boot console logging daemon: one subcommand per invocation, one
//! magic byte over the socket, exit status 0 iff the daemon acknowledged.

#![no_std]
#![no_main]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::all,
    clippy::pedantic
)]
#![feature(custom_test_frameworks)]
#![cfg_attr(test, test_runner(blogd_core::custom_test_runner))]
#![cfg_attr(test, reexport_test_harness_main = "test_main")]

extern crate alloc;

use alloc::string::String;
use core::panic::PanicInfo;

use getargs::{Arg, Options};

use blogd_core::{
    EnvVar, eprintln, fatal, io, ipc, ipc::SigDisposition, ipc::Signo, parse_argv_envp, process,
    process::ExitStatus, protocol, socket,
};

const PANIC_TITLE: &str = "blogctl";

/// How long the client waits for the daemon's reply.
const REPLY_WAIT_MS: i32 = 1000;

core::arch::global_asm! {
    ".global _start",
    "_start:",
    "mov rdi, rsp",
    "call start"
}

/// Send one control command to the running daemon.
///
/// # Safety
///
/// This program must be passed appropriate `execve`-compatible args.
#[unsafe(no_mangle)]
#[allow(unused_variables)]
unsafe extern "C" fn start(stack_top: *const usize) -> ! {
    #[cfg(test)]
    {
        test_main();
        process::exit(ExitStatus::ExitSuccess);
    }

    // HACK: This stops the compiler from complaining when building the test/debug target
    #[allow(unreachable_code)]
    #[allow(clippy::no_effect)]
    ();

    // SAFETY: This function is being called right at the start of execution before anything
    // else. The stack pointer is retrieved directly from the function args.
    let (argv, envp) = match unsafe { parse_argv_envp(stack_top) } {
        Ok(argv_envp) => argv_envp,
        Err(errno) => process::exit(ExitStatus::ExitFailure(errno as i32)),
    };

    let exit_code = main(&argv, &envp);

    process::exit(exit_code);
}

fn usage() -> ExitStatus {
    eprintln!(
        "Usage: 'blogctl root=<dir>|ping|ready|quit|final|close|deactivate|reactivate'"
    );
    ExitStatus::ExitFailure(1)
}

fn main(args: &[String], _env_vars: &[EnvVar]) -> ExitStatus {
    let mut command = None;

    let mut opts = Options::new(args.iter().map(String::as_str).skip(1));
    while let Ok(Some(arg)) = opts.next_arg() {
        match arg {
            Arg::Positional(word) => {
                command = protocol::subcommand(word);
                break; // One command per call only
            }
            _ => return usage(),
        }
    }
    let Some((magic, cmd_arg)) = command else {
        return usage();
    };

    if let Some(arg) = cmd_arg
        && (arg.is_empty() || arg.len() > u8::MAX as usize)
    {
        fatal!("blogctl: can not send message: {}", blogd_core::Errno::Einval);
    }

    let _ = ipc::set_signal(Signo::SigPipe, SigDisposition::Ignore);

    let sock = match socket::connect() {
        Ok(sock) => sock,
        Err(_) => fatal!("blogctl: no blogd active"),
    };

    let frame = protocol::command_frame(magic, cmd_arg);
    if let Err(errno) = io::safeout(sock.fd(), &frame, usize::MAX, true, None) {
        fatal!("blogctl: can not send message: {errno}");
    }

    let mut answer = [protocol::ANSWER_NCK, 0];
    if io::can_read(sock.fd(), REPLY_WAIT_MS) {
        answer[0] = 0;
        let _ = io::safein(sock.fd(), &mut answer);
    }

    if answer[0] == protocol::ANSWER_ACK {
        ExitStatus::ExitSuccess
    } else {
        ExitStatus::ExitFailure(1)
    }
}

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    eprintln!("{PANIC_TITLE} {info}");
    process::exit(ExitStatus::ExitFailure(1))
}
