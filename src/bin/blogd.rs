//! The boot-time console logging daemon. Expected to start right after the kernel hands control
//! to init, so that every boot message scrolling past the system console ends up in
//! `/var/log/boot.log` and on every registered console device.

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

use blogd_core::{
    Daemon, EnvVar, console::Consoles, eprintln, fatal, ipc, ipc::SigDisposition, ipc::Signo,
    parse_argv_envp, process, process::ExitStatus, signals, socket,
};

const PANIC_TITLE: &str = "blogd";

core::arch::global_asm! {
    ".global _start",
    "_start:",
    "mov rdi, rsp",
    "call start"
}

/// Run the boot console relay until told to quit.
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

fn main(_args: &[String], _env_vars: &[EnvVar]) -> ExitStatus {
    let _ = process::set_process_name("blogd");

    if let Err(errno) = signals::install_base_handlers() {
        fatal!("blogd: can not install signal handlers: {errno}");
    }
    // The console takeover must not be derailed by job control noise.
    let _ = ipc::set_signal(Signo::SigInt, SigDisposition::Ignore);
    let _ = ipc::set_signal(Signo::SigTtin, SigDisposition::Ignore);
    let _ = ipc::set_signal(Signo::SigTtou, SigDisposition::Ignore);

    let consoles = match Consoles::discover(true) {
        Ok(consoles) => consoles,
        Err(errno) => fatal!("blogd: can not find any console device: {errno}"),
    };

    let mut daemon = match Daemon::new(consoles) {
        Ok(daemon) => daemon,
        Err(errno) => fatal!("blogd: can not create event registry: {errno}"),
    };

    let listener = match socket::listen() {
        Ok(listener) => Some(listener),
        Err(errno) => {
            eprintln!("blogd: can not open control socket: {errno}");
            None
        }
    };

    if let Err(errno) = daemon.prepare_io(None, listener) {
        fatal!("blogd: can not prepare I/O: {errno}");
    }

    // Hijack the system console: from here on the kernel talks to our pty.
    if let Err(errno) = daemon.reactivate_capture() {
        fatal!("blogd: can not take over system console: {errno}");
    }

    while signals::signaled() == 0 {
        daemon.safe_io();
    }

    daemon.close_io();

    ExitStatus::ExitSuccess
}

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    eprintln!("{PANIC_TITLE} {info}");
    process::exit(ExitStatus::ExitFailure(1))
}
