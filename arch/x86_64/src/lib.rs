//! Boot loader entry points for a legacy BIOS PC.

#![no_std]

use acpioff::{Driver, Interpreter, Mode, Options};
use log::{error, LevelFilter};

pub mod pci;
pub mod platform;
pub mod serial_console;

pub use platform::BiosPlatform;

fn halt_forever() -> ! {
    loop {
        unsafe { x86::halt() };
    }
}

/// Put the machine into S5. Only comes back to halt if that failed.
///
/// # Safety
/// Must run once, on the boot CPU, with physical memory identity mapped.
pub unsafe fn poweroff<I: Interpreter>(interpreter: I) -> ! {
    serial_console::init(LevelFilter::Info);

    let mut driver = Driver::new(BiosPlatform::new(), interpreter);
    let code = driver.run(&Mode::PowerOff);
    error!("acpioff: machine still running ({:#x}), halting", code);

    halt_forever()
}

/// The diagnostic variant: `[debug-level] [debug-layers] [dump-namespace]`.
/// Returns the exit status for the boot loader.
///
/// # Safety
/// Same as [`poweroff`].
pub unsafe fn diagnose<'a, I, A>(interpreter: I, args: A) -> i32
where
    I: Interpreter,
    A: IntoIterator<Item = &'a str>,
{
    let options = match Options::parse(args) {
        Ok(options) => options,
        Err(err) => {
            serial_console::init(LevelFilter::Error);
            crate::println!("acpidump: {}", err);
            crate::println!("usage: acpidump [debug-level] [debug-layers] [dump-namespace]");
            return -1;
        }
    };
    serial_console::init(options.level.log_filter());

    let mut driver = Driver::new(BiosPlatform::new(), interpreter);
    driver.run(&Mode::Diagnostic(options))
}
