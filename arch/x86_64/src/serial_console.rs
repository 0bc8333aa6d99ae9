//! COM1 as both the console and the log sink.

use core::fmt;

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;
use uart_16550::SerialPort;

pub const DEFAULT_PORT: u16 = 0x3f8;

pub static SERIAL_PORT: Mutex<SerialPort> = Mutex::new(unsafe { SerialPort::new(DEFAULT_PORT) });

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let mut port = $crate::serial_console::SERIAL_PORT.lock();
        let _ = port.write_fmt(format_args!($($arg)*));
    }}
}

#[macro_export]
macro_rules! println {
    ($fmt:expr) => ($crate::print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::print!(concat!($fmt, "\n"), $($arg)*));
}

/// Handle on the serial port for code that wants a `fmt::Write`.
#[derive(Debug, Default)]
pub struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        SERIAL_PORT.lock().write_str(s)
    }
}

struct SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            crate::println!("[{:>5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: SerialLogger = SerialLogger;

/// Initialise the serial console and route `log` records to it.
pub fn init(level: LevelFilter) {
    SERIAL_PORT.lock().init();
    // Only fails if a logger is already installed, which is fine.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
