//! Positional arguments of the diagnostic variant:
//!
//! ```text
//! acpidump [debug-level] [debug-layers] [dump-namespace]
//! ```

use core::fmt;

use bitflags::bitflags;
use log::LevelFilter;

bitflags! {
    /// Interpreter trace verbosity.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DebugLevel: u32 {
        const INIT = 0x0000_0001;
        const DEBUG_OBJECT = 0x0000_0002;
        const INFO = 0x0000_0004;
        const REPAIR = 0x0000_0008;
        const ALL_EXCEPTIONS = 0x0000_000f;

        const INIT_NAMES = 0x0000_0020;
        const PARSE = 0x0000_0040;
        const LOAD = 0x0000_0080;
        const DISPATCH = 0x0000_0100;
        const EXEC = 0x0000_0200;
        const NAMES = 0x0000_0400;
        const OPREGION = 0x0000_0800;
        const BFIELD = 0x0000_1000;
        const TABLES = 0x0000_2000;
        const VALUES = 0x0000_4000;
        const OBJECTS = 0x0000_8000;
        const RESOURCES = 0x0001_0000;
        const USER_REQUESTS = 0x0002_0000;
        const PACKAGE = 0x0004_0000;

        const ALLOCATIONS = 0x0010_0000;
        const FUNCTIONS = 0x0020_0000;
        const OPTIMIZATIONS = 0x0040_0000;

        const MUTEX = 0x0100_0000;
        const THREADS = 0x0200_0000;
        const IO = 0x0400_0000;
        const INTERRUPTS = 0x0800_0000;

        const AML_DISASSEMBLE = 0x1000_0000;
        const VERBOSE_INFO = 0x2000_0000;
        const FULL_TABLES = 0x4000_0000;
        const EVENTS = 0x8000_0000;

        const _ = !0;
    }
}

impl DebugLevel {
    pub const NORMAL_DEFAULT: DebugLevel = DebugLevel::INIT
        .union(DebugLevel::DEBUG_OBJECT)
        .union(DebugLevel::REPAIR);

    /// The log filter matching this verbosity.
    pub fn log_filter(self) -> LevelFilter {
        if self.bits() & !DebugLevel::ALL_EXCEPTIONS.bits() != 0 {
            LevelFilter::Trace
        } else if self.contains(DebugLevel::INFO) {
            LevelFilter::Debug
        } else if self.contains(DebugLevel::INIT) {
            LevelFilter::Info
        } else if !self.is_empty() {
            LevelFilter::Warn
        } else {
            LevelFilter::Error
        }
    }
}

bitflags! {
    /// Interpreter components to trace.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DebugLayer: u32 {
        const UTILITIES = 0x0000_0001;
        const HARDWARE = 0x0000_0002;
        const EVENTS = 0x0000_0004;
        const TABLES = 0x0000_0008;
        const NAMESPACE = 0x0000_0010;
        const PARSER = 0x0000_0020;
        const DISPATCHER = 0x0000_0040;
        const EXECUTER = 0x0000_0080;
        const RESOURCES = 0x0000_0100;
        const CA_DEBUGGER = 0x0000_0200;
        const OS_SERVICES = 0x0000_0400;
        const CA_DISASSEMBLER = 0x0000_0800;
        const COMPILER = 0x0000_1000;
        const TOOLS = 0x0000_2000;
        const EXAMPLE = 0x0000_4000;
        const DRIVER = 0x0000_8000;

        const _ = !0;
    }
}

impl DebugLayer {
    pub const ALL_COMPONENTS: DebugLayer = DebugLayer::from_bits_retain(0x0000_1fff);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsError {
    InvalidLevel,
    InvalidLayers,
    InvalidFlag,
    TooManyArguments,
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionsError::InvalidLevel => "debug level is not a number",
            OptionsError::InvalidLayers => "debug layer mask is not a number",
            OptionsError::InvalidFlag => "dump flag must be 0/1, true/false or yes/no",
            OptionsError::TooManyArguments => "too many arguments",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub level: DebugLevel,
    pub layers: DebugLayer,
    /// Dump the namespace instead of powering off.
    pub dump_namespace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            level: DebugLevel::NORMAL_DEFAULT,
            layers: DebugLayer::ALL_COMPONENTS,
            dump_namespace: false,
        }
    }
}

fn parse_number(arg: &str) -> Option<u32> {
    match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => arg.parse().ok(),
    }
}

fn parse_flag(arg: &str) -> Option<bool> {
    match arg {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

impl Options {
    /// Parse the arguments following the program name.
    pub fn parse<'a, I>(args: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut options = Options::default();
        let mut args = args.into_iter();

        if let Some(arg) = args.next() {
            let level = parse_number(arg).ok_or(OptionsError::InvalidLevel)?;
            options.level = DebugLevel::from_bits_retain(level);
        }
        if let Some(arg) = args.next() {
            let layers = parse_number(arg).ok_or(OptionsError::InvalidLayers)?;
            options.layers = DebugLayer::from_bits_retain(layers);
        }
        if let Some(arg) = args.next() {
            options.dump_namespace = parse_flag(arg).ok_or(OptionsError::InvalidFlag)?;
        }
        if args.next().is_some() {
            return Err(OptionsError::TooManyArguments);
        }

        Ok(options)
    }
}
