//! ACPI OS services layer for a boot loader environment, and the driver
//! that uses it to power the machine off.
//!
//! There is one thread, no MMU and no interrupts worth the name: physical
//! memory is identity mapped, synchronisation objects are tokens, and work
//! the interpreter defers is queued until the driver gets control back.

#![no_std]

extern crate alloc;

pub mod driver;
pub mod interpreter;
pub mod io;
pub mod irq;
pub mod memory;
pub mod options;
pub mod output;
pub mod platform;
pub mod services;
pub mod status;
pub mod sync;
pub mod work;

#[cfg(test)]
mod mock;

pub use driver::{Driver, Mode, State, Step};
pub use interpreter::Interpreter;
pub use options::Options;
pub use platform::Platform;
pub use services::{OsServices, Osl};
pub use status::{OslError, Result, Status};
