//! The ACPI interpreter, as seen from the driver.
//!
//! Table parsing, AML evaluation and the namespace all live behind this
//! trait. Every entry point gets the services layer so the interpreter can
//! call back into it while it runs.

use alloc::string::String;

use bitflags::bitflags;

use crate::{
    options::{DebugLayer, DebugLevel},
    OsServices, Status,
};

bitflags! {
    /// Which parts of initialisation to skip in `enable_subsystem` and
    /// `initialize_objects`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InitFlags: u32 {
        const NO_HARDWARE_INIT = 0x01;
        const NO_EVENT_INIT = 0x02;
        const NO_HANDLER_INIT = 0x04;
        const NO_ACPI_ENABLE = 0x08;
        const NO_DEVICE_INIT = 0x10;
        const NO_OBJECT_INIT = 0x20;
    }
}

impl InitFlags {
    pub const FULL_INITIALIZATION: InitFlags = InitFlags::empty();
}

/// ACPI system sleep states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SleepState {
    S0 = 0,
    S1 = 1,
    S2 = 2,
    S3 = 3,
    S4 = 4,
    /// Soft off.
    S5 = 5,
}

/// Opaque reference to a namespace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(pub usize);

pub trait Interpreter {
    fn initialize_subsystem(&mut self, os: &mut dyn OsServices) -> Result<(), Status>;

    /// Locate the root tables and copy them into the interpreter's table
    /// list, which holds up to `max_tables` entries.
    fn initialize_tables(
        &mut self,
        os: &mut dyn OsServices,
        max_tables: u32,
        allow_resize: bool,
    ) -> Result<(), Status>;

    /// Load the definition blocks into the namespace.
    fn load_tables(&mut self, os: &mut dyn OsServices) -> Result<(), Status>;

    fn enable_subsystem(&mut self, os: &mut dyn OsServices, flags: InitFlags) -> Result<(), Status>;

    fn initialize_objects(&mut self, os: &mut dyn OsServices, flags: InitFlags) -> Result<(), Status>;

    /// Evaluate `_PTS` and friends ahead of `enter_sleep_state`.
    fn enter_sleep_state_prep(&mut self, os: &mut dyn OsServices, state: SleepState) -> Result<(), Status>;

    /// Only returns on failure or on machines that ignore the request.
    fn enter_sleep_state(&mut self, os: &mut dyn OsServices, state: SleepState) -> Result<(), Status>;

    fn terminate(&mut self, os: &mut dyn OsServices) -> Result<(), Status>;

    /// The SCI line declared by the FADT, once the tables are known.
    fn sci_interrupt(&self) -> Option<u32>;

    /// The namespace root.
    fn root(&self) -> NodeHandle;

    /// The child of `parent` following `previous`, or the first child.
    fn next_child(
        &mut self,
        os: &mut dyn OsServices,
        parent: NodeHandle,
        previous: Option<NodeHandle>,
    ) -> Result<Option<NodeHandle>, Status>;

    /// Fully qualified path of a node, e.g. `\_SB_.PCI0`.
    fn full_path(&mut self, os: &mut dyn OsServices, node: NodeHandle) -> Result<String, Status>;

    /// Human readable text for an exception code.
    fn format_exception(&self, status: Status) -> &'static str {
        status.name().unwrap_or("UNKNOWN_STATUS_CODE")
    }

    /// Set the interpreter's own trace verbosity.
    fn set_debug(&mut self, _level: DebugLevel, _layers: DebugLayer) {}
}
