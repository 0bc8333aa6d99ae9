use core::fmt;

use crate::{
    io::{PciAddress, PciConfigMode},
    memory::Width,
};

/// The machine underneath the services layer.
///
/// Everything here is a raw accessor: argument checking is done by the
/// services layer before a request reaches the platform.
pub trait Platform {
    /// Read from an I/O port.
    fn read_port(&mut self, port: u16, width: Width) -> u32;

    /// Write to an I/O port. `value` is already truncated to `width`.
    fn write_port(&mut self, port: u16, value: u32, width: Width);

    /// Read physical memory.
    ///
    /// # Safety
    /// `address` must be readable at `width` in the flat address space.
    unsafe fn read_memory(&mut self, address: u64, width: Width) -> u32;

    /// Write physical memory. `value` is already truncated to `width`.
    ///
    /// # Safety
    /// `address` must be writable at `width` and must not alias anything
    /// the caller relies on.
    unsafe fn write_memory(&mut self, address: u64, value: u32, width: Width);

    /// Probe for a PCI configuration mechanism.
    fn detect_pci(&mut self) -> PciConfigMode;

    fn read_pci(&mut self, mode: PciConfigMode, address: PciAddress, width: Width) -> u32;

    fn write_pci(&mut self, mode: PciConfigMode, address: PciAddress, value: u32, width: Width);

    /// Milliseconds since an arbitrary point, at whatever resolution the
    /// platform timer has.
    fn uptime_ms(&mut self) -> u64;

    /// Wait at least `ms` milliseconds, letting the environment do its idle
    /// housekeeping meanwhile.
    fn sleep_ms(&mut self, ms: u64);

    /// Physical address of the RSDP, if firmware provides one.
    fn root_pointer(&mut self) -> Option<u64>;

    /// The default output stream.
    fn console(&mut self) -> &mut dyn fmt::Write;
}
