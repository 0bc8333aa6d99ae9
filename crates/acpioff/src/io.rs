//! Port and PCI configuration space access checks.
//!
//! The accesses themselves are performed by the [`Platform`](crate::Platform);
//! this module decides whether a request may reach the hardware at all.

use crate::{memory::Width, OslError, Result};

pub const MAX_BUS: u16 = 0xff;
pub const MAX_DEVICE: u16 = 0x1f;
pub const MAX_FUNCTION: u16 = 0x07;
pub const MAX_REGISTER: u32 = 0xff;

/// PCI configuration access mechanism detected at initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PciConfigMode {
    #[default]
    None,
    /// Configuration mechanism #1 (0xCF8 address / 0xCFC data).
    Type1,
    /// Configuration mechanism #2 (0xCF8 enable / 0xCFA forward / 0xCxxx).
    Type2,
}

/// A PCI function as named by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PciId {
    pub segment: u16,
    pub bus: u16,
    pub device: u16,
    pub function: u16,
}

impl PciId {
    pub const fn new(segment: u16, bus: u16, device: u16, function: u16) -> Self {
        Self {
            segment,
            bus,
            device,
            function,
        }
    }
}

/// A validated configuration space location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciAddress {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
    pub register: u8,
}

impl PciAddress {
    /// Mechanism #1 CONFIG_ADDRESS value for the enclosing dword.
    pub fn config_address(&self) -> u32 {
        0x1 << 31
            | (self.bus as u32) << 16
            | (self.device as u32) << 11
            | (self.function as u32) << 8
            | (self.register as u32 & 0xfc)
    }

    /// Byte offset of the register within its dword.
    #[inline]
    pub fn offset(&self) -> u8 {
        self.register & 0x3
    }
}

/// Check a configuration space request.
///
/// No mechanism means not found. Locations past what the mechanism can name
/// and 64-bit accesses are limit conditions; other widths are invalid.
pub fn check_pci(mode: PciConfigMode, id: &PciId, register: u32, width: u32) -> Result<(PciAddress, Width)> {
    if mode == PciConfigMode::None {
        return Err(OslError::NotFound);
    }

    if id.segment != 0
        || id.bus > MAX_BUS
        || id.device > MAX_DEVICE
        || id.function > MAX_FUNCTION
        || register > MAX_REGISTER
    {
        return Err(OslError::Limit);
    }

    let width = match width {
        64 => return Err(OslError::Limit),
        bits => Width::try_from(bits)?,
    };

    let address = PciAddress {
        bus: id.bus as u8,
        device: id.device as u8,
        function: id.function as u8,
        register: register as u8,
    };
    Ok((address, width))
}

/// Check a port access.
#[inline]
pub fn check_port(width: u32) -> Result<Width> {
    Width::try_from(width)
}
