//! The two legacy PCI configuration mechanisms.

use acpioff::{
    io::{PciAddress, PciConfigMode},
    memory::Width,
};
use x86::io::{inb, inl, inw, outb, outl, outw};

const CONFIG_ADDRESS: u16 = 0xcf8;
const CONFIG_DATA: u16 = 0xcfc;

/// Mechanism #2 registers.
const CSE: u16 = 0xcf8;
const FORWARD: u16 = 0xcfa;
const MECHANISM_SELECT: u16 = 0xcfb;

/// Port of `address` in the mechanism #2 window. The function has to be
/// selected through the CSE register first.
pub fn type2_port(address: PciAddress) -> u16 {
    0xc000 | u16::from(address.device) << 8 | u16::from(address.register)
}

/// CSE value enabling the window for `function`.
pub fn type2_enable(function: u8) -> u8 {
    0xf0 | function << 1
}

/// Probe mechanism #1, then mechanism #2.
///
/// # Safety
/// Touches the configuration ports; nothing else may be using them.
pub unsafe fn detect() -> PciConfigMode {
    outb(MECHANISM_SELECT, 0x01);
    let saved = inl(CONFIG_ADDRESS);
    outl(CONFIG_ADDRESS, 0x8000_0000);
    let echoed = inl(CONFIG_ADDRESS);
    outl(CONFIG_ADDRESS, saved);
    if echoed == 0x8000_0000 {
        return PciConfigMode::Type1;
    }

    outb(MECHANISM_SELECT, 0x00);
    outb(CSE, 0x00);
    outb(FORWARD, 0x00);
    if inb(CSE) == 0x00 && inb(FORWARD) == 0x00 {
        return PciConfigMode::Type2;
    }

    PciConfigMode::None
}

unsafe fn read_port(port: u16, width: Width) -> u32 {
    match width {
        Width::Byte => u32::from(inb(port)),
        Width::Word => u32::from(inw(port)),
        Width::Dword => inl(port),
    }
}

unsafe fn write_port(port: u16, value: u32, width: Width) {
    match width {
        Width::Byte => outb(port, value as u8),
        Width::Word => outw(port, value as u16),
        Width::Dword => outl(port, value),
    }
}

/// # Safety
/// `mode` must be the mechanism `detect` found.
pub unsafe fn read(mode: PciConfigMode, address: PciAddress, width: Width) -> u32 {
    match mode {
        PciConfigMode::Type1 => {
            outl(CONFIG_ADDRESS, address.config_address());
            read_port(CONFIG_DATA + u16::from(address.offset()), width)
        }
        PciConfigMode::Type2 => {
            outb(CSE, type2_enable(address.function));
            outb(FORWARD, address.bus);
            let value = read_port(type2_port(address), width);
            outb(CSE, 0);
            value
        }
        PciConfigMode::None => width.mask(u32::MAX),
    }
}

/// # Safety
/// `mode` must be the mechanism `detect` found.
pub unsafe fn write(mode: PciConfigMode, address: PciAddress, value: u32, width: Width) {
    match mode {
        PciConfigMode::Type1 => {
            outl(CONFIG_ADDRESS, address.config_address());
            write_port(CONFIG_DATA + u16::from(address.offset()), value, width);
        }
        PciConfigMode::Type2 => {
            outb(CSE, type2_enable(address.function));
            outb(FORWARD, address.bus);
            write_port(type2_port(address), value, width);
            outb(CSE, 0);
        }
        PciConfigMode::None => {}
    }
}
