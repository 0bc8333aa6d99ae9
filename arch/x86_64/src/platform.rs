use core::{fmt, ptr};

use acpioff::{
    io::{PciAddress, PciConfigMode},
    memory::Width,
    Platform,
};
use log::debug;
use x86::io::{inb, inl, inw, outb, outl, outw};

use crate::{pci, serial_console::Console};

/// BIOS data area counter of timer interrupts since midnight.
const BIOS_TICKS: u64 = 0x46c;

/// Length of one BIOS tick in 100 ns units (18.2 Hz).
const TICK_100NS: u64 = 549_254;

/// Ticks after which the BIOS resets its counter to zero at midnight.
pub const TICKS_PER_DAY: u64 = 0x0018_00b0;

/// Milliseconds covered by `ticks` BIOS timer ticks.
pub fn ticks_to_ms(ticks: u64) -> u64 {
    ticks * TICK_100NS / 10_000
}

/// Extends the since-midnight BIOS counter into a count since the first
/// reading that never goes backwards.
#[derive(Debug, Default)]
pub struct TickCounter {
    last: u64,
    base: u64,
}

impl TickCounter {
    /// Fold in a raw counter value. Must be called at least once a day.
    pub fn update(&mut self, raw: u64) -> u64 {
        if raw < self.last {
            self.base += TICKS_PER_DAY;
        }
        self.last = raw;
        self.base + raw
    }
}

/// A legacy BIOS PC with low memory identity mapped.
#[derive(Debug)]
pub struct BiosPlatform {
    console: Console,
    ticks: TickCounter,
}

impl BiosPlatform {
    /// # Safety
    /// There must be at most one instance. Physical memory must be identity
    /// mapped, the BIOS data area intact and interrupts enabled.
    pub unsafe fn new() -> Self {
        Self {
            console: Console,
            ticks: TickCounter::default(),
        }
    }

    fn ticks(&mut self) -> u64 {
        let raw = u64::from(unsafe { ptr::read_volatile(BIOS_TICKS as *const u32) });
        self.ticks.update(raw)
    }
}

impl Platform for BiosPlatform {
    fn read_port(&mut self, port: u16, width: Width) -> u32 {
        unsafe {
            match width {
                Width::Byte => u32::from(inb(port)),
                Width::Word => u32::from(inw(port)),
                Width::Dword => inl(port),
            }
        }
    }

    fn write_port(&mut self, port: u16, value: u32, width: Width) {
        unsafe {
            match width {
                Width::Byte => outb(port, value as u8),
                Width::Word => outw(port, value as u16),
                Width::Dword => outl(port, value),
            }
        }
    }

    unsafe fn read_memory(&mut self, address: u64, width: Width) -> u32 {
        match width {
            Width::Byte => u32::from(ptr::read_volatile(address as *const u8)),
            Width::Word => u32::from(ptr::read_volatile(address as *const u16)),
            Width::Dword => ptr::read_volatile(address as *const u32),
        }
    }

    unsafe fn write_memory(&mut self, address: u64, value: u32, width: Width) {
        match width {
            Width::Byte => ptr::write_volatile(address as *mut u8, value as u8),
            Width::Word => ptr::write_volatile(address as *mut u16, value as u16),
            Width::Dword => ptr::write_volatile(address as *mut u32, value),
        }
    }

    fn detect_pci(&mut self) -> PciConfigMode {
        let mode = unsafe { pci::detect() };
        debug!("pci: configuration mechanism {:?}", mode);
        mode
    }

    fn read_pci(&mut self, mode: PciConfigMode, address: PciAddress, width: Width) -> u32 {
        unsafe { pci::read(mode, address, width) }
    }

    fn write_pci(&mut self, mode: PciConfigMode, address: PciAddress, value: u32, width: Width) {
        unsafe { pci::write(mode, address, value, width) }
    }

    fn uptime_ms(&mut self) -> u64 {
        ticks_to_ms(self.ticks())
    }

    fn sleep_ms(&mut self, ms: u64) {
        // The wake-up tick may come right after the first read, so wait for
        // one extra.
        let deadline = self.uptime_ms() + ms + ticks_to_ms(1);
        while self.uptime_ms() < deadline {
            unsafe { x86::halt() };
        }
    }

    fn root_pointer(&mut self) -> Option<u64> {
        unsafe { acpi::rsdp::find(0) }.ok().map(|rsdp| rsdp as u64)
    }

    fn console(&mut self) -> &mut dyn fmt::Write {
        &mut self.console
    }
}
