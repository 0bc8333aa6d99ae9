//! The OS services contract expected by the ACPI interpreter, and its
//! implementation for a single-threaded, MMU-less boot environment.
//!
//! Grouped like chapter 9 of the ACPICA programmer reference: environment
//! and tables, memory, scheduling, synchronisation, interrupts, memory and
//! port I/O, PCI configuration space, formatted output and miscellaneous.

use core::{ffi::c_void, fmt, ptr::NonNull};

use acpi::sdt::SdtHeader;
use log::{debug, error, info, warn};

use crate::{
    io::{self, PciConfigMode, PciId},
    irq::{InterruptHandler, IrqSlot},
    memory,
    output::{Destination, OutputSink},
    sync::{CpuFlags, ResourceKind, Token, TokenRegistry},
    work::{Callback, ExecuteType, WorkQueue},
    OslError, Platform, Result,
};

/// The one and only thread.
pub const THREAD_ID: u64 = 0xc0b3_2ac9_1051;

/// Timer ticks (100 ns) per millisecond.
pub const TICKS_PER_MS: u64 = 10_000;

/// Arguments of the AML `Fatal` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatalInfo {
    pub kind: u32,
    pub code: u32,
    pub argument: u32,
}

/// A signal raised by AML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal<'a> {
    Fatal(Option<FatalInfo>),
    Breakpoint(&'a str),
    Unknown(u32),
}

/// Services the interpreter calls back into.
pub trait OsServices {
    fn initialize(&mut self) -> Result<()>;
    fn terminate(&mut self) -> Result<()>;

    /// Physical address of the RSDP.
    fn root_pointer(&mut self) -> Option<u64>;
    /// Replacement value for a predefined object.
    fn predefined_override(&mut self, name: &str) -> Result<Option<&'static str>>;
    /// Replacement for a firmware table.
    fn table_override(&mut self, existing: &SdtHeader) -> Result<Option<NonNull<SdtHeader>>>;

    /// Object cache creation.
    fn create_cache(&mut self, name: &str, object_size: u16, max_depth: u16) -> Result<NonNull<c_void>>;
    fn map_memory(&mut self, physical: u64, length: usize) -> Option<NonNull<u8>>;
    fn unmap_memory(&mut self, logical: NonNull<u8>, length: usize);
    fn physical_address(&mut self, logical: *const u8) -> Result<u64>;
    fn readable(&mut self, pointer: *const u8, length: usize) -> bool;
    fn writable(&mut self, pointer: *mut u8, length: usize) -> bool;

    fn thread_id(&mut self) -> u64;
    /// Queue `callback` to run outside of the interpreter's call stack.
    fn execute(&mut self, kind: u32, callback: Option<Callback>, context: *mut c_void) -> Result<()>;
    fn wait_events_complete(&mut self);
    fn sleep(&mut self, ms: u64);
    fn stall(&mut self, us: u32);

    fn create_mutex(&mut self) -> Result<Token>;
    fn delete_mutex(&mut self, token: Token) -> Result<()>;
    fn acquire_mutex(&mut self, token: Token, timeout: u16) -> Result<()>;
    fn release_mutex(&mut self, token: Token) -> Result<()>;
    fn create_semaphore(&mut self, max_units: u32, initial_units: u32) -> Result<Token>;
    fn delete_semaphore(&mut self, token: Token) -> Result<()>;
    fn wait_semaphore(&mut self, token: Token, units: u32, timeout: u16) -> Result<()>;
    fn signal_semaphore(&mut self, token: Token, units: u32) -> Result<()>;
    fn create_lock(&mut self) -> Result<Token>;
    fn delete_lock(&mut self, token: Token) -> Result<()>;
    fn acquire_lock(&mut self, token: Token) -> Result<CpuFlags>;
    fn release_lock(&mut self, token: Token, flags: CpuFlags) -> Result<()>;

    fn install_interrupt_handler(
        &mut self,
        irq: u32,
        handler: Option<InterruptHandler>,
        context: *mut c_void,
    ) -> Result<()>;
    fn remove_interrupt_handler(&mut self, irq: u32, handler: Option<InterruptHandler>) -> Result<()>;

    /// # Safety
    /// `address` must be readable physical memory.
    unsafe fn read_memory(&mut self, address: u64, width: u32) -> Result<u32>;
    /// # Safety
    /// `address` must be writable physical memory.
    unsafe fn write_memory(&mut self, address: u64, value: u32, width: u32) -> Result<()>;
    fn read_port(&mut self, port: u16, width: u32) -> Result<u32>;
    fn write_port(&mut self, port: u16, value: u32, width: u32) -> Result<()>;

    fn read_pci_configuration(&mut self, id: &PciId, register: u32, width: u32) -> Result<u64>;
    fn write_pci_configuration(&mut self, id: &PciId, register: u32, value: u64, width: u32) -> Result<()>;

    fn printf(&mut self, args: fmt::Arguments<'_>);
    fn redirect_output(&mut self, destination: Option<Destination>);

    /// Monotonic time in 100 ns ticks.
    fn timer(&mut self) -> u64;
    fn signal(&mut self, signal: Signal<'_>) -> Result<()>;
    fn get_line(&mut self, buffer: &mut [u8]) -> Result<usize>;
}

/// All process-wide state of the services layer, owned in one place.
#[derive(Debug)]
pub struct Osl<P> {
    platform: P,
    work: WorkQueue,
    tokens: TokenRegistry,
    irq: IrqSlot,
    pci: PciConfigMode,
    output: OutputSink,
}

impl<P: Platform> Osl<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            work: WorkQueue::new(),
            tokens: TokenRegistry::new(),
            irq: IrqSlot::new(),
            pci: PciConfigMode::None,
            output: OutputSink::new(),
        }
    }

    #[inline]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    #[inline]
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Run (or with `discard`, drop) everything the interpreter deferred.
    ///
    /// Must be called after every interpreter entry point that may have
    /// scheduled work.
    pub fn process_deferred_work(&mut self, discard: bool) -> usize {
        self.work.drain(discard)
    }

    #[inline]
    pub fn pending_work(&self) -> usize {
        self.work.len()
    }

    /// Tell the layer which line the firmware uses for the SCI.
    pub fn set_sci_interrupt(&mut self, sci: Option<u32>) {
        self.irq.set_sci(sci);
    }

    #[inline]
    pub fn irq(&self) -> &IrqSlot {
        &self.irq
    }

    #[inline]
    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    #[inline]
    pub fn pci_mode(&self) -> PciConfigMode {
        self.pci
    }

    #[inline]
    pub fn output_redirected(&self) -> bool {
        self.output.is_redirected()
    }

    fn reset(&mut self) {
        // Nothing queued means an earlier reset already discarded it.
        if !self.work.is_empty() {
            self.work.drain(true);
        }
        self.tokens.reset();
        self.irq.clear();
        self.pci = PciConfigMode::None;
        self.output.reset();
    }
}

impl<P: Platform> OsServices for Osl<P> {
    fn initialize(&mut self) -> Result<()> {
        self.reset();
        self.pci = self.platform.detect_pci();
        debug!("osl: initialized, pci mode {:?}", self.pci);
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        self.reset();
        debug!("osl: terminated");
        Ok(())
    }

    fn root_pointer(&mut self) -> Option<u64> {
        match self.platform.root_pointer() {
            Some(rsdp) => {
                info!("RSDP found at physical addr {:#010x}", rsdp);
                Some(rsdp)
            }
            None => {
                error!("Unable to find RSDP in either Extended BIOS Data Area or BIOS ROM");
                None
            }
        }
    }

    fn predefined_override(&mut self, _name: &str) -> Result<Option<&'static str>> {
        Ok(None)
    }

    fn table_override(&mut self, _existing: &SdtHeader) -> Result<Option<NonNull<SdtHeader>>> {
        Ok(None)
    }

    fn create_cache(&mut self, _name: &str, _object_size: u16, _max_depth: u16) -> Result<NonNull<c_void>> {
        // The interpreter falls back on its own object cache.
        Err(OslError::NoMemory)
    }

    fn map_memory(&mut self, physical: u64, length: usize) -> Option<NonNull<u8>> {
        memory::map(physical, length)
    }

    fn unmap_memory(&mut self, _logical: NonNull<u8>, _length: usize) {}

    fn physical_address(&mut self, logical: *const u8) -> Result<u64> {
        memory::translate(logical)
    }

    fn readable(&mut self, _pointer: *const u8, _length: usize) -> bool {
        true
    }

    fn writable(&mut self, _pointer: *mut u8, _length: usize) -> bool {
        true
    }

    fn thread_id(&mut self) -> u64 {
        THREAD_ID
    }

    fn execute(&mut self, kind: u32, callback: Option<Callback>, context: *mut c_void) -> Result<()> {
        let kind = ExecuteType::try_from(kind)?;
        self.work.submit(kind, callback, context)
    }

    fn wait_events_complete(&mut self) {}

    fn sleep(&mut self, ms: u64) {
        self.platform.sleep_ms(ms);
    }

    fn stall(&mut self, us: u32) {
        // The clock is far coarser than a microsecond, so whole
        // milliseconds are all that can be waited for. Only forward steps
        // count, so a clock that jumps back cannot stretch the wait.
        let ms = u64::from(us / 1000);
        let mut last = self.platform.uptime_ms();
        let mut waited = 0;
        while waited < ms {
            core::hint::spin_loop();
            let now = self.platform.uptime_ms();
            waited += now.saturating_sub(last);
            last = now;
        }
    }

    fn create_mutex(&mut self) -> Result<Token> {
        Ok(self.tokens.create(ResourceKind::Mutex))
    }

    fn delete_mutex(&mut self, token: Token) -> Result<()> {
        self.tokens.delete(ResourceKind::Mutex, token)
    }

    fn acquire_mutex(&mut self, token: Token, _timeout: u16) -> Result<()> {
        self.tokens.validate(ResourceKind::Mutex, token)
    }

    fn release_mutex(&mut self, token: Token) -> Result<()> {
        self.tokens.validate(ResourceKind::Mutex, token)
    }

    fn create_semaphore(&mut self, max_units: u32, initial_units: u32) -> Result<Token> {
        self.tokens.create_semaphore(max_units, initial_units)
    }

    fn delete_semaphore(&mut self, token: Token) -> Result<()> {
        self.tokens.delete(ResourceKind::Semaphore, token)
    }

    fn wait_semaphore(&mut self, token: Token, _units: u32, _timeout: u16) -> Result<()> {
        self.tokens.validate(ResourceKind::Semaphore, token)
    }

    fn signal_semaphore(&mut self, token: Token, _units: u32) -> Result<()> {
        self.tokens.validate(ResourceKind::Semaphore, token)
    }

    fn create_lock(&mut self) -> Result<Token> {
        Ok(self.tokens.create(ResourceKind::Spinlock))
    }

    fn delete_lock(&mut self, token: Token) -> Result<()> {
        self.tokens.delete(ResourceKind::Spinlock, token)
    }

    fn acquire_lock(&mut self, token: Token) -> Result<CpuFlags> {
        self.tokens.validate(ResourceKind::Spinlock, token)?;
        Ok(CpuFlags::SAVED)
    }

    fn release_lock(&mut self, token: Token, _flags: CpuFlags) -> Result<()> {
        self.tokens.validate(ResourceKind::Spinlock, token)
    }

    fn install_interrupt_handler(
        &mut self,
        irq: u32,
        handler: Option<InterruptHandler>,
        context: *mut c_void,
    ) -> Result<()> {
        self.irq.install(irq, handler, context)
    }

    fn remove_interrupt_handler(&mut self, irq: u32, handler: Option<InterruptHandler>) -> Result<()> {
        self.irq.remove(irq, handler)
    }

    unsafe fn read_memory(&mut self, address: u64, width: u32) -> Result<u32> {
        let width = memory::check_access(address, width)?;
        Ok(self.platform.read_memory(address, width))
    }

    unsafe fn write_memory(&mut self, address: u64, value: u32, width: u32) -> Result<()> {
        let width = memory::check_access(address, width)?;
        self.platform.write_memory(address, width.mask(value), width);
        Ok(())
    }

    fn read_port(&mut self, port: u16, width: u32) -> Result<u32> {
        let width = io::check_port(width)?;
        Ok(self.platform.read_port(port, width))
    }

    fn write_port(&mut self, port: u16, value: u32, width: u32) -> Result<()> {
        let width = io::check_port(width)?;
        self.platform.write_port(port, width.mask(value), width);
        Ok(())
    }

    fn read_pci_configuration(&mut self, id: &PciId, register: u32, width: u32) -> Result<u64> {
        let (address, width) = io::check_pci(self.pci, id, register, width)?;
        Ok(u64::from(self.platform.read_pci(self.pci, address, width)))
    }

    fn write_pci_configuration(&mut self, id: &PciId, register: u32, value: u64, width: u32) -> Result<()> {
        let (address, width) = io::check_pci(self.pci, id, register, width)?;
        self.platform
            .write_pci(self.pci, address, width.mask(value as u32), width);
        Ok(())
    }

    fn printf(&mut self, args: fmt::Arguments<'_>) {
        // Nowhere to report a failing console to.
        let _ = self.output.print(self.platform.console(), args);
    }

    fn redirect_output(&mut self, destination: Option<Destination>) {
        self.output.redirect(destination);
    }

    fn timer(&mut self) -> u64 {
        self.platform.uptime_ms() * TICKS_PER_MS
    }

    fn signal(&mut self, signal: Signal<'_>) -> Result<()> {
        match signal {
            Signal::Fatal(info) => {
                error!("Received AML FATAL opcode signal,");
                if let Some(info) = info {
                    error!(
                        "with type {:#010x}, code {:#010x}, arg {:#010x},",
                        info.kind, info.code, info.argument
                    );
                }
                error!("trying to proceed anyway.");
                Ok(())
            }
            Signal::Breakpoint(message) => {
                warn!(
                    "No ACPI debugger support; ignoring AML BREAKPOINT opcode signal with msg: {}",
                    message
                );
                Ok(())
            }
            Signal::Unknown(_) => Err(OslError::InvalidParameter),
        }
    }

    fn get_line(&mut self, buffer: &mut [u8]) -> Result<usize> {
        // Only a debugger thread would ask, and there is none.
        let first = buffer.first_mut().ok_or(OslError::InvalidParameter)?;
        *first = b'\n';
        Ok(1)
    }
}
