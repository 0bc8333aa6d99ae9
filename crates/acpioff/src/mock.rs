//! Test doubles for the platform and the interpreter.

extern crate std;

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};
use core::{cell::Cell, ffi::c_void, fmt, ptr};
use std::sync::{Arc, Mutex};

use crate::{
    driver::Step,
    interpreter::{InitFlags, Interpreter, NodeHandle, SleepState},
    io::{PciAddress, PciConfigMode},
    memory::Width,
    options::{DebugLayer, DebugLevel},
    sync::Token,
    work::ExecuteType,
    OsServices, Platform, Status,
};

/// A cloneable output destination whose contents can be inspected after
/// it was handed over.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<String>>);

impl Capture {
    pub fn text(&self) -> String {
        self.0.lock().unwrap().clone()
    }
}

impl fmt::Write for Capture {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.lock().unwrap().push_str(s);
        Ok(())
    }
}

pub struct MockPlatform {
    ports: BTreeMap<u16, u32>,
    port_writes: Vec<(u16, u32, Width)>,
    memory: BTreeMap<u64, u8>,
    memory_writes: Vec<(u64, u32, Width)>,
    pci_mode: PciConfigMode,
    pci: BTreeMap<(u8, u8, u8, u8), u8>,
    now: u64,
    step: u64,
    wrap: Option<u64>,
    clock_reads: usize,
    slept: u64,
    root_pointer: Option<u64>,
    console: String,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            ports: BTreeMap::new(),
            port_writes: Vec::new(),
            memory: BTreeMap::new(),
            memory_writes: Vec::new(),
            pci_mode: PciConfigMode::Type1,
            pci: BTreeMap::new(),
            now: 0,
            step: 1,
            wrap: None,
            clock_reads: 0,
            slept: 0,
            root_pointer: None,
            console: String::new(),
        }
    }

    pub fn without_pci() -> Self {
        Self {
            pci_mode: PciConfigMode::None,
            ..Self::new()
        }
    }

    pub fn set_port(&mut self, port: u16, value: u32) {
        self.ports.insert(port, value);
    }

    pub fn port_writes(&self) -> Vec<(u16, u32, Width)> {
        self.port_writes.clone()
    }

    pub fn memory_writes(&self) -> Vec<(u64, u32, Width)> {
        self.memory_writes.clone()
    }

    /// Store a dword at `address`.
    pub fn set_pci(&mut self, address: PciAddress, value: u32) {
        self.store_pci(address, value, Width::Dword);
    }

    /// Every clock read returns the current time, then moves it on by `step`.
    pub fn set_clock(&mut self, start: u64, step: u64) {
        self.now = start;
        self.step = step;
    }

    /// Make the clock restart from zero every `period` ms.
    pub fn wrap_clock_at(&mut self, period: u64) {
        self.wrap = Some(period);
    }

    pub fn clock_reads(&self) -> usize {
        self.clock_reads
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn slept(&self) -> u64 {
        self.slept
    }

    pub fn set_root_pointer(&mut self, address: u64) {
        self.root_pointer = Some(address);
    }

    pub fn console_text(&self) -> &str {
        &self.console
    }

    fn bytes(width: Width) -> u8 {
        (width.bits() / 8) as u8
    }

    fn store_pci(&mut self, address: PciAddress, value: u32, width: Width) {
        for i in 0..Self::bytes(width) {
            let register = address.register.wrapping_add(i);
            let byte = (value >> (8 * i)) as u8;
            self.pci
                .insert((address.bus, address.device, address.function, register), byte);
        }
    }
}

impl Platform for MockPlatform {
    fn read_port(&mut self, port: u16, width: Width) -> u32 {
        // Nothing behind an unset port drives the bus.
        width.mask(self.ports.get(&port).copied().unwrap_or(u32::MAX))
    }

    fn write_port(&mut self, port: u16, value: u32, width: Width) {
        self.port_writes.push((port, value, width));
        self.ports.insert(port, value);
    }

    unsafe fn read_memory(&mut self, address: u64, width: Width) -> u32 {
        (0..u64::from(Self::bytes(width))).fold(0, |value, i| {
            let byte = self.memory.get(&(address + i)).copied().unwrap_or(0);
            value | u32::from(byte) << (8 * i)
        })
    }

    unsafe fn write_memory(&mut self, address: u64, value: u32, width: Width) {
        self.memory_writes.push((address, value, width));
        for i in 0..u64::from(Self::bytes(width)) {
            self.memory.insert(address + i, (value >> (8 * i)) as u8);
        }
    }

    fn detect_pci(&mut self) -> PciConfigMode {
        self.pci_mode
    }

    fn read_pci(&mut self, _mode: PciConfigMode, address: PciAddress, width: Width) -> u32 {
        (0..Self::bytes(width)).fold(0, |value, i| {
            let register = address.register.wrapping_add(i);
            let byte = self
                .pci
                .get(&(address.bus, address.device, address.function, register))
                .copied()
                .unwrap_or(0xff);
            value | u32::from(byte) << (8 * u32::from(i))
        })
    }

    fn write_pci(&mut self, _mode: PciConfigMode, address: PciAddress, value: u32, width: Width) {
        self.store_pci(address, value, width);
    }

    fn uptime_ms(&mut self) -> u64 {
        self.clock_reads += 1;
        let now = self.now;
        self.now += self.step;
        if let Some(period) = self.wrap {
            self.now %= period;
        }
        now
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.slept += ms;
        self.now += ms;
    }

    fn root_pointer(&mut self) -> Option<u64> {
        self.root_pointer
    }

    fn console(&mut self) -> &mut dyn fmt::Write {
        &mut self.console
    }
}

/// SCI line the scripted firmware declares.
pub const MOCK_SCI: u32 = 9;

/// PM1a control block the scripted firmware declares.
pub const MOCK_PM1A_CONTROL: u16 = 0x404;

extern "C" fn count(context: *mut c_void) {
    let ran = unsafe { &*(context as *const Cell<usize>) };
    ran.set(ran.get() + 1);
}

extern "C" fn sci_handler(_context: *mut c_void) -> u32 {
    0
}

/// An interpreter that walks through the motions against a real services
/// layer, with an optional scripted failure.
pub struct MockInterpreter {
    failure: Option<(Step, Status)>,
    calls: Vec<&'static str>,
    ran_at_entry: Vec<usize>,
    ran: alloc::boxed::Box<Cell<usize>>,
    tables: bool,
    loaded: bool,
    sci_installed: bool,
    mutex: Option<Token>,
    namespace: Vec<(Option<usize>, &'static str)>,
    debug: Option<(DebugLevel, DebugLayer)>,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self {
            failure: None,
            calls: Vec::new(),
            ran_at_entry: Vec::new(),
            ran: alloc::boxed::Box::new(Cell::new(0)),
            tables: false,
            loaded: false,
            sci_installed: false,
            mutex: None,
            namespace: alloc::vec![
                (None, "\\"),
                (Some(0), "\\_GPE"),
                (Some(0), "\\_PR_"),
                (Some(0), "\\_SB_"),
                (Some(0), "\\_SI_"),
                (Some(2), "\\_PR_.CPU0"),
                (Some(3), "\\_SB_.PCI0"),
                (Some(6), "\\_SB_.PCI0.ISA_"),
                (Some(0), "\\_S5_"),
            ],
            debug: None,
        }
    }

    /// Fail `step` with `status`.
    pub fn failing(step: Step, status: Status) -> Self {
        Self {
            failure: Some((step, status)),
            ..Self::new()
        }
    }

    /// Entry points called so far, in order.
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    /// How many deferred work items had run by the time each entry point
    /// was called.
    pub fn ran_at_entry(&self) -> &[usize] {
        &self.ran_at_entry
    }

    /// Deferred work items run so far.
    pub fn ran(&self) -> usize {
        self.ran.get()
    }

    pub fn debug(&self) -> Option<(DebugLevel, DebugLayer)> {
        self.debug
    }

    fn enter(&mut self, name: &'static str, step: Option<Step>) -> Result<(), Status> {
        self.calls.push(name);
        self.ran_at_entry.push(self.ran.get());
        match self.failure {
            Some((failing, status)) if Some(failing) == step => Err(status),
            _ => Ok(()),
        }
    }

    fn defer(&self, os: &mut dyn OsServices, kind: ExecuteType) -> Result<(), Status> {
        let context = &*self.ran as *const Cell<usize> as *mut c_void;
        os.execute(kind as u32, Some(count), context)?;
        Ok(())
    }
}

impl Interpreter for MockInterpreter {
    fn initialize_subsystem(&mut self, os: &mut dyn OsServices) -> Result<(), Status> {
        self.enter("initialize_subsystem", Some(Step::InitializeSubsystem))?;
        os.initialize()?;
        self.mutex = Some(os.create_mutex()?);
        Ok(())
    }

    fn initialize_tables(
        &mut self,
        os: &mut dyn OsServices,
        _max_tables: u32,
        _allow_resize: bool,
    ) -> Result<(), Status> {
        self.enter("initialize_tables", Some(Step::InitializeTables))?;
        os.root_pointer().ok_or(Status::AE_NOT_FOUND)?;
        self.tables = true;
        Ok(())
    }

    fn load_tables(&mut self, os: &mut dyn OsServices) -> Result<(), Status> {
        self.enter("load_tables", Some(Step::LoadTables))?;
        let mutex = self.mutex.ok_or(Status::AE_NOT_EXIST)?;
        os.acquire_mutex(mutex, crate::sync::WAIT_FOREVER)?;
        self.loaded = true;
        os.release_mutex(mutex)?;
        Ok(())
    }

    fn enable_subsystem(&mut self, os: &mut dyn OsServices, _flags: InitFlags) -> Result<(), Status> {
        self.enter("enable_subsystem", Some(Step::EnableSubsystem))?;
        os.install_interrupt_handler(MOCK_SCI, Some(sci_handler), ptr::null_mut())?;
        self.sci_installed = true;
        self.defer(os, ExecuteType::GlobalLockHandler)?;
        self.defer(os, ExecuteType::GpeHandler)
    }

    fn initialize_objects(&mut self, os: &mut dyn OsServices, _flags: InitFlags) -> Result<(), Status> {
        self.enter("initialize_objects", Some(Step::InitializeObjects))?;
        self.defer(os, ExecuteType::NotifyHandler)
    }

    fn enter_sleep_state_prep(&mut self, os: &mut dyn OsServices, _state: SleepState) -> Result<(), Status> {
        self.enter("enter_sleep_state_prep", Some(Step::EnterSleepStatePrep))?;
        self.defer(os, ExecuteType::NotifyHandler)
    }

    fn enter_sleep_state(&mut self, os: &mut dyn OsServices, state: SleepState) -> Result<(), Status> {
        self.enter("enter_sleep_state", Some(Step::EnterSleepState))?;
        // SLP_TYP for the state, then SLP_EN.
        let control = (state as u32) << 10 | 1 << 13;
        os.write_port(MOCK_PM1A_CONTROL, control, 16)?;
        Ok(())
    }

    fn terminate(&mut self, os: &mut dyn OsServices) -> Result<(), Status> {
        self.enter("terminate", None)?;
        // Left behind on purpose: shutdown must drop it unrun.
        self.defer(os, ExecuteType::NotifyHandler)?;
        if self.sci_installed {
            os.remove_interrupt_handler(MOCK_SCI, Some(sci_handler))?;
            self.sci_installed = false;
        }
        if let Some(mutex) = self.mutex.take() {
            os.delete_mutex(mutex)?;
        }
        self.tables = false;
        self.loaded = false;
        os.terminate()?;
        Ok(())
    }

    fn sci_interrupt(&self) -> Option<u32> {
        self.tables.then_some(MOCK_SCI)
    }

    fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    fn next_child(
        &mut self,
        _os: &mut dyn OsServices,
        parent: NodeHandle,
        previous: Option<NodeHandle>,
    ) -> Result<Option<NodeHandle>, Status> {
        if !self.loaded {
            return Ok(None);
        }
        let start = previous.map_or(0, |node| node.0 + 1);
        Ok(self
            .namespace
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, (owner, _))| *owner == Some(parent.0))
            .map(|(index, _)| NodeHandle(index)))
    }

    fn full_path(&mut self, _os: &mut dyn OsServices, node: NodeHandle) -> Result<String, Status> {
        self.namespace
            .get(node.0)
            .map(|(_, path)| path.to_string())
            .ok_or(Status::AE_BAD_PARAMETER)
    }

    fn set_debug(&mut self, level: DebugLevel, layers: DebugLayer) {
        self.debug = Some((level, layers));
    }
}
