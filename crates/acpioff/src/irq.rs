//! Single interrupt slot for the System Control Interrupt.
//!
//! Only bookkeeping happens here. Routing the SCI to the handler needs the
//! cooperation of the surrounding boot environment, which owns the interrupt
//! controllers, so no vector is ever armed.

use core::ffi::c_void;

use crate::{OslError, Result};

/// Interrupt service routine. Returns whether the interrupt was handled.
pub type InterruptHandler = extern "C" fn(context: *mut c_void) -> u32;

#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub irq: u32,
    pub handler: InterruptHandler,
    pub context: *mut c_void,
}

// See `WorkItem`: everything runs on one thread.
unsafe impl Send for Registration {}

#[inline]
fn same_handler(a: InterruptHandler, b: InterruptHandler) -> bool {
    a as usize == b as usize
}

/// Unregistered -> Registered -> Unregistered.
#[derive(Debug, Default)]
pub struct IrqSlot {
    sci: Option<u32>,
    installed: Option<Registration>,
}

impl IrqSlot {
    pub const fn new() -> Self {
        Self {
            sci: None,
            installed: None,
        }
    }

    /// Declare the platform's SCI line. Until this is known every
    /// registration is refused.
    pub fn set_sci(&mut self, sci: Option<u32>) {
        self.sci = sci;
    }

    #[inline]
    pub fn sci(&self) -> Option<u32> {
        self.sci
    }

    fn check_line(&self, irq: u32) -> Result<()> {
        match self.sci {
            Some(sci) if sci == irq => Ok(()),
            _ => Err(OslError::InvalidParameter),
        }
    }

    pub fn install(
        &mut self,
        irq: u32,
        handler: Option<InterruptHandler>,
        context: *mut c_void,
    ) -> Result<()> {
        let handler = handler.ok_or(OslError::InvalidParameter)?;
        self.check_line(irq)?;

        if self.installed.is_some() {
            return Err(OslError::AlreadyExists);
        }

        self.installed = Some(Registration {
            irq,
            handler,
            context,
        });
        Ok(())
    }

    pub fn remove(&mut self, irq: u32, handler: Option<InterruptHandler>) -> Result<()> {
        self.check_line(irq)?;
        let handler = handler.ok_or(OslError::InvalidParameter)?;

        let installed = self.installed.as_ref().ok_or(OslError::NotFound)?;
        if !same_handler(installed.handler, handler) {
            return Err(OslError::InvalidParameter);
        }

        self.installed = None;
        Ok(())
    }

    #[inline]
    pub fn registration(&self) -> Option<&Registration> {
        self.installed.as_ref()
    }

    /// Drop any registration and forget the SCI line.
    pub fn clear(&mut self) {
        self.sci = None;
        self.installed = None;
    }
}
