//! Deferred work queue.
//!
//! The interpreter hands work it wants executed "asynchronously" to the
//! services layer. There is no scheduler here, so requests are collected in
//! submission order and run to completion when the host drains the queue
//! after returning from an interpreter entry point.

use alloc::collections::VecDeque;
use core::{ffi::c_void, fmt};

use log::info;

use crate::{OslError, Result};

/// Callback for deferred work. Receives the context passed at submission.
pub type Callback = extern "C" fn(context: *mut c_void);

/// Categories of deferred work the interpreter may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExecuteType {
    GlobalLockHandler = 0,
    NotifyHandler = 1,
    GpeHandler = 2,
    DebuggerThread = 3,
    EcPollHandler = 4,
    EcBurstHandler = 5,
}

impl TryFrom<u32> for ExecuteType {
    type Error = OslError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(ExecuteType::GlobalLockHandler),
            1 => Ok(ExecuteType::NotifyHandler),
            2 => Ok(ExecuteType::GpeHandler),
            3 => Ok(ExecuteType::DebuggerThread),
            4 => Ok(ExecuteType::EcPollHandler),
            5 => Ok(ExecuteType::EcBurstHandler),
            _ => Err(OslError::InvalidParameter),
        }
    }
}

/// A pending request, owned by the queue until drained.
pub struct WorkItem {
    kind: ExecuteType,
    callback: Callback,
    context: *mut c_void,
}

// There is a single thread of control; the context pointer never crosses
// to another one.
unsafe impl Send for WorkItem {}

impl WorkItem {
    #[inline]
    pub fn kind(&self) -> ExecuteType {
        self.kind
    }

    /// Invoke the callback. Consumes the item so it runs at most once.
    #[inline]
    pub fn run(self) {
        (self.callback)(self.context)
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("kind", &self.kind)
            .field("callback", &(self.callback as usize as *const ()))
            .field("context", &self.context)
            .finish()
    }
}

/// Strict FIFO of deferred work.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append a request to the tail of the queue.
    ///
    /// Never blocks. A missing callback is an invalid parameter; failing to
    /// grow the queue is reported as out of memory.
    pub fn submit(
        &mut self,
        kind: ExecuteType,
        callback: Option<Callback>,
        context: *mut c_void,
    ) -> Result<()> {
        let callback = callback.ok_or(OslError::InvalidParameter)?;

        self.items
            .try_reserve(1)
            .map_err(|_| OslError::NoMemory)?;
        self.items.push_back(WorkItem {
            kind,
            callback,
            context,
        });
        Ok(())
    }

    /// Remove the item at the head of the queue.
    #[inline]
    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    /// Empty the queue, returning the number of items processed.
    ///
    /// Callbacks run in submission order unless `discard` is set, in which
    /// case items are released without ever being invoked.
    pub fn drain(&mut self, discard: bool) -> usize {
        let mut count = 0;
        while let Some(item) = self.pop() {
            if !discard {
                item.run();
            }
            count += 1;
        }

        info!(
            "{} {} deferred work item(s)",
            if discard { "Deallocated" } else { "Processed" },
            count
        );
        count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
