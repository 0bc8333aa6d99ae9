//! Physical <-> logical address translation.
//!
//! The boot environment runs without paging on flat 4G segments, so the
//! mapping is the identity. The only thing to police is that nothing
//! reaches past the 32-bit span the flat mapping covers.

use core::ptr::NonNull;

use crate::{OslError, Result};

/// Last address covered by the flat mapping.
pub const SPAN_LIMIT: u64 = 0xffff_ffff;

/// Access width of a memory, port or PCI configuration access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Width {
    Byte = 8,
    Word = 16,
    Dword = 32,
}

impl Width {
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Truncate `value` to this width.
    #[inline]
    pub const fn mask(self, value: u32) -> u32 {
        match self {
            Width::Byte => value & 0xff,
            Width::Word => value & 0xffff,
            Width::Dword => value,
        }
    }
}

impl TryFrom<u32> for Width {
    type Error = OslError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(Width::Byte),
            16 => Ok(Width::Word),
            32 => Ok(Width::Dword),
            _ => Err(OslError::InvalidParameter),
        }
    }
}

/// Map `length` bytes at `physical`.
///
/// Returns `None` when the range leaves the 32-bit span (or starts at zero).
pub fn map(physical: u64, length: usize) -> Option<NonNull<u8>> {
    let end = physical.checked_add(length as u64)?;
    if end > SPAN_LIMIT {
        return None;
    }
    NonNull::new(physical as usize as *mut u8)
}

/// Translate a logical address back to its physical address.
pub fn translate(logical: *const u8) -> Result<u64> {
    if logical.is_null() {
        return Err(OslError::InvalidParameter);
    }

    let address = logical as usize as u64;
    if address > SPAN_LIMIT {
        return Err(OslError::Limit);
    }
    Ok(address)
}

/// Validate the arguments of a memory access.
pub fn check_access(address: u64, width: u32) -> Result<Width> {
    if address == 0 {
        return Err(OslError::InvalidParameter);
    }
    Width::try_from(width)
}
