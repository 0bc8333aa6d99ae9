use core::{mem, slice};

use crate::{checksum, AcpiError, Result};

/// Root System Description Pointer.
///
/// The revision number indicates the size. (2 == RsdpV2).
/// See ACPI v6.4 section 5.2.5.3
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct Rsdp {
    pub signature: [u8; 8],
    pub checksum: u8,
    pub oemid: [u8; 6],
    pub revision: u8,
    pub rsdt_address: u32,
}

impl Rsdp {
    pub const SIGNATURE: [u8; 8] = *b"RSD PTR ";

    /// The RSDP is always found on a 16-byte boundary.
    pub const ALIGN: usize = 16;

    /// Validate a candidate pointer at the start of `bytes`.
    ///
    /// The first 20 bytes must checksum to zero. Revision 2 and above also
    /// carry an extended checksum over the full `length`.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Rsdp> {
        if bytes.len() < mem::size_of::<Rsdp>() || bytes[..8] != Self::SIGNATURE {
            return Err(AcpiError::InvalidSignature);
        }

        if checksum(&bytes[..mem::size_of::<Rsdp>()]) != 0 {
            return Err(AcpiError::ChecksumFailed);
        }

        let rsdp = unsafe { &*(bytes.as_ptr() as *const Rsdp) };
        if rsdp.revision >= 2 {
            if bytes.len() < mem::size_of::<RsdpV2>() {
                return Err(AcpiError::InvalidSignature);
            }
            let v2 = unsafe { &*(bytes.as_ptr() as *const RsdpV2) };
            let length = v2.length as usize;
            if length < mem::size_of::<RsdpV2>() || length > bytes.len() {
                return Err(AcpiError::InvalidSignature);
            }
            if checksum(&bytes[..length]) != 0 {
                return Err(AcpiError::ChecksumFailed);
            }
        }

        Ok(rsdp)
    }

    /// Scan a memory region for a valid RSDP, returning its offset.
    pub fn scan(region: &[u8]) -> Option<usize> {
        (0..region.len())
            .step_by(Self::ALIGN)
            .find(|&offset| Self::from_bytes(&region[offset..]).is_ok())
    }
}

/// Root System Description Pointer for version 2.
///
/// See ACPI v6.4 section 5.2.5.3
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct RsdpV2 {
    pub rsdp: Rsdp,
    pub length: u32,
    pub xsdt_address: u64,
    pub extended_checksum: u8,
    pub _reserved: [u8; 3],
}

/// Physical address of the 16-bit EBDA segment pointer in the BIOS data area.
pub const EBDA_POINTER: usize = 0x40e;

/// Only the first KiB of the EBDA is searched.
pub const EBDA_SEARCH_LEN: usize = 0x400;

/// The BIOS read-only memory area searched after the EBDA.
pub const BIOS_AREA_START: usize = 0xe0000;
pub const BIOS_AREA_END: usize = 0x100000;

/// Locate the RSDP on a legacy BIOS machine.
///
/// Searches the first KiB of the Extended BIOS Data Area, then the BIOS
/// read-only area between 0xE0000 and 0xFFFFF. Returns the physical
/// address of the pointer.
///
/// See ACPI v6.4 section 5.2.5.1
///
/// # Safety
/// Low physical memory must be identity mapped at `offset` and readable.
pub unsafe fn find(offset: usize) -> Result<usize> {
    let ebda = ((EBDA_POINTER + offset) as *const u16).read_unaligned() as usize;
    let ebda = ebda << 4;

    // A zero segment means the BIOS does not report an EBDA.
    if ebda != 0 {
        let region = slice::from_raw_parts((ebda + offset) as *const u8, EBDA_SEARCH_LEN);
        if let Some(found) = Rsdp::scan(region) {
            return Ok(ebda + found);
        }
    }

    let region = slice::from_raw_parts(
        (BIOS_AREA_START + offset) as *const u8,
        BIOS_AREA_END - BIOS_AREA_START,
    );
    Rsdp::scan(region)
        .map(|found| BIOS_AREA_START + found)
        .ok_or(AcpiError::NotFound)
}
