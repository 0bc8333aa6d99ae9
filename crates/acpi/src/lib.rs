//! Minimal ACPI firmware structures for an OS services layer.
//!
//! Only the structures a boot-time services layer touches directly live
//! here: the Root System Description Pointer and the generic System
//! Description Table header. Everything else (table parsing, AML, the
//! namespace) belongs to the ACPI interpreter.
//!
//! The implementation is based on ACPI v6.4, as described [here](https://uefi.org/htmlspecs/ACPI_Spec_6_4_html/index.html).
//!
//! As with the rest of the boot environment, the caller is responsible for
//! making sure firmware memory is reachable at its physical address (the
//! address space is identity mapped, there is no remapping).

#![no_std]

use core::{fmt, result};

pub mod rsdp;
pub mod sdt;

pub type Result<T> = result::Result<T, AcpiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcpiError {
    InvalidSignature,
    ChecksumFailed,
    NotFound,
}

impl fmt::Display for AcpiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcpiError::InvalidSignature => f.write_str("invalid signature"),
            AcpiError::ChecksumFailed => f.write_str("checksum failed"),
            AcpiError::NotFound => f.write_str("not found"),
        }
    }
}

/// Sum all bytes, wrapping. A valid ACPI structure sums to zero.
#[inline]
pub(crate) fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}
