use core::{mem, result, str};

use crate::{checksum, AcpiError, Result};

/// Generic System Description Table Header.
///
/// All system description tables begin with this header.
/// See ACPI v6.4 section 5.2.6
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct SdtHeader {
    pub signature: [u8; 4],
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oemid: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: u32,
    pub creator_revision: u32,
}

impl SdtHeader {
    /// Interpret the start of `bytes` as a table and validate it.
    ///
    /// The buffer must hold the complete table (`length` bytes), all of
    /// which take part in the checksum.
    pub fn from_bytes(bytes: &[u8]) -> Result<&SdtHeader> {
        if bytes.len() < mem::size_of::<SdtHeader>() {
            return Err(AcpiError::InvalidSignature);
        }

        // Packed, so alignment is 1 and any byte offset is fine.
        let header = unsafe { &*(bytes.as_ptr() as *const SdtHeader) };
        let length = header.length as usize;
        if length < mem::size_of::<SdtHeader>() || length > bytes.len() {
            return Err(AcpiError::InvalidSignature);
        }

        if checksum(&bytes[..length]) == 0 {
            Ok(header)
        } else {
            Err(AcpiError::ChecksumFailed)
        }
    }

    /// Validate the header in place.
    ///
    /// # Safety
    /// All the bytes in the header (+ `length - size_of::<SdtHeader>()`) are summed,
    /// so the whole table must be readable.
    pub unsafe fn validate(&self) -> Result<()> {
        let bytes =
            core::slice::from_raw_parts(self as *const SdtHeader as *const u8, self.length as usize);
        if checksum(bytes) == 0 {
            Ok(())
        } else {
            Err(AcpiError::ChecksumFailed)
        }
    }

    pub fn signature(&self) -> result::Result<&str, str::Utf8Error> {
        str::from_utf8(&self.signature)
    }

    pub fn oemid(&self) -> result::Result<&str, str::Utf8Error> {
        str::from_utf8(&self.oemid)
    }

    pub fn oem_table_id(&self) -> result::Result<&str, str::Utf8Error> {
        str::from_utf8(&self.oem_table_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(signature: &[u8; 4], body: &[u8]) -> [u8; 64] {
        let mut raw = [0u8; 64];
        let length = (mem::size_of::<SdtHeader>() + body.len()) as u32;
        raw[0..4].copy_from_slice(signature);
        raw[4..8].copy_from_slice(&length.to_le_bytes());
        raw[8] = 1;
        raw[10..16].copy_from_slice(b"BOCHS ");
        raw[36..36 + body.len()].copy_from_slice(body);
        raw[9] = 0u8.wrapping_sub(checksum(&raw[..length as usize]));
        raw
    }

    #[test]
    fn accepts_checksummed_table() {
        let raw = table(b"SSDT", &[1, 2, 3, 4]);
        let header = SdtHeader::from_bytes(&raw).unwrap();
        assert_eq!(header.signature(), Ok("SSDT"));
        assert_eq!(header.oemid(), Ok("BOCHS "));
        assert_eq!({ header.length }, 40);
        assert_eq!(unsafe { header.validate() }, Ok(()));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut raw = table(b"SSDT", &[1, 2, 3, 4]);
        raw[37] ^= 0xff;
        assert_eq!(
            SdtHeader::from_bytes(&raw).unwrap_err(),
            AcpiError::ChecksumFailed
        );
    }

    #[test]
    fn rejects_truncated_table() {
        let raw = table(b"DSDT", &[0; 8]);
        assert_eq!(
            SdtHeader::from_bytes(&raw[..40]).unwrap_err(),
            AcpiError::InvalidSignature
        );
        assert!(SdtHeader::from_bytes(&raw[..12]).is_err());
    }
}
