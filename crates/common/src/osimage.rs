//! Header of a structured OS image (`EMUTOSK5.SYS`).
//!
//! The image declares its own load region and entry point; the loader
//! validates the header before committing to the copy. All fields are
//! big-endian, the 68000's native order.

use core::fmt;

/// Fixed header length; the magic identifier sits in the last four bytes.
pub const HEADER_SIZE: usize = 48;

/// ASCII identifier at offset 44.
pub const MAGIC: [u8; 4] = *b"ETOS";

/// Images may not load below this offset (monitor work area).
pub const REGION_FLOOR: u32 = 0x800;
/// Images must fit entirely below the first megabyte.
pub const REGION_CEILING: u32 = 0x0010_0000;

/// Smallest plausible image file.
pub const MIN_IMAGE_SIZE: u32 = 64 * 1024;
/// Largest supported image file.
pub const MAX_IMAGE_SIZE: u32 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// Trailing identifier is not `ETOS`.
    BadMagic,
    /// Load region is unordered or outside the physical window.
    BadRegion { begin: u32, end: u32 },
    /// Entry point falls outside `[begin, end)`.
    EntryOutOfRange { entry: u32 },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HeaderError::BadMagic => f.write_str("missing ETOS identifier"),
            HeaderError::BadRegion { begin, end } => {
                write!(f, "bad load region {begin:#x}..{end:#x}")
            }
            HeaderError::EntryOutOfRange { entry } => {
                write!(f, "entry point {entry:#x} outside the load region")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HeaderError {}

/// A validated image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsImageHeader {
    pub version: u16,
    /// Address control transfers to once the image is in place.
    pub entry: u32,
    /// Start of the load region; the file is copied here verbatim.
    pub region_begin: u32,
    /// Exclusive end of the load region.
    pub region_end: u32,
}

impl OsImageHeader {
    /// Parses and validates the fixed-layout header.
    ///
    /// Bounds are inclusive at the low end and exclusive at the high end:
    /// `entry == region_begin` is legal, `entry == region_end` is not.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self, HeaderError> {
        if bytes[44..48] != MAGIC {
            return Err(HeaderError::BadMagic);
        }

        let version = u16::from_be_bytes([bytes[2], bytes[3]]);
        let entry = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let begin = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let end = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

        if begin < REGION_FLOOR || begin > end || end >= REGION_CEILING {
            return Err(HeaderError::BadRegion { begin, end });
        }
        if entry < begin || entry >= end {
            return Err(HeaderError::EntryOutOfRange { entry });
        }

        Ok(OsImageHeader {
            version,
            entry,
            region_begin: begin,
            region_end: end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(entry: u32, begin: u32, end: u32) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..2].copy_from_slice(&0x601Eu16.to_be_bytes());
        bytes[2..4].copy_from_slice(&0x0206u16.to_be_bytes());
        bytes[4..8].copy_from_slice(&entry.to_be_bytes());
        bytes[8..12].copy_from_slice(&begin.to_be_bytes());
        bytes[12..16].copy_from_slice(&end.to_be_bytes());
        bytes[44..48].copy_from_slice(&MAGIC);
        bytes
    }

    #[test]
    fn accepts_well_formed_header() {
        let parsed = OsImageHeader::parse(&header(0x1000, 0x800, 0xF0000)).unwrap();
        assert_eq!(parsed.version, 0x0206);
        assert_eq!(parsed.entry, 0x1000);
        assert_eq!(parsed.region_begin, 0x800);
        assert_eq!(parsed.region_end, 0xF0000);
    }

    #[test]
    fn rejects_missing_magic() {
        let mut bytes = header(0x1000, 0x800, 0xF0000);
        bytes[44] = b'X';
        assert_eq!(OsImageHeader::parse(&bytes), Err(HeaderError::BadMagic));
    }

    #[test]
    fn rejects_inverted_region() {
        assert!(matches!(
            OsImageHeader::parse(&header(0x1000, 0xF0000, 0x800)),
            Err(HeaderError::BadRegion { .. })
        ));
    }

    #[test]
    fn rejects_region_below_floor() {
        assert!(matches!(
            OsImageHeader::parse(&header(0x400, 0x400, 0xF0000)),
            Err(HeaderError::BadRegion { .. })
        ));
    }

    #[test]
    fn rejects_region_at_ceiling() {
        assert!(matches!(
            OsImageHeader::parse(&header(0x1000, 0x800, REGION_CEILING)),
            Err(HeaderError::BadRegion { .. })
        ));
    }

    #[test]
    fn entry_bounds_are_half_open() {
        // Inclusive at the low end.
        assert!(OsImageHeader::parse(&header(0x800, 0x800, 0xF0000)).is_ok());
        // Exclusive at the high end.
        assert_eq!(
            OsImageHeader::parse(&header(0xF0000, 0x800, 0xF0000)),
            Err(HeaderError::EntryOutOfRange { entry: 0xF0000 })
        );
        assert_eq!(
            OsImageHeader::parse(&header(0x7FF, 0x800, 0xF0000)),
            Err(HeaderError::EntryOutOfRange { entry: 0x7FF })
        );
    }
}
