//! The MONK5 monitor's native executable format.
//!
//! A REX object is a tagged command stream: one entry command naming the
//! address control jumps to, one load command naming where the payload lands
//! and how long it is, then the payload bytes themselves. On storage the
//! stream is cut into fixed-size records, each prefixed with a forward link
//! to the next record so the monitor can walk the chain without a
//! filesystem.

use core::fmt;

/// Tag byte introducing a load command.
pub const LOAD_CMD_TAG: u8 = 0x01;
/// Tag byte introducing an entry command.
pub const ENTRY_CMD_TAG: u8 = 0x16;

/// Entry command: tag plus a 32-bit big-endian target address.
pub const ENTRY_CMD_SIZE: usize = 5;
/// Load command: tag plus a 32-bit destination and a 16-bit length.
pub const LOAD_CMD_SIZE: usize = 7;

/// Where the booter is loaded and entered.
pub const BOOTER_ADDRESS: u32 = 0x0020_0000;

/// Logical record size the monitor reads, on any medium.
pub const RECORD_SIZE: usize = 256;
/// Link (track+sector or big-endian block number) plus sequence index.
pub const RECORD_HEADER_SIZE: usize = 4;
/// Payload bytes carried by one record.
pub const RECORD_DATA_SIZE: usize = RECORD_SIZE - RECORD_HEADER_SIZE;

pub const FLOPPY_TRACKS: u32 = 80;
pub const FLOPPY_SECTORS_PER_TRACK: u32 = 17 * 2 * 2;
pub const FLOPPY_SECTOR_SIZE: u32 = RECORD_SIZE as u32;
/// Exactly this image size selects the floppy install path.
pub const FLOPPY_IMAGE_SIZE: u64 =
    (FLOPPY_TRACKS * FLOPPY_SECTORS_PER_TRACK * FLOPPY_SECTOR_SIZE) as u64;

/// The payload length field in a load command is 16 bits wide.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The payload length does not fit the load command's length field.
    PayloadTooLarge { len: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EncodeError::PayloadTooLarge { len } => {
                write!(f, "payload of {len} bytes exceeds the {MAX_PAYLOAD} byte limit")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Encodes a payload as a REX object.
///
/// The entry command comes first so it never straddles a record boundary;
/// the monitor only interprets commands within a single record.
#[cfg(feature = "alloc")]
pub fn encode(
    payload: &[u8],
    entry_addr: u32,
    load_addr: u32,
) -> Result<alloc::vec::Vec<u8>, EncodeError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(EncodeError::PayloadTooLarge { len: payload.len() });
    }

    let mut out = alloc::vec::Vec::with_capacity(ENTRY_CMD_SIZE + LOAD_CMD_SIZE + payload.len());

    out.push(ENTRY_CMD_TAG);
    out.extend_from_slice(&entry_addr.to_be_bytes());

    out.push(LOAD_CMD_TAG);
    out.extend_from_slice(&load_addr.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());

    out.extend_from_slice(payload);

    Ok(out)
}

/// How many records an encoded object occupies.
pub const fn chain_len(encoded_len: usize) -> u32 {
    (encoded_len.div_ceil(RECORD_DATA_SIZE)) as u32
}

/// One record's worth of an encoded object.
///
/// The link field is left to the caller: its value depends on the target
/// medium's geometry, which the codec knows nothing about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Big-endian sequence index stored in the record header.
    pub index: u16,
    /// At most [`RECORD_DATA_SIZE`] payload bytes.
    pub data: &'a [u8],
    /// Whether this record terminates the chain (null link).
    pub last: bool,
}

/// Cuts an encoded object into records. Finite, non-restartable.
pub fn records(encoded: &[u8]) -> Records<'_> {
    Records {
        rest: encoded,
        index: 0,
    }
}

#[derive(Debug, Clone)]
pub struct Records<'a> {
    rest: &'a [u8],
    index: u16,
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Record<'a>> {
        if self.rest.is_empty() {
            return None;
        }

        let take = self.rest.len().min(RECORD_DATA_SIZE);
        let (data, rest) = self.rest.split_at(take);
        let index = self.index;

        self.rest = rest;
        self.index += 1;

        Some(Record {
            index,
            data,
            last: rest.is_empty(),
        })
    }
}
