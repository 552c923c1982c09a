//! Splicing an encoded booter into a target image.
//!
//! Two container flavours are supported, told apart by size alone: an image
//! of exactly the floppy size gets track/sector chain links, anything else
//! is treated as an MBR disk image and gets absolute block links starting at
//! block 1, leaving the partition table block untouched.

use std::io::{self, Read, Seek, SeekFrom, Write};

use k5boot_common::mbr::MasterBootRecord;
use k5boot_common::rex::{
    self, EncodeError, BOOTER_ADDRESS, FLOPPY_IMAGE_SIZE, FLOPPY_SECTORS_PER_TRACK, FLOPPY_TRACKS,
    RECORD_HEADER_SIZE, RECORD_SIZE,
};
use thiserror::Error;

/// Physical block size of a disk image.
const DISK_BLOCK_SIZE: usize = 512;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("booter needs {required} sectors but the floppy has only {available}")]
    TooLargeForFloppy { required: u32, available: u32 },

    #[error("disk image signature {found:02x?} not supported")]
    BadDiskMagic { found: [u8; 2] },

    #[error("booter ({sectors} sectors) would overlap partition {index} starting at block {start}")]
    BootChainOverlapsPartition {
        sectors: u32,
        index: usize,
        start: u32,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Target container: size plus random-access read and write. Blanket
/// implemented for anything file-like; tests use in-memory cursors.
pub trait Container {
    fn len(&mut self) -> io::Result<u64>;
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;
}

impl<T: Read + Write + Seek> Container for T {
    fn len(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
    Floppy,
    Disk,
}

/// Human-readable installation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorsUsed {
    pub medium: Medium,
    pub count: u32,
}

impl std::fmt::Display for SectorsUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.medium {
            Medium::Floppy => write!(f, "booter used {} floppy sectors", self.count),
            Medium::Disk => write!(f, "booter used sectors 1-{}", self.count),
        }
    }
}

/// Encodes `booter` and writes the sector chain into `image`.
///
/// All capacity and overlap problems are detected before the first write;
/// an I/O failure mid-chain may leave a partial install behind, which is
/// acceptable for offline images.
pub fn install<C: Container>(booter: &[u8], image: &mut C) -> Result<SectorsUsed, InstallError> {
    let encoded = rex::encode(booter, BOOTER_ADDRESS, BOOTER_ADDRESS)?;

    if image.len()? == FLOPPY_IMAGE_SIZE {
        install_floppy(&encoded, image)
    } else {
        install_disk(&encoded, image)
    }
}

/// Floppy chain: 256-byte records written sequentially from track 0,
/// sector 1 (sectors are 1-based; the 0,0 pair is the null link).
fn install_floppy<C: Container>(
    encoded: &[u8],
    image: &mut C,
) -> Result<SectorsUsed, InstallError> {
    let count = rex::chain_len(encoded.len());
    let available = FLOPPY_TRACKS * FLOPPY_SECTORS_PER_TRACK;
    if count > available {
        return Err(InstallError::TooLargeForFloppy {
            required: count,
            available,
        });
    }

    let mut track: u32 = 0;
    let mut sector: u32 = 1;
    let mut offset: u64 = 0;

    for record in rex::records(encoded) {
        let mut block = [0u8; RECORD_SIZE];

        if !record.last {
            if sector == FLOPPY_SECTORS_PER_TRACK {
                track += 1;
                sector = 1;
            } else {
                sector += 1;
            }
            block[0] = track as u8;
            block[1] = sector as u8;
        }
        block[2..4].copy_from_slice(&record.index.to_be_bytes());
        block[RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + record.data.len()]
            .copy_from_slice(record.data);

        image.write_at(offset, &block)?;
        offset += RECORD_SIZE as u64;
    }

    Ok(SectorsUsed {
        medium: Medium::Floppy,
        count,
    })
}

/// Disk chain: one 256-byte logical record per 512-byte block, blocks
/// 1..=N, block links as big-endian absolute block numbers. Block 0 is only
/// read, so the partition table survives.
fn install_disk<C: Container>(encoded: &[u8], image: &mut C) -> Result<SectorsUsed, InstallError> {
    let mut first = [0u8; DISK_BLOCK_SIZE];
    image.read_at(0, &mut first)?;

    let mbr: &MasterBootRecord = bytemuck::from_bytes(&first);
    if !mbr.has_boot_signature() {
        return Err(InstallError::BadDiskMagic {
            found: mbr.signature,
        });
    }
    if !mbr.partition_table.any_active() {
        log::warn!("no active partition, disk will not be bootable");
    }

    let count = rex::chain_len(encoded.len());
    if let Some((index, entry)) = mbr.partition_table.entry_at_or_below(count) {
        return Err(InstallError::BootChainOverlapsPartition {
            sectors: count,
            index,
            start: entry.start_lba(),
        });
    }

    let mut lba: u32 = 1;
    for record in rex::records(encoded) {
        let mut block = [0u8; DISK_BLOCK_SIZE];

        if !record.last {
            block[0..2].copy_from_slice(&((lba + 1) as u16).to_be_bytes());
        }
        block[2..4].copy_from_slice(&record.index.to_be_bytes());
        block[RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + record.data.len()]
            .copy_from_slice(record.data);

        image.write_at(u64::from(lba) * DISK_BLOCK_SIZE as u64, &block)?;
        lba += 1;
    }

    Ok(SectorsUsed {
        medium: Medium::Disk,
        count,
    })
}
