//! Loading a boot image out of the filesystem into its runtime address.
//!
//! Two flavours: the secondary loader (`BOOTK5.SYS`) is a raw blob copied
//! verbatim, the OS image (`EMUTOSK5.SYS`) carries a header that names its
//! own load region and entry point. Which loader runs is decided by
//! filename in the orchestrator, never by sniffing content.

use core::fmt;

use k5boot_common::osimage::{
    HeaderError, OsImageHeader, HEADER_SIZE, MAX_IMAGE_SIZE, MIN_IMAGE_SIZE,
};

use crate::fs::{FileSystem, FsError};
use crate::hal::Machine;

/// Fixed load (and entry) address of the raw secondary loader.
pub const RAW_LOAD_ADDRESS: u32 = 0x2000;

/// Anything shorter cannot be a real loader.
pub const RAW_MIN_SIZE: u32 = 1024;

/// Copy granularity; one filesystem sector per read keeps the stack
/// footprint fixed.
const COPY_CHUNK: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// Raw loader file below the minimum plausible size.
    TooSmall { size: u32 },
    /// Structured image file outside the supported size window.
    BadSize { size: u32 },
    /// Structured image header failed validation.
    InvalidHeader(HeaderError),
    /// The file ended before the advertised size was read.
    Truncated { expected: u32, got: u32 },
    Fs(FsError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LoadError::TooSmall { size } => {
                write!(f, "suspiciously small loader ({size} bytes)")
            }
            LoadError::BadSize { size } => write!(f, "implausible image size ({size} bytes)"),
            LoadError::InvalidHeader(err) => write!(f, "bad image header: {err}"),
            LoadError::Truncated { expected, got } => {
                write!(f, "short read: {got} of {expected} bytes")
            }
            LoadError::Fs(err) => write!(f, "{err}"),
        }
    }
}

impl From<FsError> for LoadError {
    fn from(err: FsError) -> Self {
        LoadError::Fs(err)
    }
}

/// Copies the whole open file to `addr`, one chunk at a time.
fn copy_to<F: FileSystem, M: Machine>(
    fs: &mut F,
    file: &mut F::File,
    machine: &mut M,
    mut addr: u32,
    size: u32,
) -> Result<(), LoadError> {
    let mut buf = [0u8; COPY_CHUNK];
    let mut remaining = size;

    while remaining > 0 {
        let want = remaining.min(COPY_CHUNK as u32) as usize;
        let got = fs.read(file, &mut buf[..want])?;
        if got == 0 {
            return Err(LoadError::Truncated {
                expected: size,
                got: size - remaining,
            });
        }
        machine.copy_in(addr, &buf[..got]);
        addr += got as u32;
        remaining -= got as u32;
    }

    Ok(())
}

/// Loads the secondary loader verbatim to its fixed address.
///
/// No structural validation beyond the size floor; a broken blob is the
/// operator's problem. Returns the entry address.
pub fn load_raw<F: FileSystem, M: Machine>(
    fs: &mut F,
    file: &mut F::File,
    machine: &mut M,
) -> Result<u32, LoadError> {
    let size = fs.size(file);
    if size < RAW_MIN_SIZE {
        return Err(LoadError::TooSmall { size });
    }

    copy_to(fs, file, machine, RAW_LOAD_ADDRESS, size)?;
    Ok(RAW_LOAD_ADDRESS)
}

/// Validates a structured OS image and loads it to its declared region.
///
/// Returns the header's entry point. Any failure abandons this file only;
/// the orchestrator moves on to the next candidate.
pub fn load_os_image<F: FileSystem, M: Machine>(
    fs: &mut F,
    file: &mut F::File,
    machine: &mut M,
) -> Result<u32, LoadError> {
    let size = fs.size(file);
    if !(MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE).contains(&size) {
        return Err(LoadError::BadSize { size });
    }

    fs.seek(file, 0)?;
    let mut header = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        let got = fs.read(file, &mut header[filled..])?;
        if got == 0 {
            return Err(LoadError::Truncated {
                expected: HEADER_SIZE as u32,
                got: filled as u32,
            });
        }
        filled += got;
    }

    let parsed = OsImageHeader::parse(&header).map_err(LoadError::InvalidHeader)?;

    log::info!("loading {size} byte image at {:#x}", parsed.region_begin);

    // The header is part of the image; copy the file from the top.
    fs.seek(file, 0)?;
    copy_to(fs, file, machine, parsed.region_begin, size)?;

    Ok(parsed.entry)
}
