//! Boundary to the external filesystem driver.
//!
//! The driver itself (partition probing, directory walking, the sector-read
//! plumbing underneath) is a third-party component; the boot path only
//! consumes this read-only surface.

use core::fmt;

use crate::drive::Drive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// No usable filesystem on the drive.
    NoFilesystem,
    /// The path does not name a file.
    NotFound,
    /// The driver failed mid-operation (bad media, read fault).
    Io,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FsError::NoFilesystem => f.write_str("no filesystem"),
            FsError::NotFound => f.write_str("file not found"),
            FsError::Io => f.write_str("filesystem I/O error"),
        }
    }
}

/// Read-only filesystem operations, one mounted volume at a time.
pub trait FileSystem {
    type File;

    fn mount(&mut self, drive: Drive) -> Result<(), FsError>;

    /// Makes `drive` the default for path lookups. Best effort.
    fn set_default(&mut self, drive: Drive) -> Result<(), FsError>;

    /// Opens a file on the default drive for reading.
    fn open(&mut self, path: &str) -> Result<Self::File, FsError>;

    fn size(&mut self, file: &Self::File) -> u32;

    fn seek(&mut self, file: &mut Self::File, pos: u32) -> Result<(), FsError>;

    /// Reads up to `buf.len()` bytes, returning how many were read. Zero
    /// means end of file.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FsError>;

    fn unmount(&mut self, drive: Drive);
}
