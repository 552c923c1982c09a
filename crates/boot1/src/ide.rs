//! Polled single-sector reads from the IDE-style interfaces.
//!
//! Registers are byte-wide on odd addresses with a 16-bit data window at
//! offset 0; both the onboard interface and the XTIDE card present the same
//! layout at different bases.

use core::fmt;

use crate::drive::Drive;
use crate::hal::Mmio;

pub const SECTOR_SIZE: usize = 512;

const REG_DATA: u32 = 0x00;
const REG_ERROR: u32 = 0x03;
const REG_SECTOR_COUNT: u32 = 0x05;
const REG_LBA_0: u32 = 0x07;
const REG_LBA_1: u32 = 0x09;
const REG_LBA_2: u32 = 0x0B;
const REG_LBA_3: u32 = 0x0D;
const REG_STATUS: u32 = 0x0F;
const REG_COMMAND: u32 = 0x0F;

/// Device-select bit in the top LBA register.
pub const SELECT_DEV1: u8 = 0x10;
/// LBA addressing mode, with bits 7 and 5 set for compatibility.
const SELECT_LBA: u8 = 0xE0;

const STATUS_ERR: u8 = 0x01;
const STATUS_DRQ: u8 = 0x08;
const STATUS_BSY: u8 = 0x80;

const CMD_READ_SECTORS: u8 = 0x20;

/// Status-poll iterations before the drive is declared dead.
const POLL_LIMIT: u32 = 0x0020_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// The drive never left BSY or raised DRQ within the poll budget.
    NotReady,
    /// The drive reported an error; `code` is the error register contents.
    Read { code: u8 },
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DiskError::NotReady => f.write_str("drive not ready"),
            DiskError::Read { code } => write!(f, "read error {code:#04x}"),
        }
    }
}

/// Access to the two IDE interfaces through a register bus.
pub struct IdeBus<M> {
    mmio: M,
    /// Swap each data word; set when the interface wiring and the CPU
    /// disagree on byte order.
    pub swap: bool,
}

impl<M: Mmio> IdeBus<M> {
    pub fn new(mmio: M) -> Self {
        Self { mmio, swap: false }
    }

    /// Reads one 512-byte sector from `drive` at `lba` into `buf`.
    pub fn read_sector(
        &mut self,
        drive: Drive,
        lba: u32,
        buf: &mut [u8; SECTOR_SIZE],
    ) -> Result<(), DiskError> {
        let base = drive.iobase();

        self.mmio.write8(
            base + REG_LBA_3,
            ((lba >> 24) & 0x3F) as u8 | SELECT_LBA | drive.select(),
        );
        self.mmio.write8(base + REG_LBA_2, (lba >> 16) as u8);
        self.mmio.write8(base + REG_LBA_1, (lba >> 8) as u8);
        self.mmio.write8(base + REG_LBA_0, lba as u8);
        self.mmio.write8(base + REG_SECTOR_COUNT, 1);
        self.mmio.write8(base + REG_COMMAND, CMD_READ_SECTORS);

        let mut timeout = POLL_LIMIT;
        while timeout > 0 {
            timeout -= 1;

            let status = self.mmio.read8(base + REG_STATUS);
            if status & STATUS_BSY != 0 {
                continue;
            }
            if status & STATUS_ERR != 0 {
                let code = self.mmio.read8(base + REG_ERROR);
                log::warn!("error {code:#04x} reading sector {lba:#x}");
                return Err(DiskError::Read { code });
            }
            if status & STATUS_DRQ != 0 {
                for chunk in buf.chunks_exact_mut(2) {
                    let mut word = self.mmio.read16(base + REG_DATA);
                    if self.swap {
                        word = word.swap_bytes();
                    }
                    chunk.copy_from_slice(&word.to_be_bytes());
                }
                return Ok(());
            }
        }

        Err(DiskError::NotReady)
    }

    /// Reads `count` consecutive sectors starting at `lba`.
    pub fn read_sectors(
        &mut self,
        drive: Drive,
        mut lba: u32,
        buf: &mut [u8],
    ) -> Result<(), DiskError> {
        for sector in buf.chunks_exact_mut(SECTOR_SIZE) {
            self.read_sector(drive, lba, sector.try_into().unwrap())?;
            lba += 1;
        }
        Ok(())
    }
}
