//! Master boot record views over raw 512-byte blocks.
//!
//! The installer never produces a partition table; it only reads one to make
//! sure the sector-linked boot chain stays clear of every partition.

use core::ptr::addr_of;

/// Value of the two trailing signature bytes, `0x55 0xAA` on disk.
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// Bit in [`TableEntry::flags`] marking the entry as active (bootable).
pub const FLAG_ACTIVE: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[repr(C, packed)]
pub struct TableEntry {
    /// Flags associated with the partition.
    pub flags: u8,
    /// Start CHS address of the partition.
    pub start_chs: [u8; 3],
    /// What kind of partition this is.
    pub partition_kind: u8,
    /// End CHS address of the partition.
    pub end_chs: [u8; 3],
    /// Little-endian logical block address of the partition.
    start_lba: u32,
    /// Little-endian size of the partition in sectors.
    sector_len: u32,
}

impl TableEntry {
    /// Returns whether this entry is marked active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.flags & FLAG_ACTIVE != 0
    }

    /// Returns whether this entry describes any sectors at all.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sector_len() == 0
    }

    /// Reads the logical block address of the entry.
    ///
    /// The field is unaligned within the packed record and little-endian on
    /// disk regardless of host order.
    #[inline]
    #[must_use]
    pub const fn start_lba(&self) -> u32 {
        u32::from_le(unsafe { addr_of!(self.start_lba).read_unaligned() })
    }

    /// Reads the length in sectors of the entry.
    #[inline]
    #[must_use]
    pub const fn sector_len(&self) -> u32 {
        u32::from_le(unsafe { addr_of!(self.sector_len).read_unaligned() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[repr(C, packed)]
pub struct PartitionTable {
    pub entries: [TableEntry; 4],
}

impl PartitionTable {
    /// Returns whether any entry carries the active flag.
    #[must_use]
    pub fn any_active(&self) -> bool {
        self.entries.iter().any(TableEntry::is_active)
    }

    /// First non-empty entry starting at or below `block`, if any.
    ///
    /// Used to refuse boot chains that would overwrite a partition.
    #[must_use]
    pub fn entry_at_or_below(&self, block: u32) -> Option<(usize, &TableEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, e)| !e.is_empty() && e.start_lba() <= block)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[repr(C, packed)]
pub struct MasterBootRecord {
    pub bootstrap: [u8; 440],
    pub unique_id: [u8; 4],
    pub reserved: [u8; 2],
    pub partition_table: PartitionTable,
    pub signature: [u8; 2],
}

impl MasterBootRecord {
    /// Returns whether the block carries the `0x55 0xAA` trailer.
    #[inline]
    #[must_use]
    pub const fn has_boot_signature(&self) -> bool {
        self.signature[0] == BOOT_SIGNATURE[0] && self.signature[1] == BOOT_SIGNATURE[1]
    }
}

impl Default for MasterBootRecord {
    fn default() -> Self {
        Self {
            bootstrap: [0; 440],
            unique_id: [0; 4],
            reserved: [0; 2],
            partition_table: PartitionTable::default(),
            signature: [0; 2],
        }
    }
}
