//! Drive identifiers and the origin-to-candidate map.
//!
//! The monitor leaves the I/O base address it booted from in a register, so
//! the booter can keep booting from the same interface. Unknown origins
//! (including the floppy controller) fall back to trying everything.

/// I/O base of the XTIDE expansion card.
pub const XTIDE_BASE: u32 = 0x1000_0300;
/// I/O base of the onboard IDE interface.
pub const IDE_BASE: u32 = 0x2000_4180;
/// I/O base of the floppy controller; has no filesystem candidate of its
/// own.
pub const FLOPPY_BASE: u32 = 0x1000_03F4;

/// One of the four logical drives the filesystem driver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Drive {
    XtideMaster,
    XtideSlave,
    IdeMaster,
    IdeSlave,
}

impl Drive {
    /// Volume name understood by the filesystem collaborator.
    #[must_use]
    pub const fn volume(self) -> &'static str {
        match self {
            Drive::XtideMaster => "1:",
            Drive::XtideSlave => "2:",
            Drive::IdeMaster => "3:",
            Drive::IdeSlave => "4:",
        }
    }

    /// Register base of the interface this drive hangs off.
    #[must_use]
    pub const fn iobase(self) -> u32 {
        match self {
            Drive::XtideMaster | Drive::XtideSlave => XTIDE_BASE,
            Drive::IdeMaster | Drive::IdeSlave => IDE_BASE,
        }
    }

    /// Device-select bit for the drive-select register.
    #[must_use]
    pub const fn select(self) -> u8 {
        match self {
            Drive::XtideMaster | Drive::IdeMaster => 0,
            Drive::XtideSlave | Drive::IdeSlave => crate::ide::SELECT_DEV1,
        }
    }

    /// Human-readable name for boot progress output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Drive::XtideMaster => "XTIDE master",
            Drive::XtideSlave => "XTIDE slave",
            Drive::IdeMaster => "IDE master",
            Drive::IdeSlave => "IDE slave",
        }
    }
}

/// Priority order when the origin is unrecognized.
pub const ALL_DRIVES: [Drive; 4] = [
    Drive::XtideMaster,
    Drive::XtideSlave,
    Drive::IdeMaster,
    Drive::IdeSlave,
];

/// Maps the boot origin (interface base address plus slave hint) to the
/// candidate list to try, in order.
#[must_use]
pub fn candidates(origin: u32, slave: bool) -> &'static [Drive] {
    match (origin, slave) {
        (XTIDE_BASE, false) => &[Drive::XtideMaster],
        (XTIDE_BASE, true) => &[Drive::XtideSlave],
        (IDE_BASE, false) => &[Drive::IdeMaster],
        (IDE_BASE, true) => &[Drive::IdeSlave],
        _ => &ALL_DRIVES,
    }
}
