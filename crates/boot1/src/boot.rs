//! The boot orchestrator: walk the candidate drives, load something, hand
//! the machine over.

use crate::drive::{candidates, Drive};
use crate::fs::FileSystem;
use crate::hal::Machine;
use crate::image;
use crate::monitor::{self, Monitor};

/// Preferred: the raw secondary loader, booted without any hardware prep.
pub const RAW_LOADER_FILE: &str = "/BOOTK5.SYS";
/// Fallback: the structured OS image, booted after the hardware handoff.
pub const OS_IMAGE_FILE: &str = "/EMUTOSK5.SYS";

// Memory-configuration fields the OS reads at startup. Writing the magic
// values marks the configuration as freshly computed, so the OS treats this
// as a cold boot and skips its own sizing pass.
const MEMVALID: u32 = 0x420;
const MEMCTRL: u32 = 0x424;
const RESVALID: u32 = 0x426;
const PHYSTOP: u32 = 0x42E;
const MEMVAL2: u32 = 0x43A;
const MEMVAL3: u32 = 0x51A;
const RAMTOP: u32 = 0x5A4;
const RAMVALID: u32 = 0x5A8;
const WARM_MAGIC: u32 = 0x6FC;

const MEMVALID_MAGIC: u32 = 0x7520_19F3;
const MEMVAL2_MAGIC: u32 = 0x2376_98AA;
const MEMVAL3_MAGIC: u32 = 0x5555_AAAA;
const RAMVALID_MAGIC: u32 = 0x1357_BD13;

/// Every board has at least this much RAM.
const RAM_PROBE_FLOOR: u32 = 0x0040_0000;
/// Largest size the probe will confirm.
const RAM_PROBE_CEILING: u32 = 0x0800_0000;
const RAM_PROBE_STEP: u32 = 0x0010_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// Control was handed to a loaded image at this entry point. On real
    /// hardware this state is never observed; the return exists for hosts
    /// where [`Machine::transfer`] comes back.
    Transferred { entry: u32 },
    /// Every candidate failed; the caller (the ROM monitor) decides what
    /// happens next.
    NothingBootable,
}

/// Entry point, called by the chain-loaded booter stub with the interface
/// base address it was loaded from and the master/slave hint.
pub fn boot_main<F, M, Mon>(
    origin: u32,
    slave: bool,
    fs: &mut F,
    machine: &mut M,
    monitor: &mut Mon,
) -> BootOutcome
where
    F: FileSystem,
    M: Machine,
    Mon: Monitor,
{
    log::info!("PT68K5 boot1");

    for &drive in candidates(origin, slave) {
        log::info!("{}:", drive.name());
        if let Some(entry) = try_boot(drive, fs, machine, monitor) {
            return BootOutcome::Transferred { entry };
        }
    }

    log::error!("nothing bootable");
    BootOutcome::NothingBootable
}

/// One candidate attempt. Returns the entry address when control was
/// transferred; `None` means the next candidate should be tried.
fn try_boot<F, M, Mon>(
    drive: Drive,
    fs: &mut F,
    machine: &mut M,
    monitor: &mut Mon,
) -> Option<u32>
where
    F: FileSystem,
    M: Machine,
    Mon: Monitor,
{
    if fs.mount(drive).is_err() {
        log::warn!("failed to find a partition on {}", drive.volume());
        return None;
    }

    // Best effort; path lookups may still work through the mount.
    if fs.set_default(drive).is_err() {
        log::warn!("failed to set default drive to {}", drive.volume());
    }

    let mut entry = None;

    if let Ok(mut file) = fs.open(RAW_LOADER_FILE) {
        match image::load_raw(fs, &mut file, machine) {
            Ok(addr) => entry = Some(addr),
            Err(err) => log::warn!("error loading {RAW_LOADER_FILE}: {err}"),
        }
    }

    if entry.is_none() {
        if let Ok(mut file) = fs.open(OS_IMAGE_FILE) {
            match image::load_os_image(fs, &mut file, machine) {
                Ok(addr) => {
                    handoff(machine, monitor);
                    entry = Some(addr);
                }
                Err(err) => log::warn!("error loading {OS_IMAGE_FILE}: {err}"),
            }
        }
    }

    match entry {
        Some(addr) => {
            log::info!("booting @ {addr:#x}");
            machine.transfer(addr);
            Some(addr)
        }
        None => {
            fs.unmount(drive);
            None
        }
    }
}

/// Probes installed memory: ascending candidate sizes in fixed steps until
/// one fails, keeping the largest confirmed size.
fn probe_ram<M: Machine>(machine: &mut M) -> u32 {
    let mut confirmed = RAM_PROBE_FLOOR;
    let mut candidate = RAM_PROBE_FLOOR;

    while candidate <= RAM_PROBE_CEILING {
        if !machine.probe(candidate) {
            break;
        }
        confirmed = candidate;
        candidate += RAM_PROBE_STEP;
    }

    confirmed
}

/// Irreversible hardware-state preparation for the structured-image path.
/// No rollback exists if the subsequent transfer never happens.
fn handoff<M: Machine, Mon: Monitor>(machine: &mut M, monitor: &mut Mon) {
    let ram_size = probe_ram(machine);
    log::info!("RAM size {} MiB", ram_size >> 20);

    // We don't conform to the OS's memory-controller layout; zeroing
    // memctrl and resvalid keeps it from touching either.
    machine.write_cfg(MEMCTRL, 0);
    machine.write_cfg(RESVALID, 0);
    machine.write_cfg(PHYSTOP, ram_size);
    machine.write_cfg(RAMTOP, 0);
    machine.write_cfg(MEMVALID, MEMVALID_MAGIC);
    machine.write_cfg(MEMVAL2, MEMVAL2_MAGIC);
    machine.write_cfg(MEMVAL3, MEMVAL3_MAGIC);
    machine.write_cfg(RAMVALID, RAMVALID_MAGIC);
    machine.write_cfg(WARM_MAGIC, 0);

    monitor::init_video(monitor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{IDE_BASE, XTIDE_BASE};
    use crate::fakes::{FakeFs, FakeMachine, FakeMonitor};
    use k5boot_common::osimage::{MAGIC, MIN_IMAGE_SIZE};

    fn os_image(entry: u32, begin: u32, end: u32) -> Vec<u8> {
        let mut data = vec![0u8; MIN_IMAGE_SIZE as usize];
        data[0..2].copy_from_slice(&0x601Eu16.to_be_bytes());
        data[2..4].copy_from_slice(&0x0206u16.to_be_bytes());
        data[4..8].copy_from_slice(&entry.to_be_bytes());
        data[8..12].copy_from_slice(&begin.to_be_bytes());
        data[12..16].copy_from_slice(&end.to_be_bytes());
        data[44..48].copy_from_slice(&MAGIC);
        data
    }

    #[test]
    fn nothing_bootable_without_any_filesystem() {
        let mut fs = FakeFs::default();
        let mut machine = FakeMachine::default();
        let mut monitor = FakeMonitor::default();

        let outcome = boot_main(0, false, &mut fs, &mut machine, &mut monitor);

        assert_eq!(outcome, BootOutcome::NothingBootable);
        assert_eq!(machine.transferred, None);
        assert!(machine.cfg.is_empty());
    }

    #[test]
    fn empty_filesystems_are_walked_and_unmounted() {
        let mut fs = FakeFs::default()
            .with_mountable(Drive::XtideMaster)
            .with_mountable(Drive::XtideSlave)
            .with_mountable(Drive::IdeMaster)
            .with_mountable(Drive::IdeSlave);
        let mut machine = FakeMachine::default();
        let mut monitor = FakeMonitor::default();

        let outcome = boot_main(0xDEAD, true, &mut fs, &mut machine, &mut monitor);

        assert_eq!(outcome, BootOutcome::NothingBootable);
        assert_eq!(
            fs.unmounts,
            [
                Drive::XtideMaster,
                Drive::XtideSlave,
                Drive::IdeMaster,
                Drive::IdeSlave,
            ]
        );
    }

    #[test]
    fn known_origin_tries_only_its_drive() {
        let mut fs = FakeFs::default().with_mountable(Drive::XtideSlave);
        let mut machine = FakeMachine::default();
        let mut monitor = FakeMonitor::default();

        boot_main(XTIDE_BASE, true, &mut fs, &mut machine, &mut monitor);

        assert_eq!(fs.unmounts, [Drive::XtideSlave]);
    }

    #[test]
    fn raw_loader_boots_without_handoff() {
        let blob: Vec<u8> = (0..1500u32).map(|i| i as u8).collect();
        let mut fs =
            FakeFs::default().with_file(Drive::IdeMaster, RAW_LOADER_FILE, blob.clone());
        let mut machine = FakeMachine::default();
        let mut monitor = FakeMonitor::default();

        let outcome = boot_main(IDE_BASE, false, &mut fs, &mut machine, &mut monitor);

        assert_eq!(outcome, BootOutcome::Transferred { entry: 0x2000 });
        assert_eq!(machine.transferred, Some(0x2000));
        assert_eq!(machine.mem_at(0x2000, blob.len()), blob);
        // Raw path skips the handoff entirely.
        assert!(machine.cfg.is_empty());
        assert!(monitor.calls.is_empty());
        // Successful transfer is terminal; no unmount happens.
        assert!(fs.unmounts.is_empty());
    }

    #[test]
    fn undersized_raw_loader_falls_through_to_os_image() {
        let image = os_image(0x900, 0x800, 0xF0000);
        let mut fs = FakeFs::default()
            .with_file(Drive::IdeMaster, RAW_LOADER_FILE, vec![0u8; 100])
            .with_file(Drive::IdeMaster, OS_IMAGE_FILE, image.clone());
        let mut machine = FakeMachine::default();
        let mut monitor = FakeMonitor::default();

        let outcome = boot_main(IDE_BASE, false, &mut fs, &mut machine, &mut monitor);

        assert_eq!(outcome, BootOutcome::Transferred { entry: 0x900 });
        assert_eq!(machine.mem_at(0x800, 48), image[..48]);
        // The structured path ran the handoff and the video bring-up.
        assert!(!machine.cfg.is_empty());
        assert!(!monitor.calls.is_empty());
    }

    #[test]
    fn bad_os_image_advances_to_next_candidate() {
        let mut broken = os_image(0x900, 0x800, 0xF0000);
        broken[44] = b'X';
        let mut fs = FakeFs::default()
            .with_file(Drive::XtideMaster, OS_IMAGE_FILE, broken)
            .with_file(Drive::XtideSlave, RAW_LOADER_FILE, vec![0u8; 2048]);
        let mut machine = FakeMachine::default();
        let mut monitor = FakeMonitor::default();

        let outcome = boot_main(0, false, &mut fs, &mut machine, &mut monitor);

        assert_eq!(outcome, BootOutcome::Transferred { entry: 0x2000 });
        assert_eq!(fs.unmounts, [Drive::XtideMaster]);
    }

    #[test]
    fn handoff_declares_probed_memory() {
        let mut machine = FakeMachine {
            // Probes succeed up to 6 MiB.
            ram_top: 0x0060_0000,
            ..FakeMachine::default()
        };
        let mut monitor = FakeMonitor::default();

        handoff(&mut machine, &mut monitor);

        assert_eq!(machine.probes, [0x0040_0000, 0x0050_0000, 0x0060_0000, 0x0070_0000]);
        assert_eq!(machine.cfg_value(PHYSTOP), Some(0x0060_0000));
        assert_eq!(machine.cfg_value(MEMCTRL), Some(0));
        assert_eq!(machine.cfg_value(RESVALID), Some(0));
        assert_eq!(machine.cfg_value(RAMTOP), Some(0));
        assert_eq!(machine.cfg_value(MEMVALID), Some(MEMVALID_MAGIC));
        assert_eq!(machine.cfg_value(MEMVAL2), Some(MEMVAL2_MAGIC));
        assert_eq!(machine.cfg_value(MEMVAL3), Some(MEMVAL3_MAGIC));
        assert_eq!(machine.cfg_value(RAMVALID), Some(RAMVALID_MAGIC));
        assert_eq!(machine.cfg_value(WARM_MAGIC), Some(0));
        assert_eq!(machine.cfg.len(), 9);
    }

    #[test]
    fn probe_floor_is_kept_when_first_probe_fails() {
        let mut machine = FakeMachine {
            ram_top: 0,
            ..FakeMachine::default()
        };

        assert_eq!(probe_ram(&mut machine), RAM_PROBE_FLOOR);
    }

    #[test]
    fn probe_stops_at_ceiling() {
        let mut machine = FakeMachine::default();

        assert_eq!(probe_ram(&mut machine), RAM_PROBE_CEILING);
        assert_eq!(*machine.probes.last().unwrap(), RAM_PROBE_CEILING);
    }
}
