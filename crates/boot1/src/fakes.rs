//! Recording fakes for the hardware and filesystem seams, shared by the
//! unit tests.

use std::collections::BTreeMap;

use crate::drive::Drive;
use crate::fs::{FileSystem, FsError};
use crate::hal::Machine;
use crate::monitor::{Monitor, TrapOp};

pub struct FakeFile {
    data: Vec<u8>,
    pos: usize,
}

/// In-memory filesystem: files keyed by drive and path, a list of drives
/// that mount successfully, and an event log.
#[derive(Default)]
pub struct FakeFs {
    pub files: BTreeMap<(Drive, &'static str), Vec<u8>>,
    pub mountable: Vec<Drive>,
    pub default_fails: bool,
    pub mounted: Option<Drive>,
    pub unmounts: Vec<Drive>,
}

impl FakeFs {
    pub fn with_file(mut self, drive: Drive, path: &'static str, data: Vec<u8>) -> Self {
        if !self.mountable.contains(&drive) {
            self.mountable.push(drive);
        }
        self.files.insert((drive, path), data);
        self
    }

    pub fn with_mountable(mut self, drive: Drive) -> Self {
        self.mountable.push(drive);
        self
    }
}

impl FileSystem for FakeFs {
    type File = FakeFile;

    fn mount(&mut self, drive: Drive) -> Result<(), FsError> {
        if self.mountable.contains(&drive) {
            self.mounted = Some(drive);
            Ok(())
        } else {
            Err(FsError::NoFilesystem)
        }
    }

    fn set_default(&mut self, _drive: Drive) -> Result<(), FsError> {
        if self.default_fails {
            Err(FsError::Io)
        } else {
            Ok(())
        }
    }

    fn open(&mut self, path: &str) -> Result<FakeFile, FsError> {
        let drive = self.mounted.ok_or(FsError::NoFilesystem)?;
        let data = self
            .files
            .iter()
            .find(|((d, p), _)| *d == drive && *p == path)
            .map(|(_, data)| data.clone())
            .ok_or(FsError::NotFound)?;
        Ok(FakeFile { data, pos: 0 })
    }

    fn size(&mut self, file: &FakeFile) -> u32 {
        file.data.len() as u32
    }

    fn seek(&mut self, file: &mut FakeFile, pos: u32) -> Result<(), FsError> {
        if pos as usize > file.data.len() {
            return Err(FsError::Io);
        }
        file.pos = pos as usize;
        Ok(())
    }

    fn read(&mut self, file: &mut FakeFile, buf: &mut [u8]) -> Result<usize, FsError> {
        let rest = &file.data[file.pos..];
        let take = rest.len().min(buf.len());
        buf[..take].copy_from_slice(&rest[..take]);
        file.pos += take;
        Ok(take)
    }

    fn unmount(&mut self, drive: Drive) {
        self.unmounts.push(drive);
        self.mounted = None;
    }
}

/// Sparse physical memory plus a record of configuration writes, probes and
/// the final control transfer.
pub struct FakeMachine {
    pub mem: BTreeMap<u32, u8>,
    pub cfg: Vec<(u32, u32)>,
    /// Probes succeed up to and including this size.
    pub ram_top: u32,
    pub probes: Vec<u32>,
    pub transferred: Option<u32>,
}

impl Default for FakeMachine {
    fn default() -> Self {
        Self {
            mem: BTreeMap::new(),
            cfg: Vec::new(),
            ram_top: u32::MAX,
            probes: Vec::new(),
            transferred: None,
        }
    }
}

impl FakeMachine {
    /// Contiguous readback of loaded memory for assertions.
    pub fn mem_at(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len as u32)
            .map(|i| self.mem.get(&(addr + i)).copied().unwrap_or(0))
            .collect()
    }

    pub fn cfg_value(&self, addr: u32) -> Option<u32> {
        self.cfg
            .iter()
            .rev()
            .find(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
    }
}

impl Machine for FakeMachine {
    fn copy_in(&mut self, addr: u32, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.mem.insert(addr + i as u32, *byte);
        }
    }

    fn write_cfg(&mut self, addr: u32, value: u32) {
        self.cfg.push((addr, value));
    }

    fn probe(&mut self, size: u32) -> bool {
        self.probes.push(size);
        size <= self.ram_top
    }

    fn transfer(&mut self, entry: u32) {
        assert!(self.transferred.is_none(), "transferred twice");
        self.transferred = Some(entry);
    }
}

#[derive(Default)]
pub struct FakeMonitor {
    pub calls: Vec<TrapOp>,
}

impl Monitor for FakeMonitor {
    fn call(&mut self, op: TrapOp, _arg1: u16, _arg2: u16, _data: Option<&[u8]>) {
        self.calls.push(op);
    }
}
