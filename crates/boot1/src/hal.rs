//! Hardware seams.
//!
//! The real implementations are thin wrappers over volatile pointer access
//! and two assembly primitives (memory probe and final jump); tests plug in
//! recording fakes.

/// Byte- and word-granular access to memory-mapped device registers.
pub trait Mmio {
    fn read8(&mut self, addr: u32) -> u8;
    fn write8(&mut self, addr: u32, value: u8);
    fn read16(&mut self, addr: u32) -> u16;
    fn write16(&mut self, addr: u32, value: u16);
}

/// CPU and physical-memory primitives the boot path needs.
pub trait Machine {
    /// Copies bytes into physical memory at `addr`.
    fn copy_in(&mut self, addr: u32, bytes: &[u8]);

    /// Writes one 32-bit configuration word at a fixed physical address.
    fn write_cfg(&mut self, addr: u32, value: u32);

    /// Tests whether memory is usable up to `size` bytes.
    fn probe(&mut self, size: u32) -> bool;

    /// Jumps to the loaded image. Never returns on hardware; fakes record
    /// the entry address and return so tests can observe terminal states.
    fn transfer(&mut self, entry: u32);
}
