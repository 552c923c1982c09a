//! Stage-2 boot logic for the PT68K5.
//!
//! The MONK5 monitor loads the booter from a raw sector chain; the code in
//! this crate then finds a filesystem-hosted image on one of the IDE
//! interfaces and chains to it. Everything hardware-shaped sits behind the
//! traits in [`hal`], [`fs`] and [`monitor`] so the control flow runs on a
//! host as well as on the machine.

#![cfg_attr(not(test), no_std)]

pub mod boot;
#[cfg(test)]
pub(crate) mod fakes;
pub mod drive;
pub mod fs;
pub mod hal;
pub mod ide;
pub mod image;
pub mod monitor;

pub use boot::{boot_main, BootOutcome};
pub use drive::Drive;
