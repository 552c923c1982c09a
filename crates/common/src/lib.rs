//! On-medium formats shared between the installer and the boot chain.

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "mbr")]
pub mod mbr;

#[cfg(feature = "osimage")]
pub mod osimage;

#[cfg(feature = "rex")]
pub mod rex;
