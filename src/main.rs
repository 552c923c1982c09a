//! Installs a booter binary onto a floppy image or an MBR disk image in the
//! sector-linked form the MONK5 monitor loads at power-on.
//!
//! The booter can tell where it was loaded from by the interface base
//! address the monitor leaves behind: `0x2000_4180` for onboard IDE,
//! `0x1000_0300` for the XTIDE card, `0x1000_03F4` for floppy.

mod install;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "Install a booter onto a floppy or MBR disk image")]
struct Args {
    /// Raw booter binary.
    booter: PathBuf,

    /// Target image: floppy-sized, or MBR-partitioned with a boot
    /// signature.
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let booter = fs::read(&args.booter)
        .with_context(|| format!("reading booter {}", args.booter.display()))?;
    let mut image = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&args.image)
        .with_context(|| format!("opening image {}", args.image.display()))?;

    let used = install::install(&booter, &mut image)
        .with_context(|| format!("installing to {}", args.image.display()))?;

    println!("{used}");

    Ok(())
}
