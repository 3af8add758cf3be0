//! mkfs_builder - Create an empty MiniVSFS image
//!
//! Usage:
//!   mkfs_builder --image fs.img --size-kib 180 --inodes 128

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use minivsfs::{now_epoch, write_image, FileSystem, Layout};

#[derive(Parser, Debug)]
#[command(name = "mkfs_builder")]
#[command(about = "Create an empty MiniVSFS image")]
struct Args {
    /// Output image file
    #[arg(long)]
    image: PathBuf,

    /// Image size in KiB (180..=4096, multiple of 4)
    #[arg(long = "size-kib")]
    size_kib: u64,

    /// Number of inodes (128..=512)
    #[arg(long)]
    inodes: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_args() -> Args {
    Args::try_parse().unwrap_or_else(|e| {
        // Usage errors exit 1, --help and --version exit 0.
        let code = if e.use_stderr() { 1 } else { 0 };
        let _ = e.print();
        std::process::exit(code);
    })
}

fn main() -> Result<()> {
    let args = parse_args();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .format_timestamp(None)
        .format_target(false)
        .init();

    let layout = Layout::new(args.size_kib, args.inodes)?;

    println!("Creating MiniVSFS image: {}", args.image.display());
    println!("Size: {} KiB, Inodes: {}", args.size_kib, args.inodes);

    let fs = FileSystem::format(&layout, now_epoch())?;
    write_image(&args.image, fs.as_bytes())
        .with_context(|| format!("cannot create image file {}", args.image.display()))?;

    println!("Filesystem created successfully!");
    Ok(())
}
