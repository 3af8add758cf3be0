//! mkfs_adder - Add one regular file to the root directory of a MiniVSFS image
//!
//! Usage:
//!   mkfs_adder --input fs.img --output fs2.img --file notes.txt
//!
//! The input image is never modified, the result goes to --output.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use minivsfs::{now_epoch, read_image, write_image, Error, FileSystem, MAX_FILE_SIZE};

#[derive(Parser, Debug)]
#[command(name = "mkfs_adder")]
#[command(about = "Add a file to the root directory of a MiniVSFS image")]
struct Args {
    /// Existing image to read
    #[arg(long)]
    input: PathBuf,

    /// Where to write the updated image
    #[arg(long)]
    output: PathBuf,

    /// File to add
    #[arg(long)]
    file: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_args() -> Args {
    Args::try_parse().unwrap_or_else(|e| {
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

    println!("Adding file '{}' to filesystem", args.file.display());
    println!("Input: {}, Output: {}", args.input.display(), args.output.display());

    let metadata = fs::metadata(&args.file)
        .with_context(|| format!("file {} not found", args.file.display()))?;
    let name = args.file.file_name().ok_or(Error::InvalidFileName)?;

    let bytes = read_image(&args.input)
        .with_context(|| format!("cannot open input image {}", args.input.display()))?;
    let mut filesystem = FileSystem::mount(bytes)?;

    // Checked before reading so an oversized file is never loaded.
    if metadata.len() > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge { size: metadata.len() }.into());
    }
    let data = fs::read(&args.file)
        .with_context(|| format!("cannot read file {}", args.file.display()))?;

    let inode_id = filesystem.add_file(name.as_encoded_bytes(), &data, now_epoch())?;
    log::debug!("{} stored as inode {}", args.file.display(), inode_id);

    write_image(&args.output, filesystem.as_bytes())
        .with_context(|| format!("cannot create output file {}", args.output.display()))?;

    println!("File added successfully!");
    Ok(())
}
