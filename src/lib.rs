//! MiniVSFS is a flat, single-directory filesystem image format.
//!
//! Linear layout (4096-byte blocks):
//! - Block 0: Superblock
//! - Block 1: Inode Bitmap
//! - Block 2: Data Bitmap
//! - Blocks 3..: Inode Table (128-byte inodes)
//! - Remaining blocks: Data Region, its first block holds the root directory
//!
//! Layers (from bottom to top):
//! 1. Checksum: CRC32 and XOR fold over encoded records.
//! 2. Records: byte-exact superblock, inode and directory entry codecs.
//! 3. Image: the whole image in memory, addressed through checked region accessors.
//! 4. Bitmap / Inode / Directory / File: allocation and record placement.
//! 5. FileSystem: building a fresh image and adding files to an existing one.
//!
//! Every mutation re-finalizes the checksums it touched, innermost records
//! first and the superblock last, before the image is handed back for persisting.

mod config;
mod checksum;
mod structs;
mod image;
mod superblock;
mod bitmap;
mod inode;
mod directory;
mod file;
mod fs;
mod storage;
mod error;

pub use config::*;
pub use checksum::{crc32, xor8};
pub use structs::*;
pub use image::Image;
pub use superblock::*;
pub use bitmap::{count_free, find_and_reserve, set_bit, test_bit};
pub use inode::*;
pub use directory::*;
pub use file::*;
pub use fs::*;
pub use storage::*;
pub use error::FsError as Error;
pub use error::Result;
