//! Common utilities for tests
#![allow(dead_code)]

use minivsfs::{crc32, xor8, FileSystem, Layout, BLOCK_SIZE};

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

pub const BUILD_TIME: u64 = 1_700_000_000;

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr) => {
        println!("{}[test] {}{}", crate::common::ORANGE, $msg, crate::common::RESET)
    };
    ($msg:expr, $($arg:tt)*) => {
        println!(
            "{}[test] {}{}",
            crate::common::ORANGE,
            format!($msg, $($arg)*),
            crate::common::RESET
        )
    };
}

pub fn fresh_fs(size_kib: u64, inodes: u64) -> FileSystem {
    let layout = Layout::new(size_kib, inodes).unwrap();
    FileSystem::format(&layout, BUILD_TIME).unwrap()
}

fn le_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

fn le_u64(buf: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

pub fn block(bytes: &[u8], id: u64) -> &[u8] {
    let start = id as usize * BLOCK_SIZE;
    &bytes[start..start + BLOCK_SIZE]
}

/// Recomputes every checksum straight from the raw bytes, without the crate's codecs.
pub fn assert_checksums_ok(bytes: &[u8]) {
    let sb = block(bytes, 0);
    let mut tmp = sb[..BLOCK_SIZE - 4].to_vec();
    tmp[112..116].fill(0);
    assert_eq!(crc32(&tmp), le_u32(sb, 112), "superblock checksum");

    let inode_count = le_u64(sb, 20) as usize;
    let inode_table_start = le_u64(sb, 60);
    let inode_bitmap = block(bytes, 1);
    let table_start = inode_table_start as usize * BLOCK_SIZE;
    for i in 0..inode_count {
        if inode_bitmap[i / 8] & (1 << (i % 8)) == 0 {
            continue;
        }
        let rec = &bytes[table_start + i * 128..table_start + (i + 1) * 128];
        assert_eq!(crc32(&rec[..120]), le_u32(rec, 120), "inode {} checksum", i + 1);
        assert_eq!(le_u32(rec, 124), 0, "inode {} crc high half", i + 1);
    }

    let root = &bytes[table_start..table_start + 128];
    let root_block = block(bytes, le_u32(root, 44) as u64);
    for slot in 0..BLOCK_SIZE / 64 {
        let e = &root_block[slot * 64..(slot + 1) * 64];
        if le_u32(e, 0) == 0 {
            continue;
        }
        assert_eq!(xor8(&e[..63]), e[63], "dirent slot {} checksum", slot);
    }
}
