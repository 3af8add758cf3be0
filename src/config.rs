pub const MAGIC: u32 = 0x4D565346; // "MVSF"
pub const VERSION: u32 = 1;

pub const BLOCK_SIZE: usize = 4096;
pub const SUPERBLOCK_ID: u64 = 0; // Block ID for the superblock
pub const SUPERBLOCK_SIZE: usize = 116; // Encoded superblock fields, rest of block 0 is zero
pub const ROOT_INODE_ID: u32 = 1; // Inode numbers are 1-based, 0 is never valid

// Fixed region placement, one block each for both bitmaps.
pub const INODE_BITMAP_START: u64 = 1;
pub const INODE_BITMAP_BLOCKS: u64 = 1;
pub const DATA_BITMAP_START: u64 = 2;
pub const DATA_BITMAP_BLOCKS: u64 = 1;
pub const INODE_TABLE_START: u64 = 3;

pub const INODE_SIZE: usize = 128;
pub const INODE_CRC_OFFSET: usize = 120; // CRC covers bytes [0, 120)
pub const NUM_DIRECT_PTRS: usize = 12;
pub const MAX_FILE_SIZE: u64 = (NUM_DIRECT_PTRS * BLOCK_SIZE) as u64;

pub const DIR_ENTRY_SIZE: usize = 64;
pub const DIR_NAME_FIELD_LEN: usize = 58;
pub const MAX_FILE_NAME_LEN: usize = DIR_NAME_FIELD_LEN - 1; // Always null-terminated
pub const DIR_CHECKSUM_OFFSET: usize = DIR_ENTRY_SIZE - 1; // XOR covers bytes [0, 63)
pub const NUM_ENTRY_PER_BLOCK: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;
pub const DOT_NAME: &[u8; 1] = b".";
pub const DOTDOT_NAME: &[u8; 2] = b"..";

pub const S_IFDIR: u16 = 0o040000;
pub const S_IFREG: u16 = 0o100000;
pub const PROJECT_ID: u32 = 3;

// Accepted build parameters.
pub const MIN_SIZE_KIB: u64 = 180;
pub const MAX_SIZE_KIB: u64 = 4096;
pub const SIZE_KIB_ALIGN: u64 = 4;
pub const MIN_INODES: u64 = 128;
pub const MAX_INODES: u64 = 512;
