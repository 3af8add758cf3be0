//! Geometry derivation and superblock placement in block 0.

use log::debug;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::image::Image;
use crate::structs::SuperBlock;

/// Block geometry derived from the build parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub size_kib: u64,
    pub inode_count: u64,
    pub total_blocks: u64,
    pub inode_table_blocks: u64,
    pub data_region_start: u64,
    pub data_region_blocks: u64,
}

impl Layout {
    pub fn new(size_kib: u64, inode_count: u64) -> Result<Self> {
        if !(MIN_SIZE_KIB..=MAX_SIZE_KIB).contains(&size_kib) {
            return Err(FsError::SizeOutOfRange(size_kib));
        }
        if size_kib % SIZE_KIB_ALIGN != 0 {
            return Err(FsError::SizeNotAligned(size_kib));
        }
        if !(MIN_INODES..=MAX_INODES).contains(&inode_count) {
            return Err(FsError::InodeCountOutOfRange(inode_count));
        }

        let total_blocks = size_kib * 1024 / BLOCK_SIZE as u64;
        let inode_table_blocks = inode_table_blocks(inode_count);
        let data_region_start = INODE_TABLE_START + inode_table_blocks;
        if total_blocks <= data_region_start {
            return Err(FsError::NoDataRegion);
        }

        Ok(Self {
            size_kib,
            inode_count,
            total_blocks,
            inode_table_blocks,
            data_region_start,
            data_region_blocks: total_blocks - data_region_start,
        })
    }
}

fn inode_table_blocks(inode_count: u64) -> u64 {
    (inode_count * INODE_SIZE as u64).div_ceil(BLOCK_SIZE as u64)
}

impl SuperBlock {
    /// Superblock for a fresh image, checksum not yet finalized.
    pub fn new(layout: &Layout, mtime_epoch: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            block_size: BLOCK_SIZE as u32,
            total_blocks: layout.total_blocks,
            inode_count: layout.inode_count,
            inode_bitmap_start: INODE_BITMAP_START,
            inode_bitmap_blocks: INODE_BITMAP_BLOCKS,
            data_bitmap_start: DATA_BITMAP_START,
            data_bitmap_blocks: DATA_BITMAP_BLOCKS,
            inode_table_start: INODE_TABLE_START,
            inode_table_blocks: layout.inode_table_blocks,
            data_region_start: layout.data_region_start,
            data_region_blocks: layout.data_region_blocks,
            root_inode: ROOT_INODE_ID as u64,
            mtime_epoch,
            flags: 0,
            checksum: 0,
        }
    }
}

fn invalid(msg: String) -> FsError {
    FsError::InvalidImage(msg)
}

pub fn read_superblock(image: &Image) -> Result<SuperBlock> {
    let superblock = SuperBlock::decode(image.block(SUPERBLOCK_ID)?);

    if superblock.magic != MAGIC {
        return Err(invalid(format!("bad magic number {:#010x}", superblock.magic)));
    }
    if superblock.block_size != BLOCK_SIZE as u32 {
        return Err(invalid(format!("unsupported block size {}", superblock.block_size)));
    }
    if superblock.total_blocks != image.num_blocks() {
        return Err(invalid(format!(
            "superblock claims {} blocks, image holds {}",
            superblock.total_blocks,
            image.num_blocks()
        )));
    }
    let fixed = superblock.inode_bitmap_start == INODE_BITMAP_START
        && superblock.inode_bitmap_blocks == INODE_BITMAP_BLOCKS
        && superblock.data_bitmap_start == DATA_BITMAP_START
        && superblock.data_bitmap_blocks == DATA_BITMAP_BLOCKS
        && superblock.inode_table_start == INODE_TABLE_START
        && superblock.root_inode == ROOT_INODE_ID as u64;
    if !fixed {
        return Err(invalid("region placement does not match the fixed layout".into()));
    }
    // Both bitmaps are a single block.
    let bitmap_bits = (BLOCK_SIZE * 8) as u64;
    if superblock.inode_count == 0 || superblock.inode_count > bitmap_bits {
        return Err(invalid(format!("inode count {} not addressable", superblock.inode_count)));
    }
    let data_region_end = superblock
        .data_region_start
        .checked_add(superblock.data_region_blocks);
    if superblock.inode_table_blocks != inode_table_blocks(superblock.inode_count)
        || superblock.data_region_start != INODE_TABLE_START + superblock.inode_table_blocks
        || data_region_end != Some(superblock.total_blocks)
        || superblock.data_region_blocks == 0
        || superblock.data_region_blocks > bitmap_bits
    {
        return Err(invalid("inconsistent region sizes".into()));
    }

    debug!("superblock: {:?}", superblock);
    Ok(superblock)
}

/// Writes the encoded superblock over block 0, bytes past the record are zeroed.
pub fn write_superblock(image: &mut Image, superblock: &SuperBlock) -> Result<()> {
    let buf = superblock.encode();
    image.block_mut(SUPERBLOCK_ID)?.copy_from_slice(&buf[..]);
    Ok(())
}
