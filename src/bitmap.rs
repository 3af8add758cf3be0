//! Management of data bitmap and inode bitmap.
//! Bits are byte-major, bit 0 of each byte is the lowest-numbered item, set means allocated.
//! Inode bit `i` stands for inode number `i + 1`; data bit `i` for block `data_region_start + i`.

use log::debug;

use crate::error::{FsError, Result};
use crate::image::Image;
use crate::structs::SuperBlock;

fn bit_pos(item_id: usize) -> (usize, u8) {
    (item_id / 8, 1 << (item_id % 8))
}

pub fn test_bit(bitmap: &[u8], item_id: usize) -> bool {
    let (byte, mask) = bit_pos(item_id);
    bitmap.get(byte).is_some_and(|b| b & mask != 0)
}

pub fn set_bit(bitmap: &mut [u8], item_id: usize) {
    let (byte, mask) = bit_pos(item_id);
    if let Some(b) = bitmap.get_mut(byte) {
        *b |= mask;
    }
}

/// Finds the lowest clear bit below `capacity` and sets it in the same step.
/// Returns the 0-based item ID, or None when every bit in range is taken.
pub fn find_and_reserve(bitmap: &mut [u8], capacity: usize) -> Option<usize> {
    let capacity = capacity.min(bitmap.len() * 8);
    for (j, byte) in bitmap.iter_mut().enumerate() {
        if *byte == 0xFF {
            continue;
        }
        for k in 0..8 {
            let current_item_id = j * 8 + k;
            if current_item_id >= capacity {
                return None;
            }
            if *byte & (1 << k) == 0 {
                *byte |= 1 << k;
                return Some(current_item_id);
            }
        }
    }
    None
}

/// Number of clear bits below `capacity`.
pub fn count_free(bitmap: &[u8], capacity: usize) -> usize {
    let capacity = capacity.min(bitmap.len() * 8);
    (0..capacity).filter(|&i| !test_bit(bitmap, i)).count()
}

// Image-level wrappers.

fn inode_capacity(superblock: &SuperBlock) -> usize {
    superblock.inode_count as usize
}

fn data_capacity(superblock: &SuperBlock) -> usize {
    superblock.data_region_blocks as usize
}

/// Allocates a new inode, setting its bit in the inode bitmap.
/// Returns the 1-based inode number.
pub fn alloc_inode_id(image: &mut Image, superblock: &SuperBlock) -> Result<u32> {
    let bitmap = image.inode_bitmap_mut(superblock)?;
    let bit =
        find_and_reserve(bitmap, inode_capacity(superblock)).ok_or(FsError::NoFreeInodes)?;
    debug!("reserved inode {}", bit + 1);
    Ok(bit as u32 + 1)
}

/// Allocates a new data block, setting its bit in the data bitmap, and zeroes it.
/// Returns the absolute block number.
pub fn alloc_data_block(image: &mut Image, superblock: &SuperBlock) -> Result<u32> {
    let bitmap = image.data_bitmap_mut(superblock)?;
    let relative =
        find_and_reserve(bitmap, data_capacity(superblock)).ok_or(FsError::NoFreeBlocks)?;
    let block_id = Image::data_block_id(superblock, relative as u64)?;
    image.data_block_mut(superblock, block_id)?.fill(0);
    debug!("reserved data block {} (region index {})", block_id, relative);
    Ok(block_id as u32)
}

pub fn free_inodes(image: &Image, superblock: &SuperBlock) -> Result<usize> {
    Ok(count_free(image.inode_bitmap(superblock)?, inode_capacity(superblock)))
}

pub fn free_data_blocks(image: &Image, superblock: &SuperBlock) -> Result<usize> {
    Ok(count_free(image.data_bitmap(superblock)?, data_capacity(superblock)))
}

pub fn inode_allocated(image: &Image, superblock: &SuperBlock, inode_id: u32) -> Result<bool> {
    if inode_id == 0 || inode_id as usize > inode_capacity(superblock) {
        return Ok(false);
    }
    Ok(test_bit(image.inode_bitmap(superblock)?, inode_id as usize - 1))
}
