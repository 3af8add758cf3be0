//! In-memory image: one byte buffer addressed only through bounds-checked
//! block and region accessors.

use std::ops::Range;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::SuperBlock;

#[derive(Debug, Clone)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    pub fn zeroed(num_blocks: u64) -> Self {
        Self {
            bytes: vec![0u8; num_blocks as usize * BLOCK_SIZE],
        }
    }

    /// Wraps raw image bytes. The length must be a whole number of blocks.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < BLOCK_SIZE || bytes.len() % BLOCK_SIZE != 0 {
            return Err(FsError::InvalidImage(format!(
                "image length {} is not a whole number of {}-byte blocks",
                bytes.len(),
                BLOCK_SIZE
            )));
        }
        Ok(Self { bytes })
    }

    pub fn num_blocks(&self) -> u64 {
        (self.bytes.len() / BLOCK_SIZE) as u64
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn range(&self, block_id: u64, offset: usize, len: usize) -> Result<Range<usize>> {
        if block_id >= self.num_blocks() || offset + len > BLOCK_SIZE {
            return Err(FsError::OutOfBounds(format!(
                "block {} [{}..{}) in a {}-block image",
                block_id,
                offset,
                offset + len,
                self.num_blocks()
            )));
        }
        let start = block_id as usize * BLOCK_SIZE + offset;
        Ok(start..start + len)
    }

    pub fn block(&self, block_id: u64) -> Result<&[u8]> {
        let r = self.range(block_id, 0, BLOCK_SIZE)?;
        Ok(&self.bytes[r])
    }

    pub fn block_mut(&mut self, block_id: u64) -> Result<&mut [u8]> {
        let r = self.range(block_id, 0, BLOCK_SIZE)?;
        Ok(&mut self.bytes[r])
    }

    pub fn inode_bitmap(&self, sb: &SuperBlock) -> Result<&[u8]> {
        self.block(sb.inode_bitmap_start)
    }

    pub fn inode_bitmap_mut(&mut self, sb: &SuperBlock) -> Result<&mut [u8]> {
        self.block_mut(sb.inode_bitmap_start)
    }

    pub fn data_bitmap(&self, sb: &SuperBlock) -> Result<&[u8]> {
        self.block(sb.data_bitmap_start)
    }

    pub fn data_bitmap_mut(&mut self, sb: &SuperBlock) -> Result<&mut [u8]> {
        self.block_mut(sb.data_bitmap_start)
    }

    /// Locates the table slot of a 1-based inode number.
    fn inode_range(&self, sb: &SuperBlock, inode_id: u32) -> Result<Range<usize>> {
        if inode_id == 0 || inode_id as u64 > sb.inode_count {
            return Err(FsError::OutOfBounds(format!(
                "inode {} outside 1..={}",
                inode_id, sb.inode_count
            )));
        }
        let per_block = (BLOCK_SIZE / INODE_SIZE) as u64;
        let slot = (inode_id - 1) as u64;
        let block_id = sb.inode_table_start + slot / per_block;
        let offset = (slot % per_block) as usize * INODE_SIZE;
        self.range(block_id, offset, INODE_SIZE)
    }

    pub fn inode_slot(&self, sb: &SuperBlock, inode_id: u32) -> Result<&[u8]> {
        let r = self.inode_range(sb, inode_id)?;
        Ok(&self.bytes[r])
    }

    pub fn inode_slot_mut(&mut self, sb: &SuperBlock, inode_id: u32) -> Result<&mut [u8]> {
        let r = self.inode_range(sb, inode_id)?;
        Ok(&mut self.bytes[r])
    }

    /// Absolute block number of a data block addressed relative to the data region.
    pub fn data_block_id(sb: &SuperBlock, relative: u64) -> Result<u64> {
        if relative >= sb.data_region_blocks {
            return Err(FsError::OutOfBounds(format!(
                "data block {} outside a {}-block region",
                relative, sb.data_region_blocks
            )));
        }
        Ok(sb.data_region_start + relative)
    }

    /// A data region block by absolute block number, rejecting metadata blocks.
    pub fn data_block(&self, sb: &SuperBlock, block_id: u64) -> Result<&[u8]> {
        Self::check_data_block(sb, block_id)?;
        self.block(block_id)
    }

    pub fn data_block_mut(&mut self, sb: &SuperBlock, block_id: u64) -> Result<&mut [u8]> {
        Self::check_data_block(sb, block_id)?;
        self.block_mut(block_id)
    }

    fn check_data_block(sb: &SuperBlock, block_id: u64) -> Result<()> {
        if block_id < sb.data_region_start {
            return Err(FsError::OutOfBounds(format!(
                "block {} lies before the data region at {}",
                block_id, sb.data_region_start
            )));
        }
        Self::data_block_id(sb, block_id - sb.data_region_start).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superblock::Layout;

    #[test]
    fn rejects_partial_blocks() {
        assert!(matches!(
            Image::from_bytes(vec![0u8; BLOCK_SIZE + 1]),
            Err(FsError::InvalidImage(_))
        ));
        assert!(matches!(Image::from_bytes(Vec::new()), Err(FsError::InvalidImage(_))));
        assert_eq!(Image::from_bytes(vec![0u8; BLOCK_SIZE * 3]).unwrap().num_blocks(), 3);
    }

    #[test]
    fn block_access_is_bounds_checked() {
        let mut img = Image::zeroed(4);
        assert!(img.block(3).is_ok());
        assert!(matches!(img.block(4), Err(FsError::OutOfBounds(_))));
        img.block_mut(2).unwrap()[0] = 0xFF;
        assert_eq!(img.as_bytes()[2 * BLOCK_SIZE], 0xFF);
    }

    #[test]
    fn inode_slots_map_to_table() {
        let layout = Layout::new(180, 128).unwrap();
        let sb = SuperBlock::new(&layout, 0);
        let mut img = Image::zeroed(layout.total_blocks);

        img.inode_slot_mut(&sb, 1).unwrap()[0] = 1;
        img.inode_slot_mut(&sb, 33).unwrap()[0] = 33;
        assert_eq!(img.block(3).unwrap()[0], 1);
        // 32 inodes per block, inode 33 opens the second table block
        assert_eq!(img.block(4).unwrap()[0], 33);

        assert!(img.inode_slot(&sb, 0).is_err());
        assert!(img.inode_slot(&sb, 129).is_err());
        assert!(img.inode_slot(&sb, 128).is_ok());
    }

    #[test]
    fn data_blocks_stay_in_region() {
        let layout = Layout::new(180, 128).unwrap();
        let sb = SuperBlock::new(&layout, 0);
        let img = Image::zeroed(layout.total_blocks);
        assert_eq!(Image::data_block_id(&sb, 0).unwrap(), 7);
        assert!(Image::data_block_id(&sb, 38).is_err());
        assert!(img.data_block(&sb, 6).is_err());
        assert!(img.data_block(&sb, 44).is_ok());
        assert!(img.data_block(&sb, 45).is_err());
    }
}
