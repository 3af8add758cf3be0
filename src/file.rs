//! Copying file content in and out of direct blocks.

use crate::config::*;
use crate::error::{FsError, Result};
use crate::image::Image;
use crate::structs::{Inode, SuperBlock};

/// Blocks a file of `size` bytes occupies. An empty file still takes one block
/// so that every used inode carries a direct pointer.
pub fn blocks_needed(size: u64) -> usize {
    (size.div_ceil(BLOCK_SIZE as u64) as usize).max(1)
}

/// Writes `data` into `blocks` in order, zero-padding the final block.
pub fn fwrite(
    image: &mut Image,
    superblock: &SuperBlock,
    blocks: &[u32],
    data: &[u8],
) -> Result<()> {
    if blocks.len() < blocks_needed(data.len() as u64) {
        return Err(FsError::OutOfBounds(format!(
            "{} bytes do not fit in {} blocks",
            data.len(),
            blocks.len()
        )));
    }
    let mut chunks = data.chunks(BLOCK_SIZE);
    for &block_id in blocks {
        let block = image.data_block_mut(superblock, block_id as u64)?;
        let chunk = chunks.next().unwrap_or(&[]);
        block[..chunk.len()].copy_from_slice(chunk);
        block[chunk.len()..].fill(0);
    }
    Ok(())
}

/// Reads the whole content of a file through its direct pointers.
pub fn fread(image: &Image, superblock: &SuperBlock, inode: &Inode) -> Result<Vec<u8>> {
    if inode.size > MAX_FILE_SIZE {
        return Err(FsError::InvalidImage(format!(
            "inode size {} exceeds direct blocks",
            inode.size
        )));
    }
    let mut buf = Vec::with_capacity(inode.size as usize);
    let mut remaining = inode.size as usize;
    for block_id in inode.blocks() {
        if remaining == 0 {
            break;
        }
        let block = image.data_block(superblock, block_id as u64)?;
        let n = remaining.min(BLOCK_SIZE);
        buf.extend_from_slice(&block[..n]);
        remaining -= n;
    }
    if remaining != 0 {
        return Err(FsError::InvalidImage(format!(
            "inode of {} bytes is missing direct blocks",
            inode.size
        )));
    }
    Ok(buf)
}
