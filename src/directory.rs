//! Directory entries inside a directory's single data block.
//! A directory never grows past its `direct[0]` block, so it holds at most
//! NUM_ENTRY_PER_BLOCK entries including "." and "..".

use log::debug;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::image::Image;
use crate::structs::{DirEntry, FileType, Inode, SuperBlock};

/// The one block holding a directory's entries.
pub fn dir_block(superblock: &SuperBlock, dir_inode: &Inode) -> Result<u64> {
    if dir_inode.file_type() != Some(FileType::Directory) {
        return Err(FsError::InvalidImage(format!(
            "inode with mode {:#o} is not a directory",
            dir_inode.mode
        )));
    }
    let block_id = dir_inode.direct_ptrs[0] as u64;
    // Validates that the block lies inside the data region.
    let relative = block_id.checked_sub(superblock.data_region_start).ok_or_else(|| {
        FsError::InvalidImage(format!("directory block {} outside the data region", block_id))
    })?;
    Image::data_block_id(superblock, relative)
}

pub fn read_entry(
    image: &Image,
    superblock: &SuperBlock,
    block_id: u64,
    slot: usize,
) -> Result<DirEntry> {
    let block = image.data_block(superblock, block_id)?;
    let off = slot * DIR_ENTRY_SIZE;
    let raw = block
        .get(off..off + DIR_ENTRY_SIZE)
        .ok_or_else(|| FsError::OutOfBounds(format!("directory slot {}", slot)))?;
    Ok(DirEntry::decode(raw))
}

/// Stores the entry as is. The caller finalizes its checksum first.
pub fn write_entry(
    image: &mut Image,
    superblock: &SuperBlock,
    block_id: u64,
    slot: usize,
    entry: &DirEntry,
) -> Result<()> {
    let block = image.data_block_mut(superblock, block_id)?;
    let off = slot * DIR_ENTRY_SIZE;
    let raw = block
        .get_mut(off..off + DIR_ENTRY_SIZE)
        .ok_or_else(|| FsError::OutOfBounds(format!("directory slot {}", slot)))?;
    raw.copy_from_slice(&entry.encode());
    Ok(())
}

/// First slot whose inode number is 0, if any.
pub fn dir_free_slot(
    image: &Image,
    superblock: &SuperBlock,
    dir_inode: &Inode,
) -> Result<Option<usize>> {
    let block_id = dir_block(superblock, dir_inode)?;
    for slot in 0..NUM_ENTRY_PER_BLOCK {
        if read_entry(image, superblock, block_id, slot)?.is_free() {
            return Ok(Some(slot));
        }
    }
    Ok(None)
}

/// Add a new directory entry to a directory inode.
/// Would not increase links count of the directory, which is caller's responsibility.
/// Returns the slot the entry landed in.
pub fn dir_add_entry(
    image: &mut Image,
    superblock: &SuperBlock,
    dir_inode: &Inode,
    entry: &DirEntry,
) -> Result<usize> {
    let block_id = dir_block(superblock, dir_inode)?;
    let slot = dir_free_slot(image, superblock, dir_inode)?.ok_or(FsError::DirectoryFull)?;
    write_entry(image, superblock, block_id, slot, entry)?;
    debug!(
        "entry {:?} -> inode {} in block {} slot {}",
        String::from_utf8_lossy(entry.name_bytes()),
        entry.inode_id,
        block_id,
        slot
    );
    Ok(slot)
}

/// Live entries with their slot numbers, in slot order.
pub fn read_dir(
    image: &Image,
    superblock: &SuperBlock,
    dir_inode: &Inode,
) -> Result<Vec<(usize, DirEntry)>> {
    let block_id = dir_block(superblock, dir_inode)?;
    let mut entries = vec![];
    for slot in 0..NUM_ENTRY_PER_BLOCK {
        let entry = read_entry(image, superblock, block_id, slot)?;
        if !entry.is_free() {
            entries.push((slot, entry));
        }
    }
    Ok(entries)
}

/// Query inode id of an entry by name. Returns the first match.
pub fn dir_lookup(
    image: &Image,
    superblock: &SuperBlock,
    dir_inode: &Inode,
    name: &[u8],
) -> Result<Option<u32>> {
    Ok(read_dir(image, superblock, dir_inode)?
        .into_iter()
        .find(|(_, e)| e.name_eq(name))
        .map(|(_, e)| e.inode_id))
}
