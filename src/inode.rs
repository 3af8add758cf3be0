//! Reading and writing records of the inode table.

use crate::error::Result;
use crate::image::Image;
use crate::structs::{Inode, SuperBlock};

pub fn get_inode(image: &Image, superblock: &SuperBlock, inode_id: u32) -> Result<Inode> {
    Ok(Inode::decode(image.inode_slot(superblock, inode_id)?))
}

/// Stores the inode as is. The caller finalizes its checksum first.
pub fn write_inode(
    image: &mut Image,
    superblock: &SuperBlock,
    inode_id: u32,
    inode: &Inode,
) -> Result<()> {
    image.inode_slot_mut(superblock, inode_id)?.copy_from_slice(&inode.encode());
    Ok(())
}
