//! The filesystem as a whole: formatting a fresh image, mounting an existing
//! one and adding files to its root directory.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use crate::bitmap::{self, alloc_data_block, alloc_inode_id, free_data_blocks, free_inodes};
use crate::config::*;
use crate::directory::{
    dir_add_entry, dir_block, dir_free_slot, dir_lookup, read_dir, write_entry,
};
use crate::error::{FsError, Result};
use crate::file::{blocks_needed, fread, fwrite};
use crate::image::Image;
use crate::inode::{get_inode, write_inode};
use crate::structs::*;
use crate::superblock::{read_superblock, write_superblock, Layout};

/// Seconds since the Unix epoch, 0 if the clock is before it.
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A record whose stored checksum does not match its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumMismatch {
    SuperBlock,
    Inode(u32),
    DirEntry { slot: usize },
}

/// A whole MiniVSFS image held in memory.
/// Nothing here touches the disk, persisting the bytes is up to the caller.
#[derive(Debug, Clone)]
pub struct FileSystem {
    image: Image,
    superblock: SuperBlock,
}

impl FileSystem {
    /// Builds a fresh image: superblock, both bitmaps with bit 0 reserved, the
    /// inode table holding the root directory, and the data region whose first
    /// block holds "." and "..".
    pub fn format(layout: &Layout, now: u64) -> Result<Self> {
        let mut superblock = SuperBlock::new(layout, now);
        let mut image = Image::zeroed(layout.total_blocks);

        bitmap::set_bit(image.inode_bitmap_mut(&superblock)?, 0);
        bitmap::set_bit(image.data_bitmap_mut(&superblock)?, 0);

        let root_block = layout.data_region_start;
        let mut root_inode =
            Inode::new(FileType::Directory, 2, BLOCK_SIZE as u64, now, &[root_block as u32]);
        let mut dot = DirEntry::new(ROOT_INODE_ID, FileType::Directory, DOT_NAME);
        let mut dotdot = DirEntry::new(ROOT_INODE_ID, FileType::Directory, DOTDOT_NAME);

        root_inode.finalize_checksum();
        dot.finalize_checksum();
        dotdot.finalize_checksum();
        write_inode(&mut image, &superblock, ROOT_INODE_ID, &root_inode)?;
        write_entry(&mut image, &superblock, root_block, 0, &dot)?;
        write_entry(&mut image, &superblock, root_block, 1, &dotdot)?;

        superblock.finalize_checksum();
        write_superblock(&mut image, &superblock)?;

        info!(
            "formatted {} blocks: inode table {}+{}, data region {}+{}",
            layout.total_blocks,
            INODE_TABLE_START,
            layout.inode_table_blocks,
            layout.data_region_start,
            layout.data_region_blocks
        );
        Ok(Self { image, superblock })
    }

    /// Loads an existing image. Only magic and geometry are enforced,
    /// stale checksums are reported as warnings.
    pub fn mount(bytes: Vec<u8>) -> Result<Self> {
        let image = Image::from_bytes(bytes)?;
        let superblock = read_superblock(&image)?;
        let fs = Self { image, superblock };

        match fs.verify() {
            Ok(mismatches) => {
                for m in mismatches {
                    warn!("checksum mismatch on load: {:?}", m);
                }
            }
            Err(e) => warn!("could not verify image on load: {}", e),
        }
        Ok(fs)
    }

    /// Adds a regular file to the root directory and returns its inode number.
    ///
    /// Every precondition is checked before anything is reserved, so on error
    /// the in-memory image is left exactly as it was.
    pub fn add_file(&mut self, name: &[u8], data: &[u8], now: u64) -> Result<u32> {
        let size = data.len() as u64;
        if size > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge { size });
        }
        if name.is_empty() || name.contains(&0) || name.contains(&b'/') {
            return Err(FsError::InvalidFileName);
        }

        let sb = self.superblock;
        let needed = blocks_needed(size);
        if free_inodes(&self.image, &sb)? == 0 {
            return Err(FsError::NoFreeInodes);
        }
        if free_data_blocks(&self.image, &sb)? < needed {
            return Err(FsError::NoFreeBlocks);
        }
        let mut root_inode = get_inode(&self.image, &sb, ROOT_INODE_ID)?;
        if dir_free_slot(&self.image, &sb, &root_inode)?.is_none() {
            return Err(FsError::DirectoryFull);
        }
        let root_links = root_inode.links.checked_add(1).ok_or_else(|| {
            FsError::InvalidImage(format!("root link count {} cannot grow", root_inode.links))
        })?;

        let inode_id = alloc_inode_id(&mut self.image, &sb)?;
        let mut blocks = Vec::with_capacity(needed);
        for _ in 0..needed {
            blocks.push(alloc_data_block(&mut self.image, &sb)?);
        }
        fwrite(&mut self.image, &sb, &blocks, data)?;

        let mut inode = Inode::new(FileType::Regular, 1, size, now, &blocks);
        let mut entry = DirEntry::new(inode_id, FileType::Regular, name);
        root_inode.links = root_links;

        // Innermost records first, superblock last.
        inode.finalize_checksum();
        write_inode(&mut self.image, &sb, inode_id, &inode)?;
        root_inode.finalize_checksum();
        write_inode(&mut self.image, &sb, ROOT_INODE_ID, &root_inode)?;
        entry.finalize_checksum();
        dir_add_entry(&mut self.image, &sb, &root_inode, &entry)?;
        self.superblock.finalize_checksum();
        write_superblock(&mut self.image, &self.superblock)?;

        info!(
            "added {:?}: inode {}, {} bytes in blocks {:?}",
            String::from_utf8_lossy(entry.name_bytes()),
            inode_id,
            size,
            blocks
        );
        Ok(inode_id)
    }

    /// Recomputes every checksum in the image: the superblock, each allocated
    /// inode and each live entry of the root directory.
    pub fn verify(&self) -> Result<Vec<ChecksumMismatch>> {
        let sb = &self.superblock;
        let mut mismatches = vec![];

        let block0 = self.image.block(SUPERBLOCK_ID)?;
        if superblock_block_checksum(block0) != SuperBlock::decode(block0).checksum {
            mismatches.push(ChecksumMismatch::SuperBlock);
        }

        for inode_id in 1..=sb.inode_count as u32 {
            if !bitmap::inode_allocated(&self.image, sb, inode_id)? {
                continue;
            }
            if !get_inode(&self.image, sb, inode_id)?.checksum_ok() {
                mismatches.push(ChecksumMismatch::Inode(inode_id));
            }
        }

        let root_inode = get_inode(&self.image, sb, ROOT_INODE_ID)?;
        for (slot, entry) in read_dir(&self.image, sb, &root_inode)? {
            if !entry.checksum_ok() {
                mismatches.push(ChecksumMismatch::DirEntry { slot });
            }
        }

        debug!("verified image, {} mismatches", mismatches.len());
        Ok(mismatches)
    }

    /// Live entries of the root directory, "." and ".." included.
    pub fn read_dir(&self) -> Result<Vec<DirEntry>> {
        let root_inode = self.get_inode(ROOT_INODE_ID)?;
        Ok(read_dir(&self.image, &self.superblock, &root_inode)?
            .into_iter()
            .map(|(_, e)| e)
            .collect())
    }

    pub fn lookup(&self, name: &[u8]) -> Result<Option<u32>> {
        let root_inode = self.get_inode(ROOT_INODE_ID)?;
        dir_lookup(&self.image, &self.superblock, &root_inode, name)
    }

    pub fn get_inode(&self, inode_id: u32) -> Result<Inode> {
        get_inode(&self.image, &self.superblock, inode_id)
    }

    pub fn read_file(&self, inode_id: u32) -> Result<Vec<u8>> {
        let inode = self.get_inode(inode_id)?;
        fread(&self.image, &self.superblock, &inode)
    }

    /// Absolute block number of the root directory's entry block.
    pub fn root_dir_block(&self) -> Result<u64> {
        dir_block(&self.superblock, &self.get_inode(ROOT_INODE_ID)?)
    }

    pub fn free_inodes(&self) -> Result<usize> {
        free_inodes(&self.image, &self.superblock)
    }

    pub fn free_data_blocks(&self) -> Result<usize> {
        free_data_blocks(&self.image, &self.superblock)
    }

    pub fn root_inode_id(&self) -> u32 {
        ROOT_INODE_ID
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.image.into_bytes()
    }
}
