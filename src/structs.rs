//! On-disk records and their byte-exact codecs.
//!
//! Every record is encoded field by field at fixed little-endian offsets,
//! never through the in-memory layout of the Rust struct.

use crate::checksum::{crc32, xor8};
use crate::config::*;

fn get_u16(buf: &[u8], off: usize) -> u16 {
    let mut b = [0u8; 2];
    b.copy_from_slice(&buf[off..off + 2]);
    u16::from_le_bytes(b)
}

fn get_u32(buf: &[u8], off: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[off..off + 4]);
    u32::from_le_bytes(b)
}

fn get_u64(buf: &[u8], off: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[off..off + 8]);
    u64::from_le_bytes(b)
}

fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], off: usize, v: u64) {
    buf[off..off + 8].copy_from_slice(&v.to_le_bytes());
}

const SB_CHECKSUM_OFFSET: usize = SUPERBLOCK_SIZE - 4;
// CRC input is the whole block minus its last four bytes.
const SB_CRC_LEN: usize = BLOCK_SIZE - 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub magic: u32,
    pub version: u32,
    pub block_size: u32,
    pub total_blocks: u64,
    pub inode_count: u64,
    pub inode_bitmap_start: u64,
    pub inode_bitmap_blocks: u64,
    pub data_bitmap_start: u64,
    pub data_bitmap_blocks: u64,
    pub inode_table_start: u64,
    pub inode_table_blocks: u64,
    pub data_region_start: u64,
    pub data_region_blocks: u64,
    pub root_inode: u64,
    pub mtime_epoch: u64,
    pub flags: u32,
    pub checksum: u32, // Must stay the last field
}

impl SuperBlock {
    /// Encodes into a full block, bytes past the record are zero.
    pub fn encode(&self) -> Box<[u8; BLOCK_SIZE]> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        put_u32(&mut buf[..], 0, self.magic);
        put_u32(&mut buf[..], 4, self.version);
        put_u32(&mut buf[..], 8, self.block_size);
        put_u64(&mut buf[..], 12, self.total_blocks);
        put_u64(&mut buf[..], 20, self.inode_count);
        put_u64(&mut buf[..], 28, self.inode_bitmap_start);
        put_u64(&mut buf[..], 36, self.inode_bitmap_blocks);
        put_u64(&mut buf[..], 44, self.data_bitmap_start);
        put_u64(&mut buf[..], 52, self.data_bitmap_blocks);
        put_u64(&mut buf[..], 60, self.inode_table_start);
        put_u64(&mut buf[..], 68, self.inode_table_blocks);
        put_u64(&mut buf[..], 76, self.data_region_start);
        put_u64(&mut buf[..], 84, self.data_region_blocks);
        put_u64(&mut buf[..], 92, self.root_inode);
        put_u64(&mut buf[..], 100, self.mtime_epoch);
        put_u32(&mut buf[..], 108, self.flags);
        put_u32(&mut buf[..], SB_CHECKSUM_OFFSET, self.checksum);
        buf
    }

    /// Decodes from the first bytes of block 0.
    /// `block` must hold at least SUPERBLOCK_SIZE bytes.
    pub fn decode(block: &[u8]) -> Self {
        Self {
            magic: get_u32(block, 0),
            version: get_u32(block, 4),
            block_size: get_u32(block, 8),
            total_blocks: get_u64(block, 12),
            inode_count: get_u64(block, 20),
            inode_bitmap_start: get_u64(block, 28),
            inode_bitmap_blocks: get_u64(block, 36),
            data_bitmap_start: get_u64(block, 44),
            data_bitmap_blocks: get_u64(block, 52),
            inode_table_start: get_u64(block, 60),
            inode_table_blocks: get_u64(block, 68),
            data_region_start: get_u64(block, 76),
            data_region_blocks: get_u64(block, 84),
            root_inode: get_u64(block, 92),
            mtime_epoch: get_u64(block, 100),
            flags: get_u32(block, 108),
            checksum: get_u32(block, SB_CHECKSUM_OFFSET),
        }
    }

    /// Must be the last thing done to an image before it is persisted.
    pub fn finalize_checksum(&mut self) -> u32 {
        self.checksum = 0;
        let block = self.encode();
        self.checksum = superblock_block_checksum(&block[..]);
        self.checksum
    }
}

/// CRC of a raw block 0 as it sits in an image, with the checksum field taken as zero.
pub fn superblock_block_checksum(block: &[u8]) -> u32 {
    let mut tmp = [0u8; SB_CRC_LEN];
    tmp.copy_from_slice(&block[..SB_CRC_LEN]);
    tmp[SB_CHECKSUM_OFFSET..SUPERBLOCK_SIZE].fill(0);
    crc32(&tmp)
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular = 1,
    Directory = 2,
}

impl FileType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(FileType::Regular),
            2 => Some(FileType::Directory),
            _ => None,
        }
    }

    pub fn mode(self) -> u16 {
        match self {
            FileType::Regular => S_IFREG,
            FileType::Directory => S_IFDIR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub mode: u16,
    pub links: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
    pub direct_ptrs: [u32; NUM_DIRECT_PTRS], // Absolute block numbers, 0 = unused
    pub reserved: [u32; 3],
    pub proj_id: u32,
    pub uid16_gid16: u32,
    pub xattr_ptr: u64,
    pub crc: u64, // Low 32 bits carry the CRC, high 32 bits stay zero
}

impl Inode {
    pub const NULL: Self = Self {
        mode: 0,
        links: 0,
        uid: 0,
        gid: 0,
        size: 0,
        atime: 0,
        mtime: 0,
        ctime: 0,
        direct_ptrs: [0; NUM_DIRECT_PTRS],
        reserved: [0; 3],
        proj_id: 0,
        uid16_gid16: 0,
        xattr_ptr: 0,
        crc: 0,
    };

    /// A fresh inode: everything zero except what the caller supplies.
    /// `direct` longer than NUM_DIRECT_PTRS is cut off.
    pub fn new(ftype: FileType, links: u16, size: u64, now: u64, direct: &[u32]) -> Self {
        let mut inode = Self::NULL;
        inode.mode = ftype.mode();
        inode.links = links;
        inode.size = size;
        inode.atime = now;
        inode.mtime = now;
        inode.ctime = now;
        let n = direct.len().min(NUM_DIRECT_PTRS);
        inode.direct_ptrs[..n].copy_from_slice(&direct[..n]);
        inode.proj_id = PROJECT_ID;
        inode
    }

    pub fn file_type(&self) -> Option<FileType> {
        match self.mode & 0o170000 {
            S_IFREG => Some(FileType::Regular),
            S_IFDIR => Some(FileType::Directory),
            _ => None,
        }
    }

    /// Direct pointers in use, in file order.
    pub fn blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct_ptrs.iter().copied().take_while(|&b| b != 0)
    }

    pub fn encode(&self) -> [u8; INODE_SIZE] {
        let mut buf = [0u8; INODE_SIZE];
        put_u16(&mut buf, 0, self.mode);
        put_u16(&mut buf, 2, self.links);
        put_u32(&mut buf, 4, self.uid);
        put_u32(&mut buf, 8, self.gid);
        put_u64(&mut buf, 12, self.size);
        put_u64(&mut buf, 20, self.atime);
        put_u64(&mut buf, 28, self.mtime);
        put_u64(&mut buf, 36, self.ctime);
        for (i, ptr) in self.direct_ptrs.iter().enumerate() {
            put_u32(&mut buf, 44 + i * 4, *ptr);
        }
        for (i, r) in self.reserved.iter().enumerate() {
            put_u32(&mut buf, 92 + i * 4, *r);
        }
        put_u32(&mut buf, 104, self.proj_id);
        put_u32(&mut buf, 108, self.uid16_gid16);
        put_u64(&mut buf, 112, self.xattr_ptr);
        put_u64(&mut buf, INODE_CRC_OFFSET, self.crc);
        buf
    }

    /// `buf` must hold at least INODE_SIZE bytes.
    pub fn decode(buf: &[u8]) -> Self {
        let mut direct_ptrs = [0u32; NUM_DIRECT_PTRS];
        for (i, ptr) in direct_ptrs.iter_mut().enumerate() {
            *ptr = get_u32(buf, 44 + i * 4);
        }
        Self {
            mode: get_u16(buf, 0),
            links: get_u16(buf, 2),
            uid: get_u32(buf, 4),
            gid: get_u32(buf, 8),
            size: get_u64(buf, 12),
            atime: get_u64(buf, 20),
            mtime: get_u64(buf, 28),
            ctime: get_u64(buf, 36),
            direct_ptrs,
            reserved: [get_u32(buf, 92), get_u32(buf, 96), get_u32(buf, 100)],
            proj_id: get_u32(buf, 104),
            uid16_gid16: get_u32(buf, 108),
            xattr_ptr: get_u64(buf, 112),
            crc: get_u64(buf, INODE_CRC_OFFSET),
        }
    }

    pub fn compute_checksum(&self) -> u32 {
        let buf = self.encode();
        crc32(&buf[..INODE_CRC_OFFSET])
    }

    pub fn finalize_checksum(&mut self) -> u32 {
        let c = self.compute_checksum();
        self.crc = c as u64;
        c
    }

    pub fn checksum_ok(&self) -> bool {
        self.crc == self.compute_checksum() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_id: u32, // 0 marks a free slot
    pub ftype: u8,
    pub name: [u8; DIR_NAME_FIELD_LEN],
    pub checksum: u8,
}

impl DirEntry {
    pub const NULL: Self = Self {
        inode_id: 0,
        ftype: 0,
        name: [0; DIR_NAME_FIELD_LEN],
        checksum: 0,
    };

    /// Names longer than MAX_FILE_NAME_LEN are truncated, the name field always
    /// keeps a trailing null.
    pub fn new(inode_id: u32, ftype: FileType, name: &[u8]) -> Self {
        let mut entry = Self::NULL;
        entry.inode_id = inode_id;
        entry.ftype = ftype as u8;
        let len = name.len().min(MAX_FILE_NAME_LEN);
        entry.name[..len].copy_from_slice(&name[..len]);
        entry
    }

    pub fn is_free(&self) -> bool {
        self.inode_id == 0
    }

    pub fn file_type(&self) -> Option<FileType> {
        FileType::from_u8(self.ftype)
    }

    /// Name bytes up to the first null.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&c| c == 0).unwrap_or(self.name.len());
        &self.name[..end]
    }

    pub fn name_eq(&self, name: &[u8]) -> bool {
        self.name_bytes() == name
    }

    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        put_u32(&mut buf, 0, self.inode_id);
        buf[4] = self.ftype;
        buf[5..DIR_CHECKSUM_OFFSET].copy_from_slice(&self.name);
        buf[DIR_CHECKSUM_OFFSET] = self.checksum;
        buf
    }

    /// `buf` must hold at least DIR_ENTRY_SIZE bytes.
    pub fn decode(buf: &[u8]) -> Self {
        let mut name = [0u8; DIR_NAME_FIELD_LEN];
        name.copy_from_slice(&buf[5..DIR_CHECKSUM_OFFSET]);
        Self {
            inode_id: get_u32(buf, 0),
            ftype: buf[4],
            name,
            checksum: buf[DIR_CHECKSUM_OFFSET],
        }
    }

    pub fn compute_checksum(&self) -> u8 {
        xor8(&self.encode()[..DIR_CHECKSUM_OFFSET])
    }

    pub fn finalize_checksum(&mut self) -> u8 {
        self.checksum = self.compute_checksum();
        self.checksum
    }

    pub fn checksum_ok(&self) -> bool {
        self.checksum == self.compute_checksum()
    }
}
