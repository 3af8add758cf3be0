mod common;

use common::{assert_checksums_ok, block, fresh_fs};
use minivsfs::*;

const ADD_TIME: u64 = 1_800_000_000;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 + 1).collect()
}

#[test]
fn test_add_file_happy_path() {
    let mut fs = fresh_fs(180, 128);
    let data = pattern(5000);
    let inode_id = fs.add_file(b"hello.txt", &data, ADD_TIME).unwrap();
    assert_eq!(inode_id, 2);

    let inode = fs.get_inode(inode_id).unwrap();
    assert_eq!(inode.mode, 0o100000);
    assert_eq!(inode.links, 1);
    assert_eq!(inode.size, 5000);
    assert_eq!(inode.atime, ADD_TIME);
    assert_eq!(inode.mtime, ADD_TIME);
    assert_eq!(inode.ctime, ADD_TIME);
    assert_eq!(inode.proj_id, 3);
    // Region index 0 is the root directory, so the file takes 1 and 2.
    assert_eq!(&inode.direct_ptrs[..2], &[8, 9]);
    assert!(inode.direct_ptrs[2..].iter().all(|&p| p == 0));

    let root = fs.get_inode(1).unwrap();
    assert_eq!(root.links, 3);

    let entries = fs.read_dir().unwrap();
    assert_eq!(entries.len(), 3);
    let entry = &entries[2];
    assert_eq!(entry.inode_id, 2);
    assert_eq!(entry.ftype, 1);
    assert_eq!(entry.name_bytes(), b"hello.txt");
    assert_eq!(fs.lookup(b"hello.txt").unwrap(), Some(2));

    assert_eq!(fs.read_file(inode_id).unwrap(), data);
    // Final block zero-padded.
    let last = block(fs.as_bytes(), 9);
    assert_eq!(last[..5000 - 4096], data[4096..]);
    assert!(last[5000 - 4096..].iter().all(|&b| b == 0));

    assert_eq!(fs.free_inodes().unwrap(), 126);
    assert_eq!(fs.free_data_blocks().unwrap(), 35);
    assert_checksums_ok(fs.as_bytes());
    assert!(fs.verify().unwrap().is_empty());
}

#[test]
fn test_add_survives_remount() {
    let mut fs = fresh_fs(180, 128);
    fs.add_file(b"a.bin", &pattern(10), ADD_TIME).unwrap();
    let mut fs = FileSystem::mount(fs.into_bytes()).unwrap();
    let id = fs.add_file(b"b.bin", &pattern(4097), ADD_TIME).unwrap();
    assert_eq!(id, 3);
    assert_eq!(&fs.get_inode(3).unwrap().direct_ptrs[..2], &[9, 10]);
    assert_eq!(fs.get_inode(1).unwrap().links, 4);

    let fs = FileSystem::mount(fs.into_bytes()).unwrap();
    assert_eq!(fs.lookup(b"a.bin").unwrap(), Some(2));
    assert_eq!(fs.read_file(3).unwrap(), pattern(4097));
    assert_checksums_ok(fs.as_bytes());
}

#[test]
fn test_long_name_truncated() {
    let mut fs = fresh_fs(180, 128);
    let name = [b'n'; 80];
    fs.add_file(&name, b"x", ADD_TIME).unwrap();
    let entry = fs.read_dir().unwrap()[2];
    assert_eq!(entry.name_bytes(), &name[..57]);
    assert_eq!(entry.name[57], 0);
    assert_eq!(fs.lookup(&name[..57]).unwrap(), Some(2));
    assert_checksums_ok(fs.as_bytes());
}

#[test]
fn test_max_size_file() {
    let mut fs = fresh_fs(180, 128);
    let data = pattern(12 * 4096);
    let id = fs.add_file(b"big", &data, ADD_TIME).unwrap();
    let inode = fs.get_inode(id).unwrap();
    assert!(inode.direct_ptrs.iter().all(|&p| p != 0));
    assert_eq!(inode.direct_ptrs[0], 8);
    assert_eq!(inode.direct_ptrs[11], 19);
    assert_eq!(fs.read_file(id).unwrap(), data);
    assert_checksums_ok(fs.as_bytes());
}

#[test]
fn test_oversize_file_rejected_before_allocation() {
    let mut fs = fresh_fs(180, 128);
    let before = fs.as_bytes().to_vec();
    let result = fs.add_file(b"big", &pattern(12 * 4096 + 1), ADD_TIME);
    assert!(matches!(result, Err(Error::FileTooLarge { size: 49153 })));
    assert_eq!(fs.as_bytes(), &before[..]);
}

#[test]
fn test_empty_file_gets_one_block() {
    let mut fs = fresh_fs(180, 128);
    let id = fs.add_file(b"empty", b"", ADD_TIME).unwrap();
    let inode = fs.get_inode(id).unwrap();
    assert_eq!(inode.size, 0);
    assert_eq!(inode.direct_ptrs[0], 8);
    assert!(fs.read_file(id).unwrap().is_empty());
    assert_checksums_ok(fs.as_bytes());
}

#[test]
fn test_invalid_names() {
    let mut fs = fresh_fs(180, 128);
    for name in [&b""[..], b"a/b", b"nul\0byte"] {
        assert!(matches!(fs.add_file(name, b"x", ADD_TIME), Err(Error::InvalidFileName)));
    }
}

#[test]
fn test_directory_full() {
    let mut fs = fresh_fs(1024, 128);
    for i in 0..62 {
        let name = format!("file_{}.txt", i);
        let id = fs.add_file(name.as_bytes(), name.as_bytes(), ADD_TIME).unwrap();
        assert_eq!(id, i + 2);
    }
    assert_eq!(fs.read_dir().unwrap().len(), 64);
    assert_eq!(fs.get_inode(1).unwrap().links, 64);
    log!("root directory full, free inodes {}", fs.free_inodes().unwrap());

    let before = fs.as_bytes().to_vec();
    let result = fs.add_file(b"one_too_many", b"x", ADD_TIME);
    assert!(matches!(result, Err(Error::DirectoryFull)));
    // Nothing reserved on failure.
    assert_eq!(fs.as_bytes(), &before[..]);
    assert_checksums_ok(fs.as_bytes());
}

#[test]
fn test_free_slot_reused() {
    let mut fs = fresh_fs(180, 128);
    fs.add_file(b"a", b"a", ADD_TIME).unwrap();
    fs.add_file(b"b", b"b", ADD_TIME).unwrap();

    // Clear slot 2 ("a") by zeroing its inode number.
    let mut bytes = fs.into_bytes();
    let off = 7 * 4096 + 2 * 64;
    bytes[off..off + 4].fill(0);
    let mut fs = FileSystem::mount(bytes).unwrap();

    fs.add_file(b"c", b"c", ADD_TIME).unwrap();
    let names: Vec<Vec<u8>> = fs
        .read_dir()
        .unwrap()
        .iter()
        .map(|e| e.name_bytes().to_vec())
        .collect();
    assert_eq!(names, vec![b".".to_vec(), b"..".to_vec(), b"c".to_vec(), b"b".to_vec()]);
}

#[test]
fn test_no_free_blocks() {
    let mut fs = fresh_fs(180, 128);
    // 37 free data blocks: three full files leave exactly one.
    for name in [&b"f1"[..], b"f2", b"f3"] {
        fs.add_file(name, &pattern(12 * 4096), ADD_TIME).unwrap();
    }
    assert_eq!(fs.free_data_blocks().unwrap(), 1);

    let before = fs.as_bytes().to_vec();
    let result = fs.add_file(b"f4", &pattern(4097), ADD_TIME);
    assert!(matches!(result, Err(Error::NoFreeBlocks)));
    assert_eq!(fs.as_bytes(), &before[..]);

    // A single block still fits.
    fs.add_file(b"f5", &pattern(4096), ADD_TIME).unwrap();
    assert_eq!(fs.free_data_blocks().unwrap(), 0);
    assert!(matches!(fs.add_file(b"f6", b"", ADD_TIME), Err(Error::NoFreeBlocks)));
}

#[test]
fn test_no_free_inodes() {
    let mut bytes = fresh_fs(180, 128).into_bytes();
    // Mark all 128 inodes allocated.
    bytes[4096..4096 + 16].fill(0xFF);
    let mut fs = FileSystem::mount(bytes).unwrap();
    assert_eq!(fs.free_inodes().unwrap(), 0);

    let before = fs.as_bytes().to_vec();
    assert!(matches!(fs.add_file(b"x", b"x", ADD_TIME), Err(Error::NoFreeInodes)));
    assert_eq!(fs.as_bytes(), &before[..]);
}

#[test]
fn test_root_link_count_saturated() {
    let mut bytes = fresh_fs(180, 128).into_bytes();
    // Root inode links field at offset 2 of the first inode slot.
    bytes[3 * 4096 + 2..3 * 4096 + 4].copy_from_slice(&u16::MAX.to_le_bytes());
    let mut fs = FileSystem::mount(bytes).unwrap();

    let before = fs.as_bytes().to_vec();
    let result = fs.add_file(b"a", b"x", ADD_TIME);
    assert!(matches!(result, Err(Error::InvalidImage(_))));
    assert_eq!(fs.as_bytes(), &before[..]);
    assert_eq!(fs.free_inodes().unwrap(), 127);
}
