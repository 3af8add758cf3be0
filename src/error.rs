//! Error taxonomy shared by the builder and the adder.

use thiserror::Error;

use crate::config::*;

#[derive(Error, Debug)]
pub enum FsError {
    #[error(
        "image size {0} KiB is out of range ({min}..={max})",
        min = MIN_SIZE_KIB,
        max = MAX_SIZE_KIB
    )]
    SizeOutOfRange(u64),

    #[error("image size {0} KiB is not a multiple of {align}", align = SIZE_KIB_ALIGN)]
    SizeNotAligned(u64),

    #[error("inode count {0} is out of range ({min}..={max})", min = MIN_INODES, max = MAX_INODES)]
    InodeCountOutOfRange(u64),

    #[error("geometry leaves no room for a data region")]
    NoDataRegion,

    #[error("invalid file name")]
    InvalidFileName,

    #[error("invalid filesystem image: {0}")]
    InvalidImage(String),

    #[error("file too large: {size} bytes (max 12 blocks = {max} bytes)", max = MAX_FILE_SIZE)]
    FileTooLarge { size: u64 },

    #[error("no free inodes available")]
    NoFreeInodes,

    #[error("no free data blocks available")]
    NoFreeBlocks,

    #[error("no free directory entries in root")]
    DirectoryFull,

    #[error("access outside the image: {0}")]
    OutOfBounds(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to persist temporary file: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
}

pub type Result<T> = core::result::Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_are_distinct() {
        let msgs = [
            FsError::NoFreeInodes.to_string(),
            FsError::NoFreeBlocks.to_string(),
            FsError::DirectoryFull.to_string(),
            FsError::FileTooLarge { size: 49153 }.to_string(),
        ];
        for (i, a) in msgs.iter().enumerate() {
            for b in &msgs[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(msgs[3].contains("49153"));
        assert!(msgs[3].contains("49152"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FsError = io_err.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
