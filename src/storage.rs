//! Loading and persisting whole images.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;
use tempfile::Builder;

use crate::error::Result;

pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Writes the image next to `path` under a temporary name, then renames it
/// over `path`. The target is either the complete image or left untouched.
pub fn write_image(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    builder.prefix(".minivsfs").suffix(".tmp");
    // Same mode a plain create would give, the umask still applies.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut temp_file = builder.tempfile_in(dir)?;
    temp_file.as_file_mut().write_all(bytes)?;
    temp_file.as_file_mut().sync_all()?;
    temp_file.persist(path)?;

    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
