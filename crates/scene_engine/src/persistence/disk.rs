use std::path::Path;

use super::PersistenceError;

/// Write a blob to disk, creating missing parent directories
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let io_error = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, bytes).map_err(io_error)?;
    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Read a whole blob from disk
pub fn read_file(path: &Path) -> Result<Vec<u8>, PersistenceError> {
    std::fs::read(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}
