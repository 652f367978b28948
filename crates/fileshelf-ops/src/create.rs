//! File and directory creation.

use std::fs::{self, File};
use std::path::Path;

use fileshelf_core::FileOpError;

/// Create an empty file, failing if anything already exists at `path`.
pub(crate) fn create_empty_file(path: &Path) -> Result<(), FileOpError> {
    File::options()
        .write(true)
        .create_new(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| FileOpError::io(path, e))
}

/// Create a directory along with any missing parents.
pub(crate) fn create_folder(path: &Path) -> Result<(), FileOpError> {
    fs::create_dir_all(path).map_err(|e| FileOpError::io(path, e))
}

/// Ensure `dir` exists, is a directory and can be written to.
pub(crate) fn check_target_dir(dir: &Path) -> Result<(), FileOpError> {
    let metadata = fs::metadata(dir).map_err(|e| FileOpError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(FileOpError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    if !is_writable(dir, &metadata) {
        return Err(FileOpError::NotWritable {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Ask the OS whether the current user may create entries in `dir`.
#[cfg(unix)]
fn is_writable(dir: &Path, _metadata: &fs::Metadata) -> bool {
    use nix::unistd::{AccessFlags, access};

    access(dir, AccessFlags::W_OK | AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(_dir: &Path, metadata: &fs::Metadata) -> bool {
    !metadata.permissions().readonly()
}
