//! Copying files and directory trees.

use std::fs::{self, File};
use std::path::Path;

use fileshelf_core::FileOpError;

use crate::delete::{permission_bits, restore_fifo};
use crate::undo::SpecialKind;

/// Copy a file or directory tree to `dest`.
///
/// `dest` must not exist. Returns the number of bytes copied.
pub(crate) fn copy_item(
    source: &Path,
    dest: &Path,
    preserve_timestamps: bool,
) -> Result<u64, FileOpError> {
    let metadata = fs::symlink_metadata(source).map_err(|e| FileOpError::io(source, e))?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        copy_symlink(source, dest)?;
        Ok(0)
    } else if file_type.is_dir() {
        copy_dir_recursive(source, dest, preserve_timestamps)
    } else if file_type.is_file() {
        copy_file(source, dest, preserve_timestamps)
    } else {
        copy_special(source, dest, &metadata)?;
        Ok(0)
    }
}

/// Recreate a FIFO at `dest`. Sockets and device nodes are refused.
fn copy_special(source: &Path, dest: &Path, metadata: &fs::Metadata) -> Result<(), FileOpError> {
    match SpecialKind::of(metadata) {
        SpecialKind::Fifo => restore_fifo(dest, permission_bits(metadata)),
        _ => Err(FileOpError::SpecialFile {
            path: source.to_path_buf(),
        }),
    }
}

/// Copy a single file with its permissions and, optionally, its mtime.
fn copy_file(source: &Path, dest: &Path, preserve_timestamps: bool) -> Result<u64, FileOpError> {
    let metadata = fs::metadata(source).map_err(|e| FileOpError::io(source, e))?;
    let bytes = fs::copy(source, dest).map_err(|e| FileOpError::io(dest, e))?;

    if preserve_timestamps {
        if let Ok(modified) = metadata.modified() {
            // Read-only copies cannot be opened for writing; keep the new mtime then.
            let result = File::options()
                .write(true)
                .open(dest)
                .and_then(|f| f.set_modified(modified));
            if let Err(e) = result {
                tracing::debug!(path = %dest.display(), error = %e, "could not preserve mtime");
            }
        }
    }

    Ok(bytes)
}

/// Recursively copy a directory.
fn copy_dir_recursive(
    source: &Path,
    dest: &Path,
    preserve_timestamps: bool,
) -> Result<u64, FileOpError> {
    fs::create_dir_all(dest).map_err(|e| FileOpError::io(dest, e))?;

    let mut total_bytes = 0u64;
    let entries = fs::read_dir(source).map_err(|e| FileOpError::io(source, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| FileOpError::io(source, e))?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| FileOpError::io(&path, e))?;

        if file_type.is_symlink() {
            copy_symlink(&path, &dest_path)?;
        } else if file_type.is_dir() {
            total_bytes += copy_dir_recursive(&path, &dest_path, preserve_timestamps)?;
        } else if file_type.is_file() {
            total_bytes += copy_file(&path, &dest_path, preserve_timestamps)?;
        } else {
            let metadata = fs::symlink_metadata(&path).map_err(|e| FileOpError::io(&path, e))?;
            if let Err(e) = copy_special(&path, &dest_path, &metadata) {
                tracing::warn!(path = %path.display(), error = %e, "skipping special file");
            }
        }
    }

    // Applied last so a read-only source directory does not block its own children.
    let permissions = fs::metadata(source)
        .map_err(|e| FileOpError::io(source, e))?
        .permissions();
    fs::set_permissions(dest, permissions).map_err(|e| FileOpError::io(dest, e))?;

    Ok(total_bytes)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, dest: &Path) -> Result<(), FileOpError> {
    let target = fs::read_link(source).map_err(|e| FileOpError::io(source, e))?;
    std::os::unix::fs::symlink(&target, dest).map_err(|e| FileOpError::io(dest, e))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, dest: &Path) -> Result<(), FileOpError> {
    if source.is_dir() {
        copy_dir_recursive(source, dest, false).map(|_| ())
    } else {
        fs::copy(source, dest)
            .map(|_| ())
            .map_err(|e| FileOpError::io(dest, e))
    }
}

/// Total size and file count of a file or directory tree.
pub(crate) fn calculate_totals(path: &Path) -> (usize, u64) {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return (0, 0);
    };
    if !metadata.is_dir() {
        return (1, metadata.len());
    }

    let mut files = 0;
    let mut bytes = 0u64;
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            let (f, b) = calculate_totals(&entry.path());
            files += f;
            bytes += b;
        }
    }

    (files, bytes)
}
