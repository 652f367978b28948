//! Deletion, pre-delete snapshots and restoring from them.

use std::fs;
use std::path::{Path, PathBuf};

use fileshelf_core::FileOpError;

use crate::numbering::path_exists;
use crate::undo::{DeletedItem, ItemSnapshot, SpecialKind};

/// How an item was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteMethod {
    Trash,
    Permanent,
}

/// Memory allowance for file contents kept by one delete.
///
/// A file is kept only when it is below the per-file limit and still fits in
/// what is left of the total.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SnapshotBudget {
    file_limit: u64,
    remaining: u64,
}

impl SnapshotBudget {
    pub(crate) fn new(file_limit: u64, total_limit: u64) -> Self {
        Self {
            file_limit,
            remaining: total_limit,
        }
    }

    /// Reserve `size` bytes if allowed.
    fn take(&mut self, size: u64) -> bool {
        if size >= self.file_limit || size > self.remaining {
            return false;
        }
        self.remaining -= size;
        true
    }
}

/// Capture an entry so it can be recreated later.
///
/// Only regular files are read. FIFOs, sockets and device nodes are
/// recorded by kind and mode.
pub(crate) fn snapshot(
    path: &Path,
    budget: &mut SnapshotBudget,
) -> Result<DeletedItem, FileOpError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FileOpError::io(path, e))?;
    let file_type = metadata.file_type();
    let parent_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let snapshot = if file_type.is_symlink() {
        let target = fs::read_link(path).map_err(|e| FileOpError::io(path, e))?;
        ItemSnapshot::Symlink { target }
    } else if file_type.is_dir() {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| FileOpError::io(path, e))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<_, _>>()
            .map_err(|e| FileOpError::io(path, e))?;
        entries.sort();

        let children = entries
            .iter()
            .map(|child| snapshot(child, budget))
            .collect::<Result<Vec<_>, _>>()?;
        ItemSnapshot::Directory { children }
    } else if file_type.is_file() {
        let size = metadata.len();
        let content = if budget.take(size) {
            Some(fs::read(path).map_err(|e| FileOpError::io(path, e))?)
        } else {
            tracing::warn!(
                path = %path.display(),
                size,
                file_limit = budget.file_limit,
                remaining = budget.remaining,
                "file content not kept for undo"
            );
            None
        };
        ItemSnapshot::File {
            size,
            content,
            readonly: metadata.permissions().readonly(),
        }
    } else {
        ItemSnapshot::Special {
            kind: SpecialKind::of(&metadata),
            mode: permission_bits(&metadata),
        }
    };

    Ok(DeletedItem {
        path: path.to_path_buf(),
        parent_dir,
        snapshot,
    })
}

#[cfg(unix)]
pub(crate) fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub(crate) fn permission_bits(_metadata: &fs::Metadata) -> u32 {
    0
}

/// Delete `path`, via the OS trash when `use_trash` and the trash works.
pub(crate) fn remove_item(path: &Path, use_trash: bool) -> Result<DeleteMethod, FileOpError> {
    if use_trash {
        match trash::delete(path) {
            Ok(()) => return Ok(DeleteMethod::Trash),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "trash unavailable, deleting permanently"
                );
            }
        }
    }

    remove_permanently(path)?;
    Ok(DeleteMethod::Permanent)
}

/// Remove a file, symlink or directory tree without going through the trash.
pub(crate) fn remove_permanently(path: &Path) -> Result<(), FileOpError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FileOpError::io(path, e))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| FileOpError::io(path, e))
}

/// Remove `path` if it is still there. Missing paths count as removed.
pub(crate) fn remove_if_present(path: &Path) -> Result<(), FileOpError> {
    if !path_exists(path) {
        tracing::debug!(path = %path.display(), "already gone");
        return Ok(());
    }
    remove_permanently(path)
}

/// Recreate a deleted entry from its snapshot.
///
/// Returns the paths that could not be brought back because their content
/// was above the size limit. Existing entries are never overwritten.
pub(crate) fn restore(item: &DeletedItem) -> Result<Vec<PathBuf>, FileOpError> {
    if path_exists(&item.path) {
        return Err(FileOpError::AlreadyExists {
            path: item.path.clone(),
        });
    }
    if !item.parent_dir.as_os_str().is_empty() {
        fs::create_dir_all(&item.parent_dir).map_err(|e| FileOpError::io(&item.parent_dir, e))?;
    }

    let mut unrecoverable = Vec::new();
    restore_into(item, &mut unrecoverable)?;
    Ok(unrecoverable)
}

fn restore_into(item: &DeletedItem, unrecoverable: &mut Vec<PathBuf>) -> Result<(), FileOpError> {
    let path = &item.path;
    match &item.snapshot {
        ItemSnapshot::File {
            content: None,
            size,
            ..
        } => {
            tracing::warn!(path = %path.display(), size, "content was not kept, cannot restore");
            unrecoverable.push(path.clone());
        }
        ItemSnapshot::File {
            content: Some(content),
            readonly,
            ..
        } => {
            fs::write(path, content).map_err(|e| FileOpError::io(path, e))?;
            if *readonly {
                let mut permissions = fs::metadata(path)
                    .map_err(|e| FileOpError::io(path, e))?
                    .permissions();
                permissions.set_readonly(true);
                fs::set_permissions(path, permissions).map_err(|e| FileOpError::io(path, e))?;
            }
        }
        ItemSnapshot::Directory { children } => {
            fs::create_dir(path).map_err(|e| FileOpError::io(path, e))?;
            for child in children {
                restore_into(child, unrecoverable)?;
            }
        }
        ItemSnapshot::Symlink { target } => restore_symlink(target, path)?,
        ItemSnapshot::Special {
            kind: SpecialKind::Fifo,
            mode,
        } => restore_fifo(path, *mode)?,
        ItemSnapshot::Special { kind, .. } => {
            tracing::warn!(path = %path.display(), kind = %kind, "special file cannot be recreated");
            unrecoverable.push(path.clone());
        }
    }
    Ok(())
}

#[cfg(unix)]
pub(crate) fn restore_fifo(path: &Path, mode: u32) -> Result<(), FileOpError> {
    use nix::sys::stat::Mode;

    let mode = Mode::from_bits_truncate(mode as nix::libc::mode_t);
    nix::unistd::mkfifo(path, mode)
        .map_err(|errno| FileOpError::io(path, std::io::Error::from(errno)))
}

#[cfg(not(unix))]
pub(crate) fn restore_fifo(path: &Path, _mode: u32) -> Result<(), FileOpError> {
    Err(FileOpError::SpecialFile {
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
fn restore_symlink(target: &Path, path: &Path) -> Result<(), FileOpError> {
    std::os::unix::fs::symlink(target, path).map_err(|e| FileOpError::io(path, e))
}

#[cfg(windows)]
fn restore_symlink(target: &Path, path: &Path) -> Result<(), FileOpError> {
    let result = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, path)
    } else {
        std::os::windows::fs::symlink_file(target, path)
    };
    result.map_err(|e| FileOpError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_and_restore_tree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("folder");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("sub/b.bin"), [0u8, 1, 2, 255]).unwrap();

        let item = snapshot(&root, &mut SnapshotBudget::new(1024, 1024)).unwrap();
        assert!(item.is_dir());
        assert!(item.is_recoverable());
        assert_eq!(item.retained_bytes(), 9);

        remove_permanently(&root).unwrap();
        assert!(!root.exists());

        let lost = restore(&item).unwrap();
        assert!(lost.is_empty());
        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "alpha");
        assert_eq!(fs::read(root.join("sub/b.bin")).unwrap(), vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn test_snapshot_respects_content_limit() {
        let dir = TempDir::new().unwrap();
        let big = dir.path().join("big.dat");
        fs::write(&big, vec![7u8; 64]).unwrap();

        let item = snapshot(&big, &mut SnapshotBudget::new(64, u64::MAX)).unwrap();
        assert!(!item.is_recoverable());

        remove_permanently(&big).unwrap();
        let lost = restore(&item).unwrap();
        assert_eq!(lost, vec![big.clone()]);
        assert!(!big.exists());
    }

    #[test]
    fn test_snapshot_total_budget() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("folder");
        fs::create_dir(&root).unwrap();
        for name in ["a", "b", "c"] {
            fs::write(root.join(name), [1u8; 10]).unwrap();
        }

        let item = snapshot(&root, &mut SnapshotBudget::new(1024, 25)).unwrap();
        assert_eq!(item.retained_bytes(), 20);
        assert!(!item.is_recoverable());

        remove_permanently(&root).unwrap();
        let lost = restore(&item).unwrap();
        assert_eq!(lost, vec![root.join("c")]);
        assert_eq!(fs::read(root.join("a")).unwrap(), vec![1u8; 10]);
        assert!(!root.join("c").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_snapshot_fifo_without_reading_it() {
        use nix::sys::stat::Mode;

        let dir = TempDir::new().unwrap();
        let root = dir.path().join("folder");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        nix::unistd::mkfifo(&root.join("pipe"), Mode::from_bits_truncate(0o640)).unwrap();

        let item = snapshot(&root, &mut SnapshotBudget::new(1024, 1024)).unwrap();
        assert!(item.is_recoverable());

        remove_permanently(&root).unwrap();
        assert!(restore(&item).unwrap().is_empty());

        use std::os::unix::fs::FileTypeExt;
        let meta = fs::symlink_metadata(root.join("pipe")).unwrap();
        assert!(meta.file_type().is_fifo());
        assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "alpha");
    }

    #[test]
    fn test_restore_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "old").unwrap();
        let item = snapshot(&path, &mut SnapshotBudget::new(1024, 1024)).unwrap();

        fs::write(&path, "new").unwrap();
        assert!(matches!(
            restore(&item),
            Err(FileOpError::AlreadyExists { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_remove_item_without_trash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "x").unwrap();

        assert_eq!(remove_item(&path, false).unwrap(), DeleteMethod::Permanent);
        assert!(!path.exists());
        assert!(remove_if_present(&path).is_ok());
    }
}
