//! Moving files and directories.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use fileshelf_core::FileOpError;

use crate::copy::{calculate_totals, copy_item};
use crate::delete::remove_permanently;

/// Move a single item (file or directory) to `dest`.
pub(crate) fn move_item(
    source: &Path,
    dest: &Path,
    preserve_timestamps: bool,
) -> Result<(), FileOpError> {
    // Try rename first (fast path for same filesystem)
    let err = match fs::rename(source, dest) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) {
        return Err(FileOpError::io(source, err));
    }

    tracing::debug!(
        source = %source.display(),
        dest = %dest.display(),
        error = %err,
        "rename failed, falling back to copy and remove"
    );

    copy_item(source, dest, preserve_timestamps)?;
    let before = calculate_totals(source);
    if let Err(e) = remove_permanently(source) {
        discard_copy_if_untouched(source, dest, before);
        return Err(e);
    }

    Ok(())
}

/// After a failed removal of `source`, drop the copy at `dest` only if the
/// source is still complete. Otherwise `dest` may hold the only copy of
/// entries already removed, so it stays.
fn discard_copy_if_untouched(source: &Path, dest: &Path, before: (usize, u64)) {
    if calculate_totals(source) != before {
        tracing::warn!(
            source = %source.display(),
            dest = %dest.display(),
            "source partially removed, keeping the copy"
        );
        return;
    }
    if let Err(cleanup) = remove_permanently(dest) {
        tracing::warn!(path = %dest.display(), error = %cleanup, "failed to clean up partial move");
    }
}

/// Check if `path` is `ancestor` itself or lies below it.
///
/// Both sides are canonicalized, so symlinked aliases of the same directory
/// are caught too.
pub(crate) fn is_same_or_descendant(path: &Path, ancestor: &Path) -> bool {
    match (fs::canonicalize(path), fs::canonicalize(ancestor)) {
        (Ok(path), Ok(ancestor)) => path.starts_with(ancestor),
        _ => path.starts_with(ancestor),
    }
}

/// Check if both paths name the same directory.
pub(crate) fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        fs::write(&source, "content").unwrap();

        move_item(&source, &dest, true).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "content");
    }

    #[test]
    fn test_move_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = move_item(&dir.path().join("nope"), &dir.path().join("b"), true);
        assert!(matches!(result, Err(FileOpError::NotFound { .. })));
    }

    #[test]
    fn test_failed_fallback_discards_copy_of_intact_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a"), "a").unwrap();
        fs::write(source.join("b"), "b").unwrap();
        let dest = dir.path().join("dst");
        copy_item(&source, &dest, false).unwrap();

        discard_copy_if_untouched(&source, &dest, calculate_totals(&source));
        assert!(!dest.exists());
        assert!(source.join("a").exists());
    }

    #[test]
    fn test_failed_fallback_keeps_copy_of_partially_removed_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a"), "a").unwrap();
        fs::write(source.join("b"), "b").unwrap();
        let dest = dir.path().join("dst");
        copy_item(&source, &dest, false).unwrap();

        let before = calculate_totals(&source);
        fs::remove_file(source.join("a")).unwrap();
        discard_copy_if_untouched(&source, &dest, before);

        assert_eq!(fs::read_to_string(dest.join("a")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dest.join("b")).unwrap(), "b");
    }

    #[test]
    fn test_is_same_or_descendant() {
        let dir = TempDir::new().unwrap();
        let parent = dir.path().join("parent");
        let child = parent.join("child");
        let sibling = dir.path().join("parent2");
        fs::create_dir_all(&child).unwrap();
        fs::create_dir_all(&sibling).unwrap();

        assert!(is_same_or_descendant(&child, &parent));
        assert!(is_same_or_descendant(&parent, &parent));
        // "parent2" shares a string prefix with "parent" but is not inside it
        assert!(!is_same_or_descendant(&sibling, &parent));
        assert!(!is_same_or_descendant(&parent, &child));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_same_or_descendant_through_symlink() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir_all(real.join("inner")).unwrap();
        let alias = dir.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias).unwrap();

        assert!(is_same_or_descendant(&alias.join("inner"), &real));
        assert!(same_dir(&alias, &real));
    }
}
