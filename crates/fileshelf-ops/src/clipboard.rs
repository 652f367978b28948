//! Engine-owned clipboard state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::numbering::path_exists;

/// What a paste will do with the clipboard contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

/// Paths waiting to be pasted.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    mode: Option<ClipboardMode>,
    paths: Vec<PathBuf>,
}

impl Clipboard {
    /// Replace the contents, keeping only paths that exist.
    ///
    /// Repeated paths are kept once, in first-seen order. Returns the number
    /// of paths kept. Nothing changes when none exist.
    pub fn set(&mut self, mode: ClipboardMode, paths: Vec<PathBuf>) -> usize {
        let mut seen = HashSet::new();
        let existing: Vec<PathBuf> = paths
            .into_iter()
            .filter(|p| path_exists(p) && seen.insert(p.clone()))
            .collect();
        if existing.is_empty() {
            return 0;
        }

        self.mode = Some(mode);
        self.paths = existing;
        self.paths.len()
    }

    pub fn clear(&mut self) {
        self.mode = None;
        self.paths.clear();
    }

    /// Drop paths that no longer exist; clears the clipboard if none are left.
    pub fn retain_existing(&mut self) {
        self.paths.retain(|p| path_exists(p));
        if self.paths.is_empty() {
            self.mode = None;
        }
    }

    pub fn mode(&self) -> Option<ClipboardMode> {
        self.mode
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() || self.paths.is_empty()
    }

    pub fn is_cut(&self) -> bool {
        self.mode == Some(ClipboardMode::Cut)
    }

    /// Check if `path` is on the clipboard.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_set_filters_missing_paths() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "a").unwrap();

        let mut clipboard = Clipboard::default();
        let kept = clipboard.set(ClipboardMode::Copy, vec![a.clone(), dir.path().join("gone")]);

        assert_eq!(kept, 1);
        assert_eq!(clipboard.paths(), &[a.clone()]);
        assert_eq!(clipboard.mode(), Some(ClipboardMode::Copy));
        assert!(clipboard.contains(&a));
    }

    #[test]
    fn test_set_drops_repeated_paths() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let mut clipboard = Clipboard::default();
        let kept = clipboard.set(ClipboardMode::Cut, vec![b.clone(), a.clone(), b.clone()]);

        assert_eq!(kept, 2);
        assert_eq!(clipboard.paths(), &[b, a]);
    }

    #[test]
    fn test_set_with_no_existing_paths_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "a").unwrap();

        let mut clipboard = Clipboard::default();
        clipboard.set(ClipboardMode::Cut, vec![a.clone()]);
        assert_eq!(clipboard.set(ClipboardMode::Copy, vec![dir.path().join("gone")]), 0);
        assert!(clipboard.is_cut());
        assert_eq!(clipboard.paths().len(), 1);
    }

    #[test]
    fn test_retain_existing_clears_when_empty() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "a").unwrap();

        let mut clipboard = Clipboard::default();
        clipboard.set(ClipboardMode::Cut, vec![a.clone()]);
        fs::remove_file(&a).unwrap();
        clipboard.retain_existing();

        assert!(clipboard.is_empty());
        assert_eq!(clipboard.mode(), None);
    }
}
