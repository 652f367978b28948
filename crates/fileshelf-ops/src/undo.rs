//! Undo data captured when an operation runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Operation-specific payload replayed to reverse or re-apply an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UndoData {
    /// Clipboard-only operations carry nothing.
    None,
    /// Items were pasted into a directory.
    Paste {
        /// List of (original_path, created_path) pairs.
        pairs: Vec<(PathBuf, PathBuf)>,
        /// Whether the clipboard held a cut (items were moved, not copied).
        was_cut: bool,
    },
    /// Items were deleted.
    Delete {
        /// Snapshots taken right before deletion, in input order.
        items: Vec<DeletedItem>,
    },
    /// A file or directory was renamed.
    Rename { old_path: PathBuf, new_path: PathBuf },
    /// A file or directory was duplicated next to itself.
    Duplicate { source: PathBuf, created: PathBuf },
    /// Items were moved into a directory.
    Move {
        /// List of (original_path, new_path) pairs.
        moves: Vec<(PathBuf, PathBuf)>,
    },
    /// An empty file was created.
    NewFile { path: PathBuf },
    /// A folder was created.
    NewFolder { path: PathBuf },
}

impl UndoData {
    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Paste { .. } => "paste",
            Self::Delete { .. } => "delete",
            Self::Rename { .. } => "rename",
            Self::Duplicate { .. } => "duplicate",
            Self::Move { .. } => "move",
            Self::NewFile { .. } => "new_file",
            Self::NewFolder { .. } => "new_folder",
        }
    }

    /// Paths created by the forward operation.
    pub fn created_paths(&self) -> Vec<PathBuf> {
        match self {
            Self::None | Self::Delete { .. } => Vec::new(),
            Self::Paste { pairs, .. } => pairs.iter().map(|(_, to)| to.clone()).collect(),
            Self::Move { moves } => moves.iter().map(|(_, to)| to.clone()).collect(),
            Self::Rename { new_path, .. } => vec![new_path.clone()],
            Self::Duplicate { created, .. } => vec![created.clone()],
            Self::NewFile { path } | Self::NewFolder { path } => vec![path.clone()],
        }
    }

    /// Get a description of how to undo this operation.
    pub fn undo_description(&self) -> String {
        match self {
            Self::None => "Nothing to undo".to_string(),
            Self::Paste { pairs, was_cut } => {
                if *was_cut {
                    format!("Move {} items back to original location", pairs.len())
                } else {
                    format!("Delete {} pasted items", pairs.len())
                }
            }
            Self::Delete { items } => {
                let lost = items.iter().filter(|i| !i.is_recoverable()).count();
                if lost == 0 {
                    format!("Restore {} deleted items", items.len())
                } else {
                    format!(
                        "Restore {} deleted items ({} too large to recover)",
                        items.len(),
                        lost
                    )
                }
            }
            Self::Rename { old_path, .. } => format!(
                "Rename back to '{}'",
                old_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ),
            Self::Duplicate { .. } => "Delete the duplicate".to_string(),
            Self::Move { moves } => {
                format!("Move {} items back to original location", moves.len())
            }
            Self::NewFile { .. } => "Delete the created file".to_string(),
            Self::NewFolder { .. } => "Delete the created folder".to_string(),
        }
    }
}

/// State of one deleted entry, enough to recreate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedItem {
    /// Where the entry lived.
    pub path: PathBuf,
    /// Directory that contained it.
    pub parent_dir: PathBuf,
    /// What was there.
    pub snapshot: ItemSnapshot,
}

impl DeletedItem {
    pub fn is_dir(&self) -> bool {
        matches!(self.snapshot, ItemSnapshot::Directory { .. })
    }

    /// Check if undo can bring back this entry and everything below it.
    pub fn is_recoverable(&self) -> bool {
        match &self.snapshot {
            ItemSnapshot::File { content, .. } => content.is_some(),
            ItemSnapshot::Directory { children } => children.iter().all(DeletedItem::is_recoverable),
            ItemSnapshot::Symlink { .. } => true,
            ItemSnapshot::Special { kind, .. } => *kind == SpecialKind::Fifo,
        }
    }

    /// Bytes held in memory for this entry.
    pub fn retained_bytes(&self) -> u64 {
        match &self.snapshot {
            ItemSnapshot::File { content, .. } => content.as_ref().map_or(0, |c| c.len() as u64),
            ItemSnapshot::Directory { children } => {
                children.iter().map(DeletedItem::retained_bytes).sum()
            }
            ItemSnapshot::Symlink { .. } | ItemSnapshot::Special { .. } => 0,
        }
    }
}

/// Content of a deleted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSnapshot {
    /// A regular file. `content` is `None` when the file was over the undo
    /// content limits.
    File {
        size: u64,
        content: Option<Vec<u8>>,
        readonly: bool,
    },
    /// A directory and its entries.
    Directory { children: Vec<DeletedItem> },
    /// A symbolic link.
    Symlink { target: PathBuf },
    /// A FIFO, socket or device node. Only FIFOs can be recreated.
    Special { kind: SpecialKind, mode: u32 },
}

/// Kind of a non-regular, non-directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialKind {
    Fifo,
    Socket,
    BlockDevice,
    CharDevice,
    Unknown,
}

impl SpecialKind {
    #[cfg(unix)]
    pub fn of(metadata: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::FileTypeExt;

        let file_type = metadata.file_type();
        if file_type.is_fifo() {
            Self::Fifo
        } else if file_type.is_socket() {
            Self::Socket
        } else if file_type.is_block_device() {
            Self::BlockDevice
        } else if file_type.is_char_device() {
            Self::CharDevice
        } else {
            Self::Unknown
        }
    }

    #[cfg(not(unix))]
    pub fn of(_metadata: &std::fs::Metadata) -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for SpecialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fifo => "fifo",
            Self::Socket => "socket",
            Self::BlockDevice => "block device",
            Self::CharDevice => "character device",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
