//! Operation types and history records.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fileshelf_core::FileOpError;
use serde::{Deserialize, Serialize};

use crate::undo::UndoData;

/// The kind of operation a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Copy,
    Cut,
    Paste,
    Delete,
    Rename,
    Duplicate,
    Move,
    NewFile,
    NewFolder,
}

impl OperationType {
    /// Stable lowercase name used in events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Cut => "cut",
            Self::Paste => "paste",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::Duplicate => "duplicate",
            Self::Move => "move",
            Self::NewFile => "new_file",
            Self::NewFolder => "new_folder",
        }
    }

    /// Copy and cut only fill the clipboard, there is nothing to reverse.
    pub fn is_undoable(&self) -> bool {
        !matches!(self, Self::Copy | Self::Cut)
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy => write!(f, "Copy"),
            Self::Cut => write!(f, "Cut"),
            Self::Paste => write!(f, "Paste"),
            Self::Delete => write!(f, "Delete"),
            Self::Rename => write!(f, "Rename"),
            Self::Duplicate => write!(f, "Duplicate"),
            Self::Move => write!(f, "Move"),
            Self::NewFile => write!(f, "New file"),
            Self::NewFolder => write!(f, "New folder"),
        }
    }
}

/// A completed operation together with the data needed to reverse it.
///
/// Everything except the undo data is fixed at construction. Redo may
/// replace the undo data when it lands on different output paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    operation_type: OperationType,
    source_paths: Vec<PathBuf>,
    target_path: Option<PathBuf>,
    timestamp: SystemTime,
    is_undoable: bool,
    undo_data: UndoData,
}

impl OperationRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        operation_type: OperationType,
        source_paths: Vec<PathBuf>,
        target_path: Option<PathBuf>,
        undo_data: UndoData,
    ) -> Self {
        Self {
            operation_type,
            source_paths,
            target_path,
            timestamp: SystemTime::now(),
            is_undoable: operation_type.is_undoable(),
            undo_data,
        }
    }

    /// Mark this record as not undoable; history will ignore it.
    pub fn not_undoable(mut self) -> Self {
        self.is_undoable = false;
        self
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn source_paths(&self) -> &[PathBuf] {
        &self.source_paths
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn is_undoable(&self) -> bool {
        self.is_undoable
    }

    pub fn undo_data(&self) -> &UndoData {
        &self.undo_data
    }

    pub(crate) fn set_undo_data(&mut self, undo_data: UndoData) {
        self.undo_data = undo_data;
    }

    /// Check that the undo data is the variant this operation needs.
    pub fn validate(&self) -> Result<(), FileOpError> {
        let matches = matches!(
            (self.operation_type, &self.undo_data),
            (OperationType::Paste, UndoData::Paste { .. })
                | (OperationType::Delete, UndoData::Delete { .. })
                | (OperationType::Rename, UndoData::Rename { .. })
                | (OperationType::Duplicate, UndoData::Duplicate { .. })
                | (OperationType::Move, UndoData::Move { .. })
                | (OperationType::NewFile, UndoData::NewFile { .. })
                | (OperationType::NewFolder, UndoData::NewFolder { .. })
        );

        if matches {
            Ok(())
        } else {
            Err(FileOpError::corrupted(
                self.operation_type.as_str(),
                format!("undo data '{}' does not belong to this operation", self.undo_data.kind()),
            ))
        }
    }

    /// Human-readable description of what was done.
    pub fn description(&self) -> String {
        let target = self
            .target_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let count = self.source_paths.len();

        match self.operation_type {
            OperationType::Copy => format!("Copied {} items to clipboard", count),
            OperationType::Cut => format!("Cut {} items to clipboard", count),
            OperationType::Paste => format!("Pasted {} items into '{}'", count, target),
            OperationType::Delete => format!("Deleted {} items", count),
            OperationType::Rename => format!("Renamed '{}' to '{}'", first_name(&self.source_paths), target),
            OperationType::Duplicate => format!("Duplicated '{}'", first_name(&self.source_paths)),
            OperationType::Move => format!("Moved {} items into '{}'", count, target),
            OperationType::NewFile => format!("Created file '{}'", target),
            OperationType::NewFolder => format!("Created folder '{}'", target),
        }
    }
}

fn first_name(paths: &[PathBuf]) -> String {
    paths
        .first()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_operations_are_not_undoable() {
        assert!(!OperationType::Copy.is_undoable());
        assert!(!OperationType::Cut.is_undoable());
        assert!(OperationType::Paste.is_undoable());
        assert!(OperationType::NewFolder.is_undoable());
    }

    #[test]
    fn test_record_validate() {
        let record = OperationRecord::new(
            OperationType::NewFile,
            vec![],
            Some(PathBuf::from("/tmp/a.txt")),
            UndoData::NewFile {
                path: PathBuf::from("/tmp/a.txt"),
            },
        );
        assert!(record.validate().is_ok());
        assert!(record.is_undoable());

        let broken = OperationRecord::new(
            OperationType::Rename,
            vec![PathBuf::from("/tmp/a.txt")],
            None,
            UndoData::NewFile {
                path: PathBuf::from("/tmp/a.txt"),
            },
        );
        assert!(matches!(
            broken.validate(),
            Err(FileOpError::CorruptedRecord { .. })
        ));
    }

    #[test]
    fn test_record_description() {
        let record = OperationRecord::new(
            OperationType::Rename,
            vec![PathBuf::from("/tmp/old.txt")],
            Some(PathBuf::from("/tmp/new.txt")),
            UndoData::Rename {
                old_path: PathBuf::from("/tmp/old.txt"),
                new_path: PathBuf::from("/tmp/new.txt"),
            },
        );
        assert_eq!(record.description(), "Renamed 'old.txt' to 'new.txt'");
    }

    #[test]
    fn test_not_undoable() {
        let record = OperationRecord::new(OperationType::Delete, vec![], None, UndoData::None)
            .not_undoable();
        assert!(!record.is_undoable());
    }
}
