//! Error types for file operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the file operations engine.
#[derive(Debug, Error)]
pub enum FileOpError {
    /// Source or target path does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Destination already exists.
    #[error("'{}' already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    /// Expected a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Target directory cannot be written to.
    #[error("Directory is not writable: {path}")]
    NotWritable { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// None of the selected paths exist.
    #[error("No valid items selected")]
    EmptySelection,

    /// Nothing has been copied or cut.
    #[error("Clipboard is empty")]
    ClipboardEmpty,

    /// A user-supplied name was rejected.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A socket or device node cannot be copied.
    #[error("Cannot copy special file: {path}")]
    SpecialFile { path: PathBuf },

    /// A directory would be moved or copied into itself.
    #[error("Cannot move or copy '{}' into itself", .source_path.display())]
    IntoItself { source_path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some items of a multi-item operation failed.
    #[error("{} of {} items failed", .errors.len(), .errors.len() + .completed.len())]
    Partial {
        /// Paths produced by the items that succeeded.
        completed: Vec<PathBuf>,
        /// One entry per failed item.
        errors: Vec<OperationError>,
    },

    /// The undo stack is empty.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty.
    #[error("Nothing to redo")]
    NothingToRedo,

    /// A history record does not carry the data its operation needs.
    #[error("Corrupted {operation} record: {message}")]
    CorruptedRecord { operation: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl FileOpError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a corrupted record error.
    pub fn corrupted(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptedRecord {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Check if this error was raised before anything touched the filesystem.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::NotADirectory { .. }
                | Self::NotWritable { .. }
                | Self::EmptySelection
                | Self::ClipboardEmpty
                | Self::InvalidName { .. }
                | Self::IntoItself { .. }
        )
    }

    /// Paths that were successfully produced before the failure, if any.
    pub fn completed(&self) -> &[PathBuf] {
        match self {
            Self::Partial { completed, .. } => completed,
            _ => &[],
        }
    }
}

/// An error that occurred on a single item of a file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<&FileOpError> for OperationError {
    fn from(err: &FileOpError) -> Self {
        let path = match err {
            FileOpError::NotFound { path }
            | FileOpError::AlreadyExists { path }
            | FileOpError::NotADirectory { path }
            | FileOpError::NotWritable { path }
            | FileOpError::PermissionDenied { path }
            | FileOpError::SpecialFile { path }
            | FileOpError::Io { path, .. } => path.clone(),
            FileOpError::IntoItself { source_path } => source_path.clone(),
            _ => PathBuf::new(),
        };
        Self::new(path, err.to_string())
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_op_error_io() {
        let err = FileOpError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, FileOpError::PermissionDenied { .. }));

        let err = FileOpError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert!(matches!(err, FileOpError::Io { .. }));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_partial_message() {
        let err = FileOpError::Partial {
            completed: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            errors: vec![OperationError::new("/c", "boom")],
        };
        assert_eq!(err.to_string(), "1 of 3 items failed");
        assert_eq!(err.completed().len(), 2);
    }

    #[test]
    fn test_operation_error_from_file_op_error() {
        let err = FileOpError::NotFound {
            path: PathBuf::from("/missing.txt"),
        };
        let op_err = OperationError::from(&err);
        assert_eq!(op_err.path, PathBuf::from("/missing.txt"));
        assert!(op_err.to_string().contains("Path not found"));

        let err = FileOpError::SpecialFile {
            path: PathBuf::from("/dev/sda"),
        };
        assert_eq!(OperationError::from(&err).path, PathBuf::from("/dev/sda"));
        assert!(!err.is_validation());
    }
}
