//! Undoable file operations for fileshelf.
//!
//! [`FileOperationsEngine`] copies, cuts, pastes, moves, renames,
//! duplicates, creates and deletes files synchronously. Every mutating
//! operation is recorded on a bounded [`HistoryStack`] with the data needed
//! to reverse it, and reports its progress as [`OperationEvent`]s to any
//! subscribed receivers. Name clashes are resolved by [`NumberingResolver`].

mod clipboard;
mod copy;
mod create;
mod delete;
mod engine;
mod event;
mod executor;
mod history;
mod move_op;
mod numbering;
mod operation;
mod rename;
mod undo;

pub use clipboard::{Clipboard, ClipboardMode};
pub use engine::FileOperationsEngine;
pub use event::{EventBus, OperationEvent};
pub use history::HistoryStack;
pub use numbering::{ExistingNumbering, NumberedName, NumberingResolver, NumberingStyle};
pub use operation::{OperationRecord, OperationType};
pub use rename::{sanitize_name, validate_filename};
pub use undo::{DeletedItem, ItemSnapshot, SpecialKind, UndoData};

pub use fileshelf_core::{EngineConfig, FileOpError, OperationError};
