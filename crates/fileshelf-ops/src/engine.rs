//! The file operations engine.

use std::path::{Path, PathBuf};

use fileshelf_core::{EngineConfig, FileOpError, OperationError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clipboard::{Clipboard, ClipboardMode};
use crate::copy::{calculate_totals, copy_item};
use crate::create::{check_target_dir, create_empty_file, create_folder};
use crate::delete::{DeleteMethod, SnapshotBudget, remove_item, snapshot};
use crate::event::{EventBus, OperationEvent};
use crate::history::HistoryStack;
use crate::move_op::{is_same_or_descendant, move_item, same_dir};
use crate::numbering::{NumberingResolver, path_exists};
use crate::operation::{OperationRecord, OperationType};
use crate::rename::{rename_path, sanitize_name, validate_filename};
use crate::undo::{DeletedItem, UndoData};

/// Performs file operations, records them for undo and reports events.
///
/// All work happens synchronously inside each call. The engine is meant to
/// be owned by a single caller (the UI loop); `&mut self` on every mutating
/// method keeps history bookkeeping sequential.
#[derive(Debug)]
pub struct FileOperationsEngine {
    pub(crate) config: EngineConfig,
    pub(crate) resolver: NumberingResolver,
    pub(crate) history: HistoryStack,
    pub(crate) clipboard: Clipboard,
    pub(crate) events: EventBus,
}

impl Default for FileOperationsEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FileOperationsEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            resolver: NumberingResolver::new(config.max_numbering_attempts),
            history: HistoryStack::new(config.max_history),
            clipboard: Clipboard::default(),
            events: EventBus::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStack {
        &mut self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn resolver(&self) -> &NumberingResolver {
        &self.resolver
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<OperationEvent> {
        self.events.subscribe()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear_history();
    }

    /// Put `paths` on the clipboard for copying.
    pub fn copy_to_clipboard(&mut self, paths: Vec<PathBuf>) -> Result<usize, FileOpError> {
        self.set_clipboard(ClipboardMode::Copy, paths)
    }

    /// Put `paths` on the clipboard for moving.
    pub fn cut_to_clipboard(&mut self, paths: Vec<PathBuf>) -> Result<usize, FileOpError> {
        self.set_clipboard(ClipboardMode::Cut, paths)
    }

    fn set_clipboard(
        &mut self,
        mode: ClipboardMode,
        paths: Vec<PathBuf>,
    ) -> Result<usize, FileOpError> {
        let op = match mode {
            ClipboardMode::Copy => OperationType::Copy,
            ClipboardMode::Cut => OperationType::Cut,
        };

        let requested = paths.clone();
        let kept = self.clipboard.set(mode, paths);
        if kept == 0 {
            return self.reject(op.as_str(), &requested, FileOpError::EmptySelection);
        }

        debug!(operation = %op, count = kept, "clipboard updated");
        let kept_paths = self.clipboard.paths().to_vec();
        self.events.completed(op.as_str(), &kept_paths, None);
        Ok(kept)
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard.clear();
    }

    /// Check if the clipboard can be pasted into `target_dir`.
    pub fn can_paste(&self, target_dir: &Path) -> bool {
        !self.clipboard.is_empty() && check_target_dir(target_dir).is_ok()
    }

    /// Paste the clipboard into `target_dir`.
    ///
    /// Returns the created paths in clipboard order. Clashing names are
    /// numbered. A cut clipboard is cleared once every item has moved.
    pub fn paste(&mut self, target_dir: &Path) -> Result<Vec<PathBuf>, FileOpError> {
        let op = OperationType::Paste;
        let Some(mode) = self.clipboard.mode() else {
            return self.reject(op.as_str(), &[], FileOpError::ClipboardEmpty);
        };
        if let Err(e) = check_target_dir(target_dir) {
            let paths = self.clipboard.paths().to_vec();
            return self.reject(op.as_str(), &paths, e);
        }

        let sources: Vec<PathBuf> = self
            .clipboard
            .paths()
            .iter()
            .filter(|p| path_exists(p))
            .cloned()
            .collect();
        if sources.is_empty() {
            self.clipboard.clear();
            return self.reject(op.as_str(), &[], FileOpError::EmptySelection);
        }

        let was_cut = mode == ClipboardMode::Cut;
        self.events.started(op.as_str(), &sources);

        let mut pairs = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();
        for source in &sources {
            match self.transfer(source, target_dir, was_cut) {
                Ok(dest) => pairs.push((source.clone(), dest)),
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "paste failed for item");
                    failures.push(e);
                }
            }
        }

        let created: Vec<PathBuf> = pairs.iter().map(|(_, to)| to.clone()).collect();
        if !pairs.is_empty() {
            let bytes: u64 = created.iter().map(|p| calculate_totals(p).1).sum();
            info!(
                count = pairs.len(),
                bytes,
                was_cut,
                target = %target_dir.display(),
                "pasted items"
            );
            self.history.record_operation(OperationRecord::new(
                op,
                sources.clone(),
                Some(target_dir.to_path_buf()),
                UndoData::Paste { pairs, was_cut },
            ));
        }

        if was_cut {
            if failures.is_empty() {
                self.clipboard.clear();
            } else {
                self.clipboard.retain_existing();
            }
        }

        self.finish_batch(
            op.as_str(),
            &sources,
            Some(target_dir.to_path_buf()),
            created,
            failures,
        )
    }

    /// Delete `paths`, through the trash unless `skip_trash`.
    ///
    /// Only trash-backed deletions are recorded for undo. Undo restores from
    /// in-memory snapshots, which skip files at or above the configured
    /// content limit.
    pub fn delete_items(&mut self, paths: Vec<PathBuf>, skip_trash: bool) -> Result<(), FileOpError> {
        let op = OperationType::Delete;
        let targets: Vec<PathBuf> = paths.iter().filter(|p| path_exists(p)).cloned().collect();
        if targets.is_empty() {
            return self.reject(op.as_str(), &paths, FileOpError::EmptySelection);
        }

        self.events.started(op.as_str(), &targets);

        let record = !skip_trash;
        let mut budget = self.snapshot_budget();
        let mut removed = Vec::with_capacity(targets.len());
        let mut snapshots = Vec::new();
        let mut failures = Vec::new();
        for target in &targets {
            // Already removed together with a selected parent directory
            if !path_exists(target) {
                debug!(path = %target.display(), "skipping, parent already deleted");
                continue;
            }
            match self.delete_one(target, record.then_some(&mut budget)) {
                Ok(item) => {
                    removed.push(target.clone());
                    snapshots.extend(item);
                }
                Err(e) => {
                    warn!(path = %target.display(), error = %e, "delete failed for item");
                    failures.push(e);
                }
            }
        }

        info!(count = removed.len(), skip_trash, "deleted items");
        if record && !snapshots.is_empty() {
            self.history.record_operation(OperationRecord::new(
                op,
                removed.clone(),
                None,
                UndoData::Delete { items: snapshots },
            ));
        }

        self.finish_batch(op.as_str(), &targets, None, removed, failures)
            .map(|_| ())
    }

    /// Delete one entry, snapshotting it first when it will be recorded.
    fn delete_one(
        &self,
        path: &Path,
        budget: Option<&mut SnapshotBudget>,
    ) -> Result<Option<DeletedItem>, FileOpError> {
        let item = match budget {
            Some(budget) => Some(snapshot(path, budget)?),
            None => None,
        };

        let method = remove_item(path, item.is_some() && self.config.use_trash)?;
        debug!(path = %path.display(), trashed = method == DeleteMethod::Trash, "deleted");
        Ok(item)
    }

    /// Content allowance for the snapshots of one delete.
    pub(crate) fn snapshot_budget(&self) -> SnapshotBudget {
        SnapshotBudget::new(self.config.undo_content_limit, self.config.undo_total_limit)
    }

    /// Rename `path` to `new_name` within the same directory.
    ///
    /// Path separators in `new_name` are dropped.
    pub fn rename_item(&mut self, path: &Path, new_name: &str) -> Result<PathBuf, FileOpError> {
        let op = OperationType::Rename;
        let sources = [path.to_path_buf()];
        if !path_exists(path) {
            return self.reject(op.as_str(), &sources, FileOpError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let name = sanitize_name(new_name);
        if let Err(e) = validate_filename(&name) {
            return self.reject(op.as_str(), &sources, e);
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        let new_path = parent.join(&name);
        if new_path == path {
            debug!(path = %path.display(), "rename to same name, nothing to do");
            return Ok(new_path);
        }
        if path_exists(&new_path) {
            let err = FileOpError::AlreadyExists { path: new_path };
            return self.reject(op.as_str(), &sources, err);
        }

        self.events.started(op.as_str(), &sources);
        if let Err(e) = rename_path(path, &new_path) {
            return self.reject(op.as_str(), &sources, e);
        }

        info!(from = %path.display(), to = %new_path.display(), "renamed");
        self.history.record_operation(OperationRecord::new(
            op,
            sources.to_vec(),
            Some(new_path.clone()),
            UndoData::Rename {
                old_path: path.to_path_buf(),
                new_path: new_path.clone(),
            },
        ));
        self.events
            .completed(op.as_str(), &sources, Some(new_path.clone()));
        Ok(new_path)
    }

    /// Copy `path` next to itself under the next free numbered name.
    pub fn duplicate_item(&mut self, path: &Path) -> Result<PathBuf, FileOpError> {
        let op = OperationType::Duplicate;
        let sources = [path.to_path_buf()];
        if !path_exists(path) {
            return self.reject(op.as_str(), &sources, FileOpError::NotFound {
                path: path.to_path_buf(),
            });
        }

        self.events.started(op.as_str(), &sources);
        let created = match self.duplicate_one(path) {
            Ok(created) => created,
            Err(e) => return self.reject(op.as_str(), &sources, e),
        };

        info!(source = %path.display(), created = %created.display(), "duplicated");
        self.history.record_operation(OperationRecord::new(
            op,
            sources.to_vec(),
            Some(created.clone()),
            UndoData::Duplicate {
                source: path.to_path_buf(),
                created: created.clone(),
            },
        ));
        self.events
            .completed(op.as_str(), &sources, Some(created.clone()));
        Ok(created)
    }

    pub(crate) fn duplicate_one(&self, path: &Path) -> Result<PathBuf, FileOpError> {
        let created = self.resolver.resolve(path);
        copy_item(path, &created, self.config.preserve_timestamps)?;
        Ok(created)
    }

    /// Create an empty file named `name` in `parent_dir`.
    pub fn create_new_file(&mut self, parent_dir: &Path, name: &str) -> Result<PathBuf, FileOpError> {
        self.create_entry(OperationType::NewFile, parent_dir, name)
    }

    /// Create a folder named `name` in `parent_dir`.
    pub fn create_new_folder(
        &mut self,
        parent_dir: &Path,
        name: &str,
    ) -> Result<PathBuf, FileOpError> {
        self.create_entry(OperationType::NewFolder, parent_dir, name)
    }

    fn create_entry(
        &mut self,
        op: OperationType,
        parent_dir: &Path,
        name: &str,
    ) -> Result<PathBuf, FileOpError> {
        let sources = [parent_dir.to_path_buf()];
        if let Err(e) = check_target_dir(parent_dir) {
            return self.reject(op.as_str(), &sources, e);
        }

        let name = sanitize_name(name);
        if let Err(e) = validate_filename(&name) {
            return self.reject(op.as_str(), &sources, e);
        }

        let path = self.resolver.resolve(&parent_dir.join(&name));
        self.events.started(op.as_str(), &sources);

        let (result, undo_data) = if op == OperationType::NewFolder {
            (create_folder(&path), UndoData::NewFolder { path: path.clone() })
        } else {
            (create_empty_file(&path), UndoData::NewFile { path: path.clone() })
        };
        if let Err(e) = result {
            return self.reject(op.as_str(), &sources, e);
        }

        info!(operation = %op, path = %path.display(), "created");
        self.history.record_operation(OperationRecord::new(
            op,
            sources.to_vec(),
            Some(path.clone()),
            undo_data,
        ));
        self.events.completed(op.as_str(), &sources, Some(path.clone()));
        Ok(path)
    }

    /// Move `paths` into `target_dir`.
    ///
    /// Missing paths, items already in `target_dir` and directories that
    /// would land inside themselves are left out.
    pub fn move_items(
        &mut self,
        paths: Vec<PathBuf>,
        target_dir: &Path,
    ) -> Result<Vec<PathBuf>, FileOpError> {
        let op = OperationType::Move;
        if let Err(e) = check_target_dir(target_dir) {
            return self.reject(op.as_str(), &paths, e);
        }

        let sources: Vec<PathBuf> = paths
            .iter()
            .filter(|p| path_exists(p))
            .filter(|p| {
                let into_itself = p.is_dir() && is_same_or_descendant(target_dir, p);
                if into_itself {
                    debug!(path = %p.display(), "skipping, cannot move a directory into itself");
                }
                !into_itself
            })
            .filter(|p| {
                let in_place = p.parent().is_some_and(|parent| same_dir(parent, target_dir));
                if in_place {
                    debug!(path = %p.display(), "skipping, already in target directory");
                }
                !in_place
            })
            .cloned()
            .collect();
        if sources.is_empty() {
            return self.reject(op.as_str(), &paths, FileOpError::EmptySelection);
        }

        self.events.started(op.as_str(), &sources);

        let mut moves = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();
        for source in &sources {
            match self.transfer(source, target_dir, true) {
                Ok(dest) => moves.push((source.clone(), dest)),
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "move failed for item");
                    failures.push(e);
                }
            }
        }

        let moved: Vec<PathBuf> = moves.iter().map(|(_, to)| to.clone()).collect();
        if !moves.is_empty() {
            info!(count = moves.len(), target = %target_dir.display(), "moved items");
            self.history.record_operation(OperationRecord::new(
                op,
                sources.clone(),
                Some(target_dir.to_path_buf()),
                UndoData::Move { moves },
            ));
        }

        self.finish_batch(
            op.as_str(),
            &sources,
            Some(target_dir.to_path_buf()),
            moved,
            failures,
        )
    }

    /// Move or copy one item into `target_dir`, numbering the name on clash.
    pub(crate) fn transfer(
        &self,
        source: &Path,
        target_dir: &Path,
        is_move: bool,
    ) -> Result<PathBuf, FileOpError> {
        if source.is_dir() && is_same_or_descendant(target_dir, source) {
            return Err(FileOpError::IntoItself {
                source_path: source.to_path_buf(),
            });
        }
        let name = source.file_name().ok_or_else(|| FileOpError::NotFound {
            path: source.to_path_buf(),
        })?;

        let dest = self.resolver.resolve(&target_dir.join(name));
        if is_move {
            move_item(source, &dest, self.config.preserve_timestamps)?;
        } else {
            copy_item(source, &dest, self.config.preserve_timestamps)?;
        }
        debug!(source = %source.display(), dest = %dest.display(), is_move, "transferred");
        Ok(dest)
    }

    /// Report a rejected operation and return its error.
    pub(crate) fn reject<T>(
        &mut self,
        operation: &str,
        paths: &[PathBuf],
        err: FileOpError,
    ) -> Result<T, FileOpError> {
        warn!(operation, error = %err, "operation failed");
        self.events.failed(operation, paths, err.to_string());
        Err(err)
    }

    /// Emit the closing event of a multi-item operation and build its result.
    pub(crate) fn finish_batch(
        &mut self,
        operation: &str,
        sources: &[PathBuf],
        target: Option<PathBuf>,
        completed: Vec<PathBuf>,
        failures: Vec<FileOpError>,
    ) -> Result<Vec<PathBuf>, FileOpError> {
        match batch_result(completed, failures) {
            Ok(completed) => {
                self.events.completed(operation, sources, target);
                Ok(completed)
            }
            Err(e) => self.reject(operation, sources, e),
        }
    }
}

/// Fold per-item failures of a batch into a single result.
///
/// A lone failure with nothing completed is returned as is, anything else
/// becomes [`FileOpError::Partial`].
pub(crate) fn batch_result(
    completed: Vec<PathBuf>,
    mut failures: Vec<FileOpError>,
) -> Result<Vec<PathBuf>, FileOpError> {
    if failures.is_empty() {
        return Ok(completed);
    }
    if completed.is_empty() && failures.len() == 1 {
        return Err(failures.remove(0));
    }
    Err(FileOpError::Partial {
        completed,
        errors: failures.iter().map(OperationError::from).collect(),
    })
}
