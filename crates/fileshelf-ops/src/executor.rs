//! Undo and redo of recorded operations.

use std::path::{Path, PathBuf};

use fileshelf_core::FileOpError;
use tracing::{debug, info, warn};

use crate::create::{create_empty_file, create_folder};
use crate::delete::{remove_if_present, remove_item, restore, snapshot};
use crate::engine::{FileOperationsEngine, batch_result};
use crate::move_op::move_item;
use crate::numbering::path_exists;
use crate::operation::{OperationRecord, OperationType};
use crate::rename::rename_path;
use crate::undo::UndoData;

/// Outcome of re-applying a record.
struct Replay {
    /// Undo data describing where things landed this time.
    undo_data: UndoData,
    completed: Vec<PathBuf>,
    failures: Vec<FileOpError>,
}

impl Replay {
    fn done(undo_data: UndoData, completed: Vec<PathBuf>) -> Self {
        Self {
            undo_data,
            completed,
            failures: Vec::new(),
        }
    }
}

impl FileOperationsEngine {
    /// Reverse the most recent operation.
    ///
    /// The record only moves to the redo stack once the reversal fully
    /// succeeded. A record that cannot be reversed stays where it is, so
    /// fixing the cause and calling `undo` again retries it.
    pub fn undo(&mut self) -> Result<OperationType, FileOpError> {
        let Some(record) = self.history.peek_undo() else {
            return self.reject("undo", &[], FileOpError::NothingToUndo);
        };
        let op = record.operation_type();
        let name = format!("undo_{}", op.as_str());
        let paths = record.source_paths().to_vec();
        let target = record.target_path().map(Path::to_path_buf);

        if let Err(e) = record.validate() {
            warn!(operation = %op, error = %e, "refusing to undo corrupted record");
            return self.reject(&name, &paths, e);
        }

        self.events.started(name.as_str(), &paths);
        let result = match self.history.peek_undo() {
            Some(record) => self.reverse(record),
            None => Err(FileOpError::NothingToUndo),
        };
        if let Err(e) = result {
            return self.reject(&name, &paths, e);
        }

        self.history.undo();
        info!(operation = %op, "undone");
        self.events.completed(name, &paths, target);
        Ok(op)
    }

    /// Re-apply the most recently undone operation.
    ///
    /// Destinations are resolved again, so a redone paste may land on a
    /// different numbered name; the record is amended with the new paths.
    /// When only some items could be re-applied the record still moves back
    /// to the undo stack, describing just those items.
    pub fn redo(&mut self) -> Result<OperationType, FileOpError> {
        let Some(record) = self.history.peek_redo() else {
            return self.reject("redo", &[], FileOpError::NothingToRedo);
        };
        let op = record.operation_type();
        let name = format!("redo_{}", op.as_str());
        let paths = record.source_paths().to_vec();
        let target = record.target_path().map(Path::to_path_buf);

        if let Err(e) = record.validate() {
            warn!(operation = %op, error = %e, "refusing to redo corrupted record");
            return self.reject(&name, &paths, e);
        }

        self.events.started(name.as_str(), &paths);
        let replay = match self.history.peek_redo() {
            Some(record) => self.reapply(record),
            None => Err(FileOpError::NothingToRedo),
        };
        let replay = match replay {
            Ok(replay) => replay,
            Err(e) => return self.reject(&name, &paths, e),
        };

        if replay.completed.is_empty() && !replay.failures.is_empty() {
            let err = batch_result(replay.completed, replay.failures)
                .err()
                .unwrap_or(FileOpError::NothingToRedo);
            return self.reject(&name, &paths, err);
        }

        self.history.redo();
        self.history.amend_latest_undo(replay.undo_data);
        info!(operation = %op, count = replay.completed.len(), "redone");

        match batch_result(replay.completed, replay.failures) {
            Ok(_) => {
                self.events.completed(name, &paths, target);
                Ok(op)
            }
            Err(e) => self.reject(&name, &paths, e),
        }
    }

    /// Put the filesystem back the way it was before `record` ran.
    fn reverse(&self, record: &OperationRecord) -> Result<(), FileOpError> {
        match record.undo_data() {
            UndoData::Paste {
                pairs,
                was_cut: true,
            } => move_back(pairs, self.config.preserve_timestamps),
            UndoData::Move { moves } => move_back(moves, self.config.preserve_timestamps),
            UndoData::Paste { pairs, was_cut: false } => {
                let mut removed = Vec::new();
                let mut failures = Vec::new();
                for (_, created) in pairs {
                    match remove_if_present(created) {
                        Ok(()) => removed.push(created.clone()),
                        Err(e) => failures.push(e),
                    }
                }
                batch_result(removed, failures).map(|_| ())
            }
            UndoData::Delete { items } => {
                let mut restored = Vec::new();
                let mut failures = Vec::new();
                for item in items {
                    if path_exists(&item.path) {
                        debug!(path = %item.path.display(), "already present, not restoring");
                        continue;
                    }
                    match restore(item) {
                        Ok(lost) => {
                            for path in lost {
                                warn!(path = %path.display(), "content too large to keep, not restored");
                            }
                            restored.push(item.path.clone());
                        }
                        Err(e) => failures.push(e),
                    }
                }
                batch_result(restored, failures).map(|_| ())
            }
            UndoData::Rename { old_path, new_path } => {
                if !path_exists(new_path) && path_exists(old_path) {
                    debug!(path = %old_path.display(), "already renamed back");
                    return Ok(());
                }
                if path_exists(old_path) {
                    return Err(FileOpError::AlreadyExists {
                        path: old_path.clone(),
                    });
                }
                rename_path(new_path, old_path)
            }
            UndoData::Duplicate { created, .. } => remove_if_present(created),
            UndoData::NewFile { path } | UndoData::NewFolder { path } => remove_if_present(path),
            UndoData::None => Err(FileOpError::corrupted(
                record.operation_type().as_str(),
                "record carries no undo data",
            )),
        }
    }

    /// Perform `record` again, resolving destinations afresh.
    fn reapply(&self, record: &OperationRecord) -> Result<Replay, FileOpError> {
        let replay = match record.undo_data() {
            UndoData::Paste { pairs, was_cut } => {
                let (pairs, failures) = self.transfer_again(pairs, *was_cut);
                Replay {
                    completed: pairs.iter().map(|(_, to)| to.clone()).collect(),
                    undo_data: UndoData::Paste {
                        pairs,
                        was_cut: *was_cut,
                    },
                    failures,
                }
            }
            UndoData::Move { moves } => {
                let (moves, failures) = self.transfer_again(moves, true);
                Replay {
                    completed: moves.iter().map(|(_, to)| to.clone()).collect(),
                    undo_data: UndoData::Move { moves },
                    failures,
                }
            }
            UndoData::Delete { items } => {
                let mut budget = self.snapshot_budget();
                let mut kept = Vec::with_capacity(items.len());
                let mut failures = Vec::new();
                for item in items {
                    if !path_exists(&item.path) {
                        debug!(path = %item.path.display(), "already deleted");
                        kept.push(item.clone());
                        continue;
                    }
                    let deleted = snapshot(&item.path, &mut budget).and_then(
                        |fresh| remove_item(&item.path, self.config.use_trash).map(|_| fresh),
                    );
                    match deleted {
                        Ok(fresh) => kept.push(fresh),
                        Err(e) => failures.push(e),
                    }
                }
                Replay {
                    completed: kept.iter().map(|item| item.path.clone()).collect(),
                    undo_data: UndoData::Delete { items: kept },
                    failures,
                }
            }
            UndoData::Rename { old_path, new_path } => {
                if path_exists(new_path) {
                    return Err(FileOpError::AlreadyExists {
                        path: new_path.clone(),
                    });
                }
                rename_path(old_path, new_path)?;
                Replay::done(record.undo_data().clone(), vec![new_path.clone()])
            }
            UndoData::Duplicate { source, .. } => {
                let created = self.duplicate_one(source)?;
                Replay::done(
                    UndoData::Duplicate {
                        source: source.clone(),
                        created: created.clone(),
                    },
                    vec![created],
                )
            }
            UndoData::NewFile { path } => {
                create_empty_file(path)?;
                Replay::done(record.undo_data().clone(), vec![path.clone()])
            }
            UndoData::NewFolder { path } => {
                create_folder(path)?;
                Replay::done(record.undo_data().clone(), vec![path.clone()])
            }
            UndoData::None => {
                return Err(FileOpError::corrupted(
                    record.operation_type().as_str(),
                    "record carries no undo data",
                ));
            }
        };
        Ok(replay)
    }

    /// Move or copy each original again into the directory it went to before.
    fn transfer_again(
        &self,
        pairs: &[(PathBuf, PathBuf)],
        is_move: bool,
    ) -> (Vec<(PathBuf, PathBuf)>, Vec<FileOpError>) {
        let mut done = Vec::with_capacity(pairs.len());
        let mut failures = Vec::new();
        for (original, previous) in pairs {
            let Some(target_dir) = previous.parent() else {
                failures.push(FileOpError::NotFound {
                    path: previous.clone(),
                });
                continue;
            };
            if !path_exists(original) {
                failures.push(FileOpError::NotFound {
                    path: original.clone(),
                });
                continue;
            }
            match self.transfer(original, target_dir, is_move) {
                Ok(dest) => done.push((original.clone(), dest)),
                Err(e) => {
                    warn!(source = %original.display(), error = %e, "redo failed for item");
                    failures.push(e);
                }
            }
        }
        (done, failures)
    }
}

/// Move every `(original, current)` pair back to `original`.
///
/// Pairs already back in place are skipped.
fn move_back(pairs: &[(PathBuf, PathBuf)], preserve_timestamps: bool) -> Result<(), FileOpError> {
    let mut restored = Vec::new();
    let mut failures = Vec::new();
    for (original, current) in pairs {
        if !path_exists(current) && path_exists(original) {
            debug!(path = %original.display(), "already moved back");
            continue;
        }
        if path_exists(original) {
            failures.push(FileOpError::AlreadyExists {
                path: original.clone(),
            });
            continue;
        }
        if let Some(parent) = original.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = create_folder(parent) {
                failures.push(e);
                continue;
            }
        }
        match move_item(current, original, preserve_timestamps) {
            Ok(()) => restored.push(original.clone()),
            Err(e) => failures.push(e),
        }
    }
    batch_result(restored, failures).map(|_| ())
}
