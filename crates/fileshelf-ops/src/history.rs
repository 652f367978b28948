//! Bounded undo/redo history.

use std::collections::VecDeque;

use fileshelf_core::DEFAULT_MAX_HISTORY;

use crate::operation::OperationRecord;
use crate::undo::UndoData;

/// Two bounded stacks of operation records.
///
/// The stacks never touch the filesystem; the engine performs the actual
/// reversal and only then moves a record from one stack to the other.
#[derive(Debug)]
pub struct HistoryStack {
    undo_stack: VecDeque<OperationRecord>,
    redo_stack: VecDeque<OperationRecord>,
    max_history: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryStack {
    /// Create a history keeping at most `max_history` records per stack.
    pub fn new(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_history.min(1000)),
            redo_stack: VecDeque::new(),
            max_history,
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Record a completed operation.
    ///
    /// Records that are not undoable are ignored. Anything on the redo stack
    /// is discarded. Returns whether the record was kept.
    pub fn record_operation(&mut self, record: OperationRecord) -> bool {
        if !record.is_undoable() {
            return false;
        }

        self.redo_stack.clear();
        push_bounded(&mut self.undo_stack, record, self.max_history);
        true
    }

    /// Move the most recent record to the redo stack and return it.
    pub fn undo(&mut self) -> Option<&OperationRecord> {
        let record = self.undo_stack.pop_back()?;
        push_bounded(&mut self.redo_stack, record, self.max_history);
        self.redo_stack.back()
    }

    /// Move the most recently undone record back to the undo stack and return it.
    pub fn redo(&mut self) -> Option<&OperationRecord> {
        let record = self.redo_stack.pop_back()?;
        push_bounded(&mut self.undo_stack, record, self.max_history);
        self.undo_stack.back()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The record the next `undo` would return.
    pub fn peek_undo(&self) -> Option<&OperationRecord> {
        self.undo_stack.back()
    }

    /// The record the next `redo` would return.
    pub fn peek_redo(&self) -> Option<&OperationRecord> {
        self.redo_stack.back()
    }

    /// Replace the undo data of the newest undo record.
    ///
    /// Used after a redo that produced different output paths.
    pub fn amend_latest_undo(&mut self, undo_data: UndoData) -> bool {
        match self.undo_stack.back_mut() {
            Some(record) => {
                record.set_undo_data(undo_data);
                true
            }
            None => false,
        }
    }

    /// Undo records, oldest first.
    pub fn get_undo_history(&self) -> Vec<&OperationRecord> {
        self.undo_stack.iter().collect()
    }

    /// Redo records, oldest first.
    pub fn get_redo_history(&self) -> Vec<&OperationRecord> {
        self.redo_stack.iter().collect()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear both stacks.
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<OperationRecord>, record: OperationRecord, max: usize) {
    stack.push_back(record);
    while stack.len() > max {
        stack.pop_front();
    }
}
