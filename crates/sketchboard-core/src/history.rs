//! Undo/redo history over whole-document snapshots.

use crate::document::Document;
use std::collections::VecDeque;

/// Maximum number of undo states to keep.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Whether applied changes are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Changes push the previous document onto the undo stack.
    #[default]
    Recording,
    /// Changes replace the live document without touching the stacks.
    /// Used while restoring snapshots and for live previews.
    Replaying,
}

/// Owns the live document and its undo/redo stacks.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    live: Document,
    undo_stack: VecDeque<Document>,
    redo_stack: VecDeque<Document>,
    limit: usize,
    mode: HistoryMode,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryManager {
    /// Create a history over an empty document.
    pub fn new(limit: usize) -> Self {
        Self::with_document(Document::new(), limit)
    }

    /// Create a history over an existing document.
    pub fn with_document(document: Document, limit: usize) -> Self {
        Self {
            live: document,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            limit: limit.max(1),
            mode: HistoryMode::Recording,
        }
    }

    /// The live document.
    pub fn document(&self) -> &Document {
        &self.live
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    /// Run `f` in replaying mode, restoring the previous mode afterwards.
    pub fn replaying<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.mode, HistoryMode::Replaying);
        let result = f(self);
        self.mode = previous;
        result
    }

    /// Apply a mutation to the live document.
    ///
    /// Returns `true` if the document changed. In recording mode the previous
    /// document becomes an undo entry and the redo stack is cleared.
    pub fn apply(&mut self, mutate: impl FnOnce(&Document) -> Document) -> bool {
        let next = mutate(&self.live);
        if next == self.live {
            return false;
        }
        let previous = std::mem::replace(&mut self.live, next);
        if self.mode == HistoryMode::Recording {
            self.record(previous);
        }
        true
    }

    /// Apply a mutation without creating a history entry.
    pub fn apply_untracked(&mut self, mutate: impl FnOnce(&Document) -> Document) -> bool {
        self.replaying(|history| history.apply(mutate))
    }

    /// Replace the live document and drop all history (used when hydrating).
    pub fn replace(&mut self, document: Document) {
        self.live = document;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop_back() else {
            return false;
        };
        self.replaying(|history| {
            let current = std::mem::replace(&mut history.live, snapshot);
            push_bounded(&mut history.redo_stack, current, history.limit);
        });
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop_back() else {
            return false;
        };
        self.replaying(|history| {
            let current = std::mem::replace(&mut history.live, snapshot);
            push_bounded(&mut history.undo_stack, current, history.limit);
        });
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn record(&mut self, previous: Document) {
        // A fresh edit always invalidates redo, even when the snapshot itself
        // is suppressed as a duplicate.
        self.redo_stack.clear();
        if self.undo_stack.back() == Some(&previous) {
            return;
        }
        push_bounded(&mut self.undo_stack, previous, self.limit);
    }
}

fn push_bounded(stack: &mut VecDeque<Document>, snapshot: Document, limit: usize) {
    stack.push_back(snapshot);
    while stack.len() > limit {
        stack.pop_front();
    }
}
