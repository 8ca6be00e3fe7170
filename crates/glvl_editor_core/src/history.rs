// SPDX-License-Identifier: MIT OR Apache-2.0
//! Linear undo/redo history.
//!
//! A history is a list of actions with a cursor. Everything before the
//! cursor has been applied; everything after it has been undone and can be
//! redone until the next push discards it.

use crate::action::{ActionContext, HistoryAction};

/// Default maximum undo history depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// History statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Actions that can be undone
    pub undo_count: usize,
    /// Actions that can be redone
    pub redo_count: usize,
    /// Maximum history depth
    pub max_depth: usize,
}

/// Undo/redo history
#[derive(Debug, Clone)]
pub struct History {
    /// Recorded actions, oldest first
    actions: Vec<HistoryAction>,
    /// Number of applied actions
    cursor: usize,
    /// Maximum history depth
    max_depth: usize,
}

impl History {
    /// Create a new history
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            actions: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record an already-applied action, discarding the redo tail
    pub fn push(&mut self, action: HistoryAction) {
        self.actions.truncate(self.cursor);
        self.actions.push(action);
        self.cursor = self.actions.len();

        if self.actions.len() > self.max_depth {
            let excess = self.actions.len() - self.max_depth;
            self.actions.drain(..excess);
            self.cursor -= excess;
        }
    }

    /// Revert the action before the cursor. No-op at the start.
    pub fn undo(&mut self, ctx: &mut ActionContext<'_>) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let action = &self.actions[self.cursor];
        tracing::debug!("Undo {}", action.label());
        action.undo(ctx);
        true
    }

    /// Re-apply the action after the cursor. No-op at the end.
    pub fn redo(&mut self, ctx: &mut ActionContext<'_>) -> bool {
        let Some(action) = self.actions.get(self.cursor) else {
            return false;
        };
        tracing::debug!("Redo {}", action.label());
        action.redo(ctx);
        self.cursor += 1;
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor < self.actions.len()
    }

    /// Recorded actions, oldest first, including the redo tail
    pub fn actions(&self) -> &[HistoryAction] {
        &self.actions
    }

    /// Number of applied actions
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.actions.clear();
        self.cursor = 0;
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.cursor,
            redo_count: self.actions.len() - self.cursor,
            max_depth: self.max_depth,
        }
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&'static str> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.actions.get(i))
            .map(HistoryAction::label)
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&'static str> {
        self.actions.get(self.cursor).map(HistoryAction::label)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
