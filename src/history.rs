//! Command-pattern undo/redo.
//!
//! DESIGN
//! ======
//! History is a list of applied commands plus a cursor: entries below the
//! cursor are applied, entries at or above it are undone and can be redone.
//! Recording a new command truncates everything above the cursor, then either
//! merges into the top entry (when the top entry accepts it) or appends.
//! Depth is bounded; the oldest entries fall off the bottom.
//!
//! Commands receive the context they act on as `&mut C` for every call, so a
//! command owns only the data it needs to redo and undo itself.
//!
//! ERROR HANDLING
//! ==============
//! Invalid requests (undo with nothing applied, redo at the end) are `Ok(false)`.
//! A command that fails leaves the cursor where it was; the error is logged
//! and returned so the owner can tell the user.
//!
//! `BatchedHistory` sits in front of `CommandHistory` and gathers commands
//! submitted within a short window into one entry.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::consts::HISTORY_MAX_DEPTH;
use crate::error::CommandError;

/// Identity and labeling carried by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMeta {
    pub id: Uuid,
    /// Stable machine-readable kind, e.g. `"move_region"`.
    pub kind: &'static str,
    /// Human-readable label for menus.
    pub description: String,
    /// Host time at which the command was created (or last merged).
    pub timestamp_ms: u64,
}

impl CommandMeta {
    #[must_use]
    pub fn new(kind: &'static str, description: impl Into<String>, timestamp_ms: u64) -> Self {
        Self { id: Uuid::new_v4(), kind, description: description.into(), timestamp_ms }
    }
}

/// A reversible edit against context `C`.
///
/// `execute` followed by `undo` must restore the observable state exactly.
pub trait Command<C>: Send {
    /// # Errors
    ///
    /// Returns the failure; the context must be left as it was.
    fn execute(&mut self, ctx: &mut C) -> Result<(), CommandError>;

    /// # Errors
    ///
    /// Returns the failure; the context must be left as it was.
    fn undo(&mut self, ctx: &mut C) -> Result<(), CommandError>;

    /// # Errors
    ///
    /// Same as [`Command::execute`].
    fn redo(&mut self, ctx: &mut C) -> Result<(), CommandError> {
        self.execute(ctx)
    }

    fn meta(&self) -> &CommandMeta;

    fn description(&self) -> &str {
        &self.meta().description
    }

    /// Whether `next`, recorded right after this one, can fold into it.
    fn can_merge(&self, _next: &dyn Command<C>) -> bool {
        false
    }

    /// Fold `next` into this command. Returns false if it cannot.
    fn accept_merge(&mut self, _next: &dyn Command<C>) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

impl<C> fmt::Debug for dyn Command<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("meta", self.meta()).finish()
    }
}

// =============================================================================
// CommandBatch
// =============================================================================

/// Several commands applied and reverted as one entry.
pub struct CommandBatch<C> {
    commands: Vec<Box<dyn Command<C>>>,
    meta: CommandMeta,
    executed_to: usize,
}

impl<C> CommandBatch<C> {
    #[must_use]
    pub fn new(description: impl Into<String>, timestamp_ms: u64) -> Self {
        Self { commands: Vec::new(), meta: CommandMeta::new("batch", description, timestamp_ms), executed_to: 0 }
    }

    pub fn push(&mut self, cmd: Box<dyn Command<C>>) {
        self.commands.push(cmd);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<C: 'static> Command<C> for CommandBatch<C> {
    fn execute(&mut self, ctx: &mut C) -> Result<(), CommandError> {
        for i in 0..self.commands.len() {
            if let Err(e) = self.commands[i].execute(ctx) {
                for j in (0..i).rev() {
                    if let Err(rollback) = self.commands[j].undo(ctx) {
                        warn!(error = %rollback, kind = self.commands[j].meta().kind, "history: batch rollback failed");
                    }
                }
                self.executed_to = 0;
                return Err(e);
            }
            self.executed_to = i + 1;
        }
        Ok(())
    }

    fn undo(&mut self, ctx: &mut C) -> Result<(), CommandError> {
        while self.executed_to > 0 {
            let i = self.executed_to - 1;
            if let Err(e) = self.commands[i].undo(ctx) {
                // Re-apply what was already reverted so the batch stays whole.
                for j in i + 1..self.commands.len() {
                    if let Err(reapply) = self.commands[j].redo(ctx) {
                        warn!(error = %reapply, kind = self.commands[j].meta().kind, "history: batch reapply failed");
                    }
                }
                self.executed_to = self.commands.len();
                return Err(e);
            }
            self.executed_to = i;
        }
        Ok(())
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// CommandHistory
// =============================================================================

/// Bounded undo/redo history over context `C`.
pub struct CommandHistory<C> {
    entries: VecDeque<Box<dyn Command<C>>>,
    cursor: usize,
    max_depth: usize,
}

impl<C> fmt::Debug for CommandHistory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<C> Default for CommandHistory<C> {
    fn default() -> Self {
        Self::new(HISTORY_MAX_DEPTH)
    }
}

impl<C> CommandHistory<C> {
    /// A history that keeps at most `max_depth` entries (at least one).
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { entries: VecDeque::new(), cursor: 0, max_depth: max_depth.max(1) }
    }

    /// Apply `cmd` and record it.
    ///
    /// # Errors
    ///
    /// Returns the command's failure. Nothing is recorded and redo entries survive.
    pub fn execute(&mut self, mut cmd: Box<dyn Command<C>>, ctx: &mut C) -> Result<(), CommandError> {
        if let Err(e) = cmd.execute(ctx) {
            warn!(error = %e, kind = cmd.meta().kind, "history: execute failed");
            return Err(e);
        }
        self.record(cmd);
        Ok(())
    }

    /// Record a command whose effect is already applied.
    pub fn record(&mut self, cmd: Box<dyn Command<C>>) {
        self.entries.truncate(self.cursor);

        if let Some(top) = self.entries.back_mut()
            && top.can_merge(cmd.as_ref())
            && top.accept_merge(cmd.as_ref())
        {
            debug!(kind = cmd.meta().kind, "history: merged into top entry");
            return;
        }

        self.entries.push_back(cmd);
        self.cursor = self.entries.len();
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
            self.cursor -= 1;
        }
    }

    /// Revert the newest applied entry. `Ok(false)` when there is none.
    ///
    /// # Errors
    ///
    /// Returns the command's failure; the cursor does not move.
    pub fn undo(&mut self, ctx: &mut C) -> Result<bool, CommandError> {
        if self.cursor == 0 {
            return Ok(false);
        }
        let Some(entry) = self.entries.get_mut(self.cursor - 1) else {
            return Ok(false);
        };
        if let Err(e) = entry.undo(ctx) {
            warn!(error = %e, kind = entry.meta().kind, "history: undo failed");
            return Err(e);
        }
        self.cursor -= 1;
        Ok(true)
    }

    /// Re-apply the oldest undone entry. `Ok(false)` when there is none.
    ///
    /// # Errors
    ///
    /// Returns the command's failure; the cursor does not move.
    pub fn redo(&mut self, ctx: &mut C) -> Result<bool, CommandError> {
        let Some(entry) = self.entries.get_mut(self.cursor) else {
            return Ok(false);
        };
        if let Err(e) = entry.redo(ctx) {
            warn!(error = %e, kind = entry.meta().kind, "history: redo failed");
            return Err(e);
        }
        self.cursor += 1;
        Ok(true)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    #[must_use]
    pub fn undo_description(&self) -> Option<&str> {
        self.cursor.checked_sub(1).and_then(|i| self.entries.get(i)).map(|cmd| cmd.description())
    }

    #[must_use]
    pub fn redo_description(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(|cmd| cmd.description())
    }

    /// Descriptions of applied entries, newest first.
    #[must_use]
    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.entries.iter().take(self.cursor).rev().map(|cmd| cmd.description()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Number of entries, applied or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of applied entries.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

// =============================================================================
// BatchedHistory
// =============================================================================

/// Collects commands submitted within a short window and records them as
/// one history entry.
pub struct BatchedHistory<C> {
    history: CommandHistory<C>,
    pending: Vec<Box<dyn Command<C>>>,
    window_ms: u64,
    deadline: Option<u64>,
}

impl<C> fmt::Debug for BatchedHistory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchedHistory")
            .field("history", &self.history)
            .field("pending", &self.pending.len())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl<C: 'static> BatchedHistory<C> {
    #[must_use]
    pub fn new(max_depth: usize, window_ms: u64) -> Self {
        Self { history: CommandHistory::new(max_depth), pending: Vec::new(), window_ms, deadline: None }
    }

    /// Queue a command. It runs when the batch window closes or on `flush`.
    pub fn submit(&mut self, cmd: Box<dyn Command<C>>, now_ms: u64) {
        if let Some(last) = self.pending.last_mut()
            && last.can_merge(cmd.as_ref())
            && last.accept_merge(cmd.as_ref())
        {
            return;
        }
        self.pending.push(cmd);
        if self.deadline.is_none() {
            self.deadline = Some(now_ms.saturating_add(self.window_ms));
        }
    }

    /// Flush the batch if its window has closed. `Ok(false)` when nothing ran.
    ///
    /// # Errors
    ///
    /// Returns the first failing command's error; the batch is rolled back.
    pub fn poll(&mut self, now_ms: u64, ctx: &mut C) -> Result<bool, CommandError> {
        match self.deadline {
            Some(deadline) if deadline <= now_ms => self.flush(ctx),
            _ => Ok(false),
        }
    }

    /// Run every pending command now and record them as one entry.
    ///
    /// # Errors
    ///
    /// Returns the first failing command's error; the batch is rolled back
    /// and nothing is recorded.
    pub fn flush(&mut self, ctx: &mut C) -> Result<bool, CommandError> {
        self.deadline = None;
        let mut pending = std::mem::take(&mut self.pending);
        let entry: Box<dyn Command<C>> = if pending.len() > 1 {
            let timestamp = pending.iter().map(|cmd| cmd.meta().timestamp_ms).max().unwrap_or_default();
            let mut batch = CommandBatch::new(format!("{} changes", pending.len()), timestamp);
            for cmd in pending {
                batch.push(cmd);
            }
            Box::new(batch)
        } else {
            match pending.pop() {
                Some(cmd) => cmd,
                None => return Ok(false),
            }
        };
        debug!(kind = entry.meta().kind, "history: flushing batch");
        self.history.execute(entry, ctx)?;
        Ok(true)
    }

    /// Flush, then apply and record `cmd` immediately.
    ///
    /// # Errors
    ///
    /// Returns a flush failure or the command's own failure.
    pub fn execute(&mut self, cmd: Box<dyn Command<C>>, ctx: &mut C) -> Result<(), CommandError> {
        self.flush(ctx)?;
        self.history.execute(cmd, ctx)
    }

    /// Flush, then record a command whose effect is already applied.
    ///
    /// # Errors
    ///
    /// Returns a flush failure; `cmd` is still recorded.
    pub fn record(&mut self, cmd: Box<dyn Command<C>>, ctx: &mut C) -> Result<(), CommandError> {
        let flushed = self.flush(ctx);
        self.history.record(cmd);
        flushed.map(|_| ())
    }

    /// # Errors
    ///
    /// Returns a flush failure or the undo failure.
    pub fn undo(&mut self, ctx: &mut C) -> Result<bool, CommandError> {
        self.flush(ctx)?;
        self.history.undo(ctx)
    }

    /// # Errors
    ///
    /// Returns a flush failure or the redo failure.
    pub fn redo(&mut self, ctx: &mut C) -> Result<bool, CommandError> {
        self.flush(ctx)?;
        self.history.redo(ctx)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || !self.pending.is_empty()
    }

    /// Pending commands would truncate the redo tail once flushed.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.pending.is_empty() && self.history.can_redo()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.deadline
    }

    #[must_use]
    pub fn history(&self) -> &CommandHistory<C> {
        &self.history
    }

    /// Drop pending commands and every entry.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadline = None;
        self.history.clear();
    }
}
