use super::*;

/// Test context: a row of numbered slots.
type Slots = Vec<i64>;

/// Sets a slot to a value, remembering the previous one. Merges with a
/// following set of the same slot within 500 ms.
struct SetSlot {
    meta: CommandMeta,
    slot: usize,
    value: i64,
    previous: Option<i64>,
}

fn set(slot: usize, value: i64, at: u64) -> Box<dyn Command<Slots>> {
    Box::new(SetSlot { meta: CommandMeta::new("set_slot", format!("set {slot}"), at), slot, value, previous: None })
}

impl Command<Slots> for SetSlot {
    fn execute(&mut self, ctx: &mut Slots) -> Result<(), CommandError> {
        let cell = ctx.get_mut(self.slot).ok_or_else(|| CommandError::Failed(format!("no slot {}", self.slot)))?;
        self.previous = Some(*cell);
        *cell = self.value;
        Ok(())
    }

    fn undo(&mut self, ctx: &mut Slots) -> Result<(), CommandError> {
        let cell = ctx.get_mut(self.slot).ok_or_else(|| CommandError::Failed(format!("no slot {}", self.slot)))?;
        if let Some(prev) = self.previous {
            *cell = prev;
        }
        Ok(())
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn can_merge(&self, next: &dyn Command<Slots>) -> bool {
        next.as_any().downcast_ref::<SetSlot>().is_some_and(|n| {
            n.slot == self.slot && n.meta.timestamp_ms.saturating_sub(self.meta.timestamp_ms) <= 500
        })
    }

    fn accept_merge(&mut self, next: &dyn Command<Slots>) -> bool {
        let Some(n) = next.as_any().downcast_ref::<SetSlot>() else {
            return false;
        };
        self.value = n.value;
        self.meta.timestamp_ms = n.meta.timestamp_ms;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Always fails to undo.
struct StuckUndo {
    meta: CommandMeta,
}

impl Command<Slots> for StuckUndo {
    fn execute(&mut self, _ctx: &mut Slots) -> Result<(), CommandError> {
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut Slots) -> Result<(), CommandError> {
        Err(CommandError::Failed("stuck".into()))
    }

    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================
// CommandHistory
// =============================================================

#[test]
fn execute_then_undo_restores_state() {
    let mut ctx = vec![0, 0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 5, 0), &mut ctx).unwrap();
    assert_eq!(ctx, vec![5, 0]);
    assert!(history.undo(&mut ctx).unwrap());
    assert_eq!(ctx, vec![0, 0]);
    assert!(history.redo(&mut ctx).unwrap());
    assert_eq!(ctx, vec![5, 0]);
}

#[test]
fn undo_on_empty_and_redo_at_end_are_noops() {
    let mut ctx = vec![0];
    let mut history: CommandHistory<Slots> = CommandHistory::new(50);
    assert!(!history.undo(&mut ctx).unwrap());
    assert!(!history.redo(&mut ctx).unwrap());
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    assert!(!history.redo(&mut ctx).unwrap());
    assert_eq!(ctx, vec![1]);
}

#[test]
fn new_command_truncates_redo() {
    let mut ctx = vec![0, 0, 0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    history.execute(set(1, 2, 1000), &mut ctx).unwrap();
    history.undo(&mut ctx).unwrap();
    history.execute(set(2, 3, 2000), &mut ctx).unwrap();

    assert!(!history.can_redo());
    assert_eq!(history.len(), 2);
    assert_eq!(ctx, vec![1, 0, 3]);
    assert!(!history.redo(&mut ctx).unwrap());
}

#[test]
fn same_target_within_window_merges() {
    let mut ctx = vec![0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 10, 0), &mut ctx).unwrap();
    history.execute(set(0, 20, 300), &mut ctx).unwrap();
    history.execute(set(0, 30, 600), &mut ctx).unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(ctx, vec![30]);
    history.undo(&mut ctx).unwrap();
    assert_eq!(ctx, vec![0]);
    assert!(!history.can_undo());
}

#[test]
fn outside_window_does_not_merge() {
    let mut ctx = vec![0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 10, 0), &mut ctx).unwrap();
    history.execute(set(0, 20, 501), &mut ctx).unwrap();
    assert_eq!(history.len(), 2);
    history.undo(&mut ctx).unwrap();
    assert_eq!(ctx, vec![10]);
}

#[test]
fn different_targets_do_not_merge() {
    let mut ctx = vec![0, 0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    history.execute(set(1, 1, 10), &mut ctx).unwrap();
    assert_eq!(history.len(), 2);
}

#[test]
fn depth_is_bounded_and_oldest_evicted() {
    let mut ctx = vec![0; 5];
    let mut history = CommandHistory::new(3);
    for slot in 0..5 {
        history.execute(set(slot, 1, 0), &mut ctx).unwrap();
    }
    assert_eq!(history.len(), 3);
    assert_eq!(history.cursor(), 3);
    while history.undo(&mut ctx).unwrap() {}
    // The first two sets fell off the bottom and stay applied.
    assert_eq!(ctx, vec![1, 1, 0, 0, 0]);
}

#[test]
fn failed_execute_records_nothing_and_keeps_redo() {
    let mut ctx = vec![0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    history.undo(&mut ctx).unwrap();

    let err = history.execute(set(9, 1, 1000), &mut ctx);
    assert!(matches!(err, Err(CommandError::Failed(_))));
    assert!(history.can_redo());
    assert_eq!(history.cursor(), 0);
}

#[test]
fn failed_undo_keeps_cursor() {
    let mut ctx = vec![0];
    let mut history = CommandHistory::new(50);
    history.execute(Box::new(StuckUndo { meta: CommandMeta::new("stuck", "stuck", 0) }), &mut ctx).unwrap();
    assert!(history.undo(&mut ctx).is_err());
    assert_eq!(history.cursor(), 1);
    assert!(history.can_undo());
}

#[test]
fn descriptions_follow_cursor() {
    let mut ctx = vec![0, 0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    history.execute(set(1, 1, 1000), &mut ctx).unwrap();
    assert_eq!(history.undo_description(), Some("set 1"));
    history.undo(&mut ctx).unwrap();
    assert_eq!(history.undo_description(), Some("set 0"));
    assert_eq!(history.redo_description(), Some("set 1"));
    assert_eq!(history.undo_descriptions(), vec!["set 0"]);
}

#[test]
fn clear_empties_history() {
    let mut ctx = vec![0];
    let mut history = CommandHistory::new(50);
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    history.clear();
    assert!(history.is_empty());
    assert!(!history.can_undo());
}

// =============================================================
// CommandBatch
// =============================================================

#[test]
fn batch_rolls_back_on_failure() {
    let mut ctx = vec![0, 0];
    let mut batch = CommandBatch::new("two", 0);
    batch.push(set(0, 1, 0));
    batch.push(set(1, 2, 0));
    batch.push(set(7, 3, 0));
    assert!(batch.execute(&mut ctx).is_err());
    assert_eq!(ctx, vec![0, 0]);
}

#[test]
fn batch_undo_reverts_in_reverse() {
    let mut ctx = vec![0];
    let mut batch = CommandBatch::new("two", 0);
    batch.push(set(0, 1, 0));
    batch.push(set(0, 2, 0));
    batch.execute(&mut ctx).unwrap();
    assert_eq!(ctx, vec![2]);
    batch.undo(&mut ctx).unwrap();
    assert_eq!(ctx, vec![0]);
}

// =============================================================
// BatchedHistory
// =============================================================

#[test]
fn batch_window_groups_commands_into_one_entry() {
    let mut ctx = vec![0, 0];
    let mut history = BatchedHistory::new(50, 50);
    history.submit(set(0, 1, 0), 0);
    history.submit(set(1, 2, 10), 10);
    assert_eq!(ctx, vec![0, 0]);

    assert!(!history.poll(49, &mut ctx).unwrap());
    assert!(history.poll(50, &mut ctx).unwrap());
    assert_eq!(ctx, vec![1, 2]);
    assert_eq!(history.history().len(), 1);
    assert_eq!(history.history().undo_description(), Some("2 changes"));

    history.undo(&mut ctx).unwrap();
    assert_eq!(ctx, vec![0, 0]);
}

#[test]
fn mergeable_submissions_merge_inside_batch() {
    let mut ctx = vec![0];
    let mut history = BatchedHistory::new(50, 50);
    history.submit(set(0, 1, 0), 0);
    history.submit(set(0, 2, 5), 5);
    assert_eq!(history.pending_len(), 1);
    history.flush(&mut ctx).unwrap();
    assert_eq!(history.history().undo_description(), Some("set 0"));
    assert_eq!(ctx, vec![2]);
}

#[test]
fn undo_flushes_pending_first() {
    let mut ctx = vec![0, 0];
    let mut history = BatchedHistory::new(50, 50);
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    history.submit(set(1, 1, 1000), 1000);
    assert!(history.can_undo());
    assert!(history.undo(&mut ctx).unwrap());
    // The pending set was applied then undone; the earlier one survives.
    assert_eq!(ctx, vec![1, 0]);
    assert!(history.can_redo());
}

#[test]
fn pending_blocks_redo() {
    let mut ctx = vec![0, 0];
    let mut history = BatchedHistory::new(50, 50);
    history.execute(set(0, 1, 0), &mut ctx).unwrap();
    history.undo(&mut ctx).unwrap();
    history.submit(set(1, 1, 1000), 1000);
    assert!(!history.can_redo());
    assert!(!history.redo(&mut ctx).unwrap());
    assert_eq!(ctx, vec![0, 1]);
}

#[test]
fn failed_batch_is_rolled_back_and_not_recorded() {
    let mut ctx = vec![0];
    let mut history = BatchedHistory::new(50, 50);
    history.submit(set(0, 1, 0), 0);
    history.submit(set(3, 1, 1), 1);
    assert!(history.flush(&mut ctx).is_err());
    assert_eq!(ctx, vec![0]);
    assert!(history.history().is_empty());
    assert_eq!(history.pending_len(), 0);
}
