use super::*;

#[test]
fn timer_fires_at_deadline_not_before() {
    let mut timers = TimerTable::new();
    timers.schedule(1u32, 1000, 150);
    assert!(timers.take_due(1149).is_empty());
    assert_eq!(timers.take_due(1150), vec![1]);
    assert!(timers.is_empty());
}

#[test]
fn rescheduling_pushes_deadline_out() {
    let mut timers = TimerTable::new();
    timers.schedule(1u32, 0, 150);
    timers.schedule(1u32, 100, 150);
    assert!(timers.take_due(200).is_empty());
    assert_eq!(timers.take_due(250), vec![1]);
    assert!(timers.take_due(1000).is_empty());
}

#[test]
fn cancel_prevents_firing() {
    let mut timers = TimerTable::new();
    timers.schedule(7u32, 0, 10);
    assert!(timers.cancel(&7));
    assert!(!timers.cancel(&7));
    assert!(timers.take_due(100).is_empty());
}

#[test]
fn due_keys_come_back_earliest_first() {
    let mut timers = TimerTable::new();
    timers.schedule(3u32, 0, 30);
    timers.schedule(1u32, 0, 10);
    timers.schedule(2u32, 0, 20);
    assert_eq!(timers.next_deadline(), Some(10));
    assert_eq!(timers.take_due(100), vec![1, 2, 3]);
}

#[test]
fn frame_request_supersedes_pending_frame() {
    let mut frames: FrameTable<u32, &str> = FrameTable::new();
    let (first, replaced) = frames.request(1, "a");
    assert!(replaced.is_none());
    let (second, replaced) = frames.request(1, "b");
    assert_eq!(replaced, Some("a"));
    assert!(!frames.is_current(&1, first));
    assert!(frames.is_current(&1, second));
    assert_eq!(frames.get(&1), Some(&"b"));
    assert_eq!(frames.len(), 1);
}

#[test]
fn frame_cancel_is_idempotent() {
    let mut frames: FrameTable<u32, u8> = FrameTable::new();
    frames.request(1, 9);
    assert_eq!(frames.cancel(&1), Some(9));
    assert_eq!(frames.cancel(&1), None);
    assert!(frames.is_empty());
}

#[test]
fn frame_keys_in_request_order() {
    let mut frames: FrameTable<u32, ()> = FrameTable::new();
    frames.request(5, ());
    frames.request(2, ());
    frames.request(9, ());
    assert_eq!(frames.keys(), vec![5, 2, 9]);
}
