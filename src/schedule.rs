//! Id-keyed timer and animation-frame tables.
//!
//! The engine runs on a cooperative single-threaded loop and never reads a
//! clock. Debounce windows are deadlines stored per id in a [`TimerTable`];
//! in-flight corrective animations are handles stored per id in a
//! [`FrameTable`]. Owners poll them with the host's `now_ms` and cancel
//! entries explicitly on teardown, so a stale deadline can never fire
//! against an id that has been disposed.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use std::collections::HashMap;
use std::hash::Hash;

/// Per-id debounce deadlines.
#[derive(Debug)]
pub struct TimerTable<K> {
    deadlines: HashMap<K, (u64, u64)>,
    next_seq: u64,
}

impl<K> TimerTable<K>
where
    K: Copy + Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self { deadlines: HashMap::new(), next_seq: 0 }
    }

    /// Arm (or re-arm) the timer for `key` to fire at `now_ms + delay_ms`.
    /// Re-arming pushes the deadline out; it never fires twice.
    pub fn schedule(&mut self, key: K, now_ms: u64, delay_ms: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.deadlines.insert(key, (now_ms.saturating_add(delay_ms), seq));
    }

    /// Disarm the timer for `key`. Returns true if one was pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.deadlines.remove(key).is_some()
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.deadlines.contains_key(key)
    }

    /// Remove and return every key whose deadline is at or before `now_ms`,
    /// earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<K> {
        let mut due: Vec<(K, u64, u64)> = self
            .deadlines
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now_ms)
            .map(|(key, (deadline, seq))| (*key, *deadline, *seq))
            .collect();
        due.sort_by_key(|(_, deadline, seq)| (*deadline, *seq));
        for (key, _, _) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(key, _, _)| key).collect()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.deadlines.values().map(|(deadline, _)| *deadline).min()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

impl<K> Default for TimerTable<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle for a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

/// At most one pending animation frame per id.
#[derive(Debug)]
pub struct FrameTable<K, T> {
    frames: HashMap<K, (FrameHandle, T)>,
    next_handle: u64,
}

impl<K, T> FrameTable<K, T>
where
    K: Copy + Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self { frames: HashMap::new(), next_handle: 1 }
    }

    /// Request a frame for `key`, superseding any pending one. Returns the
    /// new handle and the payload of the frame it replaced.
    pub fn request(&mut self, key: K, payload: T) -> (FrameHandle, Option<T>) {
        let handle = FrameHandle(self.next_handle);
        self.next_handle += 1;
        let replaced = self.frames.insert(key, (handle, payload)).map(|(_, old)| old);
        (handle, replaced)
    }

    /// Cancel the pending frame for `key`, returning its payload.
    pub fn cancel(&mut self, key: &K) -> Option<T> {
        self.frames.remove(key).map(|(_, payload)| payload)
    }

    /// Whether `handle` is still the live frame for `key`.
    #[must_use]
    pub fn is_current(&self, key: &K, handle: FrameHandle) -> bool {
        self.frames.get(key).is_some_and(|(live, _)| *live == handle)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&T> {
        self.frames.get(key).map(|(_, payload)| payload)
    }

    /// Keys with a pending frame, in request order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        let mut entries: Vec<(K, FrameHandle)> = self.frames.iter().map(|(key, (handle, _))| (*key, *handle)).collect();
        entries.sort_by_key(|(_, handle)| *handle);
        entries.into_iter().map(|(key, _)| key).collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<K, T> Default for FrameTable<K, T>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
