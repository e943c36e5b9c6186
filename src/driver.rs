//! Tokio frame driver for a shared [`Editor`].
//!
//! DESIGN
//! ======
//! The engine never reads a clock. A host running on tokio shares one editor
//! behind an async mutex and lets this driver call [`Editor::tick`] once per
//! frame with milliseconds elapsed since the driver started. Non-empty action
//! lists go out on a bounded channel; a full channel drops the frame's actions
//! (the next tick reports fresh state), a closed channel stops the driver.
//!
//! Undo and redo from the host go through [`EditorHandle`], which refuses to
//! wait: if the editor is busy with another call the request is dropped.

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::editor::{Action, Editor};
use crate::scene::SceneGraph;

pub type SharedEditor<S> = Arc<Mutex<Editor<S>>>;

const ACTION_QUEUE_CAPACITY: usize = 256;

/// Cheap clonable access to a shared editor with a common clock.
pub struct EditorHandle<S> {
    editor: SharedEditor<S>,
    epoch: Instant,
}

impl<S> Clone for EditorHandle<S> {
    fn clone(&self) -> Self {
        Self { editor: Arc::clone(&self.editor), epoch: self.epoch }
    }
}

impl<S: SceneGraph + Send + 'static> EditorHandle<S> {
    #[must_use]
    pub fn new(editor: Editor<S>) -> Self {
        Self { editor: Arc::new(Mutex::new(editor)), epoch: Instant::now() }
    }

    #[must_use]
    pub fn shared(&self) -> SharedEditor<S> {
        Arc::clone(&self.editor)
    }

    /// Milliseconds since this handle was created.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Run `f` against the editor with the current time.
    pub async fn with<R>(&self, f: impl FnOnce(&mut Editor<S>, u64) -> R) -> R {
        let mut editor = self.editor.lock().await;
        f(&mut editor, self.now_ms())
    }

    /// Undo, unless the editor is busy. `None` means the request was dropped.
    #[must_use]
    pub fn undo(&self) -> Option<Vec<Action>> {
        let now = self.now_ms();
        let Ok(mut editor) = self.editor.try_lock() else {
            debug!("driver: undo dropped, editor busy");
            return None;
        };
        Some(editor.undo(now))
    }

    /// Redo, unless the editor is busy. `None` means the request was dropped.
    #[must_use]
    pub fn redo(&self) -> Option<Vec<Action>> {
        let now = self.now_ms();
        let Ok(mut editor) = self.editor.try_lock() else {
            debug!("driver: redo dropped, editor busy");
            return None;
        };
        Some(editor.redo(now))
    }

    /// Tick the editor every `frame_ms` and forward non-empty action lists.
    #[must_use]
    pub fn spawn_frame_driver(&self, frame_ms: u64) -> (JoinHandle<()>, mpsc::Receiver<Vec<Action>>) {
        let (tx, rx) = mpsc::channel(ACTION_QUEUE_CAPACITY);
        let handle = self.clone();
        info!(frame_ms, "driver: frame loop started");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    info!("driver: receiver closed, frame loop stopped");
                    break;
                }
                let actions = handle.with(Editor::tick).await;
                if actions.is_empty() {
                    continue;
                }
                match tx.try_send(actions) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("driver: action queue full; dropping frame");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        info!("driver: receiver closed, frame loop stopped");
                        break;
                    }
                }
            }
        });
        (task, rx)
    }
}
