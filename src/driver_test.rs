use super::*;
use crate::config::EditorConfig;
use crate::geom::Bounds;
use crate::scene::{ElementKind, MemoryScene, SceneElement};

fn handle() -> EditorHandle<MemoryScene> {
    EditorHandle::new(Editor::new(MemoryScene::new(), EditorConfig::default()))
}

#[tokio::test(start_paused = true)]
async fn frame_driver_delivers_debounced_layer_update() {
    let handle = handle();
    handle
        .with(|ed, now| {
            ed.scene_mut().insert(SceneElement::new(ElementKind::Shape, "box", Bounds::new(0.0, 0.0, 10.0, 10.0))).unwrap();
            ed.sync_scene_events(now)
        })
        .await;

    let (task, mut rx) = handle.spawn_frame_driver(16);
    let actions = rx.recv().await.unwrap();
    assert!(actions.iter().any(|a| matches!(a, Action::LayersChanged(layers) if layers.len() == 1)));
    assert!(handle.now_ms() >= 100);

    drop(rx);
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn idle_editor_sends_nothing() {
    let handle = handle();
    let (task, mut rx) = handle.spawn_frame_driver(16);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
    task.abort();
}

#[tokio::test]
async fn undo_is_dropped_while_editor_is_busy() {
    let handle = handle();
    handle.with(|ed, now| ed.create_region("Home", Bounds::new(0.0, 0.0, 300.0, 200.0), now)).await;

    let shared = handle.shared();
    let guard = shared.lock().await;
    assert!(handle.undo().is_none());
    assert!(handle.redo().is_none());
    drop(guard);

    let actions = handle.undo().unwrap();
    assert!(actions.iter().any(|a| matches!(a, Action::RegionRemoved(_))));
    let actions = handle.redo().unwrap();
    assert!(actions.iter().any(|a| matches!(a, Action::RegionCommitted(_))));
}
