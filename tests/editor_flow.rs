//! End-to-end editing sessions against the in-memory scene.

use artboard::config::EditorConfig;
use artboard::doc::{Document, Region, RegionId};
use artboard::editor::{Action, Editor};
use artboard::geom::{Bounds, Point};
use artboard::scene::{ElementKind, MemoryScene, SceneElement, SceneGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn committed_id(actions: &[Action]) -> RegionId {
    actions
        .iter()
        .find_map(|a| match a {
            Action::RegionCommitted(region) => Some(region.id),
            _ => None,
        })
        .unwrap()
}

#[test]
fn document_survives_an_editing_session() {
    let input = r##"{
        "version": 1,
        "zoom": 0.75,
        "scene": {"shapes": 3},
        "regions": [
            {"id": "00000000-0000-0000-0000-000000000001", "name": "Mobile", "x": 0, "y": 0,
             "width": 390, "height": 844, "backgroundColor": "#FFFFFF"},
            {"id": "00000000-0000-0000-0000-000000000002", "name": "Desktop", "x": 1200, "y": 0,
             "width": 1440, "height": 900, "backgroundColor": "#F5F5F5", "isActive": true}
        ]
    }"##;
    let mut ed = Editor::new(MemoryScene::new(), EditorConfig::default());
    ed.load_document(Document::from_json(input).unwrap(), 0);
    let mobile = ed.regions()[0].id;

    let button = ed
        .scene_mut()
        .insert(SceneElement::new(ElementKind::Shape, "button", Bounds::new(100.0, 700.0, 190.0, 48.0)))
        .unwrap();
    ed.sync_scene_events(10);
    ed.tick(500);
    assert_eq!(ed.region_of(&button), Some(mobile));

    // Drag the phone frame down; the button travels with it.
    ed.begin_drag(mobile);
    ed.drag_to(mobile, 0.0, 100.0, 600);
    ed.end_drag(mobile, 610);
    assert_eq!(ed.scene().bounds(&button).unwrap().origin(), Point::new(100.0, 800.0));

    let saved = ed.document().to_json().unwrap();
    let reloaded = Document::from_json(&saved).unwrap();
    assert_eq!(reloaded.zoom, 0.75);
    assert_eq!(reloaded.scene, serde_json::json!({"shapes": 3}));
    assert_eq!(reloaded.regions[0].origin(), Point::new(0.0, 100.0));
    assert!(reloaded.regions[1].is_active);

    ed.undo(700);
    assert_eq!(ed.document().regions[0].origin(), Point::zero());
    assert_eq!(ed.scene().bounds(&button).unwrap().origin(), Point::new(100.0, 700.0));
}

#[test]
fn randomly_placed_regions_never_overlap_and_undo_cleanly() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut ed = Editor::new(MemoryScene::new(), EditorConfig::default());
    let mut ids = Vec::new();
    for step in 0..12u64 {
        let bounds = Bounds::new(
            rng.random_range(0.0..1500.0),
            rng.random_range(0.0..1500.0),
            rng.random_range(100.0..400.0),
            rng.random_range(100.0..400.0),
        );
        let actions = ed.create_region(&format!("R{step}"), bounds, step * 1000);
        ids.push(committed_id(&actions));
        assert!(ed.overlapping_pairs().is_empty(), "overlap after creating R{step}");
    }
    let placed: Vec<Region> = ed.document().regions;

    for step in 0..12u64 {
        ed.undo(20_000 + step);
    }
    assert!(ed.regions().is_empty());
    assert!(ed.scene().is_empty());

    for step in 0..12u64 {
        ed.redo(30_000 + step);
    }
    assert_eq!(ed.document().regions, placed);
    assert_eq!(ed.regions().iter().map(|r| r.id).collect::<Vec<_>>(), ids);
}

#[test]
fn deleting_a_region_and_undoing_restores_members_in_paint_order() {
    let mut ed = Editor::new(MemoryScene::new(), EditorConfig::default());
    let below = ed.scene_mut().insert(SceneElement::new(ElementKind::Shape, "below", Bounds::new(5000.0, 0.0, 10.0, 10.0))).unwrap();
    let actions = ed.create_region("Card", Bounds::new(0.0, 0.0, 400.0, 300.0), 0);
    let card = committed_id(&actions);
    let a = ed.scene_mut().insert(SceneElement::new(ElementKind::Text, "title", Bounds::new(20.0, 20.0, 100.0, 20.0))).unwrap();
    let b = ed.scene_mut().insert(SceneElement::new(ElementKind::Image, "hero", Bounds::new(20.0, 60.0, 200.0, 100.0))).unwrap();
    ed.sync_scene_events(0);
    ed.tick(1000);
    assert_eq!(ed.members(&card), {
        let mut m = vec![a, b];
        m.sort();
        m
    });

    let order_before: Vec<_> = ed.scene().elements().iter().map(|el| el.id).collect();
    ed.delete_region(card, 2000);
    assert_eq!(ed.scene().elements().iter().map(|el| el.id).collect::<Vec<_>>(), vec![below]);

    ed.undo(3000);
    let order_after: Vec<_> = ed.scene().elements().iter().map(|el| el.id).collect();
    assert_eq!(order_after, order_before);
}
