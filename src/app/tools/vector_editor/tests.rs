use approx::assert_relative_eq;
use glam::Vec2;

use super::super::{ApplyOutcome, MapTool, Rejection, ToolContext, ToolResponse};
use super::{EditorMode, VectorEditor};
use crate::app::state::MapDocument;
use crate::core::entity::{EntityGeometry, EntityKind, EntityMetadata};
use crate::core::entity_store::EntityStore;
use crate::core::projector::ScreenProjection;
use crate::shared::EditorOptions;

/// Screen-Pixel == Weltkoordinaten.
struct Identity;

impl ScreenProjection for Identity {
    fn screen_to_world(&self, screen: Vec2) -> Option<Vec2> {
        Some(screen)
    }
}

/// Trifft die Karte nie.
struct Miss;

impl ScreenProjection for Miss {
    fn screen_to_world(&self, _screen: Vec2) -> Option<Vec2> {
        None
    }
}

struct Harness {
    editor: VectorEditor,
    document: MapDocument,
    options: EditorOptions,
}

impl Harness {
    fn new(kind: EntityKind) -> Self {
        let options = EditorOptions::default();
        Self {
            editor: VectorEditor::new(options.kind_config(kind)),
            document: MapDocument::new(),
            options,
        }
    }

    fn with_entity(kind: EntityKind, points: &[(f32, f32)]) -> (Self, u64) {
        let mut harness = Self::new(kind);
        let id = harness.store_mut().insert_new(
            points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            None,
            EntityMetadata::default(),
        );
        (harness, id)
    }

    fn store(&self) -> &EntityStore {
        self.document.store(self.editor.kind())
    }

    fn store_mut(&mut self) -> &mut EntityStore {
        self.document.store_mut(self.editor.kind())
    }

    fn down(&mut self, x: f32, y: f32) -> ToolResponse {
        let mut ctx = ToolContext {
            projection: &Identity,
            document: &mut self.document,
            options: &self.options,
        };
        self.editor.on_pointer_down(Vec2::new(x, y), &mut ctx)
    }

    fn moved(&mut self, x: f32, y: f32) -> ToolResponse {
        let mut ctx = ToolContext {
            projection: &Identity,
            document: &mut self.document,
            options: &self.options,
        };
        self.editor.on_pointer_move(Vec2::new(x, y), &mut ctx)
    }

    fn up(&mut self, x: f32, y: f32) -> ToolResponse {
        let mut ctx = ToolContext {
            projection: &Identity,
            document: &mut self.document,
            options: &self.options,
        };
        self.editor.on_pointer_up(Vec2::new(x, y), &mut ctx)
    }

    fn click(&mut self, x: f32, y: f32) {
        self.down(x, y);
        self.up(x, y);
    }

    fn drag(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.down(from.0, from.1);
        self.moved(to.0, to.1);
        self.up(to.0, to.1);
    }

    fn apply(&mut self) -> ApplyOutcome {
        let mut ctx = ToolContext {
            projection: &Identity,
            document: &mut self.document,
            options: &self.options,
        };
        self.editor.apply(&mut ctx)
    }

    fn cancel(&mut self) -> ApplyOutcome {
        let mut ctx = ToolContext {
            projection: &Identity,
            document: &mut self.document,
            options: &self.options,
        };
        self.editor.cancel(&mut ctx)
    }

    fn set_mode(&mut self, mode: EditorMode) -> ApplyOutcome {
        let kind = self.editor.kind();
        self.editor.set_mode(mode, self.document.store_mut(kind))
    }

    fn delete_node(&mut self) -> ApplyOutcome {
        self.editor.delete_selected_node()
    }

    fn select_at(&mut self, x: f32, y: f32) {
        self.set_mode(EditorMode::Select);
        self.click(x, y);
    }
}

fn v(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

// ── Create ──

#[test]
fn test_create_polygon_and_apply() {
    let mut h = Harness::new(EntityKind::ForbiddenZone);
    h.click(0.0, 0.0);
    h.click(2.0, 0.0);
    h.click(2.0, 2.0);
    assert!(h.editor.draft_complete());
    assert!(h.editor.has_pending_input());

    let outcome = h.apply();
    assert_eq!(
        outcome,
        ApplyOutcome::Created {
            kind: EntityKind::ForbiddenZone,
            id: 1
        }
    );
    let entity = h.store().get(1).expect("Entity angelegt");
    assert_eq!(entity.points, vec![v(0.0, 0.0), v(2.0, 0.0), v(2.0, 2.0)]);
    assert!(entity.orientation.is_none());
    assert_eq!(h.editor.mode(), EditorMode::Create);
    assert!(h.editor.draft().is_empty());
}

#[test]
fn test_create_incomplete_draft_is_rejected() {
    let mut h = Harness::new(EntityKind::CriticalZone);
    h.click(0.0, 0.0);
    h.click(1.0, 0.0);
    assert_eq!(
        h.apply(),
        ApplyOutcome::Rejected(Rejection::DraftIncomplete { min: 3, current: 2 })
    );
    assert_eq!(h.editor.draft().len(), 2);
    assert!(h.store().is_empty());
}

#[test]
fn test_create_click_on_draft_node_drags_instead_of_adding() {
    let mut h = Harness::new(EntityKind::Wall);
    h.click(0.0, 0.0);
    h.click(3.0, 0.0);

    assert_eq!(h.down(3.05, 0.0), ToolResponse::Changed);
    assert!(h.editor.is_dragging());
    h.moved(3.0, 1.0);
    h.up(3.0, 1.0);

    assert_eq!(h.editor.draft().points(), &[v(0.0, 0.0), v(3.0, 1.0)]);
    assert!(!h.editor.is_dragging());
}

#[test]
fn test_cancel_discards_draft() {
    let mut h = Harness::new(EntityKind::VirtualWall);
    assert_eq!(h.cancel(), ApplyOutcome::Nothing);
    h.click(0.0, 0.0);
    assert_eq!(h.cancel(), ApplyOutcome::Discarded);
    assert!(h.editor.draft().is_empty());
    assert!(h.store().is_empty());
}

#[test]
fn test_projection_miss_is_a_silent_no_op() {
    let mut h = Harness::new(EntityKind::Wall);
    let mut ctx = ToolContext {
        projection: &Miss,
        document: &mut h.document,
        options: &h.options,
    };
    assert_eq!(
        h.editor.on_pointer_down(v(1.0, 1.0), &mut ctx),
        ToolResponse::Ignored
    );
    assert!(h.editor.draft().is_empty());
}

#[test]
fn test_pointer_up_without_hit_still_ends_drag() {
    let mut h = Harness::new(EntityKind::Wall);
    h.click(0.0, 0.0);
    h.down(0.0, 0.0);
    assert!(h.editor.is_dragging());

    let mut ctx = ToolContext {
        projection: &Miss,
        document: &mut h.document,
        options: &h.options,
    };
    h.editor.on_pointer_up(v(50.0, 50.0), &mut ctx);
    assert!(!h.editor.is_dragging());
}

// ── Select ──

#[test]
fn test_select_square_inside_and_outside() {
    let (mut h, id) = Harness::with_entity(
        EntityKind::ForbiddenZone,
        &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)],
    );
    h.select_at(1.0, 1.0);
    assert_eq!(h.editor.selected_entity(), Some(id));

    h.click(3.0, 3.0);
    assert_eq!(h.editor.selected_entity(), None);
}

#[test]
fn test_select_polyline_by_distance_and_hover() {
    let (mut h, id) = Harness::with_entity(EntityKind::Wall, &[(0.0, 0.0), (4.0, 0.0)]);
    h.set_mode(EditorMode::Select);

    assert_eq!(h.moved(2.0, 0.1), ToolResponse::Changed);
    assert_eq!(h.editor.hovered_entity(), Some(id));
    assert_eq!(h.moved(2.0, 0.12), ToolResponse::Consumed);

    h.click(2.0, 0.5);
    assert_eq!(h.editor.selected_entity(), None);
    h.click(2.0, -0.1);
    assert_eq!(h.editor.selected_entity(), Some(id));
}

#[test]
fn test_select_prefers_nearest_hit() {
    let mut h = Harness::new(EntityKind::Wall);
    let far = h
        .store_mut()
        .insert_new(vec![v(0.0, 0.1), v(4.0, 0.1)], None, EntityMetadata::default());
    let near = h
        .store_mut()
        .insert_new(vec![v(0.0, -0.02), v(4.0, -0.02)], None, EntityMetadata::default());
    h.select_at(2.0, 0.0);
    assert_ne!(h.editor.selected_entity(), Some(far));
    assert_eq!(h.editor.selected_entity(), Some(near));
}

#[test]
fn test_malformed_polygon_is_selectable_as_line() {
    let (mut h, id) =
        Harness::with_entity(EntityKind::UnpreferredZone, &[(0.0, 0.0), (2.0, 0.0)]);
    h.select_at(1.0, 0.05);
    assert_eq!(h.editor.selected_entity(), Some(id));

    let overlay = h.editor.render_overlay(&h.options);
    assert!(overlay.is_empty());
}

// ── Edit ──

#[test]
fn test_edit_requires_selection() {
    let mut h = Harness::new(EntityKind::Wall);
    assert_eq!(
        h.set_mode(EditorMode::Edit),
        ApplyOutcome::Rejected(Rejection::NoSelection)
    );
    assert_eq!(h.editor.mode(), EditorMode::Create);
}

#[test]
fn test_delete_node_of_two_point_polyline_is_rejected() {
    let (mut h, id) = Harness::with_entity(EntityKind::Wall, &[(0.0, 0.0), (2.0, 0.0)]);
    h.select_at(1.0, 0.05);
    assert!(matches!(
        h.set_mode(EditorMode::Edit),
        ApplyOutcome::EditStarted { .. }
    ));

    for (x, y) in [(0.0, 0.0), (2.0, 0.0)] {
        h.click(x, y);
        assert!(h.editor.draft().selected_node().is_some());
        assert_eq!(
            h.delete_node(),
            ApplyOutcome::Rejected(Rejection::BelowMinimumPoints { min: 2, current: 2 })
        );
        assert_eq!(h.editor.draft().len(), 2);
        assert_eq!(h.store().get(id).map(|e| e.points.len()), Some(2));
    }
}

#[test]
fn test_delete_node_in_select_mode_is_rejected() {
    let mut h = Harness::new(EntityKind::Wall);
    h.set_mode(EditorMode::Select);
    assert_eq!(
        h.delete_node(),
        ApplyOutcome::Rejected(Rejection::NotEditing)
    );
}

#[test]
fn test_edge_click_inserts_node_after_start_index() {
    let (mut h, id) = Harness::with_entity(
        EntityKind::ForbiddenZone,
        &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)],
    );
    h.select_at(1.0, 1.0);
    h.set_mode(EditorMode::Edit);

    h.click(2.05, 1.0);
    let draft = h.editor.draft();
    assert_eq!(draft.len(), 5);
    assert_eq!(draft.nodes().len(), 5);
    assert_eq!(draft.points()[2], v(2.05, 1.0));
    assert_eq!(draft.selected_node(), Some(2));
    assert_eq!(h.store().get(id).map(|e| e.points.len()), Some(4));
}

#[test]
fn test_closing_edge_insert_appends_at_end() {
    let (mut h, _) = Harness::with_entity(
        EntityKind::ForbiddenZone,
        &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)],
    );
    h.select_at(1.0, 1.0);
    h.set_mode(EditorMode::Edit);

    h.click(-0.05, 1.0);
    assert_eq!(h.editor.draft().points().last(), Some(&v(-0.05, 1.0)));
}

#[test]
fn test_edit_then_cancel_restores_snapshot_exactly() {
    let original = vec![v(0.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), v(0.0, 2.0)];
    let (mut h, id) = Harness::with_entity(
        EntityKind::ForbiddenZone,
        &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)],
    );
    h.select_at(1.0, 1.0);
    h.set_mode(EditorMode::Edit);
    let snapshot = h.editor.edit_snapshot().cloned().expect("Snapshot");

    h.drag((0.0, 0.0), (-1.0, -1.0));
    h.click(2.05, 1.0);
    assert!(matches!(h.delete_node(), ApplyOutcome::NodeDeleted { index: 2 }));
    h.drag((2.0, 2.0), (3.0, 3.0));
    assert_ne!(h.editor.draft().points(), original.as_slice());
    assert_eq!(h.store().get(id).map(|e| e.points.clone()), Some(original.clone()));

    assert_eq!(
        h.cancel(),
        ApplyOutcome::Restored {
            kind: EntityKind::ForbiddenZone,
            id
        }
    );
    let restored = h.store().get(id).expect("Entity").geometry();
    assert_eq!(restored, snapshot);
    assert_eq!(restored.points, original);
    assert_eq!(h.editor.selected_entity(), None);
    assert_eq!(h.editor.hovered_entity(), None);
    assert!(h.editor.edit_snapshot().is_none());
}

#[test]
fn test_edit_then_apply_keeps_changes() {
    let (mut h, id) = Harness::with_entity(EntityKind::Wall, &[(0.0, 0.0), (2.0, 0.0)]);
    h.select_at(1.0, 0.0);
    h.set_mode(EditorMode::Edit);
    h.drag((2.0, 0.0), (2.0, 3.0));

    assert_eq!(
        h.apply(),
        ApplyOutcome::Updated {
            kind: EntityKind::Wall,
            id
        }
    );
    assert_eq!(
        h.store().get(id).map(|e| e.points.clone()),
        Some(vec![v(0.0, 0.0), v(2.0, 3.0)])
    );
    assert_eq!(h.editor.mode(), EditorMode::Create);
}

#[test]
fn test_leaving_edit_restores_and_aborts_drag() {
    let (mut h, id) = Harness::with_entity(EntityKind::Wall, &[(0.0, 0.0), (2.0, 0.0)]);
    h.select_at(1.0, 0.0);
    h.set_mode(EditorMode::Edit);
    h.down(0.0, 0.0);
    h.moved(0.0, 5.0);
    assert!(h.editor.is_dragging());

    let outcome = h.set_mode(EditorMode::Select);
    assert_eq!(
        outcome,
        ApplyOutcome::Restored {
            kind: EntityKind::Wall,
            id
        }
    );
    assert!(!h.editor.is_dragging());
    assert_eq!(h.editor.selected_entity(), Some(id));
    assert_eq!(
        h.store().get(id).map(|e| e.points[0]),
        Some(v(0.0, 0.0))
    );
}

// ── Orientierte Punkte ──

#[test]
fn test_oriented_point_rotate_and_pan() {
    let mut h = Harness::new(EntityKind::Position);
    h.click(0.0, 0.0);
    assert_relative_eq!(h.editor.draft_yaw().unwrap_or(f32::NAN), 0.0);

    // Außerhalb der Grundfläche: drehen
    h.drag((1.0, 0.0), (0.0, 1.0));
    assert_relative_eq!(
        h.editor.draft_yaw().unwrap_or(f32::NAN),
        std::f32::consts::FRAC_PI_2,
        epsilon = 1e-5
    );
    assert_eq!(h.editor.draft().len(), 1);

    // Innerhalb: verschieben, Greifabstand bleibt erhalten
    h.drag((0.1, 0.0), (1.1, 1.0));
    let p = h.editor.draft().points()[0];
    assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(p.y, 1.0, epsilon = 1e-5);

    h.editor.set_draft_metadata(EntityMetadata {
        name: "Dock".into(),
        ..EntityMetadata::default()
    });
    let ApplyOutcome::Created { id, .. } = h.apply() else {
        panic!("Position nicht angelegt");
    };
    let entity = h.store().get(id).expect("Entity");
    assert_relative_eq!(entity.yaw(), std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    assert_eq!(entity.metadata.name, "Dock");
}

#[test]
fn test_oriented_point_edit_rotation_relative_to_start() {
    let mut h = Harness::new(EntityKind::Marker);
    let id = h.store_mut().insert_new(
        vec![v(0.0, 0.0)],
        Some(crate::core::transform::yaw_to_quaternion(0.5)),
        EntityMetadata::default(),
    );
    h.select_at(0.1, 0.1);
    assert_eq!(h.editor.selected_entity(), Some(id));
    h.set_mode(EditorMode::Edit);

    h.drag((1.0, 0.0), (0.0, 1.0));
    let yaw = h.store().get(id).map(|e| e.yaw()).unwrap_or(f32::NAN);
    assert_relative_eq!(yaw, 0.5 + std::f32::consts::FRAC_PI_2, epsilon = 1e-5);

    h.cancel();
    let yaw = h.store().get(id).map(|e| e.yaw()).unwrap_or(f32::NAN);
    assert_relative_eq!(yaw, 0.5, epsilon = 1e-5);
}

// ── IDs ──

#[test]
fn test_deleted_ids_are_not_reused() {
    let mut h = Harness::new(EntityKind::Wall);
    for x in [0.0, 10.0, 20.0] {
        h.click(x, 0.0);
        h.click(x, 2.0);
        h.apply();
    }
    assert_eq!(h.store().ids(), vec![1, 2, 3]);

    h.select_at(10.0, 1.0);
    assert_eq!(h.editor.selected_entity(), Some(2));
    let kind = h.editor.kind();
    assert_eq!(
        h.editor.delete_selected_entity(h.document.store_mut(kind)),
        ApplyOutcome::Deleted { kind, id: 2 }
    );

    h.set_mode(EditorMode::Create);
    h.click(30.0, 0.0);
    h.click(30.0, 2.0);
    assert_eq!(h.apply(), ApplyOutcome::Created { kind, id: 4 });
    assert_eq!(h.store().ids(), vec![1, 3, 4]);
}

#[test]
fn test_remap_ids_updates_selection() {
    let (mut h, id) = Harness::with_entity(EntityKind::Wall, &[(0.0, 0.0), (2.0, 0.0)]);
    h.select_at(1.0, 0.0);
    let mapping: std::collections::HashMap<u64, u64> = [(id, 77)].into_iter().collect();
    h.editor.remap_ids(&mapping);
    assert_eq!(h.editor.selected_entity(), Some(77));
}

#[test]
fn test_overlay_has_one_node_per_point() {
    let mut h = Harness::new(EntityKind::ForbiddenZone);
    h.click(0.0, 0.0);
    h.click(1.0, 0.0);
    let overlay = h.editor.render_overlay(&h.options);
    // Zwei Punkte: offene Vorschau + zwei Nodes
    assert_eq!(overlay.len(), 3);

    h.click(1.0, 1.0);
    let overlay = h.editor.render_overlay(&h.options);
    assert!(matches!(
        overlay.first(),
        Some((_, crate::shared::SceneShape::Polygon { .. }))
    ));
    assert_eq!(overlay.len(), 4);
}

#[test]
fn test_snapshot_is_deep_copy() {
    let (mut h, id) = Harness::with_entity(EntityKind::Wall, &[(0.0, 0.0), (2.0, 0.0)]);
    h.select_at(1.0, 0.0);
    h.set_mode(EditorMode::Edit);
    h.drag((0.0, 0.0), (5.0, 5.0));
    assert_eq!(
        h.editor.edit_snapshot(),
        Some(&EntityGeometry {
            points: vec![v(0.0, 0.0), v(2.0, 0.0)],
            orientation: None,
        })
    );
    assert_eq!(h.editor.draft().points()[0], v(5.0, 5.0));
    assert_eq!(h.store().get(id).map(|e| e.points[0]), Some(v(0.0, 0.0)));
}

#[test]
fn test_store_is_untouched_until_apply() {
    let (mut h, id) = Harness::with_entity(
        EntityKind::ForbiddenZone,
        &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)],
    );
    let original = h.store().get(id).cloned().expect("Entity");
    h.select_at(1.0, 1.0);
    h.set_mode(EditorMode::Edit);
    assert_eq!(h.editor.editing_entity(), Some(id));

    h.drag((0.0, 0.0), (-1.0, -1.0));
    h.click(2.05, 1.0);
    assert_eq!(h.store().get(id), Some(&original));

    // Die Arbeitskopie erscheint nur im Overlay
    let overlay = h.editor.render_overlay(&h.options);
    assert!(matches!(
        overlay.first(),
        Some((crate::shared::ShapeKey::Draft, crate::shared::SceneShape::Polygon { points, .. }))
            if points.len() == 5 && points[0] == v(-1.0, -1.0)
    ));

    h.apply();
    assert_eq!(h.store().get(id).map(|e| e.points.len()), Some(5));
    assert_eq!(h.editor.editing_entity(), None);
}
