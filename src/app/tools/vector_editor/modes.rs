//! Pointer-Verhalten je Editor-Modus.
//!
//! Jeder Modus ist ein zustandsloser `ModeHandler`; `handler` ist die einzige
//! Stelle, an der zwischen den Modi verzweigt wird.

use glam::Vec2;

use super::super::ToolResponse;
use super::state::{DragState, EditorMode, VectorEditor};
use crate::core::entity::VectorEntity;
use crate::core::entity_store::EntityStore;
use crate::core::geometry::{distance_to_polyline, point_in_polygon};

/// Pointer-Verhalten eines Modus. Positionen sind bereits Weltpunkte.
pub(crate) trait ModeHandler {
    fn on_pointer_down(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        store: &mut EntityStore,
    ) -> ToolResponse;

    fn on_pointer_move(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        store: &mut EntityStore,
    ) -> ToolResponse;

    /// `world` ist `None` bei Projektionsfehlschlag; ein Drag endet trotzdem.
    fn on_pointer_up(
        &self,
        editor: &mut VectorEditor,
        _world: Option<Vec2>,
        _store: &mut EntityStore,
    ) -> ToolResponse {
        if editor.drag.take().is_some() {
            ToolResponse::Consumed
        } else {
            ToolResponse::Ignored
        }
    }
}

struct CreateMode;
struct SelectMode;
struct EditMode;

/// Handler des Modus.
pub(crate) fn handler(mode: EditorMode) -> &'static dyn ModeHandler {
    match mode {
        EditorMode::Create => &CreateMode,
        EditorMode::Select => &SelectMode,
        EditorMode::Edit => &EditMode,
    }
}

// ── Create ───────────────────────────────────────────────────

impl ModeHandler for CreateMode {
    fn on_pointer_down(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        _store: &mut EntityStore,
    ) -> ToolResponse {
        if editor.config.is_oriented_point() {
            if editor.draft.is_empty() {
                editor.draft.push(world);
                editor.draft_orientation = Some(glam::Quat::IDENTITY);
            } else {
                editor.begin_oriented_drag(world);
            }
            return ToolResponse::Changed;
        }

        if let Some(index) = editor
            .draft
            .nearest_node(world, editor.config.selection_radius)
        {
            editor.draft.select_node(Some(index));
            editor.drag = Some(DragState::Node { index });
            return ToolResponse::Changed;
        }

        editor.draft.push(world);
        ToolResponse::Changed
    }

    fn on_pointer_move(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        _store: &mut EntityStore,
    ) -> ToolResponse {
        if editor.drag.is_some() {
            return response(editor.drag_to(world));
        }
        update_node_hover(editor, world)
    }
}

// ── Select ───────────────────────────────────────────────────

impl ModeHandler for SelectMode {
    fn on_pointer_down(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        store: &mut EntityStore,
    ) -> ToolResponse {
        let hit = hit_test(editor, store, world);
        if hit != editor.selected_entity {
            log::debug!("{}: Auswahl {:?}", editor.kind().label(), hit);
        }
        editor.selected_entity = hit;
        ToolResponse::Changed
    }

    fn on_pointer_move(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        store: &mut EntityStore,
    ) -> ToolResponse {
        let hit = hit_test(editor, store, world);
        if hit == editor.hovered_entity {
            return ToolResponse::Consumed;
        }
        editor.hovered_entity = hit;
        ToolResponse::Changed
    }
}

// ── Edit ─────────────────────────────────────────────────────

impl ModeHandler for EditMode {
    fn on_pointer_down(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        _store: &mut EntityStore,
    ) -> ToolResponse {
        if editor.config.is_oriented_point() {
            editor.begin_oriented_drag(world);
            return response(editor.drag.is_some());
        }

        if let Some(index) = editor
            .draft
            .nearest_node(world, editor.config.selection_radius)
        {
            editor.draft.select_node(Some(index));
            editor.drag = Some(DragState::Node { index });
            return ToolResponse::Changed;
        }

        if let Some((start, distance)) = editor.draft.nearest_edge(world, editor.config.closed) {
            if distance < editor.config.edge_insertion_threshold {
                let index = start + 1;
                editor.draft.insert(index, world);
                editor.draft.select_node(Some(index));
                editor.drag = Some(DragState::Node { index });
                return ToolResponse::Changed;
            }
        }

        if editor.draft.selected_node().is_some() {
            editor.draft.select_node(None);
            return ToolResponse::Changed;
        }
        ToolResponse::Consumed
    }

    fn on_pointer_move(
        &self,
        editor: &mut VectorEditor,
        world: Vec2,
        _store: &mut EntityStore,
    ) -> ToolResponse {
        if editor.drag.is_some() {
            return response(editor.drag_to(world));
        }
        update_node_hover(editor, world)
    }
}

// ── Helfer ───────────────────────────────────────────────────

fn response(changed: bool) -> ToolResponse {
    if changed {
        ToolResponse::Changed
    } else {
        ToolResponse::Consumed
    }
}

fn update_node_hover(editor: &mut VectorEditor, world: Vec2) -> ToolResponse {
    let hovered = editor
        .draft
        .nearest_node(world, editor.config.selection_radius);
    let current = editor.draft.nodes().iter().position(|n| n.hovered);
    if hovered == current {
        return ToolResponse::Consumed;
    }
    editor.draft.hover_node(hovered);
    ToolResponse::Changed
}

/// Abstand einer Entity zum Punkt, sofern sie getroffen ist.
///
/// Polygone liefern 0.0 bei Treffer im Inneren. Ungültige geschlossene
/// Formen werden wie Linien getestet.
pub(crate) fn hit_distance(editor: &VectorEditor, entity: &VectorEntity, world: Vec2) -> Option<f32> {
    let config = &editor.config;
    if config.is_oriented_point() {
        let distance = entity.points.first()?.distance(world);
        return (distance <= config.footprint_radius).then_some(distance);
    }
    if config.closed && entity.points.len() >= config.min_points {
        return point_in_polygon(world, &entity.points).then_some(0.0);
    }
    let distance = distance_to_polyline(world, &entity.points)?;
    (distance <= config.selection_radius).then_some(distance)
}

/// Nächste getroffene Entity (erste bei Gleichstand).
pub(crate) fn hit_test(editor: &VectorEditor, store: &EntityStore, world: Vec2) -> Option<u64> {
    let mut best: Option<(u64, f32)> = None;
    for entity in store.iter() {
        let Some(distance) = hit_distance(editor, entity, world) else {
            continue;
        };
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((entity.id, distance));
        }
    }
    best.map(|(id, _)| id)
}
