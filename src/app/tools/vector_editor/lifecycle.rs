//! MapTool-Implementierung des Vektor-Editors.

use glam::Vec2;

use super::super::{ApplyOutcome, CursorIcon, MapTool, ToolContext, ToolId, ToolResponse};
use super::modes::handler;
use super::state::{DragState, EditorMode, VectorEditor};
use crate::core::node_list::NodeHandle;
use crate::shared::{EditorOptions, SceneShape, ShapeKey};

impl MapTool for VectorEditor {
    fn id(&self) -> ToolId {
        ToolId::Vector(self.kind())
    }

    fn name(&self) -> &str {
        self.kind().label()
    }

    fn on_pointer_down(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse {
        let Some(world) = ctx.projection.screen_to_world(screen) else {
            return ToolResponse::Ignored;
        };
        let store = ctx.document.store_mut(self.kind());
        handler(self.mode).on_pointer_down(self, world, store)
    }

    fn on_pointer_move(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse {
        let Some(world) = ctx.projection.screen_to_world(screen) else {
            return ToolResponse::Ignored;
        };
        let store = ctx.document.store_mut(self.kind());
        handler(self.mode).on_pointer_move(self, world, store)
    }

    fn on_pointer_up(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse {
        let world = ctx.projection.screen_to_world(screen);
        let store = ctx.document.store_mut(self.kind());
        handler(self.mode).on_pointer_up(self, world, store)
    }

    fn apply(&mut self, ctx: &mut ToolContext<'_>) -> ApplyOutcome {
        self.apply_changes(ctx.document.store_mut(self.kind()))
    }

    fn cancel(&mut self, _ctx: &mut ToolContext<'_>) -> ApplyOutcome {
        self.cancel_changes()
    }

    fn abort_interaction(&mut self) {
        self.drag = None;
    }

    fn dispose(&mut self) {
        self.clear_transient();
    }

    fn has_pending_input(&self) -> bool {
        match self.mode {
            EditorMode::Create => !self.draft.is_empty(),
            EditorMode::Edit => true,
            EditorMode::Select => false,
        }
    }

    fn cursor(&self) -> CursorIcon {
        match (self.drag, self.mode) {
            (Some(DragState::Node { .. }), _) => CursorIcon::Grabbing,
            (Some(DragState::Pan { .. }), _) => CursorIcon::Move,
            (Some(DragState::Rotate { .. }), _) => CursorIcon::Rotate,
            (None, EditorMode::Create) => CursorIcon::Crosshair,
            (None, EditorMode::Edit) => CursorIcon::Grab,
            (None, EditorMode::Select) => CursorIcon::Default,
        }
    }

    fn render_overlay(&self, options: &EditorOptions) -> Vec<(ShapeKey, SceneShape)> {
        let points = self.draft.points();
        if points.is_empty() {
            return Vec::new();
        }
        let color = self.config.color;
        let mut shapes = Vec::with_capacity(points.len() + 1);

        let draft = if self.config.is_oriented_point() {
            Some(SceneShape::Marker {
                position: points[0].extend(0.0),
                yaw: self.draft_yaw().unwrap_or(0.0),
                radius: self.config.footprint_radius,
                color,
            })
        } else if self.config.closed && points.len() >= self.config.min_points {
            Some(SceneShape::Polygon {
                points: points.to_vec(),
                color,
            })
        } else if points.len() >= 2 {
            Some(SceneShape::Polyline {
                points: points.to_vec(),
                color,
            })
        } else {
            None
        };
        if let Some(shape) = draft {
            shapes.push((ShapeKey::Draft, shape));
        }

        for (index, (point, handle)) in points.iter().zip(self.draft.nodes()).enumerate() {
            shapes.push((
                ShapeKey::Node(index),
                SceneShape::Node {
                    position: *point,
                    outer_radius: options.node_outer_radius,
                    inner_radius: options.node_inner_radius,
                    color: node_color(handle, options),
                },
            ));
        }
        shapes
    }

    fn as_vector_editor(&self) -> Option<&VectorEditor> {
        Some(self)
    }

    fn as_vector_editor_mut(&mut self) -> Option<&mut VectorEditor> {
        Some(self)
    }
}

fn node_color(handle: &NodeHandle, options: &EditorOptions) -> [f32; 4] {
    if handle.selected {
        options.node_color_selected
    } else if handle.hovered {
        options.hover_color
    } else {
        options.node_color_default
    }
}
