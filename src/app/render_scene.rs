//! Builder für Render-Szenen aus dem AppState.

use crate::app::tools::MapTool;
use crate::app::AppState;
use crate::core::entity::{EntityKind, ShapeKind, VectorEntity};
use crate::shared::{EditorOptions, RenderScene, SceneShape, ShapeKey};

/// Baut eine RenderScene aus dem aktuellen AppState.
///
/// Reihenfolge: Karte, Entities je Art, Overlay des aktiven Werkzeugs,
/// Roboter, Scan-Wolke. Eine Entity in Bearbeitung erscheint nur als
/// Arbeitskopie im Overlay.
pub fn build(state: &AppState, active: Option<&dyn MapTool>) -> RenderScene {
    let options = &state.options;
    let mut shapes = Vec::with_capacity(state.entity_count() + 4);

    if let Some(layer) = state.document.occupancy.as_ref() {
        shapes.push((
            ShapeKey::MapQuad,
            SceneShape::MapQuad {
                bounds: layer.grid.world_bounds(),
                revision: layer.texture.revision(),
            },
        ));
    }

    let editor = active.and_then(|tool| tool.as_vector_editor());
    for kind in EntityKind::ALL {
        let (selected, hovered, editing) = match editor {
            Some(editor) if editor.kind() == kind => (
                editor.selected_entity(),
                editor.hovered_entity(),
                editor.editing_entity(),
            ),
            _ => (None, None, None),
        };
        for entity in state.document.store(kind).iter() {
            if Some(entity.id) == editing {
                continue;
            }
            let color = if Some(entity.id) == selected {
                options.selection_color
            } else if Some(entity.id) == hovered {
                options.hover_color
            } else {
                options.kind_color(kind)
            };
            if let Some(shape) = entity_shape(entity, color, options) {
                shapes.push((ShapeKey::Entity { kind, id: entity.id }, shape));
            }
        }
    }

    if let Some(tool) = active {
        shapes.extend(tool.render_overlay(options));
    }

    if let Some(pose) = state.robot.pose {
        shapes.push((
            ShapeKey::Robot,
            SceneShape::Marker {
                position: glam::Vec3::new(pose.x, pose.y, 0.0),
                yaw: pose.theta,
                radius: options.marker_footprint_radius,
                color: options.position_color,
            },
        ));
    }

    if !state.robot.scan_cloud.is_empty() {
        shapes.push((
            ShapeKey::Scan,
            SceneShape::Points {
                points: state.robot.scan_cloud.clone(),
                color: options.scan_point_color,
            },
        ));
    }

    RenderScene {
        camera: state.projector.camera.clone(),
        shapes,
        robot_pose: state.robot.pose,
    }
}

/// Form einer gespeicherten Entity.
///
/// Geschlossene Formen unter der Mindestpunktzahl werden als offene
/// Linie gezeichnet, damit sie sichtbar und auswählbar bleiben.
fn entity_shape(
    entity: &VectorEntity,
    color: [f32; 4],
    options: &EditorOptions,
) -> Option<SceneShape> {
    let points = &entity.points;
    match entity.kind.shape() {
        ShapeKind::OrientedPoint => points.first().map(|p| SceneShape::Marker {
            position: p.extend(entity.metadata.z_offset),
            yaw: entity.yaw(),
            radius: options.marker_footprint_radius,
            color,
        }),
        ShapeKind::Polygon if entity.is_valid() => Some(SceneShape::Polygon {
            points: points.clone(),
            color,
        }),
        _ if points.is_empty() => None,
        _ => Some(SceneShape::Polyline {
            points: points.clone(),
            color,
        }),
    }
}
