//! Render-Szene als expliziter Übergabevertrag zwischen App und Renderer.
//!
//! Lebt im shared-Modul, da `app` sie baut und ein Render-Backend sie konsumiert.

use glam::{Vec2, Vec3};

use crate::core::camera::MapCamera;
use crate::core::entity::EntityKind;
use crate::core::geometry::WorldBounds;
use crate::core::projector::SurfaceRaycast;
use crate::core::transform::RobotPose;

/// Stabile Identität einer Form über Frames hinweg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKey {
    /// Texturierte Kartenfläche
    MapQuad,
    /// Gespeicherte Entity
    Entity {
        /// Art
        kind: EntityKind,
        /// ID
        id: u64,
    },
    /// Entwurf bzw. Bearbeitungsstand des aktiven Werkzeugs
    Draft,
    /// Node-Handle des aktiven Werkzeugs
    Node(usize),
    /// Roboter
    Robot,
    /// Scan-Punktwolke
    Scan,
}

/// Zeichenbare Form.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneShape {
    /// Gefülltes Polygon mit Umriss
    Polygon {
        /// Eckpunkte
        points: Vec<Vec2>,
        /// Farbe
        color: [f32; 4],
    },
    /// Offene Linie
    Polyline {
        /// Punkte
        points: Vec<Vec2>,
        /// Farbe
        color: [f32; 4],
    },
    /// Orientierter Punkt (Kreis mit Richtungspfeil)
    Marker {
        /// Position
        position: Vec3,
        /// Gierwinkel
        yaw: f32,
        /// Radius der Grundfläche
        radius: f32,
        /// Farbe
        color: [f32; 4],
    },
    /// Node-Handle aus Außenring und Innenpunkt
    Node {
        /// Position
        position: Vec2,
        /// Außenring-Radius
        outer_radius: f32,
        /// Innenpunkt-Radius
        inner_radius: f32,
        /// Farbe
        color: [f32; 4],
    },
    /// Punktwolke
    Points {
        /// Punkte
        points: Vec<Vec3>,
        /// Farbe
        color: [f32; 4],
    },
    /// Texturierte Kartenfläche
    MapQuad {
        /// Ausdehnung in Weltkoordinaten
        bounds: WorldBounds,
        /// Textur-Revision (Re-Upload bei Änderung)
        revision: u64,
    },
}

/// Read-only Daten für einen Render-Frame.
#[derive(Debug, Clone)]
pub struct RenderScene {
    /// Kamera-Zustand für diesen Frame
    pub camera: MapCamera,
    /// Alle Formen in Zeichenreihenfolge
    pub shapes: Vec<(ShapeKey, SceneShape)>,
    /// Aktuelle Roboter-Pose
    pub robot_pose: Option<RobotPose>,
}

impl RenderScene {
    /// Gibt zurück, ob eine Karte für Rendering vorhanden ist.
    pub fn has_map(&self) -> bool {
        self.shapes.iter().any(|(key, _)| *key == ShapeKey::MapQuad)
    }

    /// Form zu einem Schlüssel.
    pub fn shape(&self, key: &ShapeKey) -> Option<&SceneShape> {
        self.shapes.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }
}

/// Vertrag des konkreten Renderers.
pub trait RenderBackend: SurfaceRaycast {
    /// Fügt eine Form hinzu (oder ersetzt eine mit gleichem Schlüssel).
    fn add_shape(&mut self, key: ShapeKey, shape: &SceneShape);

    /// Entfernt eine Form.
    fn remove_shape(&mut self, key: ShapeKey);

    /// Fordert ein Neuzeichnen an.
    fn request_redraw(&mut self);
}
