//! Vektor-Entities: Wände, Zonen, Positionen und Marker.

use glam::{Quat, Vec2};
use serde::{Deserialize, Serialize};

use super::transform::{quaternion_to_yaw, yaw_to_quaternion};

/// Fachliche Art einer Vektor-Annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Physische Wand (wird auch ins Raster übernommen)
    Wall,
    /// Virtuelle Wand (nur für die Navigation)
    VirtualWall,
    /// Sperrzone
    ForbiddenZone,
    /// Bevorzugter Fahrweg
    PreferredZone,
    /// Zu meidende Zone
    UnpreferredZone,
    /// Kritische Zone (z.B. langsam fahren)
    CriticalZone,
    /// Benannte Zielposition
    Position,
    /// Fiducial-Marker (ArUco)
    Marker,
}

impl EntityKind {
    /// Alle Arten in fester Reihenfolge.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Wall,
        EntityKind::VirtualWall,
        EntityKind::ForbiddenZone,
        EntityKind::PreferredZone,
        EntityKind::UnpreferredZone,
        EntityKind::CriticalZone,
        EntityKind::Position,
        EntityKind::Marker,
    ];

    /// Geometrische Grundform dieser Art.
    pub fn shape(self) -> ShapeKind {
        match self {
            EntityKind::Wall | EntityKind::VirtualWall | EntityKind::PreferredZone => {
                ShapeKind::Polyline
            }
            EntityKind::ForbiddenZone | EntityKind::UnpreferredZone | EntityKind::CriticalZone => {
                ShapeKind::Polygon
            }
            EntityKind::Position | EntityKind::Marker => ShapeKind::OrientedPoint,
        }
    }

    /// Anzeigename
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Wall => "Wand",
            EntityKind::VirtualWall => "Virtuelle Wand",
            EntityKind::ForbiddenZone => "Sperrzone",
            EntityKind::PreferredZone => "Bevorzugter Weg",
            EntityKind::UnpreferredZone => "Gemiedene Zone",
            EntityKind::CriticalZone => "Kritische Zone",
            EntityKind::Position => "Position",
            EntityKind::Marker => "Marker",
        }
    }
}

/// Geometrische Grundform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Geschlossenes, füllbares Polygon
    Polygon,
    /// Offene Linie
    Polyline,
    /// Einzelpunkt mit Orientierung
    OrientedPoint,
}

impl ShapeKind {
    /// Minimale Punktanzahl für eine gültige Entity.
    pub fn min_points(self) -> usize {
        match self {
            ShapeKind::Polygon => 3,
            ShapeKind::Polyline => 2,
            ShapeKind::OrientedPoint => 1,
        }
    }

    /// Maximale Punktanzahl (`None` = unbegrenzt).
    pub fn max_points(self) -> Option<usize> {
        match self {
            ShapeKind::OrientedPoint => Some(1),
            _ => None,
        }
    }

    /// Geschlossene Form (Punkt-in-Polygon statt Linienabstand).
    pub fn is_closed(self) -> bool {
        matches!(self, ShapeKind::Polygon)
    }
}

/// Parametrisierung des generischen Editors für eine Entity-Art.
#[derive(Debug, Clone, PartialEq)]
pub struct KindConfig {
    /// Entity-Art
    pub kind: EntityKind,
    /// Minimale Punktanzahl
    pub min_points: usize,
    /// Geschlossene Form
    pub closed: bool,
    /// Greifradius für Nodes und Linien (Meter)
    pub selection_radius: f32,
    /// Maximaler Kantenabstand für das Einfügen neuer Nodes (Meter)
    pub edge_insertion_threshold: f32,
    /// Radius der Grundfläche orientierter Punkte (Meter)
    pub footprint_radius: f32,
    /// Anzeigefarbe (RGBA)
    pub color: [f32; 4],
}

impl KindConfig {
    /// Erstellt die Konfiguration mit den Formregeln der Art.
    pub fn new(
        kind: EntityKind,
        selection_radius: f32,
        edge_insertion_threshold: f32,
        footprint_radius: f32,
        color: [f32; 4],
    ) -> Self {
        let shape = kind.shape();
        Self {
            kind,
            min_points: shape.min_points(),
            closed: shape.is_closed(),
            selection_radius,
            edge_insertion_threshold,
            footprint_radius,
            color,
        }
    }

    /// Grundform der konfigurierten Art.
    pub fn shape(&self) -> ShapeKind {
        self.kind.shape()
    }

    /// Handelt es sich um einen orientierten Punkt?
    pub fn is_oriented_point(&self) -> bool {
        self.shape() == ShapeKind::OrientedPoint
    }
}

/// Freie Metadaten (Name, Typ, ArUco-ID, Höhenversatz).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Anzeigename
    pub name: String,
    /// Freier Typ-Bezeichner (z.B. "charging", "waypoint")
    pub entity_type: String,
    /// ArUco-ID bei Markern
    pub aruco_id: Option<u32>,
    /// Z-Versatz, nur für die Darstellung
    pub z_offset: f32,
}

/// Geometrie einer Entity (Punkte + Orientierung), Inhalt des Edit-Snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGeometry {
    /// Punkte in Weltkoordinaten
    pub points: Vec<Vec2>,
    /// Orientierung (nur orientierte Punkte)
    pub orientation: Option<Quat>,
}

/// Eine Vektor-Annotation auf der Karte.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntity {
    /// ID (lokal vergeben oder vom Server abgeglichen)
    pub id: u64,
    /// Art
    pub kind: EntityKind,
    /// Punkte in Weltkoordinaten
    pub points: Vec<Vec2>,
    /// Orientierung (nur orientierte Punkte)
    pub orientation: Option<Quat>,
    /// Metadaten
    pub metadata: EntityMetadata,
}

impl VectorEntity {
    /// Erstellt eine Entity ohne Orientierung und mit leeren Metadaten.
    pub fn new(id: u64, kind: EntityKind, points: Vec<Vec2>) -> Self {
        Self {
            id,
            kind,
            points,
            orientation: None,
            metadata: EntityMetadata::default(),
        }
    }

    /// Erstellt einen orientierten Punkt.
    pub fn oriented(
        id: u64,
        kind: EntityKind,
        position: Vec2,
        yaw: f32,
        metadata: EntityMetadata,
    ) -> Self {
        Self {
            id,
            kind,
            points: vec![position],
            orientation: Some(yaw_to_quaternion(yaw)),
            metadata,
        }
    }

    /// Erfüllt die Entity die Mindestpunktanzahl ihrer Art?
    pub fn is_valid(&self) -> bool {
        self.points.len() >= self.kind.shape().min_points()
    }

    /// Gierwinkel (0.0 ohne Orientierung).
    pub fn yaw(&self) -> f32 {
        self.orientation.map(quaternion_to_yaw).unwrap_or(0.0)
    }

    /// Tiefe Kopie der Geometrie.
    pub fn geometry(&self) -> EntityGeometry {
        EntityGeometry {
            points: self.points.clone(),
            orientation: self.orientation,
        }
    }

    /// Übernimmt eine Geometrie unverändert.
    pub fn set_geometry(&mut self, geometry: EntityGeometry) {
        self.points = geometry.points;
        self.orientation = geometry.orientation;
    }
}
