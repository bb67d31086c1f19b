use glam::{Vec2, Vec3};

use super::document::MapDocument;
use crate::app::tools::CursorIcon;
use crate::core::camera::MapCamera;
use crate::core::projector::Projector;
use crate::core::transform::{RobotPose, TransformPipeline};
use crate::shared::EditorOptions;

/// Live-Zustand des Roboters.
#[derive(Debug, Clone, Default)]
pub struct RobotView {
    /// Transform-Kette
    pub pipeline: TransformPipeline,
    /// Letzte bekannte Pose
    pub pose: Option<RobotPose>,
    /// Scan-Punkte des letzten Frames
    pub scan_cloud: Vec<Vec3>,
}

impl RobotView {
    /// Erstellt einen leeren Roboter-Zustand mit Scan-Parametern aus den Optionen.
    pub fn new(options: &EditorOptions) -> Self {
        let mut pipeline = TransformPipeline::new();
        pipeline.scan_height = options.scan_height;
        pipeline.magnitude_limit = options.scan_magnitude_limit;
        Self {
            pipeline,
            pose: None,
            scan_cloud: Vec::new(),
        }
    }
}

/// Hauptzustand der Anwendung
pub struct AppState {
    /// Entities und Karte
    pub document: MapDocument,
    /// Screen ↔ Welt-Projektion inkl. Kamera
    pub projector: Projector,
    /// Laufzeit-Optionen (Farben, Radien, Schwellen)
    pub options: EditorOptions,
    /// Roboter-Pose und Scan
    pub robot: RobotView,
    /// Neuzeichnen angefordert (wird vom Frame-Limiter abgebaut)
    pub render_requested: bool,
    /// Vom aktiven Werkzeug gewünschter Cursor
    pub cursor: CursorIcon,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Erstellt einen neuen, leeren App-State
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    /// Erstellt einen App-State mit vorgegebenen Optionen.
    pub fn with_options(options: EditorOptions) -> Self {
        let camera =
            MapCamera::top_down(Vec2::ZERO, options.camera_height, Vec2::new(1280.0, 720.0));
        Self {
            document: MapDocument::new(),
            projector: Projector::new(camera),
            robot: RobotView::new(&options),
            options,
            render_requested: true,
            cursor: CursorIcon::Default,
        }
    }

    /// Fordert ein Neuzeichnen an.
    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Gesamtzahl aller Entities (für UI-Anzeige)
    pub fn entity_count(&self) -> usize {
        self.document.layers.total_len()
    }
}
