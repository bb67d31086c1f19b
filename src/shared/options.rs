//! Zentrale Konfiguration für den Karten-Editor.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

use crate::codec::sidecar::MapSidecar;
use crate::core::entity::{EntityKind, KindConfig};
use crate::core::occupancy::{DEFAULT_FREE_THRESH, DEFAULT_OCCUPIED_THRESH};
use crate::core::transform::DEFAULT_SCAN_MAGNITUDE_LIMIT;

// ── Kamera ──────────────────────────────────────────────────────────

/// Standard-Kamerahöhe über der Karte (Meter).
pub const CAMERA_HEIGHT_DEFAULT: f32 = 20.0;
/// Zoom-Schritt bei stufenweisem Zoom.
pub const CAMERA_ZOOM_STEP: f32 = 1.2;
/// Zoom-Schritt bei Mausrad-Scroll.
pub const CAMERA_SCROLL_ZOOM_STEP: f32 = 1.1;

// ── Selektion ───────────────────────────────────────────────────────

/// Greifradius für Nodes, Linien und Marker (Meter).
pub const SELECTION_RADIUS_WORLD: f32 = 0.15;
/// Maximaler Kantenabstand für das Einfügen eines Nodes (Meter).
pub const EDGE_INSERTION_THRESHOLD: f32 = 0.1;
/// Radius der Grundfläche von Positionen und Markern (Meter).
pub const MARKER_FOOTPRINT_RADIUS: f32 = 0.25;

// ── Node-Rendering ─────────────────────────────────────────────────

/// Außenring-Radius eines Node-Handles (Meter).
pub const NODE_OUTER_RADIUS: f32 = 0.08;
/// Innenpunkt-Radius eines Node-Handles (Meter).
pub const NODE_INNER_RADIUS: f32 = 0.04;
/// Farbe normaler Nodes (RGBA: Weiß).
pub const NODE_COLOR_DEFAULT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
/// Farbe ausgewählter Nodes (RGBA: Magenta).
pub const NODE_COLOR_SELECTED: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
/// Farbe gehoverter Elemente (RGBA: Gelb).
pub const HOVER_COLOR: [f32; 4] = [1.0, 0.9, 0.2, 1.0];
/// Farbe der ausgewählten Entity (RGBA: Cyan).
pub const SELECTION_COLOR: [f32; 4] = [0.0, 0.8, 1.0, 1.0];

// ── Entity-Farben ──────────────────────────────────────────────────

/// Wände (Schwarz)
pub const WALL_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
/// Virtuelle Wände (Rot)
pub const VIRTUAL_WALL_COLOR: [f32; 4] = [0.9, 0.1, 0.1, 1.0];
/// Sperrzonen (Rot, halbtransparent)
pub const FORBIDDEN_ZONE_COLOR: [f32; 4] = [0.9, 0.1, 0.1, 0.4];
/// Bevorzugte Wege (Grün)
pub const PREFERRED_ZONE_COLOR: [f32; 4] = [0.2, 0.8, 0.2, 0.8];
/// Gemiedene Zonen (Orange, halbtransparent)
pub const UNPREFERRED_ZONE_COLOR: [f32; 4] = [1.0, 0.5, 0.1, 0.4];
/// Kritische Zonen (Violett, halbtransparent)
pub const CRITICAL_ZONE_COLOR: [f32; 4] = [0.6, 0.2, 0.8, 0.4];
/// Positionen (Blau)
pub const POSITION_COLOR: [f32; 4] = [0.2, 0.4, 1.0, 1.0];
/// Marker (Türkis)
pub const MARKER_COLOR: [f32; 4] = [0.1, 0.8, 0.7, 1.0];

// ── Raster-Werkzeuge ───────────────────────────────────────────────

/// Pinselradius beim Wände-Zeichnen (Pixel).
pub const WALL_BRUSH_RADIUS_PX: u32 = 1;
/// Pinselradius des Radierers (Pixel).
pub const ERASER_RADIUS_PX: u32 = 4;
/// Pinselradius beim Boden-Füllen/-Löschen (Pixel).
pub const FLOOR_BRUSH_RADIUS_PX: u32 = 6;

// ── Laufzeit ────────────────────────────────────────────────────────

/// Ziel-Intervall zwischen zwei Frames (Millisekunden, ≈ 30 FPS).
pub const TARGET_FRAME_INTERVAL_MS: u64 = 33;
/// Z-Höhe der projizierten Scan-Punkte (Meter).
pub const SCAN_HEIGHT: f32 = 0.1;
/// Farbe der Scan-Punkte (RGBA: Rot).
pub const SCAN_POINT_COLOR: [f32; 4] = [1.0, 0.2, 0.2, 1.0];
/// Auflösung für Karten ohne Sidecar (Meter pro Pixel).
pub const DEFAULT_MAP_RESOLUTION: f32 = 0.05;

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Editor-Optionen.
/// Wird als `robot_map_editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorOptions {
    // ── Kamera ──────────────────────────────────────────────────
    /// Start-Höhe der Kamera
    pub camera_height: f32,
    /// Zoom-Schritt bei Shortcuts
    pub camera_zoom_step: f32,
    /// Zoom-Schritt bei Mausrad-Scroll
    pub camera_scroll_zoom_step: f32,

    // ── Selektion ───────────────────────────────────────────────
    /// Greifradius in Metern
    pub selection_radius_world: f32,
    /// Maximaler Kantenabstand für Node-Einfügen
    pub edge_insertion_threshold: f32,
    /// Grundfläche orientierter Punkte
    pub marker_footprint_radius: f32,

    // ── Nodes ───────────────────────────────────────────────────
    /// Außenring-Radius
    pub node_outer_radius: f32,
    /// Innenpunkt-Radius
    pub node_inner_radius: f32,
    /// Farbe normaler Nodes
    pub node_color_default: [f32; 4],
    /// Farbe ausgewählter Nodes
    pub node_color_selected: [f32; 4],
    /// Hover-Farbe
    pub hover_color: [f32; 4],
    /// Farbe der ausgewählten Entity
    pub selection_color: [f32; 4],

    // ── Entities ────────────────────────────────────────────────
    /// Farbe: Wände
    pub wall_color: [f32; 4],
    /// Farbe: virtuelle Wände
    pub virtual_wall_color: [f32; 4],
    /// Farbe: Sperrzonen
    pub forbidden_zone_color: [f32; 4],
    /// Farbe: bevorzugte Wege
    pub preferred_zone_color: [f32; 4],
    /// Farbe: gemiedene Zonen
    pub unpreferred_zone_color: [f32; 4],
    /// Farbe: kritische Zonen
    pub critical_zone_color: [f32; 4],
    /// Farbe: Positionen
    pub position_color: [f32; 4],
    /// Farbe: Marker
    pub marker_color: [f32; 4],

    // ── Raster ──────────────────────────────────────────────────
    /// Pinselradius Wände
    pub wall_brush_radius_px: u32,
    /// Pinselradius Radierer
    pub eraser_radius_px: u32,
    /// Pinselradius Boden
    pub floor_brush_radius_px: u32,

    // ── Laufzeit ────────────────────────────────────────────────
    /// Frame-Intervall in Millisekunden
    pub target_frame_interval_ms: u64,
    /// Z-Höhe der Scan-Punkte
    pub scan_height: f32,
    /// Betragsgrenze für Scan-Punkte (größere werden verworfen)
    pub scan_magnitude_limit: f32,
    /// Farbe der Scan-Punkte
    pub scan_point_color: [f32; 4],

    // ── Karte ───────────────────────────────────────────────────
    /// Auflösung für Karten ohne Sidecar
    pub default_map_resolution: f32,
    /// Belegt-Schwelle für Karten ohne Sidecar
    pub default_occupied_thresh: f32,
    /// Frei-Schwelle für Karten ohne Sidecar
    pub default_free_thresh: f32,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            camera_height: CAMERA_HEIGHT_DEFAULT,
            camera_zoom_step: CAMERA_ZOOM_STEP,
            camera_scroll_zoom_step: CAMERA_SCROLL_ZOOM_STEP,

            selection_radius_world: SELECTION_RADIUS_WORLD,
            edge_insertion_threshold: EDGE_INSERTION_THRESHOLD,
            marker_footprint_radius: MARKER_FOOTPRINT_RADIUS,

            node_outer_radius: NODE_OUTER_RADIUS,
            node_inner_radius: NODE_INNER_RADIUS,
            node_color_default: NODE_COLOR_DEFAULT,
            node_color_selected: NODE_COLOR_SELECTED,
            hover_color: HOVER_COLOR,
            selection_color: SELECTION_COLOR,

            wall_color: WALL_COLOR,
            virtual_wall_color: VIRTUAL_WALL_COLOR,
            forbidden_zone_color: FORBIDDEN_ZONE_COLOR,
            preferred_zone_color: PREFERRED_ZONE_COLOR,
            unpreferred_zone_color: UNPREFERRED_ZONE_COLOR,
            critical_zone_color: CRITICAL_ZONE_COLOR,
            position_color: POSITION_COLOR,
            marker_color: MARKER_COLOR,

            wall_brush_radius_px: WALL_BRUSH_RADIUS_PX,
            eraser_radius_px: ERASER_RADIUS_PX,
            floor_brush_radius_px: FLOOR_BRUSH_RADIUS_PX,

            target_frame_interval_ms: TARGET_FRAME_INTERVAL_MS,
            scan_height: SCAN_HEIGHT,
            scan_magnitude_limit: DEFAULT_SCAN_MAGNITUDE_LIMIT,
            scan_point_color: SCAN_POINT_COLOR,

            default_map_resolution: DEFAULT_MAP_RESOLUTION,
            default_occupied_thresh: DEFAULT_OCCUPIED_THRESH,
            default_free_thresh: DEFAULT_FREE_THRESH,
        }
    }
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("robot_map_editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("robot_map_editor.toml")
    }

    /// Anzeigefarbe einer Entity-Art.
    pub fn kind_color(&self, kind: EntityKind) -> [f32; 4] {
        match kind {
            EntityKind::Wall => self.wall_color,
            EntityKind::VirtualWall => self.virtual_wall_color,
            EntityKind::ForbiddenZone => self.forbidden_zone_color,
            EntityKind::PreferredZone => self.preferred_zone_color,
            EntityKind::UnpreferredZone => self.unpreferred_zone_color,
            EntityKind::CriticalZone => self.critical_zone_color,
            EntityKind::Position => self.position_color,
            EntityKind::Marker => self.marker_color,
        }
    }

    /// Editor-Parametrisierung einer Entity-Art.
    pub fn kind_config(&self, kind: EntityKind) -> KindConfig {
        KindConfig::new(
            kind,
            self.selection_radius_world,
            self.edge_insertion_threshold,
            self.marker_footprint_radius,
            self.kind_color(kind),
        )
    }

    /// Sidecar-Ersatz für Karten ohne eigene Metadaten.
    pub fn fallback_sidecar(&self) -> MapSidecar {
        let mut sidecar = MapSidecar::new("", self.default_map_resolution, [0.0; 3]);
        sidecar.occupied_thresh = self.default_occupied_thresh;
        sidecar.free_thresh = self.default_free_thresh;
        sidecar
    }

    /// Frame-Intervall als `Duration`.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.target_frame_interval_ms)
    }
}
