use glam::Vec2;

use super::pointer::{PointerEvent, RawInput};
use crate::app::tools::ToolId;
use crate::app::tools::vector_editor::EditorMode;
use crate::core::entity::EntityMetadata;
use crate::wire::{LaserScanMsg, TfMessage};

/// App-Intents: Eingaben aus Host/UI/Roboter ohne direkte Mutationslogik.
#[derive(Debug, Clone)]
pub enum AppIntent {
    /// Rohe Maus-/Touch-Eingabe
    Input(RawInput),
    /// Bereits vereinheitlichtes Pointer-Event
    Pointer(PointerEvent),
    /// Werkzeug wechseln
    SelectTool(ToolId),
    /// Modus des Vektor-Editors wechseln
    SetEditorMode(EditorMode),
    /// Bearbeitung der ausgewählten Entity beginnen
    BeginEdit,
    /// Aktuelle Transaktion übernehmen
    Apply,
    /// Aktuelle Transaktion verwerfen
    Cancel,
    /// Ausgewählten Node löschen
    DeleteSelectedNode,
    /// Ausgewählte Entity löschen
    DeleteSelectedEntity,
    /// Metadaten des Entwurfs setzen (Dialog-Bestätigung)
    SetDraftMetadata(EntityMetadata),
    /// Stufenweise hineinzoomen
    ZoomInRequested,
    /// Stufenweise herauszoomen
    ZoomOutRequested,
    /// Kamera um Delta verschieben (Welt-Einheiten)
    CameraPan {
        /// Verschiebung
        delta: Vec2,
    },
    /// Viewport-Größe hat sich geändert
    ViewportResized {
        /// Neue Größe in Pixeln
        size: [f32; 2],
    },
    /// Kartenbytes empfangen (PGM oder JSON)
    MapReceived {
        /// Kartenbytes
        bytes: Vec<u8>,
        /// Optionaler Sidecar-Text
        sidecar: Option<String>,
    },
    /// TF-Nachricht empfangen
    TransformsReceived(TfMessage),
    /// Laserscan empfangen
    ScanReceived(LaserScanMsg),
}
