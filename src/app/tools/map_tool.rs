//! MapTool-Trait: Schnittstelle für alle Karten-Werkzeuge.

use glam::Vec2;

use super::vector_editor::VectorEditor;
use super::{ApplyOutcome, CursorIcon, ToolContext, ToolId, ToolResponse};
use crate::shared::{EditorOptions, SceneShape, ShapeKey};

/// Schnittstelle für alle Werkzeuge (Vektor-Editoren, Raster-Pinsel).
///
/// Werkzeuge sind zustandsbehaftet. Pointer-Events kommen in Screen-Pixeln
/// an; die Projektion auf die Karte übernimmt das Werkzeug über den Kontext.
pub trait MapTool {
    /// Stabile Kennung (Registrierung, Tool-Wechsel)
    fn id(&self) -> ToolId;

    /// Anzeigename für die Toolbar
    fn name(&self) -> &str;

    /// Wird beim Aktivieren aufgerufen (z.B. Backup anlegen).
    fn activate(&mut self, _ctx: &mut ToolContext<'_>) {}

    /// Taste gedrückt.
    fn on_pointer_down(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse;

    /// Zeiger bewegt.
    fn on_pointer_move(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse;

    /// Taste losgelassen.
    fn on_pointer_up(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse;

    /// Übernimmt die laufende Transaktion.
    fn apply(&mut self, ctx: &mut ToolContext<'_>) -> ApplyOutcome;

    /// Verwirft die laufende Transaktion.
    fn cancel(&mut self, ctx: &mut ToolContext<'_>) -> ApplyOutcome;

    /// Bricht nur die laufende Zeigerinteraktion ab (Touch-Cancel).
    fn abort_interaction(&mut self) {}

    /// Gibt Ressourcen frei (Tool-Wechsel, neue Karte).
    fn dispose(&mut self) {}

    /// Hat das Werkzeug angefangene, nicht übernommene Eingaben?
    fn has_pending_input(&self) -> bool {
        false
    }

    /// Gewünschter Cursor.
    fn cursor(&self) -> CursorIcon {
        CursorIcon::Default
    }

    /// Werkzeug-eigene Overlay-Formen (Entwurf, Node-Handles).
    fn render_overlay(&self, _options: &EditorOptions) -> Vec<(ShapeKey, SceneShape)> {
        Vec::new()
    }

    /// Downcast auf den Vektor-Editor.
    fn as_vector_editor(&self) -> Option<&VectorEditor> {
        None
    }

    /// Mutabler Downcast auf den Vektor-Editor.
    fn as_vector_editor_mut(&mut self) -> Option<&mut VectorEditor> {
        None
    }
}
