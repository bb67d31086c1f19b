//! Trait-basiertes Werkzeug-System für Vektor- und Raster-Bearbeitung.
//!
//! Jedes Werkzeug implementiert den `MapTool`-Trait und wird beim
//! `ToolManager` registriert. Der Controller reicht Pointer-Events an das
//! aktive Werkzeug weiter; Werkzeuge mutieren das Dokument über den
//! `ToolContext`.

/// MapTool-Trait: Schnittstelle für alle Werkzeuge.
mod map_tool;
/// Raster-Pinsel mit Backup/Restore der Kartentextur.
pub mod raster_patch;
/// Generischer Vektor-Editor (Erstellen, Auswählen, Bearbeiten).
pub mod vector_editor;

pub use map_tool::MapTool;

use crate::app::state::MapDocument;
use crate::core::entity::EntityKind;
use crate::core::projector::ScreenProjection;
use crate::shared::EditorOptions;
use raster_patch::{RasterPatchTool, RasterToolKind};
use vector_editor::VectorEditor;

// ── Typen ────────────────────────────────────────────────────────

/// Kontext eines Werkzeug-Aufrufs.
pub struct ToolContext<'a> {
    /// Screen → Welt
    pub projection: &'a dyn ScreenProjection,
    /// Zu bearbeitendes Dokument
    pub document: &'a mut MapDocument,
    /// Laufzeit-Optionen
    pub options: &'a EditorOptions,
}

/// Reaktion eines Werkzeugs auf ein Pointer-Event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolResponse {
    /// Event nicht verwendet (z.B. kein Kartentreffer)
    Ignored,
    /// Event verwendet, keine sichtbare Änderung
    Consumed,
    /// Sichtbarer Zustand geändert
    Changed,
}

impl ToolResponse {
    /// Muss neu gezeichnet werden?
    pub fn needs_redraw(self) -> bool {
        self == ToolResponse::Changed
    }
}

/// Grund für eine abgelehnte Aktion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Löschen würde die Mindestpunktanzahl unterschreiten
    BelowMinimumPoints {
        /// Mindestanzahl
        min: usize,
        /// Aktuelle Anzahl
        current: usize,
    },
    /// Keine Entity ausgewählt
    NoSelection,
    /// Kein Node ausgewählt
    NoNodeSelected,
    /// Entwurf hat zu wenige Punkte
    DraftIncomplete {
        /// Mindestanzahl
        min: usize,
        /// Aktuelle Anzahl
        current: usize,
    },
    /// Keine Karte geladen
    NoMapLoaded,
    /// Aktion nur im Bearbeiten-Modus möglich
    NotEditing,
    /// Werkzeug unterstützt die Aktion nicht
    Unsupported,
}

/// Ergebnis einer Transaktions-Aktion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Neue Entity angelegt
    Created {
        /// Art
        kind: EntityKind,
        /// Vergebene ID
        id: u64,
    },
    /// Bearbeitung einer Entity begonnen (Snapshot angelegt)
    EditStarted {
        /// Art
        kind: EntityKind,
        /// ID
        id: u64,
    },
    /// Bearbeitung übernommen
    Updated {
        /// Art
        kind: EntityKind,
        /// ID
        id: u64,
    },
    /// Bearbeitung verworfen, Snapshot wiederhergestellt
    Restored {
        /// Art
        kind: EntityKind,
        /// ID
        id: u64,
    },
    /// Entity gelöscht
    Deleted {
        /// Art
        kind: EntityKind,
        /// ID
        id: u64,
    },
    /// Node gelöscht
    NodeDeleted {
        /// Index des gelöschten Nodes
        index: usize,
    },
    /// Entwurf verworfen
    Discarded,
    /// Rasteränderungen übernommen
    RasterCommitted,
    /// Rasteränderungen zurückgesetzt
    RasterRestored,
    /// Nichts zu tun
    Nothing,
    /// Aktion abgelehnt
    Rejected(Rejection),
}

impl ApplyOutcome {
    /// Wurde sichtbarer Zustand verändert?
    pub fn changed_state(self) -> bool {
        !matches!(self, ApplyOutcome::Nothing | ApplyOutcome::Rejected(_))
    }
}

/// Stabile Werkzeug-Kennung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    /// Vektor-Editor einer Entity-Art
    Vector(EntityKind),
    /// Raster-Pinsel
    Raster(RasterToolKind),
}

/// Vom Werkzeug gewünschter Mauszeiger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIcon {
    /// Standardzeiger
    #[default]
    Default,
    /// Fadenkreuz (Punkte setzen)
    Crosshair,
    /// Greifbar
    Grab,
    /// Wird gezogen
    Grabbing,
    /// Verschieben
    Move,
    /// Drehen
    Rotate,
    /// Pinsel
    Brush,
}

// ── ToolManager ──────────────────────────────────────────────────

/// Verwaltet registrierte Werkzeuge und den aktiven Tool-Index.
pub struct ToolManager {
    tools: Vec<Box<dyn MapTool>>,
    active_index: Option<usize>,
}

impl ToolManager {
    /// Erstellt einen ToolManager ohne registrierte Werkzeuge.
    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            active_index: None,
        }
    }

    /// Erstellt einen ToolManager mit einem Editor je Entity-Art und allen Raster-Pinseln.
    pub fn new(options: &EditorOptions) -> Self {
        let mut manager = Self::empty();
        for kind in EntityKind::ALL {
            manager.register(Box::new(VectorEditor::new(options.kind_config(kind))));
        }
        for kind in RasterToolKind::ALL {
            manager.register(Box::new(RasterPatchTool::new(kind, options)));
        }
        manager
    }

    /// Registriert ein neues Werkzeug.
    pub fn register(&mut self, tool: Box<dyn MapTool>) {
        self.tools.push(tool);
    }

    /// Gibt die Anzahl registrierter Tools zurück.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Gibt Kennung und Name aller registrierten Tools zurück.
    pub fn tool_entries(&self) -> Vec<(ToolId, &str)> {
        self.tools.iter().map(|t| (t.id(), t.name())).collect()
    }

    /// Index eines Werkzeugs.
    pub fn index_of(&self, id: ToolId) -> Option<usize> {
        self.tools.iter().position(|t| t.id() == id)
    }

    /// Setzt das aktive Werkzeug. Gibt das vorher aktive zurück.
    ///
    /// Der Lebenszyklus (cancel/dispose/activate) liegt beim Aufrufer.
    pub fn set_active(&mut self, id: ToolId) -> Option<usize> {
        let index = self.index_of(id)?;
        let previous = self.active_index;
        self.active_index = Some(index);
        previous
    }

    /// Gibt die Kennung des aktiven Tools zurück.
    pub fn active_id(&self) -> Option<ToolId> {
        self.active_tool().map(|t| t.id())
    }

    /// Gibt eine Referenz auf das aktive Tool zurück.
    pub fn active_tool(&self) -> Option<&dyn MapTool> {
        self.active_index.map(|i| self.tools[i].as_ref())
    }

    /// Gibt eine mutable Referenz auf das aktive Tool zurück.
    pub fn active_tool_mut(&mut self) -> Option<&mut dyn MapTool> {
        let i = self.active_index?;
        Some(self.tools[i].as_mut())
    }

    /// Vektor-Editor einer Entity-Art.
    pub fn vector_editor(&self, kind: EntityKind) -> Option<&VectorEditor> {
        let index = self.index_of(ToolId::Vector(kind))?;
        self.tools[index].as_vector_editor()
    }

    /// Mutabler Vektor-Editor einer Entity-Art.
    pub fn vector_editor_mut(&mut self, kind: EntityKind) -> Option<&mut VectorEditor> {
        let index = self.index_of(ToolId::Vector(kind))?;
        self.tools[index].as_vector_editor_mut()
    }

    /// Deaktiviert das aktive Werkzeug (ohne Lebenszyklus-Aufrufe).
    pub fn clear_active(&mut self) {
        self.active_index = None;
    }
}
