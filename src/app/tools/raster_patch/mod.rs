//! Raster-Pinsel: malt direkt in die Kartentextur.
//!
//! Beim Aktivieren (bzw. beim ersten Strich einer neuen Transaktion) wird der
//! komplette Texturpuffer gesichert. Übernehmen führt die Pixel in die Zellen
//! zurück, verwirft das Backup und markiert die Karte zum Kodieren; Verwerfen
//! kopiert das Backup byteweise zurück. Gespeichert werden nur die Zellen.

mod stroke;

use glam::Vec2;

use super::{ApplyOutcome, CursorIcon, MapTool, Rejection, ToolContext, ToolId, ToolResponse};
use crate::app::state::MapDocument;
use crate::core::occupancy::{PIXEL_FREE, PIXEL_OCCUPIED, PIXEL_UNKNOWN};
use crate::shared::EditorOptions;
use stroke::{Pixel, stamp_disc, stroke_line};

/// Art des Raster-Pinsels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterToolKind {
    /// Wand zeichnen (belegt)
    WallDraw,
    /// Radierer (frei)
    Eraser,
    /// Boden füllen (frei)
    FloorFill,
    /// Boden entfernen (unbekannt)
    FloorErase,
}

impl RasterToolKind {
    /// Alle Pinsel in Toolbar-Reihenfolge.
    pub const ALL: [RasterToolKind; 4] = [
        RasterToolKind::WallDraw,
        RasterToolKind::Eraser,
        RasterToolKind::FloorFill,
        RasterToolKind::FloorErase,
    ];

    /// Geschriebener Graustufenwert.
    pub fn pixel_value(self) -> u8 {
        match self {
            RasterToolKind::WallDraw => PIXEL_OCCUPIED,
            RasterToolKind::Eraser | RasterToolKind::FloorFill => PIXEL_FREE,
            RasterToolKind::FloorErase => PIXEL_UNKNOWN,
        }
    }

    /// Pinselradius in Pixeln aus den Optionen.
    pub fn radius(self, options: &EditorOptions) -> u32 {
        match self {
            RasterToolKind::WallDraw => options.wall_brush_radius_px,
            RasterToolKind::Eraser => options.eraser_radius_px,
            RasterToolKind::FloorFill | RasterToolKind::FloorErase => {
                options.floor_brush_radius_px
            }
        }
    }

    /// Anzeigename.
    pub fn label(self) -> &'static str {
        match self {
            RasterToolKind::WallDraw => "Wand zeichnen",
            RasterToolKind::Eraser => "Radierer",
            RasterToolKind::FloorFill => "Boden füllen",
            RasterToolKind::FloorErase => "Boden entfernen",
        }
    }
}

/// Transaktionaler Raster-Pinsel.
pub struct RasterPatchTool {
    kind: RasterToolKind,
    radius: u32,
    backup: Option<Vec<u8>>,
    last_pixel: Option<Pixel>,
    stroking: bool,
    dirty: bool,
}

impl RasterPatchTool {
    /// Erstellt einen Pinsel mit Radius aus den Optionen.
    pub fn new(kind: RasterToolKind, options: &EditorOptions) -> Self {
        Self {
            kind,
            radius: kind.radius(options),
            backup: None,
            last_pixel: None,
            stroking: false,
            dirty: false,
        }
    }

    /// Art des Pinsels.
    pub fn kind(&self) -> RasterToolKind {
        self.kind
    }

    /// Liegt ein Backup vor?
    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// Läuft gerade ein Strich?
    pub fn is_stroking(&self) -> bool {
        self.stroking
    }

    fn arm_backup(&mut self, document: &MapDocument) {
        if self.backup.is_some() {
            return;
        }
        if let Some(layer) = document.occupancy.as_ref() {
            self.backup = Some(layer.texture.as_bytes().to_vec());
            log::debug!(
                "{}: Backup angelegt ({} Bytes)",
                self.kind.label(),
                layer.texture.as_bytes().len()
            );
        }
    }

    fn end_stroke(&mut self) -> bool {
        self.last_pixel = None;
        std::mem::replace(&mut self.stroking, false)
    }
}

impl MapTool for RasterPatchTool {
    fn id(&self) -> ToolId {
        ToolId::Raster(self.kind)
    }

    fn name(&self) -> &str {
        self.kind.label()
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        self.arm_backup(ctx.document);
    }

    fn on_pointer_down(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse {
        let Some(world) = ctx.projection.screen_to_world(screen) else {
            return ToolResponse::Ignored;
        };
        self.arm_backup(ctx.document);
        let Some(layer) = ctx.document.occupancy.as_mut() else {
            return ToolResponse::Ignored;
        };
        let Some(pixel) = layer.texture.world_to_pixel(&layer.grid, world) else {
            return ToolResponse::Ignored;
        };

        stamp_disc(&mut layer.texture, pixel, self.radius, self.kind.pixel_value());
        layer.texture.touch();
        self.stroking = true;
        self.last_pixel = Some(pixel);
        self.dirty = true;
        ToolResponse::Changed
    }

    fn on_pointer_move(&mut self, screen: Vec2, ctx: &mut ToolContext<'_>) -> ToolResponse {
        if !self.stroking {
            return ToolResponse::Ignored;
        }
        let Some(world) = ctx.projection.screen_to_world(screen) else {
            return ToolResponse::Ignored;
        };
        let Some(layer) = ctx.document.occupancy.as_mut() else {
            return ToolResponse::Ignored;
        };
        let Some(pixel) = layer.texture.world_to_pixel(&layer.grid, world) else {
            return ToolResponse::Ignored;
        };
        let from = self.last_pixel.unwrap_or(pixel);
        if from == pixel {
            return ToolResponse::Consumed;
        }

        stroke_line(
            &mut layer.texture,
            from,
            pixel,
            self.radius,
            self.kind.pixel_value(),
        );
        layer.texture.touch();
        self.last_pixel = Some(pixel);
        ToolResponse::Changed
    }

    fn on_pointer_up(&mut self, _screen: Vec2, _ctx: &mut ToolContext<'_>) -> ToolResponse {
        if self.end_stroke() {
            ToolResponse::Consumed
        } else {
            ToolResponse::Ignored
        }
    }

    fn apply(&mut self, ctx: &mut ToolContext<'_>) -> ApplyOutcome {
        self.end_stroke();
        let Some(layer) = ctx.document.occupancy.as_mut() else {
            return ApplyOutcome::Rejected(Rejection::NoMapLoaded);
        };
        if !self.dirty {
            self.backup = None;
            return ApplyOutcome::Nothing;
        }
        let changed = match layer.texture.reconcile_into(&mut layer.grid) {
            Ok(changed) => changed,
            Err(e) => {
                log::warn!("{}: Uebernehmen fehlgeschlagen: {:#}", self.kind.label(), e);
                return ApplyOutcome::Nothing;
            }
        };
        self.backup = None;
        self.dirty = false;
        layer.needs_encode = true;
        log::info!(
            "{}: Rasteraenderungen uebernommen ({} Zellen)",
            self.kind.label(),
            changed
        );
        ApplyOutcome::RasterCommitted
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) -> ApplyOutcome {
        self.end_stroke();
        self.dirty = false;
        let Some(layer) = ctx.document.occupancy.as_mut() else {
            self.backup = None;
            return ApplyOutcome::Rejected(Rejection::NoMapLoaded);
        };
        let Some(backup) = self.backup.take() else {
            return ApplyOutcome::Nothing;
        };
        if let Err(e) = layer.texture.restore_bytes(&backup) {
            log::warn!("{}: Backup nicht wiederherstellbar: {:#}", self.kind.label(), e);
            return ApplyOutcome::Nothing;
        }
        log::debug!("{}: Textur auf Backup zurueckgesetzt", self.kind.label());
        ApplyOutcome::RasterRestored
    }

    fn abort_interaction(&mut self) {
        self.end_stroke();
    }

    fn dispose(&mut self) {
        self.end_stroke();
        self.backup = None;
        self.dirty = false;
    }

    fn has_pending_input(&self) -> bool {
        self.dirty
    }

    fn cursor(&self) -> CursorIcon {
        CursorIcon::Brush
    }
}
