use crate::core::entity::EntityKind;
use crate::core::entity_store::{EntityLayers, EntityStore};
use crate::core::occupancy::{OccupancyGrid, RasterTexture};

/// Geladene Belegungskarte samt editierbarer Textur.
#[derive(Debug, Clone)]
pub struct OccupancyLayer {
    /// Zellen (Zeile 0 = unten)
    pub grid: OccupancyGrid,
    /// Editierbare Textur (Zeile 0 = oben)
    pub texture: RasterTexture,
    /// Bildname für den Sidecar
    pub image_name: String,
    /// Textur wurde übernommen, aber noch nicht kodiert
    pub needs_encode: bool,
}

impl OccupancyLayer {
    /// Erstellt eine Ebene mit frisch materialisierter Textur.
    pub fn new(grid: OccupancyGrid, texture: RasterTexture, image_name: String) -> Self {
        Self {
            grid,
            texture,
            image_name,
            needs_encode: false,
        }
    }
}

/// Editierbares Dokument: Entity-Ebenen und optional die Karte.
#[derive(Debug, Default)]
pub struct MapDocument {
    /// Entity-Speicher je Art
    pub layers: EntityLayers,
    /// Belegungskarte (None = noch keine Karte empfangen)
    pub occupancy: Option<OccupancyLayer>,
}

impl MapDocument {
    /// Leeres Dokument.
    pub fn new() -> Self {
        Self::default()
    }

    /// Speicher einer Entity-Art.
    pub fn store(&self, kind: EntityKind) -> &EntityStore {
        self.layers.store(kind)
    }

    /// Veränderbarer Speicher einer Entity-Art.
    pub fn store_mut(&mut self, kind: EntityKind) -> &mut EntityStore {
        self.layers.store_mut(kind)
    }

    /// Ist eine Karte geladen?
    pub fn has_map(&self) -> bool {
        self.occupancy.is_some()
    }
}
