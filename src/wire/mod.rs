//! Wire-Formate der Außenwelt: Entity-Records, Roboter-Nachrichten, Persistenz-Vertrag.

pub mod entities;
pub mod robot;

use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;

use crate::codec::EncodedMap;
use crate::core::entity::EntityKind;

pub use entities::{
    decode_entity_list, encode_entity, encode_entity_list, OrientedPointRecord, ShapeRecord,
};
pub use robot::{FrameLink, LaserScanMsg, TfMessage};

/// Rohdaten einer gespeicherten Karte.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapPayload {
    /// Sidecar-Text (falls getrennt geliefert)
    pub info: Option<String>,
    /// Kartenbytes (PGM oder JSON-Nachricht)
    pub image: Vec<u8>,
}

/// Persistenz-Grenze (Server, Dateisystem, ...). Wird vom Core nur konsumiert.
pub trait PersistenceBackend {
    /// Lädt die Wire-Records einer Entity-Art.
    fn load_entities(&mut self, kind: EntityKind) -> Result<Value>;

    /// Speichert die Wire-Records. Liefert die Abbildung lokale ID → Server-ID.
    fn save_entities(&mut self, kind: EntityKind, records: &Value) -> Result<HashMap<u64, u64>>;

    /// Lädt die Karte.
    fn load_map_bytes(&mut self) -> Result<MapPayload>;

    /// Speichert PGM und Sidecar.
    fn save_map_bytes(&mut self, map: &EncodedMap) -> Result<()>;
}
