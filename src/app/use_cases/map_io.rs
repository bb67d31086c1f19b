//! Use-Case-Funktionen für Laden und Exportieren der Belegungskarte.
//!
//! Dekodieren ist rein; erst nach Erfolg werden Dokument und Projektor
//! ersetzt. Ein fehlerhafter Datensatz lässt die bisherige Karte unberührt.

use anyhow::{Context, Result};

use crate::app::state::OccupancyLayer;
use crate::app::AppState;
use crate::codec::{decode_map_bytes, encode_grid, DecodedMap, EncodedMap};
use crate::core::projector::MapSurface;
use crate::wire::MapPayload;

/// Dekodiert Kartenbytes und ersetzt bei Erfolg die geladene Karte.
pub fn load_map(state: &mut AppState, bytes: &[u8], sidecar: Option<&str>) -> Result<()> {
    let fallback = state.options.fallback_sidecar();
    let decoded =
        decode_map_bytes(bytes, sidecar, &fallback).context("Karte konnte nicht geladen werden")?;
    install_map(state, decoded);
    Ok(())
}

/// Lädt eine Karte aus einem Persistenz-Datensatz.
pub fn load_map_payload(state: &mut AppState, payload: &MapPayload) -> Result<()> {
    load_map(state, &payload.image, payload.info.as_deref())
}

/// Übernimmt eine bereits dekodierte Karte.
pub fn install_map(state: &mut AppState, decoded: DecodedMap) {
    let DecodedMap {
        grid,
        texture,
        image_name,
    } = decoded;
    let bounds = grid.world_bounds();
    let (unknown, free, occupied) = grid.state_counts();
    log::info!(
        "Karte geladen: {}x{} Zellen, {} m/Zelle ({} frei, {} belegt, {} unbekannt)",
        grid.width,
        grid.height,
        grid.resolution,
        free,
        occupied,
        unknown
    );

    state.document.occupancy = Some(OccupancyLayer::new(grid, texture, image_name));
    state.projector.set_surface(Some(MapSurface {
        height: 0.0,
        bounds: Some(bounds),
    }));
    state.request_render();
}

/// Kodiert die Karte, sofern übernommene Rasteränderungen anstehen.
///
/// Kodiert werden nur die Zellen; offene Striche liegen allein in der Textur
/// und bleiben außen vor. Das Flag bleibt gesetzt, bis `mark_map_saved` nach
/// erfolgreichem Speichern aufgerufen wird.
pub fn export_pending_map(state: &AppState) -> Result<Option<EncodedMap>> {
    let Some(layer) = state.document.occupancy.as_ref() else {
        return Ok(None);
    };
    if !layer.needs_encode {
        return Ok(None);
    }
    let encoded = encode_grid(&layer.grid, &layer.image_name)
        .context("Karte konnte nicht kodiert werden")?;
    Ok(Some(encoded))
}

/// Setzt das Kodier-Flag nach erfolgreichem Speichern zurück.
pub fn mark_map_saved(state: &mut AppState) {
    if let Some(layer) = state.document.occupancy.as_mut() {
        layer.needs_encode = false;
    }
}
