//! Use-Case-Funktionen für Laden und Speichern der Entity-Listen.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::app::AppState;
use crate::core::entity::EntityKind;
use crate::wire::{decode_entity_list, encode_entity_list};

/// Ersetzt alle Entities einer Art durch die dekodierten Records.
///
/// Ein fehlerhafter Record verwirft die gesamte Liste; der bisherige
/// Bestand bleibt dann unverändert.
pub fn load_entities(state: &mut AppState, kind: EntityKind, records: &Value) -> Result<usize> {
    let entities = decode_entity_list(kind, records)
        .with_context(|| format!("{}: Liste konnte nicht geladen werden", kind.label()))?;
    let invalid = entities.iter().filter(|e| !e.is_valid()).count();
    if invalid > 0 {
        log::warn!(
            "{}: {} Entity(s) mit zu wenigen Punkten uebernommen",
            kind.label(),
            invalid
        );
    }
    let count = entities.len();
    state.document.store_mut(kind).replace_all(entities);
    log::info!("{}: {} Entity(s) geladen", kind.label(), count);
    state.request_render();
    Ok(count)
}

/// Kodiert alle Entities einer Art als Wire-Records.
pub fn encode_entities(state: &AppState, kind: EntityKind) -> Result<Value> {
    encode_entity_list(state.document.store(kind).iter())
        .with_context(|| format!("{}: Liste konnte nicht kodiert werden", kind.label()))
}

/// Übernimmt vom Server vergebene IDs. Gibt die Anzahl umbenannter Entities zurück.
pub fn adopt_server_ids(
    state: &mut AppState,
    kind: EntityKind,
    mapping: &HashMap<u64, u64>,
) -> usize {
    let renamed = state.document.store_mut(kind).reconcile_ids(mapping);
    if renamed > 0 {
        state.request_render();
    }
    renamed
}
