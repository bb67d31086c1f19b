//! Geordneter Entity-Container pro Art mit monotoner ID-Vergabe.
//!
//! Gelöschte IDs werden nie wiederverwendet, auch wenn der Container kompaktiert.

use glam::{Quat, Vec2};
use indexmap::IndexMap;
use std::collections::HashMap;

use super::entity::{EntityGeometry, EntityKind, EntityMetadata, VectorEntity};

/// Alle Entities einer Art in Einfügereihenfolge.
#[derive(Debug, Clone)]
pub struct EntityStore {
    kind: EntityKind,
    entities: IndexMap<u64, VectorEntity>,
    /// Zuletzt vergebene ID (0 = noch keine)
    last_id: u64,
}

impl EntityStore {
    /// Erstellt einen leeren Container.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entities: IndexMap::new(),
            last_id: 0,
        }
    }

    /// Art der enthaltenen Entities.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Vergibt die nächste freie ID (streng monoton).
    pub fn allocate_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Zuletzt vergebene ID.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Legt eine neue Entity mit frisch vergebener ID an.
    pub fn insert_new(
        &mut self,
        points: Vec<Vec2>,
        orientation: Option<Quat>,
        metadata: EntityMetadata,
    ) -> u64 {
        let id = self.allocate_id();
        self.entities.insert(
            id,
            VectorEntity {
                id,
                kind: self.kind,
                points,
                orientation,
                metadata,
            },
        );
        log::debug!("{} {} angelegt", self.kind.label(), id);
        id
    }

    /// Übernimmt eine extern geladene Entity unverändert.
    ///
    /// Der ID-Zähler wird über die übernommene ID hinaus vorgerückt.
    pub fn insert_loaded(&mut self, mut entity: VectorEntity) {
        entity.kind = self.kind;
        self.last_id = self.last_id.max(entity.id);
        self.entities.insert(entity.id, entity);
    }

    /// Ersetzt den Inhalt vollständig (z.B. nach erfolgreichem Laden).
    ///
    /// Der ID-Zähler läuft nie zurück.
    pub fn replace_all(&mut self, entities: Vec<VectorEntity>) {
        self.entities.clear();
        for entity in entities {
            self.insert_loaded(entity);
        }
    }

    /// Entfernt eine Entity (Reihenfolge der übrigen bleibt erhalten).
    pub fn remove(&mut self, id: u64) -> Option<VectorEntity> {
        self.entities.shift_remove(&id)
    }

    /// Entity per ID.
    pub fn get(&self, id: u64) -> Option<&VectorEntity> {
        self.entities.get(&id)
    }

    /// Mutable Entity per ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut VectorEntity> {
        self.entities.get_mut(&id)
    }

    /// Ersetzt die Geometrie einer Entity. `false` wenn die ID fehlt.
    pub fn replace_geometry(&mut self, id: u64, geometry: EntityGeometry) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.set_geometry(geometry);
                true
            }
            None => false,
        }
    }

    /// Alle Entities in Einfügereihenfolge.
    pub fn iter(&self) -> impl Iterator<Item = &VectorEntity> {
        self.entities.values()
    }

    /// IDs in Einfügereihenfolge.
    pub fn ids(&self) -> Vec<u64> {
        self.entities.keys().copied().collect()
    }

    /// Anzahl Entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Ist der Container leer?
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ersetzt lokale IDs durch Server-IDs, ohne die Reihenfolge zu verändern.
    ///
    /// Alle Umbenennungen gelten gleichzeitig, Ketten wie 1→2, 2→3 sind also
    /// gültig. Übersprungen wird ein Eintrag nur, wenn seine Ziel-ID von einer
    /// Entity gehalten wird, die selbst nicht umbenannt wird, oder wenn mehrere
    /// Einträge dieselbe Ziel-ID haben. Gibt die Anzahl umbenannter Entities zurück.
    pub fn reconcile_ids(&mut self, mapping: &HashMap<u64, u64>) -> usize {
        let mut renames: HashMap<u64, u64> = mapping
            .iter()
            .filter(|&(local, server)| local != server && self.entities.contains_key(local))
            .map(|(&local, &server)| (local, server))
            .collect();

        // Ein verworfener Eintrag hält seine ID weiter und kann so weitere
        // Einträge blockieren: bis zum Fixpunkt wiederholen.
        loop {
            let mut targets: HashMap<u64, usize> = HashMap::new();
            for &server in renames.values() {
                *targets.entry(server).or_default() += 1;
            }
            let mut rejected: Vec<u64> = renames
                .iter()
                .filter(|&(_, server)| {
                    let held = self.entities.contains_key(server) && !renames.contains_key(server);
                    held || targets.get(server).is_some_and(|&n| n > 1)
                })
                .map(|(&local, _)| local)
                .collect();
            if rejected.is_empty() {
                break;
            }
            rejected.sort_unstable();
            for local in rejected {
                if let Some(server) = renames.remove(&local) {
                    log::warn!(
                        "{}: Server-ID {} bereits vergeben, lokale ID {} bleibt",
                        self.kind.label(),
                        server,
                        local
                    );
                }
            }
        }

        if renames.is_empty() {
            return 0;
        }
        let entities = std::mem::take(&mut self.entities);
        self.entities = entities
            .into_iter()
            .map(|(id, mut entity)| {
                if let Some(&server) = renames.get(&id) {
                    entity.id = server;
                }
                (entity.id, entity)
            })
            .collect();
        if let Some(&max_server) = renames.values().max() {
            self.last_id = self.last_id.max(max_server);
        }

        log::info!("{}: {} ID(s) abgeglichen", self.kind.label(), renames.len());
        renames.len()
    }
}

/// Container aller Arten.
#[derive(Debug, Clone)]
pub struct EntityLayers {
    stores: HashMap<EntityKind, EntityStore>,
}

impl Default for EntityLayers {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityLayers {
    /// Erstellt leere Container für alle Arten.
    pub fn new() -> Self {
        Self {
            stores: EntityKind::ALL
                .iter()
                .map(|&kind| (kind, EntityStore::new(kind)))
                .collect(),
        }
    }

    /// Container einer Art.
    pub fn store(&self, kind: EntityKind) -> &EntityStore {
        &self.stores[&kind]
    }

    /// Mutabler Container einer Art.
    pub fn store_mut(&mut self, kind: EntityKind) -> &mut EntityStore {
        self.stores
            .entry(kind)
            .or_insert_with(|| EntityStore::new(kind))
    }

    /// Gesamtzahl aller Entities.
    pub fn total_len(&self) -> usize {
        self.stores.values().map(EntityStore::len).sum()
    }
}
