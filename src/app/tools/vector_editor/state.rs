//! State-Definitionen und Transaktionen des Vektor-Editors.

use std::collections::HashMap;

use glam::{Quat, Vec2};

use super::super::{ApplyOutcome, Rejection};
use crate::core::entity::{EntityGeometry, EntityKind, EntityMetadata, KindConfig};
use crate::core::entity_store::EntityStore;
use crate::core::geometry::{normalize_angle, pointer_angle};
use crate::core::node_list::EditableShape;
use crate::core::transform::{quaternion_to_yaw, yaw_to_quaternion};

/// Modus des Editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Neue Entity zeichnen
    #[default]
    Create,
    /// Bestehende Entity auswählen
    Select,
    /// Ausgewählte Entity bearbeiten
    Edit,
}

/// Laufender Drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum DragState {
    /// Node am Index wird verschoben
    Node { index: usize },
    /// Orientierter Punkt wird verschoben (Abstand Punkt − Zeiger beim Greifen)
    Pan { grab_offset: Vec2 },
    /// Orientierter Punkt wird gedreht
    Rotate {
        start_pointer_angle: f32,
        start_yaw: f32,
    },
}

/// Generischer Editor für eine Entity-Art.
///
/// Im Erstellen-Modus ist `draft` der Entwurf; im Bearbeiten-Modus die
/// Arbeitskopie der ausgewählten Entity. Der Speicher bleibt bis zum
/// Übernehmen unverändert, die Arbeitskopie wird über das Overlay gezeichnet.
/// `edit_snapshot` hält den Stand bei Bearbeitungsbeginn.
#[derive(Debug, Clone)]
pub struct VectorEditor {
    pub(crate) config: KindConfig,
    pub(crate) mode: EditorMode,
    pub(crate) draft: EditableShape,
    pub(crate) draft_orientation: Option<Quat>,
    /// Per Dialog gesetzte Metadaten (wirksam beim Übernehmen)
    pub(crate) pending_metadata: Option<EntityMetadata>,
    pub(crate) selected_entity: Option<u64>,
    pub(crate) hovered_entity: Option<u64>,
    pub(crate) edit_snapshot: Option<EntityGeometry>,
    pub(crate) drag: Option<DragState>,
}

impl VectorEditor {
    /// Erstellt einen Editor im Erstellen-Modus.
    pub fn new(config: KindConfig) -> Self {
        Self {
            config,
            mode: EditorMode::Create,
            draft: EditableShape::new(),
            draft_orientation: None,
            pending_metadata: None,
            selected_entity: None,
            hovered_entity: None,
            edit_snapshot: None,
            drag: None,
        }
    }

    /// Konfiguration der Art.
    pub fn config(&self) -> &KindConfig {
        &self.config
    }

    /// Entity-Art.
    pub fn kind(&self) -> EntityKind {
        self.config.kind
    }

    /// Aktueller Modus.
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Entwurf bzw. Arbeitskopie.
    pub fn draft(&self) -> &EditableShape {
        &self.draft
    }

    /// Gierwinkel des Entwurfs (orientierte Punkte).
    pub fn draft_yaw(&self) -> Option<f32> {
        self.draft_orientation.map(quaternion_to_yaw)
    }

    /// Ausgewählte Entity.
    pub fn selected_entity(&self) -> Option<u64> {
        self.selected_entity
    }

    /// Entity unter dem Zeiger.
    pub fn hovered_entity(&self) -> Option<u64> {
        self.hovered_entity
    }

    /// Snapshot bei Bearbeitungsbeginn.
    pub fn edit_snapshot(&self) -> Option<&EntityGeometry> {
        self.edit_snapshot.as_ref()
    }

    /// Entity, die gerade bearbeitet wird.
    pub fn editing_entity(&self) -> Option<u64> {
        if self.mode == EditorMode::Edit {
            self.selected_entity
        } else {
            None
        }
    }

    /// Läuft gerade ein Drag?
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Ist der Entwurf übernehmbar?
    pub fn draft_complete(&self) -> bool {
        self.draft.len() >= self.config.min_points
    }

    /// Setzt die Metadaten für das nächste Übernehmen (Dialog-Bestätigung).
    pub fn set_draft_metadata(&mut self, metadata: EntityMetadata) {
        self.pending_metadata = Some(metadata);
    }

    /// Wechselt den Modus.
    ///
    /// Jeder Wechsel bricht einen laufenden Drag ab. Verlassen von Edit stellt
    /// den Snapshot wieder her, Verlassen von Create verwirft den Entwurf.
    /// Edit ist nur mit gültiger Auswahl erreichbar.
    pub fn set_mode(&mut self, mode: EditorMode, store: &mut EntityStore) -> ApplyOutcome {
        self.drag = None;
        if mode == self.mode {
            return ApplyOutcome::Nothing;
        }

        if mode == EditorMode::Edit {
            let Some(id) = self.selected_entity else {
                log::warn!("{}: Bearbeiten ohne Auswahl abgelehnt", self.kind().label());
                return ApplyOutcome::Rejected(Rejection::NoSelection);
            };
            let Some(entity) = store.get(id) else {
                log::warn!(
                    "{}: ausgewaehlte Entity {} existiert nicht mehr",
                    self.kind().label(),
                    id
                );
                self.selected_entity = None;
                return ApplyOutcome::Rejected(Rejection::NoSelection);
            };
            let snapshot = entity.geometry();
            self.discard_draft();
            self.draft = EditableShape::from_points(snapshot.points.clone());
            self.draft_orientation = snapshot.orientation;
            self.edit_snapshot = Some(snapshot);
            self.mode = EditorMode::Edit;
            log::debug!("{}: Bearbeitung von {} begonnen", self.kind().label(), id);
            return ApplyOutcome::EditStarted {
                kind: self.kind(),
                id,
            };
        }

        let outcome = match self.mode {
            EditorMode::Edit => self.restore_snapshot(),
            EditorMode::Create if !self.draft.is_empty() => ApplyOutcome::Discarded,
            _ => ApplyOutcome::Nothing,
        };
        self.discard_draft();
        if mode == EditorMode::Create {
            self.selected_entity = None;
            self.hovered_entity = None;
        }
        log::debug!(
            "{}: Modus {:?} -> {:?}",
            self.kind().label(),
            self.mode,
            mode
        );
        self.mode = mode;
        outcome
    }

    /// Beginnt die Bearbeitung der ausgewählten Entity.
    pub fn begin_edit(&mut self, store: &mut EntityStore) -> ApplyOutcome {
        self.set_mode(EditorMode::Edit, store)
    }

    /// Übernimmt Entwurf bzw. Bearbeitung.
    pub fn apply_changes(&mut self, store: &mut EntityStore) -> ApplyOutcome {
        self.drag = None;
        let outcome = match self.mode {
            EditorMode::Select => return ApplyOutcome::Nothing,
            EditorMode::Edit => {
                let Some(id) = self.selected_entity else {
                    return ApplyOutcome::Rejected(Rejection::NoSelection);
                };
                store.replace_geometry(id, self.working_geometry());
                if let (Some(metadata), Some(entity)) =
                    (self.pending_metadata.take(), store.get_mut(id))
                {
                    entity.metadata = metadata;
                }
                ApplyOutcome::Updated {
                    kind: self.kind(),
                    id,
                }
            }
            EditorMode::Create => {
                if self.draft.is_empty() {
                    return ApplyOutcome::Nothing;
                }
                if !self.draft_complete() {
                    log::warn!(
                        "{}: Entwurf mit {} Punkt(en) unvollstaendig (mindestens {})",
                        self.kind().label(),
                        self.draft.len(),
                        self.config.min_points
                    );
                    return ApplyOutcome::Rejected(Rejection::DraftIncomplete {
                        min: self.config.min_points,
                        current: self.draft.len(),
                    });
                }
                let orientation = if self.config.is_oriented_point() {
                    Some(self.draft_orientation.unwrap_or(Quat::IDENTITY))
                } else {
                    None
                };
                let points = std::mem::take(&mut self.draft).into_points();
                let metadata = self.pending_metadata.take().unwrap_or_default();
                let id = store.insert_new(points, orientation, metadata);
                ApplyOutcome::Created {
                    kind: self.kind(),
                    id,
                }
            }
        };
        self.reset_to_create();
        outcome
    }

    /// Verwirft Entwurf bzw. Bearbeitung.
    pub fn cancel_changes(&mut self) -> ApplyOutcome {
        self.drag = None;
        let outcome = match self.mode {
            EditorMode::Edit => {
                let outcome = self.restore_snapshot();
                self.reset_to_create();
                outcome
            }
            EditorMode::Create => {
                let had_draft = !self.draft.is_empty();
                self.reset_to_create();
                if had_draft {
                    ApplyOutcome::Discarded
                } else {
                    ApplyOutcome::Nothing
                }
            }
            EditorMode::Select => {
                let had_selection = self.selected_entity.is_some();
                self.selected_entity = None;
                self.hovered_entity = None;
                if had_selection {
                    ApplyOutcome::Discarded
                } else {
                    ApplyOutcome::Nothing
                }
            }
        };
        self.pending_metadata = None;
        outcome
    }

    /// Löscht den ausgewählten Node.
    ///
    /// Im Bearbeiten-Modus wird die Mindestpunktanzahl erzwungen.
    pub fn delete_selected_node(&mut self) -> ApplyOutcome {
        if self.mode == EditorMode::Select {
            return ApplyOutcome::Rejected(Rejection::NotEditing);
        }
        let Some(index) = self.draft.selected_node() else {
            return ApplyOutcome::Rejected(Rejection::NoNodeSelected);
        };

        if self.mode == EditorMode::Edit && self.draft.len() <= self.config.min_points {
            log::warn!(
                "{}: Node {} nicht geloescht, Mindestanzahl {} erreicht",
                self.kind().label(),
                index,
                self.config.min_points
            );
            return ApplyOutcome::Rejected(Rejection::BelowMinimumPoints {
                min: self.config.min_points,
                current: self.draft.len(),
            });
        }

        self.drag = None;
        self.draft.remove(index);
        if self.draft.is_empty() {
            self.draft_orientation = None;
        }
        ApplyOutcome::NodeDeleted { index }
    }

    /// Löscht die ausgewählte Entity aus dem Speicher.
    pub fn delete_selected_entity(&mut self, store: &mut EntityStore) -> ApplyOutcome {
        let Some(id) = self.selected_entity else {
            return ApplyOutcome::Rejected(Rejection::NoSelection);
        };
        if store.remove(id).is_none() {
            self.selected_entity = None;
            return ApplyOutcome::Rejected(Rejection::NoSelection);
        }
        log::info!("{} {} geloescht", self.kind().label(), id);

        let next_mode = if self.mode == EditorMode::Create {
            EditorMode::Create
        } else {
            EditorMode::Select
        };
        self.discard_draft();
        self.selected_entity = None;
        if self.hovered_entity == Some(id) {
            self.hovered_entity = None;
        }
        self.mode = next_mode;
        ApplyOutcome::Deleted {
            kind: self.kind(),
            id,
        }
    }

    /// Überträgt Server-IDs auf Auswahl und Hover.
    pub fn remap_ids(&mut self, mapping: &HashMap<u64, u64>) {
        for slot in [&mut self.selected_entity, &mut self.hovered_entity] {
            if let Some(new_id) = slot.and_then(|id| mapping.get(&id)) {
                *slot = Some(*new_id);
            }
        }
    }

    /// Setzt alle flüchtigen Zustände zurück, ohne den Speicher anzufassen.
    pub fn clear_transient(&mut self) {
        self.reset_to_create();
        self.pending_metadata = None;
    }

    // ── Interne Helfer ──────────────────────────────────────────

    /// Aktueller Stand von Entwurf bzw. Arbeitskopie.
    pub(crate) fn working_geometry(&self) -> EntityGeometry {
        EntityGeometry {
            points: self.draft.points().to_vec(),
            orientation: self.draft_orientation,
        }
    }

    /// Startet Verschieben oder Drehen eines orientierten Punkts.
    pub(crate) fn begin_oriented_drag(&mut self, world: Vec2) {
        let Some(&center) = self.draft.points().first() else {
            return;
        };
        if center.distance(world) <= self.config.footprint_radius {
            self.drag = Some(DragState::Pan {
                grab_offset: center - world,
            });
        } else {
            self.drag = Some(DragState::Rotate {
                start_pointer_angle: pointer_angle(center, world),
                start_yaw: self.draft_yaw().unwrap_or(0.0),
            });
        }
    }

    /// Führt den laufenden Drag zur Zeigerposition nach.
    pub(crate) fn drag_to(&mut self, world: Vec2) -> bool {
        match self.drag {
            Some(DragState::Node { index }) => self.draft.set(index, world),
            Some(DragState::Pan { grab_offset }) => self.draft.set(0, world + grab_offset),
            Some(DragState::Rotate {
                start_pointer_angle,
                start_yaw,
            }) => {
                let Some(&center) = self.draft.points().first() else {
                    return false;
                };
                let delta = normalize_angle(pointer_angle(center, world) - start_pointer_angle);
                let yaw = normalize_angle(start_yaw + delta);
                self.draft_orientation = Some(yaw_to_quaternion(yaw));
                true
            }
            None => false,
        }
    }

    /// Verwirft die Arbeitskopie; der Speicher hält noch den Snapshot-Stand.
    fn restore_snapshot(&mut self) -> ApplyOutcome {
        let (Some(_), Some(id)) = (self.edit_snapshot.take(), self.selected_entity) else {
            return ApplyOutcome::Nothing;
        };
        log::debug!("{}: {} auf Snapshot zurueckgesetzt", self.kind().label(), id);
        ApplyOutcome::Restored {
            kind: self.kind(),
            id,
        }
    }

    fn discard_draft(&mut self) {
        self.draft.clear();
        self.draft_orientation = None;
        self.edit_snapshot = None;
        self.drag = None;
    }

    fn reset_to_create(&mut self) {
        self.discard_draft();
        self.mode = EditorMode::Create;
        self.selected_entity = None;
        self.hovered_entity = None;
    }
}
