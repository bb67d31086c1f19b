//! Map Controller für zentrale Event-Verarbeitung.
//!
//! Besitzt die Werkzeuge exklusiv, vereinheitlicht Maus und Touch und
//! reicht Pointer-Events an das aktive Werkzeug weiter. Use-Cases werden
//! direkt auf den AppState angewendet.

use std::time::Instant;

use anyhow::{Context, Result};

use super::events::{AppIntent, PointerEvent, PointerPhase, PointerTranslator, RawInput};
use super::render_loop::{FrameLimiter, SceneSync};
use super::render_scene;
use super::tools::vector_editor::{EditorMode, VectorEditor};
use super::tools::{ApplyOutcome, MapTool, Rejection, ToolContext, ToolId, ToolManager, ToolResponse};
use super::use_cases::{camera, entities, map_io, robot};
use super::AppState;
use crate::core::entity::{EntityKind, EntityMetadata};
use crate::core::entity_store::EntityStore;
use crate::core::projector::{RaycastProjector, ScreenProjection, SurfaceRaycast};
use crate::shared::{EditorOptions, RenderBackend, RenderScene};
use crate::wire::PersistenceBackend;

/// Orchestriert Eingaben, Werkzeuge und Use-Cases auf den AppState.
pub struct MapController {
    tools: ToolManager,
    translator: PointerTranslator,
    frame_limiter: FrameLimiter,
    scene_sync: SceneSync,
}

impl MapController {
    /// Erstellt einen Controller mit allen Standard-Werkzeugen (keins aktiv).
    pub fn new(options: &EditorOptions) -> Self {
        Self::with_tools(ToolManager::new(options), options)
    }

    /// Erstellt einen Controller mit vorgegebenem Werkzeugsatz.
    pub fn with_tools(tools: ToolManager, options: &EditorOptions) -> Self {
        Self {
            tools,
            translator: PointerTranslator::new(),
            frame_limiter: FrameLimiter::new(options.frame_interval()),
            scene_sync: SceneSync::new(),
        }
    }

    /// Registrierte Werkzeuge.
    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    /// Kennung des aktiven Werkzeugs.
    pub fn active_tool_id(&self) -> Option<ToolId> {
        self.tools.active_id()
    }

    /// Modus des aktiven Vektor-Editors.
    pub fn editor_mode(&self) -> Option<EditorMode> {
        self.active_editor().map(VectorEditor::mode)
    }

    /// Aktiver Vektor-Editor (falls das aktive Werkzeug einer ist).
    pub fn active_editor(&self) -> Option<&VectorEditor> {
        self.tools.active_tool()?.as_vector_editor()
    }

    /// Verarbeitet einen Intent.
    ///
    /// Fehler entstehen nur beim Dekodieren empfangener Daten; der
    /// bisherige Zustand bleibt dann erhalten.
    pub fn handle_intent(&mut self, state: &mut AppState, intent: AppIntent) -> Result<ApplyOutcome> {
        let outcome = match intent {
            AppIntent::Input(input) => {
                self.handle_input(state, input);
                ApplyOutcome::Nothing
            }
            AppIntent::Pointer(event) => {
                self.handle_pointer(state, event);
                ApplyOutcome::Nothing
            }
            AppIntent::SelectTool(id) => self.set_active_tool(state, id),
            AppIntent::SetEditorMode(mode) => self.set_mode(state, mode),
            AppIntent::BeginEdit => self.begin_edit(state),
            AppIntent::Apply => self.apply(state),
            AppIntent::Cancel => self.cancel(state),
            AppIntent::DeleteSelectedNode => self.delete_selected_node(state),
            AppIntent::DeleteSelectedEntity => self.delete_selected_entity(state),
            AppIntent::SetDraftMetadata(metadata) => self.set_draft_metadata(state, metadata),
            AppIntent::ZoomInRequested => {
                camera::zoom_in(state);
                ApplyOutcome::Nothing
            }
            AppIntent::ZoomOutRequested => {
                camera::zoom_out(state);
                ApplyOutcome::Nothing
            }
            AppIntent::CameraPan { delta } => {
                camera::pan(state, delta);
                ApplyOutcome::Nothing
            }
            AppIntent::ViewportResized { size } => {
                camera::set_viewport(state, size);
                ApplyOutcome::Nothing
            }
            AppIntent::MapReceived { bytes, sidecar } => {
                self.load_map(state, &bytes, sidecar.as_deref())?;
                ApplyOutcome::Nothing
            }
            AppIntent::TransformsReceived(message) => {
                robot::apply_transforms(state, &message);
                ApplyOutcome::Nothing
            }
            AppIntent::ScanReceived(message) => {
                robot::apply_scan(state, &message.to_scan());
                ApplyOutcome::Nothing
            }
        };
        Ok(outcome)
    }

    // ── Pointer ──────────────────────────────────────────────────

    /// Verarbeitet eine rohe Host-Eingabe (Maus, Touch, Mausrad).
    pub fn handle_input(&mut self, state: &mut AppState, input: RawInput) -> ToolResponse {
        if let RawInput::Wheel { position, delta } = input {
            camera::zoom_towards(state, position, delta);
            return ToolResponse::Consumed;
        }
        match self.translator.translate(input) {
            Some(event) => self.handle_pointer(state, event),
            None => ToolResponse::Ignored,
        }
    }

    /// Reicht ein Pointer-Event an das aktive Werkzeug (Projektion über die Kamera).
    pub fn handle_pointer(&mut self, state: &mut AppState, event: PointerEvent) -> ToolResponse {
        self.dispatch_pointer(state, event, None)
    }

    /// Wie `handle_pointer`, projiziert aber über den Strahltest des Renderers.
    pub fn handle_pointer_via(
        &mut self,
        state: &mut AppState,
        event: PointerEvent,
        caster: &dyn SurfaceRaycast,
    ) -> ToolResponse {
        self.dispatch_pointer(state, event, Some(caster))
    }

    fn dispatch_pointer(
        &mut self,
        state: &mut AppState,
        event: PointerEvent,
        caster: Option<&dyn SurfaceRaycast>,
    ) -> ToolResponse {
        let Some(tool) = self.tools.active_tool_mut() else {
            return ToolResponse::Ignored;
        };

        if event.phase == PointerPhase::Cancel {
            tool.abort_interaction();
            state.cursor = tool.cursor();
            state.request_render();
            return ToolResponse::Consumed;
        }
        if !event.is_primary() {
            return ToolResponse::Ignored;
        }

        let position = event.position;
        let response = run_tool(&mut *tool, state, caster, |tool, ctx| match event.phase {
            PointerPhase::Down => tool.on_pointer_down(position, ctx),
            PointerPhase::Move => tool.on_pointer_move(position, ctx),
            PointerPhase::Up | PointerPhase::Cancel => tool.on_pointer_up(position, ctx),
        });
        state.cursor = tool.cursor();
        if response.needs_redraw() {
            state.request_render();
        }
        response
    }

    // ── Werkzeug-Lebenszyklus ────────────────────────────────────

    /// Wechselt das aktive Werkzeug.
    ///
    /// Das bisherige Werkzeug verwirft seine offene Transaktion und gibt
    /// seine Ressourcen frei; das neue wird aktiviert.
    pub fn set_active_tool(&mut self, state: &mut AppState, id: ToolId) -> ApplyOutcome {
        if self.tools.index_of(id).is_none() {
            log::warn!("Unbekanntes Werkzeug {:?}", id);
            return ApplyOutcome::Rejected(Rejection::Unsupported);
        }
        if self.tools.active_id() == Some(id) {
            return ApplyOutcome::Nothing;
        }

        let mut outcome = ApplyOutcome::Nothing;
        if let Some(previous) = self.tools.active_tool_mut() {
            outcome = run_tool(&mut *previous, state, None, |tool, ctx| tool.cancel(ctx));
            previous.dispose();
        }
        self.tools.set_active(id);
        if let Some(tool) = self.tools.active_tool_mut() {
            run_tool(&mut *tool, state, None, |tool, ctx| tool.activate(ctx));
            state.cursor = tool.cursor();
            log::debug!("Werkzeug gewechselt: {}", tool.name());
        }
        state.request_render();
        outcome
    }

    /// Deaktiviert das aktive Werkzeug (offene Transaktion wird verworfen).
    pub fn deactivate_tool(&mut self, state: &mut AppState) -> ApplyOutcome {
        let Some(tool) = self.tools.active_tool_mut() else {
            return ApplyOutcome::Nothing;
        };
        let outcome = run_tool(&mut *tool, state, None, |tool, ctx| tool.cancel(ctx));
        tool.dispose();
        self.tools.clear_active();
        state.cursor = Default::default();
        state.request_render();
        outcome
    }

    /// Übernimmt die Transaktion des aktiven Werkzeugs.
    pub fn apply(&mut self, state: &mut AppState) -> ApplyOutcome {
        self.transact(state, |tool, ctx| tool.apply(ctx))
    }

    /// Verwirft die Transaktion des aktiven Werkzeugs.
    pub fn cancel(&mut self, state: &mut AppState) -> ApplyOutcome {
        self.transact(state, |tool, ctx| tool.cancel(ctx))
    }

    fn transact(
        &mut self,
        state: &mut AppState,
        action: impl FnOnce(&mut dyn MapTool, &mut ToolContext<'_>) -> ApplyOutcome,
    ) -> ApplyOutcome {
        let Some(tool) = self.tools.active_tool_mut() else {
            return ApplyOutcome::Nothing;
        };
        let outcome = run_tool(&mut *tool, state, None, action);
        state.cursor = tool.cursor();
        finish(state, outcome)
    }

    // ── Vektor-Editor ────────────────────────────────────────────

    /// Wechselt den Modus des aktiven Vektor-Editors.
    pub fn set_mode(&mut self, state: &mut AppState, mode: EditorMode) -> ApplyOutcome {
        self.with_editor(state, |editor, store| editor.set_mode(mode, store))
    }

    /// Beginnt die Bearbeitung der ausgewählten Entity.
    pub fn begin_edit(&mut self, state: &mut AppState) -> ApplyOutcome {
        self.with_editor(state, |editor, store| editor.begin_edit(store))
    }

    /// Löscht den ausgewählten Node.
    pub fn delete_selected_node(&mut self, state: &mut AppState) -> ApplyOutcome {
        self.with_editor(state, |editor, _| editor.delete_selected_node())
    }

    /// Löscht die ausgewählte Entity.
    pub fn delete_selected_entity(&mut self, state: &mut AppState) -> ApplyOutcome {
        self.with_editor(state, |editor, store| editor.delete_selected_entity(store))
    }

    /// Setzt die Metadaten für das nächste Übernehmen.
    pub fn set_draft_metadata(
        &mut self,
        state: &mut AppState,
        metadata: EntityMetadata,
    ) -> ApplyOutcome {
        self.with_editor(state, |editor, _| {
            editor.set_draft_metadata(metadata);
            ApplyOutcome::Nothing
        })
    }

    fn with_editor(
        &mut self,
        state: &mut AppState,
        action: impl FnOnce(&mut VectorEditor, &mut EntityStore) -> ApplyOutcome,
    ) -> ApplyOutcome {
        let Some(editor) = self
            .tools
            .active_tool_mut()
            .and_then(|tool| tool.as_vector_editor_mut())
        else {
            return ApplyOutcome::Rejected(Rejection::Unsupported);
        };
        let kind = editor.kind();
        let outcome = action(editor, state.document.store_mut(kind));
        state.cursor = editor.cursor();
        // Auswahl und Moduswechsel ändern die Hervorhebung
        state.request_render();
        finish(state, outcome)
    }

    // ── Persistenz ───────────────────────────────────────────────

    /// Dekodiert und übernimmt eine Karte.
    ///
    /// Ein aktiver Raster-Pinsel legt sein Backup für die neue Karte neu an.
    pub fn load_map(&mut self, state: &mut AppState, bytes: &[u8], sidecar: Option<&str>) -> Result<()> {
        map_io::load_map(state, bytes, sidecar)?;
        if let Some(tool) = self.tools.active_tool_mut() {
            if matches!(tool.id(), ToolId::Raster(_)) {
                tool.dispose();
                run_tool(&mut *tool, state, None, |tool, ctx| tool.activate(ctx));
            }
        }
        camera::center_on_map(state);
        Ok(())
    }

    /// Lädt die Karte über das Persistenz-Backend.
    pub fn load_map_from(
        &mut self,
        state: &mut AppState,
        backend: &mut dyn PersistenceBackend,
    ) -> Result<()> {
        let payload = backend
            .load_map_bytes()
            .context("Karte konnte nicht vom Backend gelesen werden")?;
        self.load_map(state, &payload.image, payload.info.as_deref())
    }

    /// Speichert die Karte, sofern übernommene Rasteränderungen anstehen.
    ///
    /// Gibt `false` zurück, wenn nichts zu speichern war.
    pub fn save_map_to(
        &mut self,
        state: &mut AppState,
        backend: &mut dyn PersistenceBackend,
    ) -> Result<bool> {
        let Some(encoded) = map_io::export_pending_map(state)? else {
            return Ok(false);
        };
        backend
            .save_map_bytes(&encoded)
            .context("Karte konnte nicht gespeichert werden")?;
        map_io::mark_map_saved(state);
        log::info!("Karte gespeichert ({} Bytes)", encoded.pgm.len());
        Ok(true)
    }

    /// Ersetzt die Entities einer Art durch Wire-Records.
    ///
    /// Der Editor dieser Art verliert Entwurf, Auswahl und Snapshot.
    pub fn load_entities(
        &mut self,
        state: &mut AppState,
        kind: EntityKind,
        records: &serde_json::Value,
    ) -> Result<usize> {
        let count = entities::load_entities(state, kind, records)?;
        if let Some(editor) = self.tools.vector_editor_mut(kind) {
            editor.clear_transient();
        }
        Ok(count)
    }

    /// Lädt die Entities einer Art über das Persistenz-Backend.
    pub fn load_entities_from(
        &mut self,
        state: &mut AppState,
        backend: &mut dyn PersistenceBackend,
        kind: EntityKind,
    ) -> Result<usize> {
        let records = backend
            .load_entities(kind)
            .with_context(|| format!("{}: Backend-Lesefehler", kind.label()))?;
        self.load_entities(state, kind, &records)
    }

    /// Speichert die Entities einer Art und übernimmt die Server-IDs.
    pub fn save_entities_to(
        &mut self,
        state: &mut AppState,
        backend: &mut dyn PersistenceBackend,
        kind: EntityKind,
    ) -> Result<usize> {
        let records = entities::encode_entities(state, kind)?;
        let mapping = backend
            .save_entities(kind, &records)
            .with_context(|| format!("{}: Speichern fehlgeschlagen", kind.label()))?;
        let renamed = entities::adopt_server_ids(state, kind, &mapping);
        if let Some(editor) = self.tools.vector_editor_mut(kind) {
            editor.remap_ids(&mapping);
        }
        log::info!(
            "{}: {} Entity(s) gespeichert, {} ID(s) abgeglichen",
            kind.label(),
            state.document.store(kind).len(),
            renamed
        );
        Ok(renamed)
    }

    // ── Rendering ────────────────────────────────────────────────

    /// Baut die Render-Szene aus dem aktuellen AppState.
    pub fn build_render_scene(&self, state: &AppState) -> RenderScene {
        render_scene::build(state, self.tools.active_tool())
    }

    /// Ein Durchlauf der Render-Schleife.
    ///
    /// Rendert nur bei angefordertem Neuzeichnen und verbrauchtem
    /// Frame-Budget; sonst bleibt die Anforderung für den nächsten Tick stehen.
    pub fn tick(
        &mut self,
        state: &mut AppState,
        now: Instant,
        backend: &mut dyn RenderBackend,
    ) -> bool {
        if !state.render_requested || !self.frame_limiter.should_render(now) {
            return false;
        }
        state.render_requested = false;
        let scene = self.build_render_scene(state);
        self.scene_sync.sync(&scene, backend);
        true
    }
}

/// Führt eine Werkzeug-Aktion mit passendem Kontext aus.
///
/// Ohne `caster` projiziert die Kamera des Zustands, sonst der Strahltest
/// des Render-Backends.
fn run_tool<R>(
    tool: &mut dyn MapTool,
    state: &mut AppState,
    caster: Option<&dyn SurfaceRaycast>,
    action: impl FnOnce(&mut dyn MapTool, &mut ToolContext<'_>) -> R,
) -> R {
    let AppState {
        document,
        projector,
        options,
        ..
    } = state;
    let raycast;
    let projection: &dyn ScreenProjection = match caster {
        Some(caster) => {
            raycast = RaycastProjector::new(caster).with_camera(&projector.camera);
            &raycast
        }
        None => &*projector,
    };
    let mut ctx = ToolContext {
        projection,
        document,
        options: &*options,
    };
    action(tool, &mut ctx)
}

fn finish(state: &mut AppState, outcome: ApplyOutcome) -> ApplyOutcome {
    match outcome {
        ApplyOutcome::Rejected(reason) => log::debug!("Aktion abgelehnt: {:?}", reason),
        outcome if outcome.changed_state() => state.request_render(),
        _ => {}
    }
    outcome
}
