//! Use-Case-Funktionen für Kamera-Steuerung.

use glam::Vec2;

use crate::app::AppState;
use crate::core::projector::ScreenProjection;

/// Zoomt die Kamera stufenweise hinein.
pub fn zoom_in(state: &mut AppState) {
    state.projector.camera.zoom_by(state.options.camera_zoom_step);
    state.request_render();
}

/// Zoomt die Kamera stufenweise heraus.
pub fn zoom_out(state: &mut AppState) {
    state
        .projector
        .camera
        .zoom_by(1.0 / state.options.camera_zoom_step);
    state.request_render();
}

/// Verschiebt die Kamera um ein Welt-Delta.
pub fn pan(state: &mut AppState, delta: Vec2) {
    state.projector.camera.pan(delta);
    state.request_render();
}

/// Zoomt per Mausrad auf den Kartenpunkt unter dem Zeiger hin.
///
/// Der Weltpunkt unter dem Zeiger bleibt nach dem Zoom an derselben
/// Bildschirmposition. Ohne Kartentreffer wird um die Bildmitte gezoomt.
pub fn zoom_towards(state: &mut AppState, screen: Vec2, scroll_delta: f32) {
    if scroll_delta == 0.0 || !scroll_delta.is_finite() {
        return;
    }
    let step = state.options.camera_scroll_zoom_step;
    let factor = if scroll_delta > 0.0 { step } else { 1.0 / step };

    let focus_before = state.projector.screen_to_world(screen);
    state.projector.camera.zoom_by(factor);
    if let (Some(before), Some(after)) = (focus_before, state.projector.screen_to_world(screen)) {
        state.projector.camera.pan(before - after);
    }
    state.request_render();
}

/// Übernimmt eine neue Viewport-Größe.
pub fn set_viewport(state: &mut AppState, size: [f32; 2]) {
    let size = Vec2::from(size);
    if !(size.x > 0.0 && size.y > 0.0) {
        log::warn!("Ungueltige Viewport-Groesse {:?} ignoriert", size);
        return;
    }
    state.projector.camera.set_viewport(size);
    state.request_render();
}

/// Zentriert die Kamera auf die geladene Karte.
///
/// Keine Operation solange keine Karte geladen ist.
pub fn center_on_map(state: &mut AppState) {
    let Some(layer) = state.document.occupancy.as_ref() else {
        return;
    };
    let center = layer.grid.world_bounds().center();
    state.projector.camera.look_at(center);
    state.request_render();
}
