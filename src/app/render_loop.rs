//! Ratenbegrenzte Render-Schleife: Frame-Limiter und Szenen-Abgleich.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::shared::{RenderBackend, RenderScene, SceneShape, ShapeKey};

/// Lässt höchstens einen Frame pro Intervall zu.
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    interval: Duration,
    last_frame: Option<Instant>,
}

impl FrameLimiter {
    /// Erstellt einen Limiter mit festem Ziel-Intervall.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_frame: None,
        }
    }

    /// Ziel-Intervall.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ist das Budget seit dem letzten Frame verbraucht?
    ///
    /// Bei `true` gilt `now` als Zeitpunkt des neuen Frames.
    pub fn should_render(&mut self, now: Instant) -> bool {
        match self.last_frame {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_frame = Some(now);
                true
            }
        }
    }
}

/// Gleicht die Render-Szene mit dem Backend ab.
///
/// Merkt sich die zuletzt übergebenen Formen und schickt nur Differenzen.
#[derive(Debug, Clone, Default)]
pub struct SceneSync {
    shown: HashMap<ShapeKey, SceneShape>,
}

impl SceneSync {
    /// Leerer Abgleich.
    pub fn new() -> Self {
        Self::default()
    }

    /// Anzahl der im Backend angezeigten Formen.
    pub fn shown_count(&self) -> usize {
        self.shown.len()
    }

    /// Überträgt die Szene. Gibt zurück, ob sich etwas geändert hat.
    pub fn sync(&mut self, scene: &RenderScene, backend: &mut dyn RenderBackend) -> bool {
        let mut changed = false;
        let mut next = HashMap::with_capacity(scene.shapes.len());

        for (key, shape) in &scene.shapes {
            if self.shown.get(key) != Some(shape) {
                backend.add_shape(*key, shape);
                changed = true;
            }
            next.insert(*key, shape.clone());
        }

        for key in self.shown.keys() {
            if !next.contains_key(key) {
                backend.remove_shape(*key);
                changed = true;
            }
        }

        self.shown = next;
        if changed {
            backend.request_redraw();
        }
        changed
    }

    /// Vergisst den Abgleich (z.B. nach Backend-Neustart).
    pub fn reset(&mut self) {
        self.shown.clear();
    }
}
