//! Vereinheitlichte Pointer-Events für Maus und Touch.

use glam::Vec2;

/// Phase eines Pointer-Events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// Taste gedrückt / Finger aufgesetzt
    Down,
    /// Bewegung
    Move,
    /// Taste losgelassen / Finger abgehoben
    Up,
    /// Geste vom System abgebrochen
    Cancel,
}

/// Auslösende Taste.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Linke Maustaste bzw. primärer Finger
    Primary,
    /// Rechte Maustaste
    Secondary,
    /// Mittlere Maustaste
    Middle,
}

/// Eingabequelle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    /// Maus
    Mouse,
    /// Touch (primärer Finger)
    Touch,
}

/// Ein vereinheitlichtes Pointer-Event in Screen-Pixeln.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Phase
    pub phase: PointerPhase,
    /// Screen-Position in Pixeln
    pub position: Vec2,
    /// Taste
    pub button: PointerButton,
    /// Quelle
    pub source: PointerSource,
}

impl PointerEvent {
    /// Primäres Maus-Event (v.a. für Tests und Host-Adapter).
    pub fn mouse(phase: PointerPhase, position: Vec2) -> Self {
        Self {
            phase,
            position,
            button: PointerButton::Primary,
            source: PointerSource::Mouse,
        }
    }

    /// Ist das Event für Werkzeuge relevant (primäre Taste)?
    pub fn is_primary(&self) -> bool {
        self.button == PointerButton::Primary
    }
}

/// Rohe Host-Eingabe vor der Vereinheitlichung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    /// Maustaste gedrückt
    MouseDown {
        /// Position
        position: Vec2,
        /// Taste
        button: PointerButton,
    },
    /// Maus bewegt
    MouseMove {
        /// Position
        position: Vec2,
    },
    /// Maustaste losgelassen
    MouseUp {
        /// Position
        position: Vec2,
        /// Taste
        button: PointerButton,
    },
    /// Finger aufgesetzt
    TouchStart {
        /// Touch-ID
        id: u64,
        /// Position
        position: Vec2,
    },
    /// Finger bewegt
    TouchMove {
        /// Touch-ID
        id: u64,
        /// Position
        position: Vec2,
    },
    /// Finger abgehoben
    TouchEnd {
        /// Touch-ID
        id: u64,
        /// Position
        position: Vec2,
    },
    /// Touch vom System abgebrochen
    TouchCancel {
        /// Touch-ID
        id: u64,
    },
    /// Mausrad
    Wheel {
        /// Position
        position: Vec2,
        /// Scroll-Delta (positiv = hinein)
        delta: f32,
    },
}

/// Übersetzt Maus- und Touch-Eingaben in `PointerEvent`s.
///
/// Bei Multitouch zählt nur der erste aufgesetzte Finger.
#[derive(Debug, Default)]
pub struct PointerTranslator {
    primary_touch: Option<u64>,
    last_position: Vec2,
}

impl PointerTranslator {
    /// Erstellt einen Translator ohne aktiven Touch.
    pub fn new() -> Self {
        Self::default()
    }

    /// ID des aktuell verfolgten Fingers.
    pub fn primary_touch(&self) -> Option<u64> {
        self.primary_touch
    }

    /// Übersetzt eine Roh-Eingabe. `None` für ignorierte Eingaben und Mausrad.
    pub fn translate(&mut self, input: RawInput) -> Option<PointerEvent> {
        let event = match input {
            RawInput::MouseDown { position, button } => {
                mouse(PointerPhase::Down, position, button)
            }
            RawInput::MouseMove { position } => {
                mouse(PointerPhase::Move, position, PointerButton::Primary)
            }
            RawInput::MouseUp { position, button } => mouse(PointerPhase::Up, position, button),
            RawInput::TouchStart { id, position } => {
                if self.primary_touch.is_some() {
                    return None;
                }
                self.primary_touch = Some(id);
                touch(PointerPhase::Down, position)
            }
            RawInput::TouchMove { id, position } => {
                if self.primary_touch != Some(id) {
                    return None;
                }
                touch(PointerPhase::Move, position)
            }
            RawInput::TouchEnd { id, position } => {
                if self.primary_touch != Some(id) {
                    return None;
                }
                self.primary_touch = None;
                touch(PointerPhase::Up, position)
            }
            RawInput::TouchCancel { id } => {
                if self.primary_touch != Some(id) {
                    return None;
                }
                self.primary_touch = None;
                touch(PointerPhase::Cancel, self.last_position)
            }
            RawInput::Wheel { .. } => return None,
        };
        self.last_position = event.position;
        Some(event)
    }
}

fn mouse(phase: PointerPhase, position: Vec2, button: PointerButton) -> PointerEvent {
    PointerEvent {
        phase,
        position,
        button,
        source: PointerSource::Mouse,
    }
}

fn touch(phase: PointerPhase, position: Vec2) -> PointerEvent {
    PointerEvent {
        phase,
        position,
        button: PointerButton::Primary,
        source: PointerSource::Touch,
    }
}
