//! Generischer Vektor-Editor für alle Entity-Arten.
//!
//! Eine Instanz pro Art, parametrisiert über `KindConfig`:
//! **Create** hängt Punkte an den Entwurf, **Select** wählt per Treffertest,
//! **Edit** verschiebt Nodes, fügt auf Kanten ein und dreht orientierte Punkte.
//! Übernehmen und Verwerfen sind Transaktionen über einen Snapshot.
//!
//! Aufgeteilt in:
//! - `state` : Struct, Modus, Transaktionen (apply/cancel/delete)
//! - `modes` : Pointer-Verhalten je Modus und Treffertests
//! - `lifecycle`: MapTool-Implementierung und Overlay

mod lifecycle;
pub(crate) mod modes;
mod state;

pub use state::{EditorMode, VectorEditor};

#[cfg(test)]
mod tests;
