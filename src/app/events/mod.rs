//! AppIntent und Pointer-Events für den Eingabe-Datenfluss.

mod intent;
mod pointer;

pub use intent::AppIntent;
pub use pointer::{
    PointerButton, PointerEvent, PointerPhase, PointerSource, PointerTranslator, RawInput,
};
