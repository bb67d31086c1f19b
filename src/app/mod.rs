//! Application-Layer: Controller, State, Events, Werkzeuge und Use-Cases.

pub mod controller;
pub mod events;
pub mod render_loop;
pub mod render_scene;
/// Application State
///
/// Dieses Modul verwaltet den Zustand der Anwendung (Dokument, Kamera, Roboter).
pub mod state;
pub mod tools;
pub mod use_cases;

pub use controller::MapController;
pub use events::{AppIntent, PointerEvent, PointerPhase, PointerTranslator, RawInput};
pub use render_loop::{FrameLimiter, SceneSync};
pub use render_scene::build as build_render_scene;
pub use state::{AppState, MapDocument, OccupancyLayer, RobotView};
pub use tools::vector_editor::{EditorMode, VectorEditor};
pub use tools::{ApplyOutcome, CursorIcon, MapTool, Rejection, ToolId, ToolManager, ToolResponse};
