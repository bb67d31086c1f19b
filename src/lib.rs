//! Robot Map Editor Library.
//! Editor-Kern für Roboter-Einsatzkarten als Library exportiert für Hosts, Tests und Benchmarks.

pub mod app;
pub mod codec;
pub mod core;
pub mod shared;
pub mod wire;

pub use app::{
    AppIntent, AppState, ApplyOutcome, EditorMode, MapController, MapTool, PointerEvent,
    PointerPhase, RawInput, Rejection, ToolId, ToolResponse, VectorEditor,
};
pub use codec::{decode_map_bytes, decode_pgm, encode_grid, encode_pgm, MapSidecar};
pub use core::{
    EntityKind, EntityMetadata, MapCamera, OccupancyGrid, Projector, RasterTexture,
    ScreenProjection, VectorEntity, WorldBounds,
};
pub use shared::{EditorOptions, RenderBackend, RenderScene, SceneShape, ShapeKey};
pub use wire::{MapPayload, PersistenceBackend};
