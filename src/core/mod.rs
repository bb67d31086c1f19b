//! Core-Domänentypen: Geometrie, Kamera, Projektion, Entities, Occupancy-Grid, Transformationen.

pub mod camera;
/// Vektor-Annotationen und ihre Formregeln
pub mod entity;
pub mod entity_store;
pub mod geometry;
pub mod node_list;
pub mod occupancy;
pub mod projector;
pub mod transform;

pub use camera::{CameraProjection, MapCamera, Ray};
pub use entity::{
    EntityGeometry, EntityKind, EntityMetadata, KindConfig, ShapeKind, VectorEntity,
};
pub use entity_store::{EntityLayers, EntityStore};
pub use geometry::{
    centroid, distance_to_polyline, nearest_edge, point_in_polygon, pointer_angle, WorldBounds,
};
pub use node_list::{EditableShape, NodeHandle};
pub use occupancy::{
    CellState, MapOrigin, OccupancyGrid, OccupancyThresholds, RasterTexture, PIXEL_FREE,
    PIXEL_OCCUPIED, PIXEL_UNKNOWN,
};
pub use projector::{
    MapSurface, Projector, RaycastProjector, ScreenProjection, SurfaceRaycast, MAP_SURFACE_NAME,
};
pub use transform::{
    compose, quaternion_to_yaw, yaw_to_quaternion, LaserScan, RobotPose, Transform,
    TransformPipeline,
};
