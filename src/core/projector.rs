//! Screen ↔ Welt-Projektion gegen die Kartenebene.

use glam::{Vec2, Vec3};

use super::camera::MapCamera;
use super::geometry::WorldBounds;

/// Name der Kartenfläche im Render-Backend.
pub const MAP_SURFACE_NAME: &str = "map";

/// Screen-Koordinate → Punkt auf der Kartenebene (und zurück).
///
/// `None` heißt immer: kein Treffer. Aufrufer behandeln das als No-Op.
pub trait ScreenProjection {
    /// Screen-Pixel → Weltpunkt auf der Karte.
    fn screen_to_world(&self, screen: Vec2) -> Option<Vec2>;

    /// Weltpunkt → Screen-Pixel (darf approximativ sein).
    fn world_to_screen(&self, _world: Vec2) -> Option<Vec2> {
        None
    }
}

/// Strahltest gegen eine benannte Fläche der Szene.
pub trait SurfaceRaycast {
    /// Schnittpunkt des Strahls durch `screen` mit der Fläche `surface`.
    fn cast_ray(&self, screen: Vec2, surface: &str) -> Option<Vec3>;
}

/// Geladene Kartenfläche: Höhe der Ebene und (optional) ihre Ausdehnung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSurface {
    /// Z-Höhe der Kartenebene
    pub height: f32,
    /// Endliche Ausdehnung, falls bekannt
    pub bounds: Option<WorldBounds>,
}

/// Kamerabasierte Projektion.
#[derive(Debug, Clone)]
pub struct Projector {
    /// Kamera
    pub camera: MapCamera,
    surface: Option<MapSurface>,
}

impl Projector {
    /// Projektor ohne geladene Karte (alle Anfragen liefern `None`).
    pub fn new(camera: MapCamera) -> Self {
        Self {
            camera,
            surface: None,
        }
    }

    /// Setzt oder entfernt die Kartenfläche.
    pub fn set_surface(&mut self, surface: Option<MapSurface>) {
        self.surface = surface;
    }

    /// Aktuelle Kartenfläche.
    pub fn surface(&self) -> Option<&MapSurface> {
        self.surface.as_ref()
    }

    /// Ist eine Karte geladen?
    pub fn has_map(&self) -> bool {
        self.surface.is_some()
    }
}

impl ScreenProjection for Projector {
    fn screen_to_world(&self, screen: Vec2) -> Option<Vec2> {
        let surface = self.surface.as_ref()?;
        let hit = self
            .camera
            .screen_ray(screen)?
            .intersect_plane_z(surface.height)?
            .truncate();
        match surface.bounds {
            Some(bounds) if !bounds.contains(hit) => None,
            _ => Some(hit),
        }
    }

    fn world_to_screen(&self, world: Vec2) -> Option<Vec2> {
        let height = self.surface.as_ref().map(|s| s.height).unwrap_or(0.0);
        self.camera.project(world.extend(height))
    }
}

/// Projektion über den Strahltest des Render-Backends.
pub struct RaycastProjector<'a> {
    caster: &'a dyn SurfaceRaycast,
    surface_name: &'a str,
    camera: Option<&'a MapCamera>,
}

impl<'a> RaycastProjector<'a> {
    /// Strahltest gegen die Standard-Kartenfläche.
    pub fn new(caster: &'a dyn SurfaceRaycast) -> Self {
        Self {
            caster,
            surface_name: MAP_SURFACE_NAME,
            camera: None,
        }
    }

    /// Andere Zielfläche.
    pub fn with_surface(mut self, surface_name: &'a str) -> Self {
        self.surface_name = surface_name;
        self
    }

    /// Kamera für die Rückprojektion.
    pub fn with_camera(mut self, camera: &'a MapCamera) -> Self {
        self.camera = Some(camera);
        self
    }
}

impl ScreenProjection for RaycastProjector<'_> {
    fn screen_to_world(&self, screen: Vec2) -> Option<Vec2> {
        let hit = self.caster.cast_ray(screen, self.surface_name)?;
        hit.is_finite().then(|| hit.truncate())
    }

    fn world_to_screen(&self, world: Vec2) -> Option<Vec2> {
        self.camera?.project(world.extend(0.0))
    }
}
