//! Kartenkamera mit Perspektiv- oder Orthoprojektion, Pan, Zoom und Strahlberechnung.

use glam::{Mat4, Vec2, Vec3};

/// Projektionsart der Kamera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraProjection {
    /// Perspektive mit vertikalem Öffnungswinkel (Radiant)
    Perspective {
        /// Vertikaler Öffnungswinkel
        fov_y: f32,
    },
    /// Orthoprojektion mit halber sichtbarer Höhe (Welt-Einheiten)
    Orthographic {
        /// Halbe sichtbare Höhe
        half_height: f32,
    },
}

/// Strahl im Weltraum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Startpunkt
    pub origin: Vec3,
    /// Normierte Richtung
    pub direction: Vec3,
}

impl Ray {
    /// Minimale Z-Komponente der Richtung, unterhalb gilt der Strahl als parallel.
    pub const PARALLEL_EPSILON: f32 = 1e-6;

    /// Schnittpunkt mit der horizontalen Ebene `z = height`.
    ///
    /// `None` bei (nahezu) parallelem Strahl oder Schnitt hinter dem Startpunkt.
    pub fn intersect_plane_z(&self, height: f32) -> Option<Vec3> {
        if self.direction.z.abs() < Self::PARALLEL_EPSILON {
            return None;
        }
        let t = (height - self.origin.z) / self.direction.z;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        Some(self.origin + self.direction * t)
    }
}

/// 3D-Kamera über der Kartenebene.
#[derive(Debug, Clone)]
pub struct MapCamera {
    /// Kameraposition
    pub eye: Vec3,
    /// Blickziel
    pub target: Vec3,
    /// Up-Vektor
    pub up: Vec3,
    /// Projektionsart
    pub projection: CameraProjection,
    /// Near-Plane
    pub near: f32,
    /// Far-Plane
    pub far: f32,
    /// Viewport-Größe in Pixeln
    pub viewport: Vec2,
}

impl MapCamera {
    /// Standard-Öffnungswinkel (60°).
    pub const DEFAULT_FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
    /// Minimaler Abstand Kamera ↔ Ziel bzw. minimale Halbhöhe.
    pub const ZOOM_MIN_EXTENT: f32 = 0.5;
    /// Maximaler Abstand Kamera ↔ Ziel bzw. maximale Halbhöhe.
    pub const ZOOM_MAX_EXTENT: f32 = 500.0;

    /// Perspektivkamera senkrecht über `center` in Höhe `height`.
    pub fn top_down(center: Vec2, height: f32, viewport: Vec2) -> Self {
        Self {
            eye: center.extend(height),
            target: center.extend(0.0),
            up: Vec3::Y,
            projection: CameraProjection::Perspective {
                fov_y: Self::DEFAULT_FOV_Y,
            },
            near: 0.05,
            far: 1000.0,
            viewport,
        }
    }

    /// Orthokamera senkrecht über `center` mit halber sichtbarer Höhe.
    pub fn top_down_orthographic(center: Vec2, half_height: f32, viewport: Vec2) -> Self {
        Self {
            eye: center.extend(100.0),
            target: center.extend(0.0),
            up: Vec3::Y,
            projection: CameraProjection::Orthographic { half_height },
            near: 0.05,
            far: 1000.0,
            viewport,
        }
    }

    /// Seitenverhältnis des Viewports (mindestens 1 Pixel pro Achse).
    pub fn aspect(&self) -> f32 {
        self.viewport.x.max(1.0) / self.viewport.y.max(1.0)
    }

    /// View-Matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Projektionsmatrix (Tiefe 0..1).
    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = self.aspect();
        match self.projection {
            CameraProjection::Perspective { fov_y } => {
                Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            CameraProjection::Orthographic { half_height } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Kombinierte View-Projection-Matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Screen-Pixel → NDC (Y nach oben).
    pub fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        let size = self.viewport.max(Vec2::ONE);
        Vec2::new(screen.x / size.x * 2.0 - 1.0, 1.0 - screen.y / size.y * 2.0)
    }

    /// Strahl durch den Screen-Punkt (zwischen Near- und Far-Plane).
    pub fn screen_ray(&self, screen: Vec2) -> Option<Ray> {
        let ndc = self.screen_to_ndc(screen);
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let direction = (far - near).try_normalize()?;
        near.is_finite().then_some(Ray {
            origin: near,
            direction,
        })
    }

    /// Weltpunkt → Screen-Pixel. `None` hinter der Kamera.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let size = self.viewport.max(Vec2::ONE);
        let screen = Vec2::new(
            (ndc.x + 1.0) * 0.5 * size.x,
            (1.0 - ndc.y) * 0.5 * size.y,
        );
        screen.is_finite().then_some(screen)
    }

    /// Verschiebt Kamera und Ziel parallel zur Kartenebene.
    pub fn pan(&mut self, delta: Vec2) {
        let offset = delta.extend(0.0);
        self.eye += offset;
        self.target += offset;
    }

    /// Zentriert die Kamera auf einen Kartenpunkt.
    pub fn look_at(&mut self, center: Vec2) {
        let delta = center - self.target.truncate();
        self.pan(delta);
    }

    /// Zoomt um `factor` (> 1 = näher heran).
    pub fn zoom_by(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        match &mut self.projection {
            CameraProjection::Perspective { .. } => {
                let offset = self.eye - self.target;
                let distance = (offset.length() / factor)
                    .clamp(Self::ZOOM_MIN_EXTENT, Self::ZOOM_MAX_EXTENT);
                if let Some(dir) = offset.try_normalize() {
                    self.eye = self.target + dir * distance;
                }
            }
            CameraProjection::Orthographic { half_height } => {
                *half_height =
                    (*half_height / factor).clamp(Self::ZOOM_MIN_EXTENT, Self::ZOOM_MAX_EXTENT);
            }
        }
    }

    /// Setzt die Viewport-Größe.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Welt-Einheiten pro Screen-Pixel auf Höhe des Blickziels.
    pub fn world_per_pixel(&self) -> f32 {
        let visible_height = match self.projection {
            CameraProjection::Perspective { fov_y } => {
                2.0 * (self.eye - self.target).length() * (fov_y * 0.5).tan()
            }
            CameraProjection::Orthographic { half_height } => 2.0 * half_height,
        };
        visible_height / self.viewport.y.max(1.0)
    }
}
