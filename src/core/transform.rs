//! Starrkörper-Transformationen, Quaternion↔Yaw und Laserscan-Projektion.
//!
//! Die Roboter-Pose wird nie gespeichert, sondern immer aus der aktuellen
//! Transform-Kette `map → odom → base` abgeleitet.

use glam::{Quat, Vec3};

/// Obergrenze für projizierte Scan-Koordinaten (Meter), darüber wird verworfen.
pub const DEFAULT_SCAN_MAGNITUDE_LIMIT: f32 = 1.0e4;

/// Starrkörper-Transformation (Translation + Rotation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation in Metern
    pub translation: Vec3,
    /// Rotation als Einheits-Quaternion
    pub rotation: Quat,
}

impl Transform {
    /// Identität (keine Verschiebung, keine Rotation).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Erstellt eine Transformation aus Translation und Rotation.
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Planare Transformation aus einer 2D-Pose.
    pub fn from_pose(pose: RobotPose) -> Self {
        Self {
            translation: Vec3::new(pose.x, pose.y, 0.0),
            rotation: yaw_to_quaternion(pose.theta),
        }
    }

    /// Wendet die Transformation auf einen Punkt an.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Prüft ob alle Komponenten endlich sind.
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Verkettet zwei Transformationen: erst `child`, dann `parent`.
pub fn compose(parent: &Transform, child: &Transform) -> Transform {
    Transform {
        translation: parent.rotation * child.translation + parent.translation,
        rotation: parent.rotation * child.rotation,
    }
}

/// Extrahiert den Gierwinkel (Rotation um Z) aus einem Quaternion.
///
/// Nicht-endliche Komponenten werden abgelehnt (Warnung, Rückgabe 0.0).
pub fn quaternion_to_yaw(q: Quat) -> f32 {
    if !q.is_finite() {
        log::warn!("Quaternion mit ungueltigen Komponenten ignoriert: {:?}", q);
        return 0.0;
    }
    let siny_cosp = 2.0 * (q.w * q.z + q.x * q.y);
    let cosy_cosp = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
    siny_cosp.atan2(cosy_cosp)
}

/// Planare Rotation als Quaternion (nur um Z).
pub fn yaw_to_quaternion(theta: f32) -> Quat {
    let half = theta * 0.5;
    Quat::from_xyzw(0.0, 0.0, half.sin(), half.cos())
}

/// Roboter-Pose in Kartenkoordinaten.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RobotPose {
    /// X-Position (Meter)
    pub x: f32,
    /// Y-Position (Meter)
    pub y: f32,
    /// Gierwinkel (Radiant)
    pub theta: f32,
}

impl RobotPose {
    /// Leitet die Pose aus einer Transformation ab.
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            x: transform.translation.x,
            y: transform.translation.y,
            theta: quaternion_to_yaw(transform.rotation),
        }
    }
}

/// Ein Laserscan-Frame.
#[derive(Debug, Clone, Default)]
pub struct LaserScan {
    /// Winkel des ersten Strahls (Radiant)
    pub angle_min: f32,
    /// Winkelabstand zwischen zwei Strahlen (Radiant)
    pub angle_increment: f32,
    /// Minimale gültige Distanz (≤ 0 = keine Untergrenze)
    pub range_min: f32,
    /// Maximale gültige Distanz (≤ 0 = keine Obergrenze)
    pub range_max: f32,
    /// Gemessene Distanzen in Metern
    pub ranges: Vec<f32>,
}

impl LaserScan {
    fn accepts(&self, range: f32) -> bool {
        if !range.is_finite() || range <= 0.0 {
            return false;
        }
        if self.range_min > 0.0 && range < self.range_min {
            return false;
        }
        if self.range_max > 0.0 && range > self.range_max {
            return false;
        }
        true
    }
}

/// Hält die letzte bekannte Transform-Kette und leitet Pose und Scan-Wolke ab.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    map_to_odom: Option<Transform>,
    odom_to_base: Option<Transform>,
    laser_to_base: Transform,
    /// Z-Höhe der Scan-Punkte im Laser-Frame
    pub scan_height: f32,
    /// Betragsgrenze für projizierte Koordinaten
    pub magnitude_limit: f32,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformPipeline {
    /// Erstellt eine leere Pipeline (Laser sitzt im Ursprung der Basis).
    pub fn new() -> Self {
        Self {
            map_to_odom: None,
            odom_to_base: None,
            laser_to_base: Transform::IDENTITY,
            scan_height: 0.0,
            magnitude_limit: DEFAULT_SCAN_MAGNITUDE_LIMIT,
        }
    }

    /// Setzt `map → odom`. Nicht-endliche Transformationen werden verworfen.
    pub fn set_map_to_odom(&mut self, transform: Transform) -> bool {
        Self::store_checked(&mut self.map_to_odom, transform, "map→odom")
    }

    /// Setzt `odom → base`. Nicht-endliche Transformationen werden verworfen.
    pub fn set_odom_to_base(&mut self, transform: Transform) -> bool {
        Self::store_checked(&mut self.odom_to_base, transform, "odom→base")
    }

    /// Setzt die Montage-Transformation des Laserscanners.
    pub fn set_laser_to_base(&mut self, transform: Transform) -> bool {
        if !transform.is_finite() {
            log::warn!("Ungueltige laser→base-Transformation verworfen");
            return false;
        }
        self.laser_to_base = transform;
        true
    }

    fn store_checked(slot: &mut Option<Transform>, transform: Transform, label: &str) -> bool {
        if !transform.is_finite() {
            log::warn!("Ungueltige {}-Transformation verworfen", label);
            return false;
        }
        *slot = Some(transform);
        true
    }

    /// Transformation `map → base`, sofern beide Teilstücke bekannt sind.
    pub fn map_to_base(&self) -> Option<Transform> {
        let map_to_odom = self.map_to_odom.as_ref()?;
        let odom_to_base = self.odom_to_base.as_ref()?;
        Some(compose(map_to_odom, odom_to_base))
    }

    /// Aktuelle Roboter-Pose, sofern die Kette vollständig ist.
    pub fn robot_pose(&self) -> Option<RobotPose> {
        self.map_to_base().map(|t| RobotPose::from_transform(&t))
    }

    /// Projiziert einen Scan in Kartenkoordinaten.
    ///
    /// Ungültige Distanzen und nicht-endliche oder zu große Ergebnisse
    /// werden einzeln verworfen. `None` solange keine Pose bekannt ist.
    pub fn project_scan(&self, scan: &LaserScan) -> Option<Vec<Vec3>> {
        let pose = self.robot_pose()?;
        let sensor = compose(&Transform::from_pose(pose), &self.laser_to_base);

        let mut cloud = Vec::with_capacity(scan.ranges.len());
        let mut dropped = 0usize;
        for (i, &range) in scan.ranges.iter().enumerate() {
            if !scan.accepts(range) {
                continue;
            }
            let angle = scan.angle_min + i as f32 * scan.angle_increment;
            let local = Vec3::new(range * angle.cos(), range * angle.sin(), self.scan_height);
            let world = sensor.transform_point(local);
            if !world.is_finite() || world.abs().max_element() > self.magnitude_limit {
                dropped += 1;
                continue;
            }
            cloud.push(world);
        }

        if dropped > 0 {
            log::debug!("{} Scan-Punkte ausserhalb der Grenzen verworfen", dropped);
        }
        Some(cloud)
    }
}
