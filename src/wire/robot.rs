//! Roboter-Nachrichten: TF-Transformationen und Laserscans.

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::core::transform::{LaserScan, Transform};

/// 3D-Vektor einer Nachricht.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct VectorMsg {
    /// X
    #[serde(default)]
    pub x: f64,
    /// Y
    #[serde(default)]
    pub y: f64,
    /// Z
    #[serde(default)]
    pub z: f64,
}

/// Quaternion einer Nachricht.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuaternionMsg {
    /// X
    #[serde(default)]
    pub x: f64,
    /// Y
    #[serde(default)]
    pub y: f64,
    /// Z
    #[serde(default)]
    pub z: f64,
    /// W
    #[serde(default = "one")]
    pub w: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for QuaternionMsg {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// Translation + Rotation.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TransformMsg {
    /// Translation
    #[serde(default)]
    pub translation: VectorMsg,
    /// Rotation
    #[serde(default)]
    pub rotation: QuaternionMsg,
}

impl TransformMsg {
    /// In eine Core-Transformation umwandeln (ohne Gültigkeitsprüfung).
    pub fn to_transform(&self) -> Transform {
        let t = self.translation;
        let r = self.rotation;
        Transform::new(
            Vec3::new(t.x as f32, t.y as f32, t.z as f32),
            Quat::from_xyzw(r.x as f32, r.y as f32, r.z as f32, r.w as f32),
        )
    }
}

/// Header mit Eltern-Frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderMsg {
    /// Eltern-Frame
    #[serde(default)]
    pub frame_id: String,
}

/// Eine Transformation mit Frames.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformStampedMsg {
    /// Header (Eltern-Frame)
    #[serde(default)]
    pub header: HeaderMsg,
    /// Kind-Frame
    pub child_frame_id: String,
    /// Transformation
    pub transform: TransformMsg,
}

/// TF-Nachricht mit beliebig vielen Transformationen.
#[derive(Debug, Clone, Deserialize)]
pub struct TfMessage {
    /// Transformationen
    pub transforms: Vec<TransformStampedMsg>,
}

/// Glied der Transform-Kette, das eine Nachricht aktualisiert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLink {
    /// map → odom
    MapToOdom,
    /// odom → base
    OdomToBase,
    /// base → laser (Montage des Scanners)
    LaserToBase,
}

const BASE_FRAMES: [&str; 2] = ["base_link", "base_footprint"];
const LASER_FRAMES: [&str; 4] = ["laser", "laser_link", "base_laser", "base_scan"];

impl FrameLink {
    /// Ordnet ein Frame-Paar einem Kettenglied zu.
    pub fn classify(parent: &str, child: &str) -> Option<Self> {
        let parent = parent.trim_start_matches('/');
        let child = child.trim_start_matches('/');
        match (parent, child) {
            ("map", "odom") => Some(FrameLink::MapToOdom),
            ("odom", c) if BASE_FRAMES.contains(&c) => Some(FrameLink::OdomToBase),
            (p, c) if BASE_FRAMES.contains(&p) && LASER_FRAMES.contains(&c) => {
                Some(FrameLink::LaserToBase)
            }
            _ => None,
        }
    }
}

impl TfMessage {
    /// Parst eine TF-Nachricht.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("TF-Nachricht ungueltig")
    }

    /// Bekannte Kettenglieder mit ihren Transformationen.
    pub fn links(&self) -> Vec<(FrameLink, Transform)> {
        self.transforms
            .iter()
            .filter_map(|t| {
                let link = FrameLink::classify(&t.header.frame_id, &t.child_frame_id);
                if link.is_none() {
                    log::trace!(
                        "TF {} → {} ignoriert",
                        t.header.frame_id,
                        t.child_frame_id
                    );
                }
                link.map(|l| (l, t.transform.to_transform()))
            })
            .collect()
    }
}

/// Laserscan-Nachricht. `null` in `ranges` gilt als ungültige Messung.
#[derive(Debug, Clone, Deserialize)]
pub struct LaserScanMsg {
    /// Winkel des ersten Strahls
    pub angle_min: f32,
    /// Winkelabstand
    pub angle_increment: f32,
    /// Minimale Distanz
    #[serde(default)]
    pub range_min: f32,
    /// Maximale Distanz
    #[serde(default)]
    pub range_max: f32,
    /// Distanzen
    pub ranges: Vec<Option<f32>>,
}

impl LaserScanMsg {
    /// Parst eine Scan-Nachricht.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Laserscan-Nachricht ungueltig")
    }

    /// In einen Core-Scan umwandeln.
    pub fn to_scan(&self) -> LaserScan {
        LaserScan {
            angle_min: self.angle_min,
            angle_increment: self.angle_increment,
            range_min: self.range_min,
            range_max: self.range_max,
            ranges: self
                .ranges
                .iter()
                .map(|r| r.unwrap_or(f32::NAN))
                .collect(),
        }
    }
}
