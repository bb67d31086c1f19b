//! Wire-Records der Vektor-Entities.
//!
//! Zonen und Wände: `{ID, Properties: "{\"Points\": [x0, y0, x1, y1, ...]}"}`.
//! Positionen und Marker: `{ID, Name, Type, Properties: "{\"Position\": [x, y, z],
//! \"Orientation\": [x, y, z, w]}"}`.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use glam::{Quat, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::entity::{EntityKind, EntityMetadata, ShapeKind, VectorEntity};

/// Record einer Zone oder Wand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// Entity-ID
    #[serde(rename = "ID")]
    pub id: u64,
    /// JSON-kodierte Eigenschaften
    #[serde(rename = "Properties")]
    pub properties: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ShapeProperties {
    #[serde(rename = "Points")]
    points: Vec<f64>,
}

/// Record einer Position oder eines Markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedPointRecord {
    /// Entity-ID
    #[serde(rename = "ID")]
    pub id: u64,
    /// Anzeigename
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Freier Typ
    #[serde(rename = "Type", default)]
    pub entity_type: String,
    /// JSON-kodierte Eigenschaften
    #[serde(rename = "Properties")]
    pub properties: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrientedProperties {
    #[serde(rename = "Position")]
    position: [f64; 3],
    #[serde(rename = "Orientation")]
    orientation: [f64; 4],
    #[serde(rename = "ArucoId", default, skip_serializing_if = "Option::is_none")]
    aruco_id: Option<u32>,
}

/// Dekodiert einen Zonen-/Wand-Record.
///
/// Die Mindestpunktanzahl wird nicht geprüft. Solche Entities werden
/// übernommen, aber nicht als geschlossene Form dargestellt.
pub fn decode_shape_record(kind: EntityKind, record: &ShapeRecord) -> Result<VectorEntity> {
    let props: ShapeProperties = serde_json::from_str(&record.properties)
        .with_context(|| format!("Properties von ID {} ungueltig", record.id))?;
    if props.points.len() % 2 != 0 {
        bail!(
            "ID {}: ungerade Koordinatenanzahl ({})",
            record.id,
            props.points.len()
        );
    }
    let points: Vec<Vec2> = props
        .points
        .chunks_exact(2)
        .map(|c| Vec2::new(c[0] as f32, c[1] as f32))
        .collect();
    if points.iter().any(|p| !p.is_finite()) {
        bail!("ID {}: Koordinaten nicht endlich", record.id);
    }
    Ok(VectorEntity::new(record.id, kind, points))
}

/// Dekodiert einen Positions-/Marker-Record.
pub fn decode_oriented_record(
    kind: EntityKind,
    record: &OrientedPointRecord,
) -> Result<VectorEntity> {
    let props: OrientedProperties = serde_json::from_str(&record.properties)
        .with_context(|| format!("Properties von ID {} ungueltig", record.id))?;
    let [x, y, z] = props.position.map(|v| v as f32);
    let [qx, qy, qz, qw] = props.orientation.map(|v| v as f32);
    let orientation = Quat::from_xyzw(qx, qy, qz, qw);
    if !(x.is_finite() && y.is_finite() && z.is_finite()) || !orientation.is_finite() {
        bail!("ID {}: Pose nicht endlich", record.id);
    }
    if orientation.length_squared() <= f32::EPSILON {
        bail!("ID {}: Orientierung ist kein gueltiges Quaternion", record.id);
    }

    Ok(VectorEntity {
        id: record.id,
        kind,
        points: vec![Vec2::new(x, y)],
        orientation: Some(orientation.normalize()),
        metadata: EntityMetadata {
            name: record.name.clone(),
            entity_type: record.entity_type.clone(),
            aruco_id: props.aruco_id,
            z_offset: z,
        },
    })
}

/// Dekodiert eine komplette Liste.
///
/// Ein fehlerhafter Eintrag oder eine doppelte ID verwirft die ganze Liste.
pub fn decode_entity_list(kind: EntityKind, value: &Value) -> Result<Vec<VectorEntity>> {
    let items = value
        .as_array()
        .with_context(|| format!("{}: Liste erwartet", kind.label()))?;

    let entities = items
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<VectorEntity> {
            let entity = match kind.shape() {
                ShapeKind::OrientedPoint => {
                    let record: OrientedPointRecord = serde_json::from_value(item.clone())
                        .with_context(|| format!("Eintrag {} ist kein Punkt-Record", index))?;
                    decode_oriented_record(kind, &record)?
                }
                ShapeKind::Polygon | ShapeKind::Polyline => {
                    let record: ShapeRecord = serde_json::from_value(item.clone())
                        .with_context(|| format!("Eintrag {} ist kein Form-Record", index))?;
                    decode_shape_record(kind, &record)?
                }
            };
            Ok(entity)
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("{}: Liste verworfen", kind.label()))?;

    let mut seen = HashSet::with_capacity(entities.len());
    for entity in &entities {
        if !seen.insert(entity.id) {
            bail!("{}: ID {} mehrfach vorhanden, Liste verworfen", kind.label(), entity.id);
        }
    }
    Ok(entities)
}

/// Kodiert eine Entity als Wire-Record.
pub fn encode_entity(entity: &VectorEntity) -> Result<Value> {
    let value = match entity.kind.shape() {
        ShapeKind::OrientedPoint => {
            let position = entity.points.first().copied().unwrap_or(Vec2::ZERO);
            let q = entity.orientation.unwrap_or(Quat::IDENTITY);
            let props = OrientedProperties {
                position: [
                    f64::from(position.x),
                    f64::from(position.y),
                    f64::from(entity.metadata.z_offset),
                ],
                orientation: [q.x, q.y, q.z, q.w].map(f64::from),
                aruco_id: entity.metadata.aruco_id,
            };
            serde_json::to_value(OrientedPointRecord {
                id: entity.id,
                name: entity.metadata.name.clone(),
                entity_type: entity.metadata.entity_type.clone(),
                properties: serde_json::to_string(&props)?,
            })?
        }
        ShapeKind::Polygon | ShapeKind::Polyline => {
            let props = ShapeProperties {
                points: entity
                    .points
                    .iter()
                    .flat_map(|p| [f64::from(p.x), f64::from(p.y)])
                    .collect(),
            };
            serde_json::to_value(ShapeRecord {
                id: entity.id,
                properties: serde_json::to_string(&props)?,
            })?
        }
    };
    Ok(value)
}

/// Kodiert eine Liste von Entities.
pub fn encode_entity_list<'a>(
    entities: impl IntoIterator<Item = &'a VectorEntity>,
) -> Result<Value> {
    let records = entities
        .into_iter()
        .map(encode_entity)
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(records))
}
