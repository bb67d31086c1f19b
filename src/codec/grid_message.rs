//! Dekodieren und Kodieren der Karten-Nachrichten.
//!
//! Unterstützte Varianten (per Form erkannt, nicht per Typfeld):
//! - Grid-Objekt mit flachem `data`-Array (`info{...}` oder flache Felder)
//! - Umschlag mit Sidecar-Text in `info` und PGM-Bytes in `map_data`
//! - PGM allein (optional mit Sidecar-Text)

use anyhow::{bail, Context, Result};
use glam::{Quat, Vec3};
use serde_json::{Map, Value};

use super::pgm::{decode_pgm, encode_pgm, looks_like_pgm, PgmImage};
use super::sidecar::{parse_key_values, MapSidecar, SidecarValue};
use crate::core::occupancy::{
    CellState, MapOrigin, OccupancyGrid, OccupancyThresholds, RasterTexture, CELL_UNKNOWN,
};

/// Ergebnis eines erfolgreichen Dekodierens.
#[derive(Debug, Clone)]
pub struct DecodedMap {
    /// Belegungskarte
    pub grid: OccupancyGrid,
    /// Anzeige-Raster
    pub texture: RasterTexture,
    /// Bildname aus dem Sidecar (leer wenn unbekannt)
    pub image_name: String,
}

/// Kodierte Karte für die Persistenz.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMap {
    /// PGM-Bytes
    pub pgm: Vec<u8>,
    /// Sidecar-Text
    pub sidecar: String,
}

/// Dekodiert Kartenbytes beliebiger unterstützter Form.
///
/// `sidecar` wird nur für ein nacktes PGM verwendet; fehlt es, gilt `fallback`.
pub fn decode_map_bytes(
    bytes: &[u8],
    sidecar: Option<&str>,
    fallback: &MapSidecar,
) -> Result<DecodedMap> {
    if looks_like_pgm(bytes) {
        let sidecar = match sidecar {
            Some(text) => MapSidecar::parse(text).context("Sidecar zum PGM ungueltig")?,
            None => {
                log::info!(
                    "PGM ohne Sidecar, verwende Aufloesung {}",
                    fallback.resolution
                );
                fallback.clone()
            }
        };
        let image = decode_pgm(bytes)?;
        return decoded_from_pgm(&image, &sidecar, None);
    }

    let value: Value = serde_json::from_slice(bytes)
        .context("Kartendaten sind weder PGM noch JSON")?;
    decode_map_value(&value)
}

/// Dekodiert eine bereits geparste JSON-Nachricht.
pub fn decode_map_value(value: &Value) -> Result<DecodedMap> {
    let object = value
        .as_object()
        .context("Kartennachricht ist kein JSON-Objekt")?;

    if object.contains_key("data") {
        decode_grid_object(object)
    } else if object.contains_key("map_data") {
        decode_envelope(object)
    } else {
        bail!("Unbekannte Kartennachricht: weder 'data' noch 'map_data' vorhanden")
    }
}

fn decode_grid_object(object: &Map<String, Value>) -> Result<DecodedMap> {
    let info = match object.get("info") {
        Some(Value::Object(info)) => info,
        Some(_) => bail!("Feld 'info' ist kein Objekt"),
        None => object,
    };

    let width = required_dimension(info, "width")?;
    let height = required_dimension(info, "height")?;
    let resolution = required_positive(info, "resolution")?;
    let origin = parse_origin(info.get("origin"))?;

    let data = object
        .get("data")
        .and_then(Value::as_array)
        .context("Feld 'data' ist kein Array")?;
    let expected = width as usize * height as usize;
    if data.len() != expected {
        bail!(
            "Zellanzahl {} passt nicht zu {}x{} (erwartet {})",
            data.len(),
            width,
            height,
            expected
        );
    }

    // Nicht-ganzzahlige Einträge verwerfen die Karte, Werte außerhalb
    // -1..=100 werden als unbekannt übernommen.
    let mut out_of_range = 0usize;
    let cells = data
        .iter()
        .enumerate()
        .map(|(index, v)| match v.as_i64() {
            Some(c) if (-1..=100).contains(&c) => Ok(c as i16),
            Some(_) => {
                out_of_range += 1;
                Ok(CELL_UNKNOWN)
            }
            None => bail!("Zelle {} ist keine ganze Zahl: {}", index, v),
        })
        .collect::<Result<Vec<i16>>>()?;
    if out_of_range > 0 {
        log::warn!(
            "{} Zellwerte ausserhalb -1..=100 als unbekannt uebernommen",
            out_of_range
        );
    }

    let grid = OccupancyGrid::new(width, height, resolution, origin, cells)?;
    let texture = RasterTexture::from_grid(&grid);
    log::info!(
        "Karte dekodiert (Grid): {}x{} @ {} m",
        width,
        height,
        resolution
    );
    Ok(DecodedMap {
        grid,
        texture,
        image_name: String::new(),
    })
}

fn decode_envelope(object: &Map<String, Value>) -> Result<DecodedMap> {
    let info_text = match object.get("info") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(_)) => {
            let bytes = byte_array(object.get("info"), "info")?;
            String::from_utf8(bytes).context("Feld 'info' ist kein UTF-8")?
        }
        Some(_) => bail!("Feld 'info' hat ein unbekanntes Format"),
        None => bail!("Feld 'info' fehlt"),
    };
    let sidecar = MapSidecar::parse(&info_text)?;

    let pgm_bytes = byte_array(object.get("map_data"), "map_data")?;
    let image = decode_pgm(&pgm_bytes).context("Feld 'map_data' ist kein gueltiges PGM")?;

    // Optionale Dimensionen im Sidecar müssen zum Bild passen
    let values = parse_key_values(&info_text);
    let declared = |key: &str| values.get(key).and_then(SidecarValue::as_number);
    if let (Some(w), Some(h)) = (declared("width"), declared("height")) {
        if w != f64::from(image.width) || h != f64::from(image.height) {
            bail!(
                "Groesse im Sidecar {}x{} passt nicht zum Bild {}x{}",
                w,
                h,
                image.width,
                image.height
            );
        }
    }

    decoded_from_pgm(&image, &sidecar, Some(sidecar.image.clone()))
}

fn decoded_from_pgm(
    image: &PgmImage,
    sidecar: &MapSidecar,
    image_name: Option<String>,
) -> Result<DecodedMap> {
    let grid = grid_from_pgm(
        image,
        sidecar.resolution,
        sidecar.map_origin(),
        &sidecar.thresholds(),
    )?;
    let texture = RasterTexture::from_grid(&grid);
    let (unknown, free, occupied) = grid.state_counts();
    log::info!(
        "Karte dekodiert (PGM): {}x{} @ {} m, belegt {}, frei {}, unbekannt {}",
        grid.width,
        grid.height,
        grid.resolution,
        occupied,
        free,
        unknown
    );
    Ok(DecodedMap {
        grid,
        texture,
        image_name: image_name.unwrap_or_else(|| sidecar.image.clone()),
    })
}

/// Klassifiziert PGM-Pixel (Zeile 0 oben) in Grid-Zellen (Zeile 0 unten).
pub fn grid_from_pgm(
    image: &PgmImage,
    resolution: f32,
    origin: MapOrigin,
    thresholds: &OccupancyThresholds,
) -> Result<OccupancyGrid> {
    let width = image.width as usize;
    let height = image.height as usize;
    if width == 0 || height == 0 || image.pixels.len() != width * height {
        bail!(
            "PGM-Bild {}x{} mit {} Pixeln ist inkonsistent",
            image.width,
            image.height,
            image.pixels.len()
        );
    }
    let mut cells = vec![CELL_UNKNOWN; width * height];
    for (row, line) in image.pixels.chunks_exact(width).enumerate() {
        let y = height - 1 - row;
        for (x, &value) in line.iter().enumerate() {
            cells[y * width + x] = CellState::from_pixel(value, thresholds).to_cell();
        }
    }
    OccupancyGrid::new(image.width, image.height, resolution, origin, cells)
}

/// Kodiert ein Grid als PGM + Sidecar (kanonische Pixelwerte).
pub fn encode_grid(grid: &OccupancyGrid, image_name: &str) -> Result<EncodedMap> {
    let width = grid.width as usize;
    let height = grid.height as usize;
    let mut pixels = Vec::with_capacity(width * height);
    for row in 0..height {
        let y = height - 1 - row;
        let line = &grid.cells[y * width..(y + 1) * width];
        pixels.extend(line.iter().map(|&c| CellState::from_cell(c).to_pixel()));
    }

    let pgm = encode_pgm(grid.width, grid.height, &pixels, "robot-map-editor")?;
    let sidecar = MapSidecar::new(image_name, grid.resolution, grid.origin.to_xy_theta());
    Ok(EncodedMap {
        pgm,
        sidecar: sidecar.to_text(),
    })
}

fn number(info: &Map<String, Value>, key: &str) -> Result<f64> {
    info.get(key)
        .and_then(Value::as_f64)
        .with_context(|| format!("Feld '{}' fehlt oder ist keine Zahl", key))
}

fn required_dimension(info: &Map<String, Value>, key: &str) -> Result<u32> {
    let value = number(info, key)?;
    if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        bail!("Ungueltiger Wert fuer '{}': {}", key, value);
    }
    Ok(value as u32)
}

fn required_positive(info: &Map<String, Value>, key: &str) -> Result<f32> {
    let value = number(info, key)? as f32;
    if !value.is_finite() || value <= 0.0 {
        bail!("Ungueltiger Wert fuer '{}': {}", key, value);
    }
    Ok(value)
}

fn parse_origin(value: Option<&Value>) -> Result<MapOrigin> {
    let Some(value) = value else {
        log::warn!("Kartennachricht ohne Ursprung, verwende (0, 0, 0)");
        return Ok(MapOrigin::default());
    };
    let origin = value.as_object().context("Feld 'origin' ist kein Objekt")?;

    let component = |obj: &Map<String, Value>, key: &str, default: f64| -> f32 {
        obj.get(key).and_then(Value::as_f64).unwrap_or(default) as f32
    };

    let position = match origin.get("position").and_then(Value::as_object) {
        Some(p) => Vec3::new(
            component(p, "x", 0.0),
            component(p, "y", 0.0),
            component(p, "z", 0.0),
        ),
        None => bail!("Feld 'origin.position' fehlt"),
    };
    let orientation = match origin.get("orientation").and_then(Value::as_object) {
        Some(q) => Quat::from_xyzw(
            component(q, "x", 0.0),
            component(q, "y", 0.0),
            component(q, "z", 0.0),
            component(q, "w", 1.0),
        ),
        None => Quat::IDENTITY,
    };
    if !position.is_finite() || !orientation.is_finite() {
        bail!("Ursprung nicht endlich");
    }
    let orientation = if orientation.length_squared() > f32::EPSILON {
        orientation.normalize()
    } else {
        Quat::IDENTITY
    };
    Ok(MapOrigin {
        position,
        orientation,
    })
}

fn byte_array(value: Option<&Value>, key: &str) -> Result<Vec<u8>> {
    let array = value
        .and_then(Value::as_array)
        .with_context(|| format!("Feld '{}' ist kein Byte-Array", key))?;
    array
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .with_context(|| format!("Feld '{}': Eintrag {} ist kein Byte", key, i))
        })
        .collect()
}
