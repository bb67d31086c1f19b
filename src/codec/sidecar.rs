//! Textuelles Karten-Sidecar (`key: value`-Zeilen).

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

use crate::core::occupancy::{
    MapOrigin, OccupancyThresholds, DEFAULT_FREE_THRESH, DEFAULT_OCCUPIED_THRESH,
};

/// Wert einer Sidecar-Zeile.
#[derive(Debug, Clone, PartialEq)]
pub enum SidecarValue {
    /// Skalar
    Number(f64),
    /// Zahlenliste `[a, b, c]`
    List(Vec<f64>),
    /// Sonstiger Text (ohne Anführungszeichen)
    Text(String),
}

impl SidecarValue {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let parsed: Result<Vec<f64>, _> = inner
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<f64>)
                .collect();
            if let Ok(values) = parsed {
                return SidecarValue::List(values);
            }
        }
        if let Ok(number) = raw.parse::<f64>() {
            return SidecarValue::Number(number);
        }
        SidecarValue::Text(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
    }

    /// Skalarer Wert, falls vorhanden.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SidecarValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

fn line_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.*?)\s*$").ok())
        .as_ref()
}

/// Zerlegt den Text in geordnete Schlüssel/Wert-Paare.
///
/// Leere Zeilen, Kommentare (`#`) und Zeilen ohne `key:` werden übersprungen.
pub fn parse_key_values(text: &str) -> IndexMap<String, SidecarValue> {
    let mut values = IndexMap::new();
    let Some(pattern) = line_pattern() else {
        return values;
    };
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default();
        if line.trim().is_empty() {
            continue;
        }
        match pattern.captures(line) {
            Some(caps) => {
                values.insert(caps[1].to_string(), SidecarValue::parse(&caps[2]));
            }
            None => log::debug!("Sidecar-Zeile ignoriert: '{}'", line.trim()),
        }
    }
    values
}

/// Metadaten einer Karte im Sidecar-Format.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSidecar {
    /// Dateiname des Bilds
    pub image: String,
    /// Meter pro Pixel
    pub resolution: f32,
    /// `[x, y, theta]` der unteren linken Ecke
    pub origin: [f32; 3],
    /// Belegt-Schwelle
    pub occupied_thresh: f32,
    /// Frei-Schwelle
    pub free_thresh: f32,
    /// Invertierte Graustufen
    pub negate: bool,
}

impl MapSidecar {
    /// Sidecar mit Standardschwellen.
    pub fn new(image: impl Into<String>, resolution: f32, origin: [f32; 3]) -> Self {
        Self {
            image: image.into(),
            resolution,
            origin,
            occupied_thresh: DEFAULT_OCCUPIED_THRESH,
            free_thresh: DEFAULT_FREE_THRESH,
            negate: false,
        }
    }

    /// Parst den Sidecar-Text.
    ///
    /// `resolution` und `origin` sind Pflicht. Ungültige Schwellen werden mit
    /// Warnung durch die Standardwerte ersetzt.
    pub fn parse(text: &str) -> Result<Self> {
        let values = parse_key_values(text);

        let resolution = values
            .get("resolution")
            .and_then(SidecarValue::as_number)
            .context("Sidecar: Feld 'resolution' fehlt")? as f32;
        if !resolution.is_finite() || resolution <= 0.0 {
            bail!("Sidecar: ungueltige Aufloesung {}", resolution);
        }

        let origin = match values.get("origin") {
            Some(SidecarValue::List(list)) if list.len() >= 2 => {
                let theta = list.get(2).copied().unwrap_or(0.0);
                [list[0] as f32, list[1] as f32, theta as f32]
            }
            Some(other) => bail!("Sidecar: ungueltiger Ursprung {:?}", other),
            None => bail!("Sidecar: Feld 'origin' fehlt"),
        };
        if origin.iter().any(|v| !v.is_finite()) {
            bail!("Sidecar: Ursprung nicht endlich {:?}", origin);
        }

        let image = match values.get("image") {
            Some(SidecarValue::Text(name)) => name.clone(),
            Some(SidecarValue::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let occupied_thresh = threshold(&values, "occupied_thresh", DEFAULT_OCCUPIED_THRESH);
        let free_thresh = threshold(&values, "free_thresh", DEFAULT_FREE_THRESH);
        let negate = values
            .get("negate")
            .and_then(SidecarValue::as_number)
            .is_some_and(|n| n != 0.0);

        Ok(Self {
            image,
            resolution,
            origin,
            occupied_thresh,
            free_thresh,
            negate,
        })
    }

    /// Ursprung als Grid-Ursprung.
    pub fn map_origin(&self) -> MapOrigin {
        MapOrigin::from_xy_theta(self.origin[0], self.origin[1], self.origin[2])
    }

    /// Klassifikationsschwellen.
    pub fn thresholds(&self) -> OccupancyThresholds {
        OccupancyThresholds {
            occupied: self.occupied_thresh,
            free: self.free_thresh,
            negate: self.negate,
        }
    }

    /// Serialisiert das Sidecar.
    pub fn to_text(&self) -> String {
        format!(
            "image: {}\nresolution: {}\norigin: [{}, {}, {}]\nnegate: {}\noccupied_thresh: {}\nfree_thresh: {}\n",
            self.image,
            self.resolution,
            self.origin[0],
            self.origin[1],
            self.origin[2],
            u8::from(self.negate),
            self.occupied_thresh,
            self.free_thresh
        )
    }
}

fn threshold(values: &IndexMap<String, SidecarValue>, key: &str, default: f32) -> f32 {
    match values.get(key) {
        None => default,
        Some(value) => match value.as_number().map(|n| n as f32) {
            Some(t) if t.is_finite() && (0.0..=1.0).contains(&t) => t,
            _ => {
                log::warn!(
                    "Sidecar: ungueltiger Wert fuer '{}' ({:?}), verwende {}",
                    key,
                    value,
                    default
                );
                default
            }
        },
    }
}
