//! Binäres Graustufenbild (PGM, Magic `P5`).

use anyhow::{bail, Context, Result};

/// Magic-Token eines binären PGM.
pub const PGM_MAGIC: &str = "P5";

/// Geparster PGM-Header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgmHeader {
    /// Breite in Pixeln
    pub width: u32,
    /// Höhe in Pixeln
    pub height: u32,
    /// Maximaler Grauwert
    pub max_value: u16,
    /// Byte-Offset des ersten Pixels
    pub data_offset: usize,
}

impl PgmHeader {
    /// Erwartete Pixelanzahl.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Dekodiertes PGM: Graustufen in Bildreihenfolge (Zeile 0 oben).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgmImage {
    /// Breite in Pixeln
    pub width: u32,
    /// Höhe in Pixeln
    pub height: u32,
    /// Genau `width * height` Grauwerte
    pub pixels: Vec<u8>,
}

/// Beginnt der Puffer wie ein binäres PGM?
pub fn looks_like_pgm(bytes: &[u8]) -> bool {
    let trimmed = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| &bytes[start..])
        .unwrap_or_default();
    trimmed.starts_with(PGM_MAGIC.as_bytes())
}

/// Liest den Header zeilenweise.
///
/// Kommentarzeilen (`#`) werden übersprungen. Die Pixeldaten beginnen direkt
/// nach dem Zeilenumbruch der Zeile, die das vierte Token enthält.
pub fn parse_header(bytes: &[u8]) -> Result<PgmHeader> {
    let mut tokens: Vec<String> = Vec::with_capacity(4);
    let mut cursor = 0usize;

    while tokens.len() < 4 {
        if cursor >= bytes.len() {
            bail!("PGM-Header unvollstaendig ({} von 4 Feldern)", tokens.len());
        }
        let line_end = bytes[cursor..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| cursor + p);
        let line = &bytes[cursor..line_end.unwrap_or(bytes.len())];
        cursor = line_end.map(|p| p + 1).unwrap_or(bytes.len());

        let text = std::str::from_utf8(line).context("PGM-Header ist kein ASCII")?;
        let text = text.trim();
        if text.starts_with('#') {
            continue;
        }
        for token in text.split_whitespace() {
            if token.starts_with('#') {
                break;
            }
            tokens.push(token.to_string());
            if tokens.len() == 4 {
                break;
            }
        }
    }

    if tokens[0] != PGM_MAGIC {
        bail!("Kein binaeres PGM (Magic '{}')", tokens[0]);
    }
    let width: u32 = tokens[1]
        .parse()
        .with_context(|| format!("Ungueltige PGM-Breite '{}'", tokens[1]))?;
    let height: u32 = tokens[2]
        .parse()
        .with_context(|| format!("Ungueltige PGM-Hoehe '{}'", tokens[2]))?;
    let max_value: u16 = tokens[3]
        .parse()
        .with_context(|| format!("Ungueltiger PGM-Maximalwert '{}'", tokens[3]))?;

    if width == 0 || height == 0 {
        bail!("Ungueltige PGM-Groesse {}x{}", width, height);
    }
    if max_value == 0 || max_value > 255 {
        bail!("Nur 8-Bit-PGM unterstuetzt (Maximalwert {})", max_value);
    }

    Ok(PgmHeader {
        width,
        height,
        max_value,
        data_offset: cursor,
    })
}

/// Dekodiert ein binäres PGM.
///
/// Zu wenige Pixel → Fehler. Überzählige Bytes werden mit Warnung abgeschnitten.
pub fn decode_pgm(bytes: &[u8]) -> Result<PgmImage> {
    let header = parse_header(bytes)?;
    let data = &bytes[header.data_offset..];
    let expected = header.pixel_count();

    if data.len() < expected {
        bail!(
            "PGM-Pixeldaten zu kurz: {} Bytes, erwartet {} ({}x{})",
            data.len(),
            expected,
            header.width,
            header.height
        );
    }
    if data.len() > expected {
        log::warn!(
            "PGM enthaelt {} ueberzaehlige Bytes, werden ignoriert",
            data.len() - expected
        );
    }

    let mut pixels = data[..expected].to_vec();
    if header.max_value != 255 {
        let scale = 255.0 / f32::from(header.max_value);
        for p in &mut pixels {
            *p = (f32::from(*p) * scale).round().min(255.0) as u8;
        }
    }

    log::debug!("PGM dekodiert: {}x{}", header.width, header.height);
    Ok(PgmImage {
        width: header.width,
        height: header.height,
        pixels,
    })
}

/// Kodiert Graustufen (Bildreihenfolge) als binäres PGM mit Kommentarzeile.
pub fn encode_pgm(width: u32, height: u32, pixels: &[u8], comment: &str) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize;
    if width == 0 || height == 0 || pixels.len() != expected {
        bail!(
            "PGM-Kodierung: {} Pixel passen nicht zu {}x{}",
            pixels.len(),
            width,
            height
        );
    }
    let comment = comment.replace(['\n', '\r'], " ");
    let header = format!("{PGM_MAGIC}\n# {comment}\n{width} {height}\n255\n");
    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(pixels);
    Ok(out)
}
