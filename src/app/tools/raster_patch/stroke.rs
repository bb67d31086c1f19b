//! Rasterisierung von Pinselstrichen auf die Kartentextur.

use crate::core::occupancy::RasterTexture;

/// Pixelkoordinate in Bildreihenfolge (darf außerhalb liegen).
pub(crate) type Pixel = (i64, i64);

/// Stempelt eine Kreisscheibe. Gibt die Anzahl geschriebener Pixel zurück.
pub(crate) fn stamp_disc(texture: &mut RasterTexture, center: Pixel, radius: u32, value: u8) -> usize {
    let r = i64::from(radius);
    let r_sq = r * r;
    let mut written = 0;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r_sq {
                continue;
            }
            if texture.set_gray(center.0 + dx, center.1 + dy, value) {
                written += 1;
            }
        }
    }
    written
}

/// Zeichnet eine Linie und stempelt an jedem Pixel die Scheibe.
pub(crate) fn stroke_line(
    texture: &mut RasterTexture,
    from: Pixel,
    to: Pixel,
    radius: u32,
    value: u8,
) -> usize {
    line_pixels(from, to)
        .into_iter()
        .map(|pixel| stamp_disc(texture, pixel, radius, value))
        .sum()
}

/// Pixel entlang einer Bresenham-Linie, beide Enden eingeschlossen.
pub(crate) fn line_pixels(from: Pixel, to: Pixel) -> Vec<Pixel> {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let step_x = if x < to.0 { 1 } else { -1 };
    let step_y = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut pixels = Vec::with_capacity((dx - dy) as usize + 1);

    loop {
        pixels.push((x, y));
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += step_x;
        }
        if e2 <= dx {
            err += dx;
            y += step_y;
        }
    }
    pixels
}
