//! Occupancy-Grid, Zellklassifikation und die daraus abgeleitete Raster-Textur.
//!
//! Konvention (Dekodierung und Kodierung identisch):
//! Pixelwert 0 = belegt (schwarz), 254 = frei, 205 = unbekannt.
//! Zellen sind zeilenweise gespeichert, Zeile 0 liegt am Karten-Ursprung (unten).
//! Die Textur ist bildorientiert, Zeile 0 ist die oberste Bildzeile.

use anyhow::{bail, Result};
use glam::{Quat, Vec2, Vec3};
use image::{Rgba, RgbaImage};

use super::geometry::WorldBounds;
use super::transform::{quaternion_to_yaw, yaw_to_quaternion};

/// Zellwert für unbekannte Zellen.
pub const CELL_UNKNOWN: i16 = -1;
/// Zellwert für freie Zellen.
pub const CELL_FREE: i16 = 0;
/// Zellwert für sicher belegte Zellen.
pub const CELL_OCCUPIED: i16 = 100;
/// Ab diesem Zellwert gilt eine Zelle als belegt.
pub const OCCUPIED_CELL_MIN: i16 = 50;

/// Pixelwert für belegte Zellen.
pub const PIXEL_OCCUPIED: u8 = 0;
/// Pixelwert für freie Zellen.
pub const PIXEL_FREE: u8 = 254;
/// Pixelwert für unbekannte Zellen (Mittelgrau-Sentinel).
pub const PIXEL_UNKNOWN: u8 = 205;

/// Standard-Schwelle für "belegt" (Belegungswahrscheinlichkeit).
pub const DEFAULT_OCCUPIED_THRESH: f32 = 0.65;
/// Standard-Schwelle für "frei" (Belegungswahrscheinlichkeit).
pub const DEFAULT_FREE_THRESH: f32 = 0.196;

/// Dreiwertige Klassifikation einer Zelle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    /// Nicht kartiert
    Unknown,
    /// Befahrbar
    Free,
    /// Hindernis
    Occupied,
}

impl CellState {
    /// Klassifiziert einen Zellwert (−1 / 0..49 / 50..100).
    pub fn from_cell(value: i16) -> Self {
        if value < 0 {
            CellState::Unknown
        } else if value >= OCCUPIED_CELL_MIN {
            CellState::Occupied
        } else {
            CellState::Free
        }
    }

    /// Kanonischer Zellwert dieses Zustands.
    pub fn to_cell(self) -> i16 {
        match self {
            CellState::Unknown => CELL_UNKNOWN,
            CellState::Free => CELL_FREE,
            CellState::Occupied => CELL_OCCUPIED,
        }
    }

    /// Klassifiziert einen Graustufen-Pixelwert anhand der Schwellen.
    pub fn from_pixel(value: u8, thresholds: &OccupancyThresholds) -> Self {
        if value == PIXEL_UNKNOWN {
            return CellState::Unknown;
        }
        let v = f32::from(value) / 255.0;
        let occupancy = if thresholds.negate { v } else { 1.0 - v };
        if occupancy > thresholds.occupied {
            CellState::Occupied
        } else if occupancy < thresholds.free {
            CellState::Free
        } else {
            CellState::Unknown
        }
    }

    /// Kanonischer Pixelwert dieses Zustands.
    pub fn to_pixel(self) -> u8 {
        match self {
            CellState::Unknown => PIXEL_UNKNOWN,
            CellState::Free => PIXEL_FREE,
            CellState::Occupied => PIXEL_OCCUPIED,
        }
    }
}

/// Schwellen für die Pixel-Klassifikation (aus dem Karten-Sidecar).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyThresholds {
    /// Wahrscheinlichkeit, ab der eine Zelle belegt ist
    pub occupied: f32,
    /// Wahrscheinlichkeit, unter der eine Zelle frei ist
    pub free: f32,
    /// Invertierte Graustufen (weiß = belegt)
    pub negate: bool,
}

impl Default for OccupancyThresholds {
    fn default() -> Self {
        Self {
            occupied: DEFAULT_OCCUPIED_THRESH,
            free: DEFAULT_FREE_THRESH,
            negate: false,
        }
    }
}

/// Lage des Karten-Ursprungs (untere linke Zellecke) in Weltkoordinaten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapOrigin {
    /// Position des Ursprungs
    pub position: Vec3,
    /// Orientierung des Grids
    pub orientation: Quat,
}

impl MapOrigin {
    /// Ursprung aus `[x, y, theta]` (Sidecar-Format).
    pub fn from_xy_theta(x: f32, y: f32, theta: f32) -> Self {
        Self {
            position: Vec3::new(x, y, 0.0),
            orientation: yaw_to_quaternion(theta),
        }
    }

    /// Gierwinkel des Grids.
    pub fn yaw(&self) -> f32 {
        quaternion_to_yaw(self.orientation)
    }

    /// Flaches `[x, y, theta]` für das Sidecar.
    pub fn to_xy_theta(&self) -> [f32; 3] {
        [self.position.x, self.position.y, self.yaw()]
    }
}

impl Default for MapOrigin {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

/// Probabilistische Belegungskarte.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    /// Breite in Zellen
    pub width: u32,
    /// Höhe in Zellen
    pub height: u32,
    /// Kantenlänge einer Zelle in Metern
    pub resolution: f32,
    /// Ursprung des Grids
    pub origin: MapOrigin,
    /// Zellwerte, Zeile 0 unten
    pub cells: Vec<i16>,
}

impl OccupancyGrid {
    /// Erstellt ein Grid und prüft Dimensionen, Auflösung und Zellanzahl.
    pub fn new(
        width: u32,
        height: u32,
        resolution: f32,
        origin: MapOrigin,
        cells: Vec<i16>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Ungueltige Kartengroesse {}x{}", width, height);
        }
        if !resolution.is_finite() || resolution <= 0.0 {
            bail!("Ungueltige Aufloesung: {}", resolution);
        }
        if !origin.position.is_finite() || !origin.orientation.is_finite() {
            bail!("Ungueltiger Karten-Ursprung");
        }
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            bail!(
                "Zellanzahl {} passt nicht zu {}x{} (erwartet {})",
                cells.len(),
                width,
                height,
                expected
            );
        }
        Ok(Self {
            width,
            height,
            resolution,
            origin,
            cells,
        })
    }

    /// Erstellt ein vollständig unbekanntes Grid.
    pub fn unknown(width: u32, height: u32, resolution: f32, origin: MapOrigin) -> Result<Self> {
        let cells = vec![CELL_UNKNOWN; width as usize * height as usize];
        Self::new(width, height, resolution, origin, cells)
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Zellwert an (x, y), Zeile 0 unten.
    pub fn cell(&self, x: u32, y: u32) -> Option<i16> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Klassifikation der Zelle an (x, y).
    pub fn cell_state(&self, x: u32, y: u32) -> Option<CellState> {
        self.cell(x, y).map(CellState::from_cell)
    }

    /// Setzt einen Zellwert. `false` außerhalb des Grids.
    pub fn set_cell(&mut self, x: u32, y: u32, value: i16) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Wandelt einen Weltpunkt in den Grid-lokalen Punkt (Meter, ohne Rotation).
    fn world_to_local(&self, world: Vec2) -> Vec2 {
        let offset = world - self.origin.position.truncate();
        let yaw = self.origin.yaw();
        if yaw == 0.0 {
            offset
        } else {
            Vec2::from_angle(-yaw).rotate(offset)
        }
    }

    /// Weltposition der Zellmitte (x, y).
    pub fn cell_center(&self, x: u32, y: u32) -> Vec2 {
        let local = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * self.resolution;
        let yaw = self.origin.yaw();
        let rotated = if yaw == 0.0 {
            local
        } else {
            Vec2::from_angle(yaw).rotate(local)
        };
        rotated + self.origin.position.truncate()
    }

    /// Zelle unter einem Weltpunkt (`None` außerhalb).
    pub fn world_to_cell(&self, world: Vec2) -> Option<(u32, u32)> {
        let local = self.world_to_local(world) / self.resolution;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (x, y) = (local.x.floor() as u32, local.y.floor() as u32);
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Ausdehnung der Karte in Weltkoordinaten (achsenparallel um alle Ecken).
    pub fn world_bounds(&self) -> WorldBounds {
        let w = self.width as f32 * self.resolution;
        let h = self.height as f32 * self.resolution;
        let yaw = self.origin.yaw();
        let origin = self.origin.position.truncate();
        let rotation = Vec2::from_angle(yaw);
        let corners = [
            Vec2::ZERO,
            Vec2::new(w, 0.0),
            Vec2::new(w, h),
            Vec2::new(0.0, h),
        ]
        .map(|c| rotation.rotate(c) + origin);
        WorldBounds::from_points(&corners).unwrap_or(WorldBounds::from_corners(origin, origin))
    }

    /// Anzahl Zellen je Klassifikation `(unbekannt, frei, belegt)`.
    pub fn state_counts(&self) -> (usize, usize, usize) {
        self.cells
            .iter()
            .fold((0, 0, 0), |(u, f, o), &c| match CellState::from_cell(c) {
                CellState::Unknown => (u + 1, f, o),
                CellState::Free => (u, f + 1, o),
                CellState::Occupied => (u, f, o + 1),
            })
    }
}

/// RGBA-Darstellung des Grids für die Anzeige (Zeile 0 = oben).
///
/// Raster-Werkzeuge schreiben direkt hier hinein; erst beim Übernehmen werden
/// die Pixel in die Zellen zurückgeführt.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterTexture {
    image: RgbaImage,
    revision: u64,
}

impl RasterTexture {
    /// Materialisiert die Textur aus den Zellen.
    pub fn from_grid(grid: &OccupancyGrid) -> Self {
        let mut image = RgbaImage::new(grid.width, grid.height);
        for y in 0..grid.height {
            let row = grid.height - 1 - y;
            for x in 0..grid.width {
                let state = grid.cell_state(x, y).unwrap_or(CellState::Unknown);
                image.put_pixel(x, row, gray(state.to_pixel()));
            }
        }
        Self { image, revision: 0 }
    }

    /// Erstellt eine Textur direkt aus Graustufen in Bildreihenfolge.
    pub fn from_gray_rows(width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            bail!(
                "Pixelanzahl {} passt nicht zu {}x{}",
                pixels.len(),
                width,
                height
            );
        }
        let image = RgbaImage::from_fn(width, height, |x, y| {
            gray(pixels[y as usize * width as usize + x as usize])
        });
        Ok(Self { image, revision: 0 })
    }

    /// Breite in Pixeln.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Höhe in Pixeln.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Änderungszähler für den Renderer (Re-Upload bei Änderung).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Markiert die Textur als geändert.
    pub fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Graustufenwert an Pixel (x, y).
    pub fn gray_at(&self, x: u32, y: u32) -> Option<u8> {
        (x < self.width() && y < self.height()).then(|| self.image.get_pixel(x, y).0[0])
    }

    /// Setzt einen Graustufenwert. Pixel außerhalb werden ignoriert.
    pub fn set_gray(&mut self, x: i64, y: i64, value: u8) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width()) || y >= i64::from(self.height()) {
            return false;
        }
        self.image.put_pixel(x as u32, y as u32, gray(value));
        true
    }

    /// Roher RGBA-Puffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Überschreibt den gesamten Puffer byteweise (Backup-Wiederherstellung).
    pub fn restore_bytes(&mut self, backup: &[u8]) -> Result<()> {
        let target: &mut [u8] = &mut self.image;
        if target.len() != backup.len() {
            bail!(
                "Backup-Groesse {} passt nicht zur Textur ({})",
                backup.len(),
                target.len()
            );
        }
        target.copy_from_slice(backup);
        self.touch();
        Ok(())
    }

    /// Pixelkoordinate (Bildreihenfolge) unter einem Weltpunkt.
    pub fn world_to_pixel(&self, grid: &OccupancyGrid, world: Vec2) -> Option<(i64, i64)> {
        let local = grid.world_to_local(world) / grid.resolution;
        if !local.is_finite() {
            return None;
        }
        let x = local.x.floor() as i64;
        let row = local.y.floor() as i64;
        Some((x, i64::from(grid.height) - 1 - row))
    }

    /// Graustufen in Bildreihenfolge (für den PGM-Export).
    pub fn gray_rows(&self) -> Vec<u8> {
        self.image.pixels().map(|p| p.0[0]).collect()
    }

    /// Führt die Pixel in die Zellen zurück (nur für übernommene Striche).
    ///
    /// Unveränderte Zellen behalten ihren Originalwert; nur Zellen, deren
    /// Klassifikation vom Pixel abweicht, erhalten den kanonischen Wert.
    pub fn reconcile_into(&self, grid: &mut OccupancyGrid) -> Result<usize> {
        if grid.width != self.width() || grid.height != self.height() {
            bail!(
                "Textur {}x{} passt nicht zum Grid {}x{}",
                self.width(),
                self.height(),
                grid.width,
                grid.height
            );
        }
        let thresholds = OccupancyThresholds::default();
        let mut changed = 0;
        for (x, row, pixel) in self.image.enumerate_pixels() {
            let y = grid.height - 1 - row;
            let state = CellState::from_pixel(pixel.0[0], &thresholds);
            let current = grid.cell(x, y).map(CellState::from_cell);
            if current != Some(state) {
                grid.set_cell(x, y, state.to_cell());
                changed += 1;
            }
        }
        Ok(changed)
    }
}

fn gray(value: u8) -> Rgba<u8> {
    Rgba([value, value, value, 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_2x2() -> OccupancyGrid {
        // Zeile 0 (unten): belegt, frei; Zeile 1 (oben): unbekannt, 30
        OccupancyGrid::new(2, 2, 0.5, MapOrigin::default(), vec![100, 0, -1, 30]).unwrap()
    }

    #[test]
    fn cell_classification_boundaries() {
        assert_eq!(CellState::from_cell(-1), CellState::Unknown);
        assert_eq!(CellState::from_cell(0), CellState::Free);
        assert_eq!(CellState::from_cell(49), CellState::Free);
        assert_eq!(CellState::from_cell(50), CellState::Occupied);
        assert_eq!(CellState::from_cell(100), CellState::Occupied);
    }

    #[test]
    fn pixel_classification_uses_fixed_convention() {
        let t = OccupancyThresholds::default();
        assert_eq!(CellState::from_pixel(0, &t), CellState::Occupied);
        assert_eq!(CellState::from_pixel(254, &t), CellState::Free);
        assert_eq!(CellState::from_pixel(255, &t), CellState::Free);
        assert_eq!(CellState::from_pixel(205, &t), CellState::Unknown);
        // Mittelgrau zwischen den Schwellen
        assert_eq!(CellState::from_pixel(128, &t), CellState::Unknown);

        for state in [CellState::Unknown, CellState::Free, CellState::Occupied] {
            assert_eq!(CellState::from_pixel(state.to_pixel(), &t), state);
        }
    }

    #[test]
    fn negate_inverts_pixel_meaning() {
        let t = OccupancyThresholds {
            negate: true,
            ..Default::default()
        };
        assert_eq!(CellState::from_pixel(0, &t), CellState::Free);
        assert_eq!(CellState::from_pixel(254, &t), CellState::Occupied);
    }

    #[test]
    fn grid_rejects_invalid_dimensions() {
        assert!(OccupancyGrid::new(0, 2, 0.05, MapOrigin::default(), vec![]).is_err());
        assert!(OccupancyGrid::new(2, 2, 0.0, MapOrigin::default(), vec![0; 4]).is_err());
        assert!(OccupancyGrid::new(2, 2, f32::NAN, MapOrigin::default(), vec![0; 4]).is_err());
        assert!(OccupancyGrid::new(2, 2, 0.05, MapOrigin::default(), vec![0; 3]).is_err());
    }

    #[test]
    fn texture_flips_rows() {
        let grid = grid_2x2();
        let texture = RasterTexture::from_grid(&grid);
        // Oberste Bildzeile = Grid-Zeile 1
        assert_eq!(texture.gray_at(0, 0), Some(PIXEL_UNKNOWN));
        assert_eq!(texture.gray_at(1, 0), Some(PIXEL_FREE));
        assert_eq!(texture.gray_at(0, 1), Some(PIXEL_OCCUPIED));
        assert_eq!(texture.gray_at(1, 1), Some(PIXEL_FREE));
    }

    #[test]
    fn reconcile_keeps_untouched_cells_verbatim() {
        let mut grid = grid_2x2();
        let mut texture = RasterTexture::from_grid(&grid);
        // Unbekannte Zelle oben links als Wand malen
        texture.set_gray(0, 0, PIXEL_OCCUPIED);

        let changed = texture.reconcile_into(&mut grid).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(grid.cell(0, 1), Some(CELL_OCCUPIED));
        // Zelle mit Wert 30 ist weiterhin frei klassifiziert und bleibt unverändert
        assert_eq!(grid.cell(1, 1), Some(30));
    }

    #[test]
    fn restore_bytes_is_exact() {
        let grid = grid_2x2();
        let mut texture = RasterTexture::from_grid(&grid);
        let backup = texture.as_bytes().to_vec();
        texture.set_gray(1, 1, PIXEL_OCCUPIED);
        assert_ne!(texture.as_bytes(), backup.as_slice());

        texture.restore_bytes(&backup).unwrap();
        assert_eq!(texture.as_bytes(), backup.as_slice());
        assert!(texture.restore_bytes(&backup[..4]).is_err());
    }

    #[test]
    fn world_cell_mapping_with_offset_origin() {
        let grid = OccupancyGrid::unknown(
            10,
            5,
            0.1,
            MapOrigin::from_xy_theta(-1.0, -0.5, 0.0),
        )
        .unwrap();
        assert_eq!(grid.world_to_cell(Vec2::new(-0.95, -0.45)), Some((0, 0)));
        assert_eq!(grid.world_to_cell(Vec2::new(-0.05, -0.05)), Some((9, 4)));
        assert_eq!(grid.world_to_cell(Vec2::new(0.05, 0.0)), None);

        let center = grid.cell_center(9, 4);
        assert_relative_eq!(center.x, -0.05, epsilon = 1e-5);
        assert_relative_eq!(center.y, -0.05, epsilon = 1e-5);

        let bounds = grid.world_bounds();
        assert_relative_eq!(bounds.min_x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(bounds.max_y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn world_to_pixel_flips_rows() {
        let grid = OccupancyGrid::unknown(4, 4, 1.0, MapOrigin::default()).unwrap();
        let texture = RasterTexture::from_grid(&grid);
        assert_eq!(texture.world_to_pixel(&grid, Vec2::new(0.5, 0.5)), Some((0, 3)));
        assert_eq!(texture.world_to_pixel(&grid, Vec2::new(3.5, 3.5)), Some((3, 0)));
    }

    #[test]
    fn state_counts_sum_up() {
        let (unknown, free, occupied) = grid_2x2().state_counts();
        assert_eq!((unknown, free, occupied), (1, 2, 1));
    }
}
