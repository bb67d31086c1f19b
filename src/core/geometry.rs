//! Rein-mathematische 2D-Geometrie für Hit-Tests und Shape-Bearbeitung.
//!
//! Alle Funktionen arbeiten auf Weltkoordinaten (Meter) in der Kartenebene.

use glam::Vec2;

/// Schutzwert gegen Division durch Null bei horizontalen Polygon-Kanten.
const EDGE_DENOMINATOR_EPSILON: f32 = 1e-9;

/// Achsenparallele Begrenzung eines Bereichs in der Kartenebene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    /// Minimale X-Koordinate (links)
    pub min_x: f32,
    /// Minimale Y-Koordinate (unten)
    pub min_y: f32,
    /// Maximale X-Koordinate (rechts)
    pub max_x: f32,
    /// Maximale Y-Koordinate (oben)
    pub max_y: f32,
}

impl WorldBounds {
    /// Erstellt Bounds aus zwei Eckpunkten (Reihenfolge egal).
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Bounding-Box einer Punktliste (`None` bei leerer Liste).
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Self::from_corners(first, first);
        for p in points.iter().skip(1) {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    /// Prüft ob ein Punkt innerhalb liegt (inkl. Rand).
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Mittelpunkt der Bounds.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Ausdehnung in X und Y.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.max_x - self.min_x, self.max_y - self.min_y)
    }
}

/// Prüft ob ein Punkt innerhalb eines Polygons liegt (Even-Odd-Ray-Casting).
///
/// Vorab wird gegen die Bounding-Box verworfen. Polygone mit weniger als
/// 3 Punkten enthalten nie einen Punkt.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let Some(bounds) = WorldBounds::from_points(polygon) else {
        return false;
    };
    if !bounds.contains(point) {
        return false;
    }

    let mut inside = false;
    let mut previous = polygon[polygon.len() - 1];

    for &current in polygon {
        if (current.y > point.y) != (previous.y > point.y) {
            let mut denominator = previous.y - current.y;
            if denominator.abs() < EDGE_DENOMINATOR_EPSILON {
                denominator = EDGE_DENOMINATOR_EPSILON.copysign(denominator);
            }
            let x_cross = (previous.x - current.x) * (point.y - current.y) / denominator + current.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        previous = current;
    }

    inside
}

/// Nächster Punkt auf dem Segment `a`–`b` (auf das Segment geklemmt).
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Abstand eines Punkts zum Segment `a`–`b`.
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    point.distance(closest_point_on_segment(point, a, b))
}

/// Minimaler Abstand eines Punkts zu einer offenen Polylinie.
///
/// Eine Polylinie mit genau einem Punkt liefert den Punktabstand,
/// eine leere Liste `None`.
pub fn distance_to_polyline(point: Vec2, points: &[Vec2]) -> Option<f32> {
    match points {
        [] => None,
        [single] => Some(point.distance(*single)),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(point, w[0], w[1]))
            .reduce(f32::min),
    }
}

/// Findet die Kante mit dem geringsten Abstand zum Punkt.
///
/// Gibt `(start_index, abstand)` zurück. Bei `closed` wird die Schlusskante
/// (letzter → erster Punkt) mit `start_index = len - 1` berücksichtigt.
pub fn nearest_edge(point: Vec2, points: &[Vec2], closed: bool) -> Option<(usize, f32)> {
    if points.len() < 2 {
        return None;
    }
    let edge_count = if closed && points.len() >= 3 {
        points.len()
    } else {
        points.len() - 1
    };

    let mut best: Option<(usize, f32)> = None;
    for start in 0..edge_count {
        let a = points[start];
        let b = points[(start + 1) % points.len()];
        let distance = distance_to_segment(point, a, b);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((start, distance));
        }
    }
    best
}

/// Index des nächsten Punkts innerhalb von `radius` (erster bei Gleichstand).
pub fn nearest_point_within(point: Vec2, points: &[Vec2], radius: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, candidate) in points.iter().enumerate() {
        let distance = point.distance(*candidate);
        if distance <= radius && best.is_none_or(|(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Vorzeichenbehaftete Fläche eines Polygons (Shoelace, CCW positiv).
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        sum += previous.perp_dot(current);
        previous = current;
    }
    sum * 0.5
}

/// Flächenschwerpunkt eines Polygons.
///
/// Bei entarteten Polygonen (Fläche ≈ 0) wird der Mittelwert der Punkte verwendet.
pub fn centroid(polygon: &[Vec2]) -> Option<Vec2> {
    if polygon.is_empty() {
        return None;
    }
    let mean = polygon.iter().copied().sum::<Vec2>() / polygon.len() as f32;

    let area = signed_area(polygon);
    if area.abs() <= f32::EPSILON {
        return Some(mean);
    }

    let mut accumulated = Vec2::ZERO;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        let cross = previous.perp_dot(current);
        accumulated += (previous + current) * cross;
        previous = current;
    }
    Some(accumulated / (6.0 * area))
}

/// Winkel des Vektors vom Zentrum zum Zeiger (atan2, Radiant).
pub fn pointer_angle(center: Vec2, pointer: Vec2) -> f32 {
    (pointer.y - center.y).atan2(pointer.x - center.x)
}

/// Normalisiert einen Winkel auf (−π, π].
pub fn normalize_angle(angle: f32) -> f32 {
    let two_pi = std::f32::consts::TAU;
    let mut a = angle.rem_euclid(two_pi);
    if a > std::f32::consts::PI {
        a -= two_pi;
    }
    a
}
