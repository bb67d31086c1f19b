use approx::assert_relative_eq;
use glam::{Quat, Vec2};
use robot_map_editor::codec::{decode_map_bytes, encode_grid, MapSidecar};
use robot_map_editor::core::{
    point_in_polygon, quaternion_to_yaw, yaw_to_quaternion, CellState, EntityKind, EntityStore,
};
use robot_map_editor::wire::{decode_entity_list, encode_entity_list};
use serde_json::json;

fn fallback() -> MapSidecar {
    MapSidecar::new("", 0.05, [0.0; 3])
}

/// Zustände in Pixelreihenfolge (Bildzeile 0 = oberste Kartenzeile).
fn states_in_pixel_order(bytes: &[u8]) -> Vec<CellState> {
    let decoded = decode_map_bytes(bytes, None, &fallback()).expect("Karte dekodierbar");
    let grid = decoded.grid;
    let mut states = Vec::new();
    for row in 0..grid.height {
        let y = grid.height - 1 - row;
        for x in 0..grid.width {
            states.push(grid.cell_state(x, y).expect("Zelle im Raster"));
        }
    }
    states
}

#[test]
fn test_pgm_with_comment_classifies_cells() {
    let mut bytes = b"P5\n# c\n4 2\n255\n".to_vec();
    bytes.extend_from_slice(&[0, 0, 205, 205, 254, 254, 0, 205]);

    let decoded = decode_map_bytes(&bytes, None, &fallback()).unwrap();
    assert_eq!((decoded.grid.width, decoded.grid.height), (4, 2));

    use CellState::{Free as F, Occupied as O, Unknown as U};
    assert_eq!(states_in_pixel_order(&bytes), vec![O, O, U, U, F, F, O, U]);
}

#[test]
fn test_pgm_roundtrip_preserves_classification() {
    let width = 16u32;
    let height = 9u32;
    let mut bytes = format!("P5\n{} {}\n255\n", width, height).into_bytes();
    let pixels: Vec<u8> = (0..width * height)
        .map(|i| match i % 5 {
            0 => 0,
            1 | 2 => 254,
            3 => 205,
            _ => 10,
        })
        .collect();
    bytes.extend_from_slice(&pixels);

    let decoded = decode_map_bytes(&bytes, None, &fallback()).unwrap();
    let encoded = encode_grid(&decoded.grid, "roundtrip.pgm").unwrap();
    let sidecar = encoded.sidecar.clone();
    assert!(sidecar.contains("roundtrip.pgm"));

    let again = decode_map_bytes(&encoded.pgm, Some(&sidecar), &fallback()).unwrap();
    assert_eq!(
        states_in_pixel_order(&bytes),
        states_in_pixel_order(&encoded.pgm)
    );
    assert_relative_eq!(again.grid.resolution, decoded.grid.resolution);
}

#[test]
fn test_square_contains_center_not_outside() {
    let square = [
        Vec2::new(0.0, 0.0),
        Vec2::new(2.0, 0.0),
        Vec2::new(2.0, 2.0),
        Vec2::new(0.0, 2.0),
    ];
    assert!(point_in_polygon(Vec2::new(1.0, 1.0), &square));
    assert!(!point_in_polygon(Vec2::new(3.0, 3.0), &square));
}

#[test]
fn test_quarter_turn_quaternion_yaw() {
    let half = std::f32::consts::FRAC_PI_4;
    let q = Quat::from_xyzw(0.0, 0.0, half.sin(), half.cos());
    assert_relative_eq!(
        quaternion_to_yaw(q),
        std::f32::consts::FRAC_PI_2,
        epsilon = 1e-6
    );
    assert_relative_eq!(quaternion_to_yaw(yaw_to_quaternion(-2.5)), -2.5, epsilon = 1e-5);
}

#[test]
fn test_ids_are_never_reused_after_delete() {
    let mut store = EntityStore::new(EntityKind::Wall);
    let line = || vec![Vec2::ZERO, Vec2::X];
    for _ in 0..3 {
        store.insert_new(line(), None, Default::default());
    }
    assert!(store.remove(2).is_some());
    let id = store.insert_new(line(), None, Default::default());
    assert_eq!(id, 4);
    assert_eq!(store.ids(), vec![1, 3, 4]);
}

#[test]
fn test_entity_records_survive_encode_and_decode() {
    let records = json!([
        {"ID": 7, "Properties": "{\"Points\": [0, 0, 2, 0, 2, 2]}"},
        {"ID": 8, "Properties": "{\"Points\": [5, 5, 6, 5]}"}
    ]);
    let zones = decode_entity_list(EntityKind::ForbiddenZone, &records).unwrap();
    assert!(zones[0].is_valid());
    // Zu wenige Punkte: wird übernommen, aber nicht als Fläche gezeichnet
    assert!(!zones[1].is_valid());

    let encoded = encode_entity_list(zones.iter()).unwrap();
    let again = decode_entity_list(EntityKind::ForbiddenZone, &encoded).unwrap();
    assert_eq!(again, zones);
}
