//! Wire-Formate der Belegungskarte: PGM, Sidecar und Karten-Nachrichten.

pub mod grid_message;
pub mod pgm;
pub mod sidecar;

pub use grid_message::{
    decode_map_bytes, decode_map_value, encode_grid, grid_from_pgm, DecodedMap,
    EncodedMap,
};
pub use pgm::{decode_pgm, encode_pgm, parse_header, PgmHeader, PgmImage};
pub use sidecar::{parse_key_values, MapSidecar, SidecarValue};
