//! Application State: zentrale Datenhaltung.

mod app_state;
mod document;

pub use app_state::{AppState, RobotView};
pub use document::{MapDocument, OccupancyLayer};
