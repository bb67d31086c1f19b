//! Use-Case-Funktionen für Roboter-Pose und Laserscan.

use crate::app::AppState;
use crate::core::transform::LaserScan;
use crate::wire::{FrameLink, TfMessage};

/// Übernimmt alle bekannten Kettenglieder einer TF-Nachricht.
///
/// Gibt `true` zurück, wenn sich die Pose geändert hat.
pub fn apply_transforms(state: &mut AppState, message: &TfMessage) -> bool {
    let pipeline = &mut state.robot.pipeline;
    let mut accepted = 0usize;
    for (link, transform) in message.links() {
        let ok = match link {
            FrameLink::MapToOdom => pipeline.set_map_to_odom(transform),
            FrameLink::OdomToBase => pipeline.set_odom_to_base(transform),
            FrameLink::LaserToBase => pipeline.set_laser_to_base(transform),
        };
        accepted += usize::from(ok);
    }
    if accepted == 0 {
        return false;
    }

    let pose = pipeline.robot_pose();
    if pose == state.robot.pose {
        return false;
    }
    state.robot.pose = pose;
    state.request_render();
    true
}

/// Projiziert einen Scan; die Wolke ersetzt die des vorherigen Frames.
///
/// Ohne bekannte Pose wird die Wolke geleert.
pub fn apply_scan(state: &mut AppState, scan: &LaserScan) -> usize {
    let cloud = state.robot.pipeline.project_scan(scan).unwrap_or_default();
    let count = cloud.len();
    if count == 0 && state.robot.scan_cloud.is_empty() {
        return 0;
    }
    state.robot.scan_cloud = cloud;
    state.request_render();
    count
}
