//! System metadata entry rendering
//!
//! The metadata section opens with nine fixed entries derived from the
//! tracked job statistics; caller-supplied entries follow in their original
//! order. Keys are not deduplicated.

use super::constants::{EXTENT_SAFETY_MARGIN, FORMAT_VERSION};
use super::tracker::KinematicState;

/// Render the nine fixed system entries, in final wire order.
pub(crate) fn system_entries(head_type: &str, state: &KinematicState) -> Vec<(String, String)> {
    vec![
        ("VERSION".to_string(), FORMAT_VERSION.to_string()),
        ("HEAD_TYPE".to_string(), head_type.to_string()),
        ("TIME_COST".to_string(), format!("{:.2}", state.time_cost())),
        ("TRAVEL_DIST".to_string(), format!("{:.2}", state.traveled())),
        (
            "MAX_X".to_string(),
            format!("{:.2}", state.max_x() + EXTENT_SAFETY_MARGIN),
        ),
        (
            "MAX_Y".to_string(),
            format!("{:.2}", state.max_y() + EXTENT_SAFETY_MARGIN),
        ),
        (
            "MAX_Z".to_string(),
            format!("{:.2}", state.max_z() + EXTENT_SAFETY_MARGIN),
        ),
        (
            "MAX_R".to_string(),
            format!("{:.2}", state.max_r() + EXTENT_SAFETY_MARGIN),
        ),
        (
            "FILAMENT_USED".to_string(),
            render_filament(state.filament()),
        ),
    ]
}

/// Comma-joined channel values: three if channel 2 is nonzero, two if
/// channel 1 is nonzero, otherwise channel 0 alone.
fn render_filament(filament: [f32; 3]) -> String {
    if filament[2] != 0.0 {
        format!("{:.2},{:.2},{:.2}", filament[0], filament[1], filament[2])
    } else if filament[1] != 0.0 {
        format!("{:.2},{:.2}", filament[0], filament[1])
    } else {
        format!("{:.2}", filament[0])
    }
}
