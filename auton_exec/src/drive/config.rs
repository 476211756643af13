//! Drive controller configuration

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{WheelMap, WheelPosition};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Configuration owned by a drive controller.
///
/// Passed in at construction. The only part which changes afterwards is the tracking wheel
/// offsets, which are updated through [`super::TrackingWheel::set_center_offset_in`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    // ---- EXIT CONDITIONS ----
    pub drive_exit: ExitConditions,
    pub turn_exit: ExitConditions,
    pub swing_exit: ExitConditions,
    pub odom_drive_exit: ExitConditions,

    // ---- CHAINING ----

    /// Distance from the target at which a drive may be blended into the next motion.
    ///
    /// Units: inches
    pub drive_chain_in: f64,

    /// Units: degrees
    pub turn_chain_deg: f64,

    /// Units: degrees
    pub swing_chain_deg: f64,

    // ---- SLEW ----

    /// Distance over which a slewed motion ramps up from `slew_min_speed` to its max speed.
    ///
    /// Units: inches (or degrees for turns)
    pub slew_distance: f64,

    /// Starting speed of a slewed motion, out of 127.
    pub slew_min_speed: i32,

    // ---- ODOMETRY ----

    /// Look-ahead distance of the path follower. A waypoint is passed once it is inside this
    /// distance.
    ///
    /// Units: inches
    pub look_ahead_in: f64,

    // ---- TRACKING WHEELS ----

    /// Offset of each fitted tracking wheel from the center of rotation.
    ///
    /// Units: inches
    pub tracker_offsets_in: Vec<TrackerOffset>,
}

/// Exit conditions of one motion type.
///
/// A motion exits once its error has been inside `small_error` for `small_time_ms`, or inside
/// `big_error` for `big_time_ms`. A motion whose output is saturated while barely moving for
/// `velocity_time_ms` exits early and is flagged as interfered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitConditions {
    pub small_time_ms: u64,
    pub small_error: f64,
    pub big_time_ms: u64,
    pub big_error: f64,
    pub velocity_time_ms: u64,
}

/// Configured offset of one tracking wheel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackerOffset {
    pub position: WheelPosition,

    /// Units: inches
    pub offset_in: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveConfig {
    /// Tracker offsets keyed by wheel position.
    pub fn offsets(&self) -> WheelMap<f64> {
        self.tracker_offsets_in
            .iter()
            .map(|t| (t.position, t.offset_in))
            .collect()
    }

    /// Replace the offsets of the given wheels, leaving all others as they were.
    pub fn update_offsets(&mut self, offsets: &WheelMap<f64>) {
        for t in self.tracker_offsets_in.iter_mut() {
            if let Some(&o) = offsets.get(t.position) {
                t.offset_in = o;
            }
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            drive_exit: ExitConditions {
                small_time_ms: 90,
                small_error: 1.0,
                big_time_ms: 250,
                big_error: 3.0,
                velocity_time_ms: 500,
            },
            turn_exit: ExitConditions {
                small_time_ms: 90,
                small_error: 3.0,
                big_time_ms: 250,
                big_error: 7.0,
                velocity_time_ms: 500,
            },
            swing_exit: ExitConditions {
                small_time_ms: 90,
                small_error: 3.0,
                big_time_ms: 250,
                big_error: 7.0,
                velocity_time_ms: 500,
            },
            odom_drive_exit: ExitConditions {
                small_time_ms: 90,
                small_error: 1.0,
                big_time_ms: 250,
                big_error: 3.0,
                velocity_time_ms: 750,
            },
            drive_chain_in: 3.0,
            turn_chain_deg: 3.0,
            swing_chain_deg: 5.0,
            slew_distance: 3.0,
            slew_min_speed: 70,
            look_ahead_in: 7.0,
            tracker_offsets_in: vec![
                TrackerOffset {
                    position: WheelPosition::Left,
                    offset_in: 5.5,
                },
                TrackerOffset {
                    position: WheelPosition::Back,
                    offset_in: 2.0,
                },
            ],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_update_offsets() {
        let mut config = DriveConfig::default();

        let mut new = WheelMap::new();
        new.insert(WheelPosition::Back, 2.25);
        new.insert(WheelPosition::Front, 9.0);
        config.update_offsets(&new);

        let offsets = config.offsets();
        assert_eq!(offsets.get(WheelPosition::Left), Some(&5.5));
        assert_eq!(offsets.get(WheelPosition::Back), Some(&2.25));
        // Wheels which aren't fitted are never added
        assert!(!offsets.contains(WheelPosition::Front));
    }
}
