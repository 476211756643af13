//! Tracking wheel types

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Display;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of tracking wheel mounting positions on the robot.
pub const NUM_TRACKER_POSITIONS: usize = 4;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An unpowered odometry wheel with its own encoder.
///
/// The center offset is the perpendicular distance from the wheel to the robot's center of
/// rotation, signed so that turning clockwise in place by `a` radians moves the wheel
/// `offset * a` inches.
pub trait TrackingWheel {
    /// Zero the accumulated distance.
    fn reset(&mut self);

    /// Distance travelled since the last reset.
    ///
    /// Units: inches
    fn distance_in(&self) -> f64;

    /// Units: inches
    fn center_offset_in(&self) -> f64;

    /// Set the offset used by odometry.
    ///
    /// Units: inches
    fn set_center_offset_in(&mut self, offset_in: f64);

    /// True if the encoder is connected and reporting.
    fn is_present(&self) -> bool;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Mounting position of a tracking wheel.
///
/// `Left` and `Right` are vertical wheels (parallel to the direction of travel), `Back` and
/// `Front` are horizontal wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelPosition {
    Left,
    Right,
    Back,
    Front,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A value which may or may not exist for each of the tracking wheel positions.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelMap<T>([Option<T>; NUM_TRACKER_POSITIONS]);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WheelPosition {
    /// All positions, in the order the calibration reports them.
    pub const ALL: [WheelPosition; NUM_TRACKER_POSITIONS] = [
        WheelPosition::Left,
        WheelPosition::Right,
        WheelPosition::Back,
        WheelPosition::Front,
    ];

    pub fn index(self) -> usize {
        match self {
            WheelPosition::Left => 0,
            WheelPosition::Right => 1,
            WheelPosition::Back => 2,
            WheelPosition::Front => 3,
        }
    }

    /// True for wheels which roll in the direction of travel.
    pub fn is_vertical(self) -> bool {
        matches!(self, WheelPosition::Left | WheelPosition::Right)
    }
}

impl Display for WheelPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WheelPosition::Left => "left",
            WheelPosition::Right => "right",
            WheelPosition::Back => "back",
            WheelPosition::Front => "front",
        };
        write!(f, "{}", name)
    }
}

impl<T> WheelMap<T> {
    /// A map with no wheels present.
    pub fn new() -> Self {
        WheelMap([None, None, None, None])
    }

    pub fn get(&self, position: WheelPosition) -> Option<&T> {
        self.0[position.index()].as_ref()
    }

    pub fn get_mut(&mut self, position: WheelPosition) -> Option<&mut T> {
        self.0[position.index()].as_mut()
    }

    /// Set the value for a position, returning the previous value.
    pub fn insert(&mut self, position: WheelPosition, value: T) -> Option<T> {
        self.0[position.index()].replace(value)
    }

    pub fn remove(&mut self, position: WheelPosition) -> Option<T> {
        self.0[position.index()].take()
    }

    pub fn contains(&self, position: WheelPosition) -> bool {
        self.0[position.index()].is_some()
    }

    /// Iterate over the positions which have a value, in [`WheelPosition::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (WheelPosition, &T)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (WheelPosition::ALL[i], v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (WheelPosition, &mut T)> {
        self.0
            .iter_mut()
            .enumerate()
            .filter_map(|(i, v)| v.as_mut().map(|v| (WheelPosition::ALL[i], v)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for WheelMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::iter::FromIterator<(WheelPosition, T)> for WheelMap<T> {
    fn from_iter<I: IntoIterator<Item = (WheelPosition, T)>>(iter: I) -> Self {
        let mut map = WheelMap::new();
        for (p, v) in iter {
            map.insert(p, v);
        }
        map
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wheel_map() {
        let mut map: WheelMap<f64> =
            vec![(WheelPosition::Back, 2.0), (WheelPosition::Left, -1.0)].into_iter().collect();

        assert_eq!(map.len(), 2);
        assert!(!map.contains(WheelPosition::Front));

        // Iteration is in position order, not insertion order
        let positions: Vec<_> = map.iter().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![WheelPosition::Left, WheelPosition::Back]);

        if let Some(v) = map.get_mut(WheelPosition::Back) {
            *v *= 2.0;
        }
        assert_eq!(map.get(WheelPosition::Back), Some(&4.0));
        assert_eq!(map.remove(WheelPosition::Left), Some(-1.0));
        assert_eq!(map.len(), 1);
    }
}
