//! Implementation of the offset calibration

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use auton_if::motion::{MotionCommand, WaitMode};
use util::maths::wrap_angle_deg;

use super::{CalibParams, CalibrationError};
use crate::{
    drive::{BrakeMode, DriveController, Pose, WheelMap, WheelPosition},
    exec::Executor,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Measures and installs tracking wheel offsets.
#[derive(Debug, Clone)]
pub struct OffsetCalibrator {
    params: CalibParams,
}

/// Measurements of one calibration turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTrial {
    /// Units: degrees
    pub target_deg: f64,

    /// Magnitude of the heading change measured over the trial.
    ///
    /// Units: radians
    pub angle_delta_rad: f64,

    /// Distance travelled by each wheel present during the trial.
    ///
    /// Units: inches
    pub wheel_distances_in: WheelMap<f64>,
}

/// Running per-wheel average of the offsets measured by each trial.
#[derive(Debug, Clone)]
pub struct OffsetAccumulator {
    min_angle_delta_rad: f64,
    sums: WheelMap<f64>,
    counts: WheelMap<u32>,
    num_valid: u32,
    num_rejected: u32,
}

#[derive(Debug, Clone)]
pub struct CalibrationReport {
    /// Offsets written to each wheel.
    ///
    /// Units: inches
    pub offsets: WheelMap<f64>,

    /// Offsets of each calibrated wheel before the calibration.
    ///
    /// Units: inches
    pub previous: WheelMap<f64>,

    pub trials: Vec<CalibrationTrial>,

    pub num_valid: u32,
    pub num_rejected: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OffsetAccumulator {
    pub fn new(min_angle_delta_rad: f64) -> Self {
        Self {
            min_angle_delta_rad,
            sums: WheelMap::new(),
            counts: WheelMap::new(),
            num_valid: 0,
            num_rejected: 0,
        }
    }

    /// Add a trial to the average. Returns false if the trial was rejected.
    pub fn add(&mut self, trial: &CalibrationTrial) -> bool {
        let angle = trial.angle_delta_rad;

        if !angle.is_finite() || angle.abs() < self.min_angle_delta_rad {
            self.num_rejected += 1;
            return false;
        }

        for (p, d) in trial.wheel_distances_in.iter() {
            let offset = d / angle;

            match self.sums.get_mut(p) {
                Some(s) => *s += offset,
                None => {
                    self.sums.insert(p, offset);
                }
            }
            match self.counts.get_mut(p) {
                Some(c) => *c += 1,
                None => {
                    self.counts.insert(p, 1);
                }
            }
        }

        self.num_valid += 1;
        true
    }

    /// Average offset of each wheel which contributed to at least one valid trial.
    pub fn offsets(&self) -> WheelMap<f64> {
        self.sums
            .iter()
            .filter_map(|(p, s)| self.counts.get(p).map(|&c| (p, s / c as f64)))
            .collect()
    }

    pub fn num_valid(&self) -> u32 {
        self.num_valid
    }

    pub fn num_rejected(&self) -> u32 {
        self.num_rejected
    }
}

impl OffsetCalibrator {
    pub fn new(params: CalibParams) -> Self {
        Self { params }
    }

    /// Run the calibration, writing the measured offsets to the drive's tracking wheels.
    ///
    /// Wheels which are not present are left untouched. If no trial is valid nothing is written.
    pub fn run(&self, exec: &mut Executor) -> Result<CalibrationReport, CalibrationError> {
        let wheels = present_wheels(exec.drive());
        if wheels.is_empty() {
            return Err(CalibrationError::NoTrackers);
        }

        info!(
            "Calibrating {} tracking wheels over {} turns",
            wheels.len(),
            self.params.iterations
        );

        let mut acc = OffsetAccumulator::new(self.params.min_angle_delta_rad);
        let mut trials = Vec::with_capacity(self.params.iterations as usize);

        for i in 0..self.params.iterations {
            let trial = self.measure_trial(exec, i)?;

            if acc.add(&trial) {
                info!(
                    "Trial {}: turned {:.4} rad, wheels {:?}",
                    i, trial.angle_delta_rad, trial.wheel_distances_in
                );
            } else {
                warn!(
                    "Trial {} rejected, turned only {:.4} rad",
                    i, trial.angle_delta_rad
                );
            }

            trials.push(trial);
        }

        if acc.num_valid() == 0 {
            return Err(CalibrationError::NoValidTrials(self.params.iterations));
        }

        // Install the offsets
        let offsets = acc.offsets();
        let drive = exec.drive();
        let mut previous = WheelMap::new();

        for (p, &offset) in offsets.iter() {
            if let Some(t) = drive.tracker(p) {
                previous.insert(p, t.center_offset_in());
                t.set_center_offset_in(offset);
                info!(
                    "{} tracker offset {:.4} in -> {:.4} in",
                    p,
                    previous.get(p).copied().unwrap_or(0.0),
                    offset
                );
            }
        }

        Ok(CalibrationReport {
            offsets,
            previous,
            trials,
            num_valid: acc.num_valid(),
            num_rejected: acc.num_rejected(),
        })
    }

    /// Make one turn in place from a zeroed state and measure it.
    fn measure_trial(
        &self,
        exec: &mut Executor,
        index: u32,
    ) -> Result<CalibrationTrial, CalibrationError> {
        let target_deg = self.params.target_deg(index);

        // Zero everything
        {
            let drive = exec.drive();
            for p in WheelPosition::ALL.iter() {
                if let Some(t) = drive.tracker(*p) {
                    if t.is_present() {
                        t.reset();
                    }
                }
            }
            drive.reset_targets();
            drive.reset_heading();
            drive.reset_position_sensors();
            drive.set_brake_mode(BrakeMode::Hold);
            drive.set_pose(Pose::default());
        }

        let start_deg = exec.drive().heading_deg();

        exec.run(
            MotionCommand::Turn {
                angle_deg: target_deg,
                max_speed: self.params.turn_speed,
                angle_mode: self.params.angle_mode,
            },
            WaitMode::FullSettle,
        )?;
        exec.delay(self.params.hold_ms);

        let drive = exec.drive();
        let angle_delta_rad = angle_delta_rad(start_deg, drive.heading_deg());

        let mut wheel_distances_in = WheelMap::new();
        for p in WheelPosition::ALL.iter() {
            if let Some(t) = drive.tracker(*p) {
                if t.is_present() {
                    wheel_distances_in.insert(*p, t.distance_in());
                }
            }
        }

        Ok(CalibrationTrial {
            target_deg,
            angle_delta_rad,
            wheel_distances_in,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Magnitude of the heading change between two headings, taking the short way round.
///
/// Units: degrees in, radians out
pub fn angle_delta_rad(start_deg: f64, end_deg: f64) -> f64 {
    wrap_angle_deg(end_deg - start_deg).abs().to_radians()
}

/// Positions at which a working tracking wheel is fitted.
fn present_wheels(drive: &mut dyn DriveController) -> Vec<WheelPosition> {
    WheelPosition::ALL
        .iter()
        .copied()
        .filter(|p| drive.tracker(*p).map_or(false, |t| t.is_present()))
        .collect()
}
