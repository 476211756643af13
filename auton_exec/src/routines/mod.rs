//! # Routine dispatcher
//!
//! Autonomous routines are plain functions taking the [`Autonomous`] context. The
//! [`RoutineDispatcher`] maps routine names to these functions, so that one can be selected at the
//! start of the autonomous period, and provides the standalone calibration entry point.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Routines bundled with the executable
pub mod bundled;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use crate::{
    auton::Autonomous,
    calib::{CalibParams, CalibrationError, CalibrationReport, OffsetCalibrator},
    exec::ExecError,
};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// An autonomous routine.
pub type Routine = fn(&mut Autonomous) -> Result<(), ExecError>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Default)]
pub struct RoutineDispatcher {
    routines: Vec<(String, Routine)>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No routine named \"{0}\" is registered")]
    UnknownRoutine(String),

    #[error("Routine failed: {0}")]
    Exec(#[from] ExecError),

    #[error("Calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoutineDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher with every bundled routine registered.
    pub fn with_bundled() -> Self {
        let mut d = Self::new();

        for (name, routine) in bundled::ROUTINES {
            d.register(name, *routine);
        }

        d
    }

    /// Register a routine under `name`, replacing any routine already registered with that name.
    pub fn register(&mut self, name: &str, routine: Routine) {
        match self.routines.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => {
                warn!("Replacing routine \"{}\"", name);
                entry.1 = routine;
            }
            None => self.routines.push((name.to_string(), routine)),
        }
    }

    /// Names of the registered routines, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routines.iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.iter().any(|(n, _)| n == name)
    }

    /// Prepare the drive and run the named routine to completion.
    pub fn run(&self, name: &str, auton: &mut Autonomous) -> Result<(), DispatchError> {
        let routine = self
            .routines
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| *r)
            .ok_or_else(|| DispatchError::UnknownRoutine(name.to_string()))?;

        info!("Running routine \"{}\"", name);

        auton.prepare();
        routine(auton)?;

        info!(
            "Routine \"{}\" complete after {} commands",
            name,
            auton.exec().num_cmds()
        );

        Ok(())
    }

    /// Measure and install the tracking wheel offsets.
    ///
    /// This runs independently of any routine.
    pub fn calibrate(
        &self,
        auton: &mut Autonomous,
        params: CalibParams,
    ) -> Result<CalibrationReport, DispatchError> {
        info!("Running tracking wheel calibration");

        let report = OffsetCalibrator::new(params).run(auton.exec())?;

        Ok(report)
    }
}
