//! # Mechanisms
//!
//! Motors and pneumatics outside of the drivetrain, actuated directly by the autonomous routines.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use std::collections::HashMap;

use auton_if::{
    mech::{MotorId, PneumaticId},
    MAX_SPEED,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait Mechanisms {
    /// Set the power of a motor, from -127 to 127.
    fn set_motor(&mut self, id: MotorId, power: i32);

    fn set_pneumatic(&mut self, id: PneumaticId, extended: bool);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Host-side mechanisms which log and record their latest demands.
#[derive(Debug, Default)]
pub struct SimMechanisms {
    motors: HashMap<MotorId, i32>,
    pneumatics: HashMap<PneumaticId, bool>,

    /// Every demand received, in order.
    pub history: Vec<MechDemand>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechDemand {
    Motor(MotorId, i32),
    Pneumatic(PneumaticId, bool),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimMechanisms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current power of a motor, zero if it has never been set.
    pub fn motor(&self, id: MotorId) -> i32 {
        self.motors.get(&id).copied().unwrap_or(0)
    }

    /// Current state of a pneumatic, retracted if it has never been set.
    pub fn pneumatic(&self, id: PneumaticId) -> bool {
        self.pneumatics.get(&id).copied().unwrap_or(false)
    }
}

impl Mechanisms for SimMechanisms {
    fn set_motor(&mut self, id: MotorId, power: i32) {
        let limited = power.max(-MAX_SPEED).min(MAX_SPEED);
        if limited != power {
            warn!("{:?} power {} limited to {}", id, power, limited);
        }

        debug!("{:?} -> {}", id, limited);
        self.motors.insert(id, limited);
        self.history.push(MechDemand::Motor(id, limited));
    }

    fn set_pneumatic(&mut self, id: PneumaticId, extended: bool) {
        debug!(
            "{:?} -> {}",
            id,
            if extended { "extended" } else { "retracted" }
        );
        self.pneumatics.insert(id, extended);
        self.history.push(MechDemand::Pneumatic(id, extended));
    }
}
