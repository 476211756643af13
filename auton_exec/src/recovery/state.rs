//! Implementation of the interference recovery state machine

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use auton_if::motion::{MotionCommand, WaitMode};

use super::RecoveryParams;
use crate::exec::{ExecError, Executor};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Bounded retry of an escape drive after interference.
#[derive(Debug, Clone)]
pub struct InterferenceRecovery {
    params: RecoveryParams,

    state: RecoveryState,

    /// Number of completed recovery cycles, incremented on leaving `Recovering`.
    attempt: u32,

    /// Number of escape drives made.
    num_escapes: u32,
}

/// Result of a recovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Terminal state reached.
    pub state: RecoveryState,

    /// Number of escape drives made.
    pub attempts: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Attempting,
    Recovering,
    Succeeded,
    Exhausted,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RecoveryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RecoveryState::Succeeded | RecoveryState::Exhausted)
    }
}

impl RecoveryOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == RecoveryState::Succeeded
    }
}

impl InterferenceRecovery {
    pub fn new(params: RecoveryParams) -> Self {
        Self {
            params,
            state: RecoveryState::Attempting,
            attempt: 0,
            num_escapes: 0,
        }
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Step the state machine until it reaches a terminal state.
    ///
    /// Errors from the drive controller are propagated, being out of bounds of what a retry can
    /// fix.
    pub fn run(&mut self, exec: &mut Executor) -> Result<RecoveryOutcome, ExecError> {
        info!(
            "Starting interference recovery, up to {} attempts",
            self.params.max_attempts
        );

        if self.params.max_attempts == 0 {
            warn!("Recovery has no attempts available");
            self.state = RecoveryState::Exhausted;
        }

        while !self.state.is_terminal() {
            self.step(exec)?;
        }

        let outcome = self.outcome();
        match outcome.state {
            RecoveryState::Succeeded => {
                info!("Recovered after {} attempts", outcome.attempts)
            }
            _ => warn!(
                "Recovery exhausted after {} attempts, continuing anyway",
                outcome.attempts
            ),
        }

        Ok(outcome)
    }

    /// Perform the action of the current state and transition to the next one.
    pub fn step(&mut self, exec: &mut Executor) -> Result<RecoveryState, ExecError> {
        let next = match self.state {
            RecoveryState::Attempting => {
                let report = exec.run(self.escape_cmd(), WaitMode::FullSettle)?;
                self.num_escapes += 1;

                if !report.interfered {
                    RecoveryState::Succeeded
                } else if self.attempt + 1 < self.params.max_attempts {
                    RecoveryState::Recovering
                } else {
                    RecoveryState::Exhausted
                }
            }
            RecoveryState::Recovering => {
                // Encoders may be inconsistent after a stall
                exec.drive().reset_position_sensors();
                exec.start(self.nudge_cmd())?;
                exec.delay(self.params.settle_delay_ms);
                self.attempt += 1;

                RecoveryState::Attempting
            }
            terminal => terminal,
        };

        if next != self.state {
            info!(
                "Recovery {:?} -> {:?} (attempt {})",
                self.state, next, self.attempt
            );
        }
        self.state = next;

        Ok(next)
    }

    pub fn outcome(&self) -> RecoveryOutcome {
        RecoveryOutcome {
            state: self.state,
            attempts: self.num_escapes,
        }
    }

    fn escape_cmd(&self) -> MotionCommand {
        MotionCommand::Drive {
            distance_in: self.params.escape_distance_in,
            max_speed: self.params.escape_speed,
            slew: false,
        }
    }

    fn nudge_cmd(&self) -> MotionCommand {
        MotionCommand::Drive {
            distance_in: self.params.nudge_distance_in,
            max_speed: self.params.nudge_speed,
            slew: false,
        }
    }
}
