//! Implementations for the Executor

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};

use auton_if::motion::{MotionCommand, WaitMode};
use util::time::millis;

use super::{ExecError, ExecParams};
use crate::drive::{DriveController, MotionHandle, MotionStatus};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Issues motion commands to a drive controller and blocks according to their wait modes.
pub struct Executor<'a> {
    params: ExecParams,

    drive: &'a mut dyn DriveController,

    /// The most recently issued motion.
    active: Option<MotionHandle>,

    num_cmds: u64,
}

/// Outcome of blocking on a motion.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub handle: MotionHandle,

    pub wait: WaitMode,

    /// The condition which released the wait.
    pub completion: Completion,

    /// Value of the controller's interference flag when the wait was released.
    pub interfered: bool,

    /// Progress of the motion when the wait was released.
    pub progress: f64,

    /// Number of poll periods spent waiting.
    pub num_polls: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The condition on which a wait was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The motion reached its exit condition.
    Settled,

    /// The motion may be blended into the next one.
    ChainReady,

    /// The motion travelled past the requested progress threshold.
    ProgressReached,

    /// The path motion passed the requested waypoint.
    WaypointReached,

    /// The motion settled before reaching the requested progress or waypoint.
    SettledEarly,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> Executor<'a> {
    pub fn new(drive: &'a mut dyn DriveController, params: ExecParams) -> Self {
        Self {
            params,
            drive,
            active: None,
            num_cmds: 0,
        }
    }

    /// Issue a command and block until its wait mode is satisfied.
    pub fn run(&mut self, cmd: MotionCommand, wait: WaitMode) -> Result<RunReport, ExecError> {
        let handle = self.start(cmd)?;
        self.wait_for(handle, wait)
    }

    /// Issue a command without waiting for it.
    pub fn start(&mut self, cmd: MotionCommand) -> Result<MotionHandle, ExecError> {
        debug!("Issuing command {}: {}", self.num_cmds, cmd);

        let handle = self.drive.issue(&cmd)?;
        self.active = Some(handle);
        self.num_cmds += 1;

        Ok(handle)
    }

    /// Block until the wait mode of an already issued motion is satisfied.
    pub fn wait_for(&mut self, handle: MotionHandle, wait: WaitMode) -> Result<RunReport, ExecError> {
        let poll_period = millis(self.params.poll_period_ms);
        let mut num_polls = 0;

        let (completion, status) = loop {
            let status = self.drive.status(handle)?;

            if let Some(c) = Self::check_wait(&status, wait) {
                break (c, status);
            }

            self.drive.wait(poll_period);
            num_polls += 1;
        };

        let interfered = self.drive.interfered();

        match completion {
            Completion::SettledEarly => warn!(
                "Motion {:?} settled at progress {:.2} before reaching {:?}",
                handle, status.progress, wait
            ),
            _ => trace!(
                "Motion {:?} released by {:?} after {} polls",
                handle,
                completion,
                num_polls
            ),
        }

        if interfered {
            warn!("Motion {:?} was interfered with", handle);
        }

        Ok(RunReport {
            handle,
            wait,
            completion,
            interfered,
            progress: status.progress,
            num_polls,
        })
    }

    /// Block the sequence for a fixed time while any motion in progress continues.
    pub fn delay(&mut self, ms: u64) {
        trace!("Delay {} ms", ms);
        self.drive.wait(millis(ms));
    }

    /// Change the speed cap of the motion in progress.
    pub fn set_max_speed(&mut self, max_speed: i32) {
        debug!("Setting max speed to {}", max_speed);
        self.drive.set_max_speed(max_speed);
    }

    /// True if the last motion exited because it was interfered with.
    pub fn interfered(&self) -> bool {
        self.drive.interfered()
    }

    /// The most recently issued motion.
    pub fn active(&self) -> Option<MotionHandle> {
        self.active
    }

    /// Number of commands issued so far.
    pub fn num_cmds(&self) -> u64 {
        self.num_cmds
    }

    /// Direct access to the drive controller.
    pub fn drive(&mut self) -> &mut dyn DriveController {
        &mut *self.drive
    }

    /// Decide whether a wait is satisfied by the given status.
    fn check_wait(status: &MotionStatus, wait: WaitMode) -> Option<Completion> {
        match wait {
            WaitMode::FullSettle if status.settled => Some(Completion::Settled),
            WaitMode::QuickChain if status.chain_ready => Some(Completion::ChainReady),
            WaitMode::QuickChain if status.settled => Some(Completion::Settled),
            WaitMode::UntilProgress(t) if progress_reached(status.progress, t) => {
                Some(Completion::ProgressReached)
            }
            WaitMode::UntilWaypoint(i) if status.target_waypoint.map_or(false, |w| w > i) => {
                Some(Completion::WaypointReached)
            }
            WaitMode::UntilProgress(_) | WaitMode::UntilWaypoint(_) if status.settled => {
                Some(Completion::SettledEarly)
            }
            _ => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// True if `progress` has passed `threshold` in the threshold's direction.
fn progress_reached(progress: f64, threshold: f64) -> bool {
    if threshold >= 0.0 {
        progress >= threshold
    } else {
        progress <= threshold
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive::{
        stub::{StubCall, StubDrive, StubMotion},
        DriveError,
    };
    use std::time::Duration;

    fn motion(chain_after: u32, settle_after: u32) -> StubMotion {
        StubMotion {
            chain_after,
            settle_after,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_settle_blocks() {
        let mut stub = StubDrive::with_profile(|_| motion(2, 5));
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        let report = exec
            .run(MotionCommand::drive(24.0, 110), WaitMode::FullSettle)
            .unwrap();
        assert_eq!(report.completion, Completion::Settled);
        assert_eq!(report.num_polls, 5);
        assert!(exec.drive().status(report.handle).unwrap().settled);

        assert_eq!(stub.num_waits(), 5);
        assert_eq!(stub.calls[1], StubCall::Wait(Duration::from_millis(10)));
    }

    #[test]
    fn test_already_settled_does_not_wait() {
        let mut stub = StubDrive::with_profile(|_| motion(0, 0));
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        let report = exec
            .run(MotionCommand::turn(0.0, 90), WaitMode::FullSettle)
            .unwrap();
        assert_eq!(report.num_polls, 0);
        assert_eq!(stub.num_waits(), 0);
    }

    #[test]
    fn test_quick_chain_returns_before_settle() {
        let mut stub = StubDrive::with_profile(|_| motion(2, 6));
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        let report = exec
            .run(MotionCommand::turn(90.0, 90), WaitMode::QuickChain)
            .unwrap();
        assert_eq!(report.completion, Completion::ChainReady);
        assert_eq!(report.num_polls, 2);
        assert!(!exec.drive().status(report.handle).unwrap().settled);
    }

    #[test]
    fn test_until_progress() {
        // Forwards
        let mut stub = StubDrive::with_profile(|_| motion(18, 20));
        let mut exec = Executor::new(&mut stub, ExecParams::default());
        let report = exec
            .run(MotionCommand::drive(24.0, 30), WaitMode::UntilProgress(6.0))
            .unwrap();
        assert_eq!(report.completion, Completion::ProgressReached);
        assert_eq!(report.num_polls, 6);
        assert!(report.progress >= 6.0);

        // Backwards, the threshold is signed
        let mut stub = StubDrive::with_profile(|_| StubMotion {
            progress_per_tick: -1.0,
            ..motion(18, 20)
        });
        let mut exec = Executor::new(&mut stub, ExecParams::default());
        let report = exec
            .run(MotionCommand::drive(-24.0, 30), WaitMode::UntilProgress(-6.0))
            .unwrap();
        assert_eq!(report.completion, Completion::ProgressReached);
        assert_eq!(report.num_polls, 6);
        assert!(report.progress <= -6.0);

        // Moving the wrong way never reaches the threshold, the wait is released on settle
        let mut stub = StubDrive::with_profile(|_| motion(18, 20));
        let mut exec = Executor::new(&mut stub, ExecParams::default());
        let report = exec
            .run(MotionCommand::drive(24.0, 30), WaitMode::UntilProgress(-6.0))
            .unwrap();
        assert_eq!(report.completion, Completion::SettledEarly);
        assert_eq!(report.num_polls, 20);
    }

    #[test]
    fn test_until_waypoint() {
        let mut stub = StubDrive::with_profile(|_| StubMotion {
            ticks_per_waypoint: Some(3),
            ..motion(18, 20)
        });
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        let report = exec
            .run(MotionCommand::drive(24.0, 110), WaitMode::UntilWaypoint(1))
            .unwrap();
        assert_eq!(report.completion, Completion::WaypointReached);
        assert_eq!(report.num_polls, 6);
    }

    #[test]
    fn test_chain_sequence_order() {
        let mut stub = StubDrive::with_profile(|_| motion(3, 8));
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        let script = vec![
            (MotionCommand::drive(24.0, 110), WaitMode::FullSettle),
            (MotionCommand::turn(90.0, 90), WaitMode::QuickChain),
            (MotionCommand::turn(0.0, 90), WaitMode::FullSettle),
        ];

        let completions: Vec<_> = script
            .iter()
            .map(|(cmd, wait)| exec.run(cmd.clone(), *wait).unwrap().completion)
            .collect();

        assert_eq!(
            completions,
            vec![Completion::Settled, Completion::ChainReady, Completion::Settled]
        );
        assert_eq!(exec.num_cmds(), 3);

        // Commands are issued strictly in order, each only once the previous wait was released
        let issued: Vec<_> = script.into_iter().map(|(c, _)| c).collect();
        assert_eq!(stub.issued(), issued);

        let waits_between: Vec<usize> = stub
            .calls
            .split(|c| matches!(c, StubCall::Issue(_)))
            .skip(1)
            .map(|s| s.len())
            .collect();
        assert_eq!(waits_between, vec![8, 3, 8]);
    }

    #[test]
    fn test_interference_reported() {
        let mut stub = StubDrive::with_profile(|_| StubMotion {
            interfered: true,
            ..Default::default()
        });
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        let report = exec
            .run(MotionCommand::drive(24.0, 110), WaitMode::FullSettle)
            .unwrap();
        assert!(report.interfered);
        assert!(exec.interfered());
    }

    #[test]
    fn test_controller_errors_propagate() {
        let mut stub = StubDrive::new();
        stub.fail_next_issue = true;
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        let r = exec.run(MotionCommand::drive(24.0, 110), WaitMode::FullSettle);
        assert!(matches!(
            r,
            Err(ExecError::DriveError(DriveError::InvalidCommand(..)))
        ));
        assert_eq!(exec.active(), None);
    }

    #[test]
    fn test_delay_and_speed() {
        let mut stub = StubDrive::new();
        let mut exec = Executor::new(&mut stub, ExecParams::default());

        exec.start(MotionCommand::drive(24.0, 30)).unwrap();
        exec.delay(250);
        exec.set_max_speed(110);

        assert_eq!(
            stub.calls[1..],
            [
                StubCall::Wait(Duration::from_millis(250)),
                StubCall::SetMaxSpeed(110)
            ]
        );
    }
}
