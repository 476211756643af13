//! # Autonomous context
//!
//! The handle given to every routine. It bundles the motion [`Executor`] with the robot's
//! mechanisms, and provides the short helpers routines are written in terms of.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};

use auton_if::{
    mech::{MotorId, PneumaticId},
    motion::{MotionCommand, SwingSide, WaitMode},
};

use crate::{
    drive::{BrakeMode, MotionHandle, Pose},
    exec::{ExecError, Executor, RunReport},
    mech::Mechanisms,
    recovery::{InterferenceRecovery, RecoveryOutcome, RecoveryParams},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

// Speeds are out of 127

pub const TURN_SPEED: i32 = 90;
pub const TURN_SPEED_SLOW: i32 = 60;
pub const SWING_SPEED: i32 = 110;

pub const DRIVE_SPEED: i32 = 110;
pub const DRIVE_SPEED_SLOW: i32 = 40;
pub const DRIVE_SPEED_MEDIUM: i32 = 65;

/// Default speed of the moving side in an absolute swing or arc.
pub const SWING_ABS_SPEED: i32 = 90;

/// Default speed of the inside wheels in an arc.
pub const ARC_INSIDE_SPEED: i32 = 30;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Autonomous<'a> {
    exec: Executor<'a>,

    mech: &'a mut dyn Mechanisms,

    /// Parameters used for every recovery started by a routine. The attempt limit is given by
    /// the routine itself.
    recovery: RecoveryParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> Autonomous<'a> {
    pub fn new(
        exec: Executor<'a>,
        mech: &'a mut dyn Mechanisms,
        recovery: RecoveryParams,
    ) -> Self {
        Self {
            exec,
            mech,
            recovery,
        }
    }

    pub fn exec(&mut self) -> &mut Executor<'a> {
        &mut self.exec
    }

    /// Put the drive into a known state before a routine starts.
    ///
    /// Targets, heading and drive sensors are reset, the pose is set to the origin and the
    /// motors are set to hold.
    pub fn prepare(&mut self) {
        debug!("Preparing drive for autonomous");

        let drive = self.exec.drive();
        drive.reset_targets();
        drive.reset_heading();
        drive.reset_position_sensors();
        drive.set_pose(Pose::default());
        drive.set_brake_mode(BrakeMode::Hold);
    }

    // ---- MOTIONS ----

    pub fn run(&mut self, cmd: MotionCommand, wait: WaitMode) -> Result<RunReport, ExecError> {
        self.exec.run(cmd, wait)
    }

    pub fn start(&mut self, cmd: MotionCommand) -> Result<MotionHandle, ExecError> {
        self.exec.start(cmd)
    }

    /// Block on a motion which has already been issued.
    pub fn wait(&mut self, handle: MotionHandle, wait: WaitMode) -> Result<RunReport, ExecError> {
        self.exec.wait_for(handle, wait)
    }

    /// Drive a distance with slew and wait for it to settle.
    pub fn drive(&mut self, distance_in: f64, speed: i32) -> Result<RunReport, ExecError> {
        self.exec
            .run(MotionCommand::drive(distance_in, speed), WaitMode::FullSettle)
    }

    /// Turn to an absolute heading by the shortest way and wait for it to settle.
    pub fn turn(&mut self, angle_deg: f64, speed: i32) -> Result<RunReport, ExecError> {
        self.exec
            .run(MotionCommand::turn(angle_deg, speed), WaitMode::FullSettle)
    }

    /// Swing to an absolute heading pivoting about the stationary right side.
    pub fn swing_abs_left(&mut self, angle_deg: f64, speed: i32) -> Result<RunReport, ExecError> {
        self.swing(SwingSide::Left, angle_deg, speed, 0)
    }

    /// Swing to an absolute heading pivoting about the stationary left side.
    pub fn swing_abs_right(&mut self, angle_deg: f64, speed: i32) -> Result<RunReport, ExecError> {
        self.swing(SwingSide::Right, angle_deg, speed, 0)
    }

    /// Arc to an absolute heading with the left side leading.
    pub fn arc_left_abs(
        &mut self,
        angle_deg: f64,
        turn_speed: i32,
        inside_speed: i32,
    ) -> Result<RunReport, ExecError> {
        self.swing(SwingSide::Left, angle_deg, turn_speed, inside_speed)
    }

    /// Arc to an absolute heading with the right side leading.
    pub fn arc_right_abs(
        &mut self,
        angle_deg: f64,
        turn_speed: i32,
        inside_speed: i32,
    ) -> Result<RunReport, ExecError> {
        self.swing(SwingSide::Right, angle_deg, turn_speed, inside_speed)
    }

    pub fn swing(
        &mut self,
        side: SwingSide,
        angle_deg: f64,
        moving_side_speed: i32,
        still_side_speed: i32,
    ) -> Result<RunReport, ExecError> {
        self.exec.run(
            MotionCommand::Swing {
                side,
                angle_deg,
                moving_side_speed,
                still_side_speed,
            },
            WaitMode::FullSettle,
        )
    }

    pub fn set_max_speed(&mut self, speed: i32) {
        self.exec.set_max_speed(speed)
    }

    /// Overwrite the current heading without moving.
    pub fn set_heading(&mut self, heading_deg: f64) {
        let drive = self.exec.drive();
        let pose = drive.pose();
        drive.set_pose(Pose {
            theta_deg: heading_deg,
            ..pose
        });
    }

    pub fn delay(&mut self, ms: u64) {
        self.exec.delay(ms)
    }

    pub fn interfered(&self) -> bool {
        self.exec.interfered()
    }

    /// Try to escape an obstruction with up to `max_attempts` escape drives.
    pub fn tug(&mut self, max_attempts: u32) -> Result<RecoveryOutcome, ExecError> {
        info!("Tugging free, {} attempts", max_attempts);

        InterferenceRecovery::new(RecoveryParams {
            max_attempts,
            ..self.recovery.clone()
        })
        .run(&mut self.exec)
    }

    // ---- MECHANISMS ----

    pub fn motor(&mut self, id: MotorId, power: i32) {
        self.mech.set_motor(id, power)
    }

    pub fn pneumatic(&mut self, id: PneumaticId, extended: bool) {
        self.mech.set_pneumatic(id, extended)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        drive::stub::{StubCall, StubDrive, StubMotion},
        exec::ExecParams,
        mech::{MechDemand, SimMechanisms},
    };

    #[test]
    fn test_helpers_issue_settled_motions() {
        let mut stub = StubDrive::new();
        let mut mech = SimMechanisms::new();
        {
            let mut auton = Autonomous::new(
                Executor::new(&mut stub, ExecParams::default()),
                &mut mech,
                RecoveryParams::default(),
            );

            auton.drive(24.0, DRIVE_SPEED).unwrap();
            auton.turn(90.0, TURN_SPEED).unwrap();
            auton.swing_abs_left(45.0, SWING_ABS_SPEED).unwrap();
            auton.arc_right_abs(0.0, SWING_ABS_SPEED, ARC_INSIDE_SPEED).unwrap();
            auton.motor(MotorId::Intake, 127);
            auton.pneumatic(PneumaticId::BlockCollector, true);
        }

        assert_eq!(
            stub.issued(),
            vec![
                MotionCommand::drive(24.0, 110),
                MotionCommand::turn(90.0, 90),
                MotionCommand::Swing {
                    side: SwingSide::Left,
                    angle_deg: 45.0,
                    moving_side_speed: 90,
                    still_side_speed: 0
                },
                MotionCommand::Swing {
                    side: SwingSide::Right,
                    angle_deg: 0.0,
                    moving_side_speed: 90,
                    still_side_speed: 30
                },
            ]
        );

        // Every motion fully settled before the next one was issued
        assert_eq!(stub.num_waits(), 4 * StubMotion::default().settle_after as usize);

        assert_eq!(
            mech.history,
            vec![
                MechDemand::Motor(MotorId::Intake, 127),
                MechDemand::Pneumatic(PneumaticId::BlockCollector, true)
            ]
        );
    }

    #[test]
    fn test_prepare_and_heading() {
        let mut stub = StubDrive::new();
        let mut mech = SimMechanisms::new();
        {
            let mut auton = Autonomous::new(
                Executor::new(&mut stub, ExecParams::default()),
                &mut mech,
                RecoveryParams::default(),
            );
            auton.prepare();
            auton.set_heading(90.0);
        }

        assert_eq!(
            stub.calls,
            vec![
                StubCall::ResetTargets,
                StubCall::ResetHeading,
                StubCall::ResetSensors,
                StubCall::SetPose(Pose::default()),
                StubCall::Brake(BrakeMode::Hold),
                StubCall::SetPose(Pose::new(0.0, 0.0, 90.0)),
            ]
        );
    }

    #[test]
    fn test_tug_uses_routine_attempts() {
        let mut stub = StubDrive::with_profile(|_| StubMotion {
            interfered: true,
            ..Default::default()
        });
        let mut mech = SimMechanisms::new();
        let outcome = {
            let mut auton = Autonomous::new(
                Executor::new(&mut stub, ExecParams::default()),
                &mut mech,
                RecoveryParams {
                    max_attempts: 10,
                    ..Default::default()
                },
            );
            auton.tug(2).unwrap()
        };

        assert!(!outcome.succeeded());
        assert_eq!(outcome.attempts, 2);

        // Escape, nudge, escape
        assert_eq!(stub.issued().len(), 3);
        assert_eq!(
            stub.issued()[0],
            MotionCommand::Drive {
                distance_in: -24.0,
                max_speed: 127,
                slew: false
            }
        );
    }
}
