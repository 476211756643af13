//! Bundled autonomous routines.
//!
//! These demonstrate each kind of motion and wait mode, plus the skills park routine. Angles are
//! absolute headings, distances are in inches.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use auton_if::{
    mech::{MotorId, PneumaticId},
    motion::{Direction, MotionCommand, OdomTarget, PoseTarget, SwingSide, WaitMode},
};

use super::Routine;
use crate::{
    auton::{Autonomous, DRIVE_SPEED, SWING_SPEED, TURN_SPEED},
    exec::{ExecError, RunReport},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Every bundled routine and the name it is registered under.
pub const ROUTINES: &[(&str, Routine)] = &[
    ("drive", drive_example),
    ("turn", turn_example),
    ("drive_and_turn", drive_and_turn),
    ("wait_until_change_speed", wait_until_change_speed),
    ("swing", swing_example),
    ("motion_chaining", motion_chaining),
    ("combining_movements", combining_movements),
    ("interfered", interfered_example),
    ("odom_drive", odom_drive_example),
    ("pure_pursuit", odom_pure_pursuit_example),
    ("pure_pursuit_wait_until", odom_pure_pursuit_wait_until_example),
    ("boomerang", odom_boomerang_example),
    ("boomerang_pure_pursuit", odom_boomerang_injected_pure_pursuit_example),
    ("score_preload", score_preload),
    ("skills_park", skills_park),
];

/// Speed of the still side in the swing demonstrations.
const SWING_STILL_SPEED: i32 = 45;

/// Speed used to creep up to the point at which a routine speeds up.
const CREEP_SPEED: i32 = 30;

const SKILLS_PARK_SPEED: i32 = 120;

// ------------------------------------------------------------------------------------------------
// ROUTINES
// ------------------------------------------------------------------------------------------------

pub fn drive_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.drive(24.0, DRIVE_SPEED)?;
    auton.drive(-12.0, DRIVE_SPEED)?;
    auton.drive(-12.0, DRIVE_SPEED)?;

    Ok(())
}

pub fn turn_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.turn(90.0, TURN_SPEED)?;
    auton.turn(45.0, TURN_SPEED)?;
    auton.turn(0.0, TURN_SPEED)?;

    Ok(())
}

pub fn drive_and_turn(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.drive(24.0, DRIVE_SPEED)?;
    auton.turn(45.0, TURN_SPEED)?;
    auton.turn(-45.0, TURN_SPEED)?;
    auton.turn(0.0, TURN_SPEED)?;
    auton.drive(-24.0, DRIVE_SPEED)?;

    Ok(())
}

/// Creep for the first 6 inches of each drive, then finish it at full drive speed.
pub fn wait_until_change_speed(auton: &mut Autonomous) -> Result<(), ExecError> {
    creep_then_speed_up(auton, 24.0, 6.0)?;

    auton.turn(45.0, TURN_SPEED)?;
    auton.turn(-45.0, TURN_SPEED)?;
    auton.turn(0.0, TURN_SPEED)?;

    creep_then_speed_up(auton, -24.0, -6.0)?;

    Ok(())
}

pub fn swing_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.swing(SwingSide::Left, 45.0, SWING_SPEED, SWING_STILL_SPEED)?;
    auton.swing(SwingSide::Right, 0.0, SWING_SPEED, SWING_STILL_SPEED)?;
    auton.swing(SwingSide::Right, 45.0, SWING_SPEED, SWING_STILL_SPEED)?;
    auton.swing(SwingSide::Left, 0.0, SWING_SPEED, SWING_STILL_SPEED)?;

    Ok(())
}

/// The turns blend into each other. The last motion of a chain must fully settle.
pub fn motion_chaining(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.drive(24.0, DRIVE_SPEED)?;

    auton.run(MotionCommand::turn(45.0, TURN_SPEED), WaitMode::QuickChain)?;
    auton.run(MotionCommand::turn(-45.0, TURN_SPEED), WaitMode::QuickChain)?;
    auton.turn(0.0, TURN_SPEED)?;

    auton.drive(-24.0, DRIVE_SPEED)?;

    Ok(())
}

pub fn combining_movements(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.drive(24.0, DRIVE_SPEED)?;
    auton.turn(45.0, TURN_SPEED)?;
    auton.swing(SwingSide::Right, -45.0, SWING_SPEED, SWING_STILL_SPEED)?;
    auton.turn(0.0, TURN_SPEED)?;
    auton.drive(-24.0, DRIVE_SPEED)?;

    Ok(())
}

/// Drive forward and turn, unless the drive is interfered with, in which case try to escape
/// backwards and give up on the rest of the routine.
pub fn interfered_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    let report = auton.drive(24.0, DRIVE_SPEED)?;

    if report.interfered {
        auton.tug(3)?;
        return Ok(());
    }

    auton.turn(90.0, TURN_SPEED)?;

    Ok(())
}

pub fn odom_drive_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    odom(auton, OdomTarget::Distance(24.0), Direction::Forward, true)?;
    odom(auton, OdomTarget::Distance(-12.0), Direction::Forward, false)?;
    odom(auton, OdomTarget::Distance(-12.0), Direction::Forward, false)?;

    Ok(())
}

/// Drive to (0, 30) through (6, 10) and (0, 20), then back to the origin in reverse.
pub fn odom_pure_pursuit_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    let path = vec![
        PoseTarget::point(6.0, 10.0),
        PoseTarget::point(0.0, 20.0),
        PoseTarget::point(0.0, 30.0),
    ];
    odom(auton, OdomTarget::Path(path), Direction::Forward, true)?;

    odom(
        auton,
        OdomTarget::Pose(PoseTarget::point(0.0, 0.0)),
        Direction::Reverse,
        true,
    )?;

    Ok(())
}

/// Start the intake once the path passes its second waypoint, and stop it at the end.
pub fn odom_pure_pursuit_wait_until_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    let path = vec![
        PoseTarget::point(0.0, 24.0),
        PoseTarget::point(12.0, 24.0),
        PoseTarget::point(24.0, 24.0),
    ];

    let handle = auton.start(MotionCommand::OdomDrive {
        target: OdomTarget::Path(path),
        direction: Direction::Forward,
        max_speed: DRIVE_SPEED,
        slew: true,
    })?;

    auton.wait(handle, WaitMode::UntilWaypoint(1))?;
    auton.motor(MotorId::Intake, 127);

    auton.wait(handle, WaitMode::FullSettle)?;
    auton.motor(MotorId::Intake, 0);

    Ok(())
}

pub fn odom_boomerang_example(auton: &mut Autonomous) -> Result<(), ExecError> {
    odom(
        auton,
        OdomTarget::Pose(PoseTarget::pose(0.0, 24.0, 45.0)),
        Direction::Forward,
        true,
    )?;
    odom(
        auton,
        OdomTarget::Pose(PoseTarget::pose(0.0, 0.0, 0.0)),
        Direction::Reverse,
        true,
    )?;

    Ok(())
}

/// A boomerang approach to the first waypoint, then pure pursuit through the rest.
pub fn odom_boomerang_injected_pure_pursuit_example(
    auton: &mut Autonomous,
) -> Result<(), ExecError> {
    let path = vec![
        PoseTarget::pose(0.0, 24.0, 45.0),
        PoseTarget::point(12.0, 24.0),
        PoseTarget::point(24.0, 24.0),
    ];
    odom(auton, OdomTarget::Path(path), Direction::Forward, true)?;

    odom(
        auton,
        OdomTarget::Pose(PoseTarget::pose(0.0, 0.0, 0.0)),
        Direction::Reverse,
        true,
    )?;

    Ok(())
}

/// Run every roller to score the preloaded blocks without moving.
pub fn score_preload(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.pneumatic(PneumaticId::BlockCollector, false);

    auton.motor(MotorId::Intake, 127);
    auton.motor(MotorId::Combine, -127);
    auton.motor(MotorId::Hood, -127);
    auton.delay(3000);

    Ok(())
}

pub fn skills_park(auton: &mut Autonomous) -> Result<(), ExecError> {
    auton.drive(-10.0, SKILLS_PARK_SPEED)?;
    auton.drive(60.0, SKILLS_PARK_SPEED)?;
    auton.drive(-10.0, SKILLS_PARK_SPEED)?;

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// HELPERS
// ------------------------------------------------------------------------------------------------

/// Drive `distance_in` at creep speed until `speed_up_at_in` has been covered, then raise the
/// speed cap and wait for the drive to settle.
fn creep_then_speed_up(
    auton: &mut Autonomous,
    distance_in: f64,
    speed_up_at_in: f64,
) -> Result<RunReport, ExecError> {
    let report = auton.run(
        MotionCommand::drive(distance_in, CREEP_SPEED),
        WaitMode::UntilProgress(speed_up_at_in),
    )?;

    auton.set_max_speed(DRIVE_SPEED);
    auton.wait(report.handle, WaitMode::FullSettle)
}

fn odom(
    auton: &mut Autonomous,
    target: OdomTarget,
    direction: Direction,
    slew: bool,
) -> Result<RunReport, ExecError> {
    auton.run(
        MotionCommand::OdomDrive {
            target,
            direction,
            max_speed: DRIVE_SPEED,
            slew,
        },
        WaitMode::FullSettle,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        drive::{
            stub::{StubCall, StubDrive, StubMotion},
            DriveConfig, DriveController, SimDrive, SimParams,
        },
        exec::{ExecParams, Executor},
        mech::{MechDemand, SimMechanisms},
        recovery::RecoveryParams,
    };

    fn run_on(drive: &mut dyn DriveController, mech: &mut SimMechanisms, routine: Routine) {
        let mut auton = Autonomous::new(
            Executor::new(drive, ExecParams::default()),
            mech,
            RecoveryParams::default(),
        );
        auton.prepare();
        routine(&mut auton).unwrap();
    }

    #[test]
    fn test_all_routines_run_on_stub() {
        for (name, routine) in ROUTINES {
            let mut stub = StubDrive::new();
            let mut mech = SimMechanisms::new();
            run_on(&mut stub, &mut mech, *routine);

            // Every routine that moves ends with a fully settled motion
            if let Some(handle) = stub.issued().len().checked_sub(1) {
                let status = stub
                    .status(crate::drive::MotionHandle(handle as u64))
                    .unwrap();
                assert!(status.settled, "{} ended unsettled", name);
            }
        }
    }

    #[test]
    fn test_speed_change_after_progress() {
        let mut stub = StubDrive::with_profile(|cmd| match cmd {
            MotionCommand::Drive { distance_in, .. } => StubMotion {
                settle_after: 20,
                chain_after: 18,
                progress_per_tick: distance_in.signum(),
                ..Default::default()
            },
            _ => StubMotion::default(),
        });
        let mut mech = SimMechanisms::new();
        run_on(&mut stub, &mut mech, wait_until_change_speed);

        // The speed is raised exactly 6 ticks into each creeping drive
        let issue_pos: Vec<_> = stub
            .calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, StubCall::Issue(MotionCommand::Drive { .. })))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(issue_pos.len(), 2);

        for i in issue_pos {
            assert_eq!(stub.calls[i + 7], StubCall::SetMaxSpeed(DRIVE_SPEED));
            assert!(stub.calls[i + 1..i + 7]
                .iter()
                .all(|c| matches!(c, StubCall::Wait(_))));
        }
        assert_eq!(stub.issued()[0], MotionCommand::drive(24.0, CREEP_SPEED));
    }

    #[test]
    fn test_intake_starts_at_waypoint() {
        let mut stub = StubDrive::with_profile(|_| StubMotion {
            ticks_per_waypoint: Some(3),
            chain_after: 10,
            settle_after: 12,
            ..Default::default()
        });
        let mut mech = SimMechanisms::new();
        run_on(&mut stub, &mut mech, odom_pure_pursuit_wait_until_example);

        // Waypoint 1 is passed on the 6th tick, the path settles on the 12th
        assert_eq!(stub.num_waits(), 12);
        assert_eq!(
            mech.history,
            vec![
                MechDemand::Motor(MotorId::Intake, 127),
                MechDemand::Motor(MotorId::Intake, 0)
            ]
        );
    }

    #[test]
    fn test_routines_on_sim() {
        let routines: [Routine; 3] = [drive_example, motion_chaining, wait_until_change_speed];

        for routine in routines.iter() {
            let mut sim = SimDrive::new(DriveConfig::default(), SimParams::default());
            let mut mech = SimMechanisms::new();
            run_on(&mut sim, &mut mech, *routine);

            // Each of these returns to where it started
            let pose = sim.pose();
            assert!(pose.x_in.abs() < 1.5, "x = {}", pose.x_in);
            assert!(pose.y_in.abs() < 1.5, "y = {}", pose.y_in);
            assert!(!sim.interfered());
        }
    }

    #[test]
    fn test_interfered_routine_tugs_free() {
        let mut sim = SimDrive::new(
            DriveConfig::default(),
            SimParams {
                wall_y_in: Some(12.0),
                ..Default::default()
            },
        );
        let mut mech = SimMechanisms::new();
        run_on(&mut sim, &mut mech, interfered_example);

        // Stalled at the wall, escaped backwards and never turned
        assert!(!sim.interfered());
        assert!(sim.pose().y_in < 0.0);
        assert!(sim.heading_deg().abs() < 1.0);
    }
}
