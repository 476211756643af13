//! # Motion script runner
//!
//! Executes the steps of a loaded motion script in order through an [`Autonomous`] context.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};

use auton_if::script::ScriptStep;
use util::script_interpreter::ScriptInterpreter;

use crate::{
    auton::Autonomous,
    exec::ExecError,
    recovery::RecoveryOutcome,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptReport {
    /// Number of steps executed.
    pub num_steps: usize,

    /// Number of steps left unexecuted because the script ended early.
    pub num_skipped: usize,

    /// Outcome of the recovery which ended the script, if any.
    pub recovery: Option<RecoveryOutcome>,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run every step of the script.
///
/// A `Recover` step reached while the last motion is interfered with runs the recovery protocol
/// and then ends the script, whatever the outcome of the recovery.
pub fn run_script(
    mut si: ScriptInterpreter,
    auton: &mut Autonomous,
) -> Result<ScriptReport, ExecError> {
    info!(
        "Running script {:?} with {} steps",
        si.get_path(),
        si.get_num_steps()
    );

    let mut num_steps = 0;

    while let Some(step) = si.next_step() {
        debug!("Step {}: {:?}", num_steps, step);
        num_steps += 1;

        match step {
            ScriptStep::Run { cmd, wait } => {
                auton.run(cmd, wait)?;
            }
            ScriptStep::Start { cmd } => {
                auton.start(cmd)?;
            }
            ScriptStep::Wait { wait } => match auton.exec().active() {
                Some(handle) => {
                    auton.wait(handle, wait)?;
                }
                None => warn!("Nothing to wait for, no motion has been issued"),
            },
            ScriptStep::Delay { ms } => auton.delay(ms),
            ScriptStep::SetMaxSpeed { speed } => auton.set_max_speed(speed),
            ScriptStep::Motor { id, power } => auton.motor(id, power),
            ScriptStep::Pneumatic { id, extended } => auton.pneumatic(id, extended),
            ScriptStep::Recover { max_attempts } => {
                if auton.interfered() {
                    let outcome = auton.tug(max_attempts)?;
                    let num_skipped = si.get_num_steps();

                    warn!(
                        "Script ended by interference, {} steps skipped",
                        num_skipped
                    );

                    return Ok(ScriptReport {
                        num_steps,
                        num_skipped,
                        recovery: Some(outcome),
                    });
                }
            }
        }
    }

    info!("Script complete");

    Ok(ScriptReport {
        num_steps,
        num_skipped: 0,
        recovery: None,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        drive::stub::{StubCall, StubDrive, StubMotion},
        exec::{ExecParams, Executor},
        mech::{MechDemand, SimMechanisms},
        recovery::{RecoveryParams, RecoveryState},
    };
    use auton_if::{mech::MotorId, motion::MotionCommand};

    const SCRIPT: &str = r#"
# Drive into the goal, back off if something is in the way
{"Motor": {"id": "Intake", "power": 127}};
{"Run": {"cmd": {"Drive": {"distance_in": 24.0, "max_speed": 110, "slew": true}}, "wait": "FullSettle"}};
{"Recover": {"max_attempts": 3}};
{"Run": {"cmd": {"Turn": {"angle_deg": 90.0, "max_speed": 90, "angle_mode": "Shortest"}}, "wait": "QuickChain"}};
{"Delay": {"ms": 250}};
{"Motor": {"id": "Intake", "power": 0}};
"#;

    fn run(stub: &mut StubDrive, mech: &mut SimMechanisms) -> ScriptReport {
        let mut auton = Autonomous::new(
            Executor::new(stub, ExecParams::default()),
            mech,
            RecoveryParams::default(),
        );
        run_script(ScriptInterpreter::from_str(SCRIPT).unwrap(), &mut auton).unwrap()
    }

    #[test]
    fn test_script_runs_to_end() {
        let mut stub = StubDrive::new();
        let mut mech = SimMechanisms::new();
        let report = run(&mut stub, &mut mech);

        assert_eq!(
            report,
            ScriptReport {
                num_steps: 6,
                num_skipped: 0,
                recovery: None
            }
        );
        assert_eq!(
            stub.issued(),
            vec![MotionCommand::drive(24.0, 110), MotionCommand::turn(90.0, 90)]
        );
        assert_eq!(
            mech.history,
            vec![
                MechDemand::Motor(MotorId::Intake, 127),
                MechDemand::Motor(MotorId::Intake, 0)
            ]
        );
    }

    #[test]
    fn test_interference_ends_script() {
        // Only the scripted drive is obstructed
        let mut stub = StubDrive::with_profile(|cmd| StubMotion {
            interfered: *cmd == MotionCommand::drive(24.0, 110),
            ..Default::default()
        });
        let mut mech = SimMechanisms::new();
        let report = run(&mut stub, &mut mech);

        assert_eq!(report.num_steps, 3);
        assert_eq!(report.num_skipped, 3);
        let outcome = report.recovery.unwrap();
        assert_eq!(outcome.state, RecoveryState::Succeeded);
        assert_eq!(outcome.attempts, 1);

        // The turn is never reached and the intake is left running
        assert!(!stub.issued().iter().any(|c| c.is_angular()));
        assert_eq!(mech.history.len(), 1);
    }

    #[test]
    fn test_wait_modes_from_script() {
        let mut stub = StubDrive::with_profile(|_| StubMotion {
            chain_after: 2,
            settle_after: 6,
            ..Default::default()
        });
        let mut mech = SimMechanisms::new();
        run(&mut stub, &mut mech);

        // 6 polls for the full settle, 2 for the chain and one for the delay
        assert_eq!(stub.num_waits(), 9);
    }

    #[test]
    fn test_start_then_wait() {
        let script = r#"
{"Wait": {"wait": "FullSettle"}};
{"Start": {"cmd": {"Drive": {"distance_in": 24.0, "max_speed": 30, "slew": true}}}};
{"Delay": {"ms": 100}};
{"SetMaxSpeed": {"speed": 110}};
{"Wait": {"wait": "FullSettle"}};
"#;
        let mut stub = StubDrive::new();
        let mut mech = SimMechanisms::new();
        {
            let mut auton = Autonomous::new(
                Executor::new(&mut stub, ExecParams::default()),
                &mut mech,
                RecoveryParams::default(),
            );
            let report =
                run_script(ScriptInterpreter::from_str(script).unwrap(), &mut auton).unwrap();
            assert_eq!(report.num_steps, 5);
        }

        // The first wait has nothing to block on, the second blocks on the started drive
        assert_eq!(stub.issued().len(), 1);
        assert_eq!(stub.num_waits(), 4);
        assert!(stub.calls.contains(&StubCall::SetMaxSpeed(110)));
    }
}
