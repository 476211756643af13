//! # Motion script interpreter module
//!
//! This module provides an interpreter for motion scripts, allowing an
//! autonomous routine to be written as data rather than compiled in.
//!
//! A script is a sequence of statements, each a single JSON encoded
//! [`ScriptStep`] terminated by a `;`. Lines beginning with `#` are comments.
//!
//! ```text
//! # Motion chaining
//! {"Run": {"cmd": {"Drive": {"distance_in": 24.0, "max_speed": 110, "slew": true}}, "wait": "FullSettle"}};
//! {"Run": {"cmd": {"Turn": {"angle_deg": 45.0, "max_speed": 90, "angle_mode": "Shortest"}}, "wait": "QuickChain"}};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use auton_if::script::{ScriptStep, StepParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.next_step` to
/// acquire each step in order.
pub struct ScriptInterpreter {
    script_path: PathBuf,
    steps: VecDeque<ScriptStep>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid step at statement {0}: {1}")]
    InvalidStep(usize, StepParseError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let steps = Self::parse(&script)?;

        Ok(ScriptInterpreter {
            script_path: path,
            steps
        })
    }

    /// Create a new interpreter directly from the script's text.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        Ok(ScriptInterpreter {
            script_path: PathBuf::new(),
            steps: Self::parse(script)?
        })
    }

    /// Pop the next step of the script, or `None` at the end of the script.
    pub fn next_step(&mut self) -> Option<ScriptStep> {
        self.steps.pop_front()
    }

    /// Get the number of steps remaining in the script
    pub fn get_num_steps(&self) -> usize {
        self.steps.len()
    }

    /// Path the script was loaded from. Empty for scripts built from a string.
    pub fn get_path(&self) -> &Path {
        &self.script_path
    }

    fn parse(script: &str) -> Result<VecDeque<ScriptStep>, ScriptError> {
        // Empty queue of steps
        let mut step_queue: VecDeque<ScriptStep> = VecDeque::new();

        // A statement starts at the beginning of a line with an opening brace
        // and runs up to the terminating semicolon. JSON never contains a
        // bare `;` so this is unambiguous. Comment lines never match as they
        // don't start with a brace.
        let re = RegexBuilder::
            new(r"^\s*(\{[^;]*\})\s*;")
            .multi_line(true)
            .build()
            .unwrap();

        for (i, cap) in re.captures_iter(script).enumerate() {
            let step = ScriptStep::from_json(&cap[1])
                .map_err(|e| ScriptError::InvalidStep(i, e))?;

            step_queue.push_back(step);
        }

        if step_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(step_queue)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use auton_if::{
        mech::MotorId,
        motion::{MotionCommand, WaitMode}
    };
    use std::io::Write;

    const SCRIPT: &str = r#"
# Drive forward with the intake running
{"Motor": {"id": "Intake", "power": 127}};
{"Run": {
    "cmd": {"Drive": {"distance_in": 24.0, "max_speed": 110, "slew": true}},
    "wait": {"UntilProgress": 6.0}
}};
{"SetMaxSpeed": {"speed": 40}};
# {"Delay": {"ms": 100000}};
{"Wait": {"wait": "FullSettle"}};
"#;

    #[test]
    fn test_parse_script() {
        let mut si = ScriptInterpreter::from_str(SCRIPT).unwrap();

        assert_eq!(si.get_num_steps(), 4);
        assert_eq!(
            si.next_step(),
            Some(ScriptStep::Motor { id: MotorId::Intake, power: 127 })
        );
        assert_eq!(
            si.next_step(),
            Some(ScriptStep::Run {
                cmd: MotionCommand::drive(24.0, 110),
                wait: WaitMode::UntilProgress(6.0)
            })
        );
        assert_eq!(si.next_step(), Some(ScriptStep::SetMaxSpeed { speed: 40 }));
        assert_eq!(
            si.next_step(),
            Some(ScriptStep::Wait { wait: WaitMode::FullSettle })
        );
        assert_eq!(si.next_step(), None);
    }

    #[test]
    fn test_script_errors() {
        assert!(matches!(
            ScriptInterpreter::from_str("# nothing here\n"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_str("{\"Delay\": {\"ms\": 10}};\n{\"Fly\": {}};"),
            Err(ScriptError::InvalidStep(1, _))
        ));
        assert!(matches!(
            ScriptInterpreter::new("/does/not/exist.ars"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }

    #[test]
    fn test_load_script_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SCRIPT).unwrap();

        let si = ScriptInterpreter::new(file.path()).unwrap();
        assert_eq!(si.get_num_steps(), 4);
        assert_eq!(si.get_path(), file.path());
    }
}
