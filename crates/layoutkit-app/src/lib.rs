//! LayoutKit replay shell.
//!
//! Loads a JSON script describing a scene, a selection and a list of
//! pointer gestures, plays the gestures through the transform tool and
//! reports what happened.

pub mod error;
pub mod replay;
pub mod script;

pub use error::{AppError, AppResult};
pub use replay::{ItemReport, Replay, ReplayReport, ReportEvent};
pub use script::{Gesture, Script, load_script};

use std::path::Path;

/// Load the script at `path`, replay it and return the report as JSON.
pub fn run_script(path: &Path) -> AppResult<String> {
    let script = load_script(path)?;
    let report = Replay::new(&script)?.run(&script.gestures)?;
    report.to_json()
}
