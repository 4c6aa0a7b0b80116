//! Stages of a task pipeline.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// One of three ordered phases every task passes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Input,
    Computing,
    Output,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Input, Stage::Computing, Stage::Output];

    /// Position of the stage in the pipeline, `0..=2`.
    pub fn index(&self) -> usize {
        match self {
            Stage::Input => 0,
            Stage::Computing => 1,
            Stage::Output => 2,
        }
    }

    /// Stage which follows this one, `None` after [Stage::Output].
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Input => Some(Stage::Computing),
            Stage::Computing => Some(Stage::Output),
            Stage::Output => None,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Input => "input",
            Stage::Computing => "computing",
            Stage::Output => "output",
        })
    }
}
