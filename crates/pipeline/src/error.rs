//! Errors returned by tasks and workload loaders.

use std::path::PathBuf;

use thiserror::Error;

use crate::stage::Stage;

/// Contract violations of the [Task](crate::task::Task) state machine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    /// [tick](crate::task::Task::tick) was called on a task with no time left.
    #[error("trying to decrement more time than what's left")]
    ExhaustedTime,
    /// [force_complete_current_stage](crate::task::Task::force_complete_current_stage) was called
    /// when there is no next stage.
    #[error("can't transition past the {stage} stage")]
    InvalidTransition { stage: Stage },
    /// Task was constructed with an unusable duration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failures while loading a workload or generator config.
#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("can't read file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't parse YAML from file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("can't parse YAML: {0}")]
    InlineYaml(#[from] serde_yaml::Error),
    #[error("invalid task #{index}: {source}")]
    InvalidTask {
        index: usize,
        #[source]
        source: TaskError,
    },
    #[error("invalid generator config: {0}")]
    InvalidGenerator(String),
}
