//! Tools for loading workloads from YAML files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::WorkloadError, resource::TaskKind, task::Task};

/// Struct representing a single [Task] submitted at a given time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct YamlTask {
    /// Job label.
    pub job: String,
    /// Task preset.
    pub kind: TaskKind,
    /// Tick at which the task is submitted to the driver.
    #[serde(default)]
    pub start_time: u64,
    /// Input stage time in ticks.
    pub input: u64,
    /// Compute stage time, may be fractional.
    pub compute: f64,
    /// Output stage time in ticks.
    pub output: u64,
}

/// YAML representation of a workload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct YamlWorkload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<YamlTask>,
}

/// Task together with the tick it is submitted at.
#[derive(Clone, Debug)]
pub struct TaskPlan {
    pub start_time: u64,
    pub task: Task,
}

/// Validated workload with tasks sorted by submission time.
#[derive(Clone, Debug, Default)]
pub struct WorkloadPlan {
    pub tasks: Vec<TaskPlan>,
}

impl WorkloadPlan {
    /// Builds plan from tasks in any order. Tasks with equal start time keep their relative order.
    pub fn new(mut tasks: Vec<TaskPlan>) -> Self {
        tasks.sort_by_key(|plan| plan.start_time);
        WorkloadPlan { tasks }
    }

    /// Read [WorkloadPlan] from YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self, WorkloadError> {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file).map_err(|source| WorkloadError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let yaml: YamlWorkload = serde_yaml::from_str(&content).map_err(|source| WorkloadError::Yaml {
            path: file.to_path_buf(),
            source,
        })?;
        Self::from_workload(yaml)
    }

    /// Parse [WorkloadPlan] from YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self, WorkloadError> {
        Self::from_workload(serde_yaml::from_str(content)?)
    }

    /// Validate every task of a workload.
    pub fn from_workload(workload: YamlWorkload) -> Result<Self, WorkloadError> {
        let tasks = workload
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                Task::with_kind(task.kind, task.job, task.input, task.compute, task.output)
                    .map(|built| TaskPlan {
                        start_time: task.start_time,
                        task: built,
                    })
                    .map_err(|source| WorkloadError::InvalidTask { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(tasks))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
