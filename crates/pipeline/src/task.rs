//! Model of a single task flowing through the input, compute and output stages.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{
    error::TaskError,
    resource::{ResourceClass, StageResources, TaskKind},
    stage::Stage,
};

/// Time of each stage of a task.
///
/// Input and output stages are measured in whole ticks while compute time may be fractional.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageDurations {
    pub input: u64,
    pub compute: f64,
    pub output: u64,
}

impl StageDurations {
    pub fn new(input: u64, compute: f64, output: u64) -> Self {
        StageDurations { input, compute, output }
    }

    /// Time of a given stage.
    pub fn get(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Input => self.input as f64,
            Stage::Computing => self.compute,
            Stage::Output => self.output as f64,
        }
    }

    /// Sum over all stages.
    pub fn total(&self) -> f64 {
        self.input as f64 + self.compute + self.output as f64
    }
}

/// Result of a single [Task::tick].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    /// Stage the tick was charged to.
    pub stage: Stage,
    /// Resource class of that stage.
    pub resource: ResourceClass,
    /// Amount of time consumed, `1` unless the compute stage had less than one tick left.
    pub consumed: f64,
    /// Whether the stage ran out of time with this tick.
    pub stage_finished: bool,
}

/// Largest total task time for which every tick is exactly representable in [Task::time_left].
pub const MAX_TASK_TIME: u64 = 1 << 53;

/// Serialized form of a task used to create it anew.
///
/// Only the configuration is read back, progress fields of a serialized [Task] are ignored.
#[derive(Deserialize)]
struct TaskConfig {
    job: String,
    #[serde(default)]
    kind: Option<TaskKind>,
    resources: StageResources,
    durations: StageDurations,
}

impl TryFrom<TaskConfig> for Task {
    type Error = TaskError;

    fn try_from(config: TaskConfig) -> Result<Self, Self::Error> {
        if let Some(kind) = config.kind {
            if kind.resources() != config.resources {
                return Err(TaskError::InvalidArgument(format!(
                    "resources {:?} don't match {} preset",
                    config.resources,
                    kind.name()
                )));
            }
        }
        Task::build(config.job, config.kind, config.resources, config.durations)
    }
}

/// Task which passes through [Stage::Input], [Stage::Computing] and [Stage::Output] in order.
///
/// The task is owned by a driver which calls [tick](Task::tick) once per simulated time unit
/// and uses [current_resource_class](Task::current_resource_class) to decide which resource the task
/// is currently using. A deserialized task always starts from the beginning of its input stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "TaskConfig")]
pub struct Task {
    job: String,
    kind: Option<TaskKind>,
    resources: StageResources,
    durations: StageDurations,
    remaining: StageDurations,
    current_stage: Stage,
}

impl Task {
    /// Creates new task with given resource classes of input and output stages.
    pub fn new(
        job: impl Into<String>,
        resources: StageResources,
        input: u64,
        compute: f64,
        output: u64,
    ) -> Result<Self, TaskError> {
        Self::build(job.into(), None, resources, StageDurations::new(input, compute, output))
    }

    /// Creates new task from a preset.
    pub fn with_kind(
        kind: TaskKind,
        job: impl Into<String>,
        input: u64,
        compute: f64,
        output: u64,
    ) -> Result<Self, TaskError> {
        Self::build(
            job.into(),
            Some(kind),
            kind.resources(),
            StageDurations::new(input, compute, output),
        )
    }

    /// Creates new disk-to-disk task.
    pub fn map(job: impl Into<String>, input: u64, compute: f64, output: u64) -> Result<Self, TaskError> {
        Self::with_kind(TaskKind::Map, job, input, compute, output)
    }

    /// Creates new network-to-disk task.
    pub fn reduce(job: impl Into<String>, input: u64, compute: f64, output: u64) -> Result<Self, TaskError> {
        Self::with_kind(TaskKind::Reduce, job, input, compute, output)
    }

    fn build(
        job: String,
        kind: Option<TaskKind>,
        resources: StageResources,
        durations: StageDurations,
    ) -> Result<Self, TaskError> {
        if !durations.compute.is_finite() || durations.compute < 0.0 {
            return Err(TaskError::InvalidArgument(format!(
                "compute time must be a non-negative number, got {}",
                durations.compute
            )));
        }
        let whole = durations.input.checked_add(durations.output).unwrap_or(u64::MAX);
        if whole > MAX_TASK_TIME || whole as f64 + durations.compute > MAX_TASK_TIME as f64 {
            return Err(TaskError::InvalidArgument(format!(
                "total task time must not exceed {}",
                MAX_TASK_TIME
            )));
        }
        Ok(Task {
            job,
            kind,
            resources,
            durations,
            remaining: durations,
            current_stage: Stage::Input,
        })
    }

    /// Label of the job this task belongs to.
    pub fn job(&self) -> &str {
        &self.job
    }

    /// Preset the task was created from, `None` for tasks with custom resources.
    pub fn kind(&self) -> Option<TaskKind> {
        self.kind
    }

    pub fn resources(&self) -> StageResources {
        self.resources
    }

    /// Stage durations given on construction.
    pub fn durations(&self) -> StageDurations {
        self.durations
    }

    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    /// Resource class of a given stage.
    pub fn resource_class(&self, stage: Stage) -> ResourceClass {
        match stage {
            Stage::Input => self.resources.input,
            Stage::Computing => ResourceClass::Cpu,
            Stage::Output => self.resources.output,
        }
    }

    /// Resource class of the current stage.
    pub fn current_resource_class(&self) -> ResourceClass {
        self.resource_class(self.current_stage)
    }

    /// Remaining time of a given stage.
    pub fn stage_time_remaining(&self, stage: Stage) -> f64 {
        self.remaining.get(stage)
    }

    /// Remaining time of the current stage.
    pub fn current_stage_time_remaining(&self) -> f64 {
        self.remaining.get(self.current_stage)
    }

    /// Remaining time over all stages, including ones already passed.
    pub fn time_left(&self) -> f64 {
        self.remaining.total()
    }

    /// Returns whether the output stage has no time left.
    ///
    /// This doesn't look at the other stages: a task created with zero output time is complete
    /// right away, even though its input and compute time was never consumed.
    pub fn is_complete(&self) -> bool {
        self.remaining.output == 0
    }

    /// Consumes one unit of time of the current stage and moves to the next stage once it runs out.
    ///
    /// If the current stage is already empty (it was created with zero time or entered by
    /// [force_complete_current_stage](Task::force_complete_current_stage) from a stage before an empty one),
    /// the task first moves forward to the first stage which still has time.
    pub fn tick(&mut self) -> Result<TickOutcome, TaskError> {
        if self.time_left() <= 0.0 {
            return Err(TaskError::ExhaustedTime);
        }
        self.skip_empty_stages();

        let stage = self.current_stage;
        let consumed = match stage {
            Stage::Input => {
                self.remaining.input -= 1;
                1.0
            }
            Stage::Computing => {
                let consumed = self.remaining.compute.min(1.0);
                self.remaining.compute -= consumed;
                consumed
            }
            Stage::Output => {
                self.remaining.output -= 1;
                1.0
            }
        };

        let stage_finished = self.remaining.get(stage) == 0.0;
        if stage_finished {
            log::trace!("task of job {}: {} stage finished", self.job, stage);
            if let Some(next) = stage.next() {
                self.current_stage = next;
            }
        }

        Ok(TickOutcome {
            stage,
            resource: self.resource_class(stage),
            consumed,
            stage_finished,
        })
    }

    /// Drops all remaining time of the current stage and moves to the next one.
    ///
    /// Returns the amount of time dropped. Fails without changing the task when it is already at
    /// the output stage.
    pub fn force_complete_current_stage(&mut self) -> Result<f64, TaskError> {
        let stage = self.current_stage;
        let next = stage.next().ok_or(TaskError::InvalidTransition { stage })?;
        let abandoned = self.remaining.get(stage);
        match stage {
            Stage::Input => self.remaining.input = 0,
            Stage::Computing => self.remaining.compute = 0.0,
            Stage::Output => unreachable!(),
        }
        self.current_stage = next;
        log::trace!(
            "task of job {}: {} stage forced to complete with {} time left",
            self.job,
            stage,
            abandoned
        );
        Ok(abandoned)
    }

    fn skip_empty_stages(&mut self) {
        while self.current_stage_time_remaining() == 0.0 {
            match self.current_stage.next() {
                Some(next) => self.current_stage = next,
                None => break,
            }
        }
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with job name: {}, {} (input) time of {}, cpu time of {}, and {} (output) time of {} (total: {})",
            self.kind.map(|kind| kind.name()).unwrap_or("Task"),
            self.job,
            self.resources.input,
            self.durations.input,
            self.durations.compute,
            self.resources.output,
            self.durations.output,
            self.time_left()
        )
    }
}
