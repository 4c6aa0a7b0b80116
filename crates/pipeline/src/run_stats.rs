//! Some stats from a completed simulation.

use serde::{Deserialize, Serialize};

use crate::resource::{ResourceClass, TaskKind};

/// Some stats from a completed simulation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Time between the first admitted task and the last completed one.
    pub total_makespan: f64,
    /// Total number of admitted tasks.
    pub total_task_count: usize,
    /// Number of admitted map tasks.
    pub map_task_count: usize,
    /// Number of admitted reduce tasks.
    pub reduce_task_count: usize,
    /// Total number of completed tasks.
    pub completed_task_count: usize,
    /// Number of tasks dropped because of a state machine error.
    pub failed_task_count: usize,
    /// Average makespan of a task among completed tasks.
    pub average_task_makespan: f64,
    /// Minimum makespan of a task among completed tasks.
    pub min_task_makespan: f64,
    /// Maximum makespan of a task among completed tasks.
    pub max_task_makespan: f64,
    /// Time consumed by stages backed by the network.
    pub network_time: f64,
    /// Time consumed by compute stages.
    pub cpu_time: f64,
    /// Time consumed by stages backed by disks.
    pub disk_time: f64,
    /// Time left in tasks which were retired as complete with input or compute time still remaining.
    pub abandoned_time: f64,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            min_task_makespan: f64::MAX,
            ..Default::default()
        }
    }

    /// Register admitted task.
    pub fn register_task(&mut self, kind: Option<TaskKind>) {
        self.total_task_count += 1;
        match kind {
            Some(TaskKind::Map) => self.map_task_count += 1,
            Some(TaskKind::Reduce) => self.reduce_task_count += 1,
            None => {}
        }
    }

    /// Register completed task with given makespan and time which was left unconsumed.
    pub fn register_completion(&mut self, makespan: f64, abandoned_time: f64) {
        self.average_task_makespan = (self.average_task_makespan * self.completed_task_count as f64 + makespan)
            / (self.completed_task_count + 1) as f64;
        self.completed_task_count += 1;
        self.max_task_makespan = self.max_task_makespan.max(makespan);
        self.min_task_makespan = self.min_task_makespan.min(makespan);
        self.abandoned_time += abandoned_time;
    }

    pub fn register_failure(&mut self) {
        self.failed_task_count += 1;
    }

    /// Register time consumed from a resource of a given class.
    pub fn register_usage(&mut self, resource: ResourceClass, time: f64) {
        match resource {
            ResourceClass::Network => self.network_time += time,
            ResourceClass::Cpu => self.cpu_time += time,
            ResourceClass::Disk => self.disk_time += time,
        }
    }

    /// Finalize result given [total_makespan](RunStats::total_makespan).
    pub fn finalize(&mut self, makespan: f64) {
        self.total_makespan = makespan;
        if self.completed_task_count == 0 {
            self.min_task_makespan = 0.0;
        }
    }
}
