//! Synthetic workload generator.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{
    error::WorkloadError,
    resource::TaskKind,
    task::Task,
    workload::{TaskPlan, WorkloadPlan},
};

/// Inclusive range of stage times.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

/// Distribution of stage times for tasks of one kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskShape {
    pub input: Range<u64>,
    pub compute: Range<f64>,
    pub output: Range<u64>,
}

impl TaskShape {
    fn validate(&self, job: &str) -> Result<(), WorkloadError> {
        if self.input.min > self.input.max || self.output.min > self.output.max {
            return Err(WorkloadError::InvalidGenerator(format!("job {job}: empty input or output range")));
        }
        if !(self.compute.min >= 0.0 && self.compute.min <= self.compute.max && self.compute.max.is_finite()) {
            return Err(WorkloadError::InvalidGenerator(format!("job {job}: bad compute range")));
        }
        Ok(())
    }

    fn sample(&self, rng: &mut Pcg64) -> (u64, f64, u64) {
        (
            rng.gen_range(self.input.min..=self.input.max),
            rng.gen_range(self.compute.min..=self.compute.max),
            rng.gen_range(self.output.min..=self.output.max),
        )
    }
}

/// Description of a job split into map and reduce tasks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    #[serde(default)]
    pub start_time: u64,
    pub map_tasks: usize,
    pub reduce_tasks: usize,
    pub map: TaskShape,
    pub reduce: TaskShape,
}

/// Generator config, a list of jobs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<JobConfig>,
}

impl GeneratorConfig {
    /// Read [GeneratorConfig] from YAML file.
    pub fn from_yaml<P: AsRef<Path>>(file: P) -> Result<Self, WorkloadError> {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file).map_err(|source| WorkloadError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| WorkloadError::Yaml {
            path: file.to_path_buf(),
            source,
        })
    }

    /// Generate workload. The same seed always gives the same workload.
    pub fn generate(&self, seed: u64) -> Result<WorkloadPlan, WorkloadError> {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut tasks = Vec::new();
        for job in self.jobs.iter() {
            job.map.validate(&job.name)?;
            job.reduce.validate(&job.name)?;
            let kinds = std::iter::repeat(TaskKind::Map)
                .take(job.map_tasks)
                .chain(std::iter::repeat(TaskKind::Reduce).take(job.reduce_tasks));
            for kind in kinds {
                let shape = match kind {
                    TaskKind::Map => &job.map,
                    TaskKind::Reduce => &job.reduce,
                };
                let (input, compute, output) = shape.sample(&mut rng);
                let task = Task::with_kind(kind, job.name.clone(), input, compute, output).map_err(|source| {
                    WorkloadError::InvalidTask {
                        index: tasks.len(),
                        source,
                    }
                })?;
                tasks.push(TaskPlan {
                    start_time: job.start_time,
                    task,
                });
            }
        }
        Ok(WorkloadPlan::new(tasks))
    }
}
