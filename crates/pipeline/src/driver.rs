//! Reference driver which advances tasks one tick at a time on top of dslab-core.
//!
//! Every active task progresses on every tick, there is no notion of resource capacity.

use std::{cell::RefCell, collections::VecDeque, path::PathBuf, rc::Rc};

use dslab_core::{cast, log_debug, log_error, log_info, log_warn, Event, EventHandler, Simulation, SimulationContext};
use serde::Serialize;

use crate::{
    run_stats::RunStats,
    stage::Stage,
    task::Task,
    trace::{Trace, TraceEvent},
    workload::{TaskPlan, WorkloadPlan},
};

#[derive(Clone, Serialize)]
pub struct Start {}

#[derive(Clone, Serialize)]
pub struct Tick {}

struct ActiveTask {
    id: usize,
    admitted_at: f64,
    stage: Stage,
    task: Task,
}

pub struct TickDriver {
    pending: VecDeque<(usize, TaskPlan)>,
    active: Vec<ActiveTask>,
    first_admission: Option<f64>,
    last_completion: f64,
    run_stats: RunStats,
    trace: Trace,
    ctx: SimulationContext,
}

impl TickDriver {
    pub fn new(plan: WorkloadPlan, ctx: SimulationContext) -> Self {
        TickDriver {
            pending: plan.tasks.into_iter().enumerate().collect(),
            active: Vec::new(),
            first_admission: None,
            last_completion: 0.0,
            run_stats: RunStats::new(),
            trace: Trace::new(),
            ctx,
        }
    }

    pub fn run_stats(&self) -> &RunStats {
        &self.run_stats
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    fn admit_tasks(&mut self) {
        let now = self.ctx.time();
        while self
            .pending
            .front()
            .is_some_and(|(_, plan)| plan.start_time as f64 <= now)
        {
            let Some((id, plan)) = self.pending.pop_front() else {
                break;
            };
            log_debug!(self.ctx, "admitted task {}: {}", id, plan.task);
            self.first_admission.get_or_insert(now);
            self.run_stats.register_task(plan.task.kind());
            self.trace.log(TraceEvent::TaskAdmitted {
                time: now,
                task_id: id,
                job: plan.task.job().to_string(),
                summary: plan.task.to_string(),
            });

            let active = ActiveTask {
                id,
                admitted_at: now,
                stage: plan.task.current_stage(),
                task: plan.task,
            };
            if active.task.is_complete() {
                self.complete_task(active, now);
            } else {
                self.trace.log(TraceEvent::StageStarted {
                    time: now,
                    task_id: id,
                    stage: active.stage,
                    resource: active.task.current_resource_class(),
                });
                self.active.push(active);
            }
        }
    }

    fn tick_tasks(&mut self) {
        let now = self.ctx.time();
        let mut still_active = Vec::with_capacity(self.active.len());
        for mut active in std::mem::take(&mut self.active) {
            let outcome = match active.task.tick() {
                Ok(outcome) => outcome,
                Err(e) => {
                    log_error!(self.ctx, "task {} dropped: {}", active.id, e);
                    self.run_stats.register_failure();
                    continue;
                }
            };
            if outcome.stage != active.stage {
                // empty stages were passed without consuming time
                active.stage = outcome.stage;
                self.trace.log(TraceEvent::StageStarted {
                    time: now,
                    task_id: active.id,
                    stage: outcome.stage,
                    resource: outcome.resource,
                });
            }
            self.run_stats.register_usage(outcome.resource, outcome.consumed);

            if active.task.is_complete() {
                self.complete_task(active, now + 1.0);
                continue;
            }
            if active.task.current_stage() != active.stage {
                active.stage = active.task.current_stage();
                log_debug!(self.ctx, "task {} moved to {} stage", active.id, active.stage);
                self.trace.log(TraceEvent::StageStarted {
                    time: now + 1.0,
                    task_id: active.id,
                    stage: active.stage,
                    resource: active.task.current_resource_class(),
                });
            }
            still_active.push(active);
        }
        self.active = still_active;
    }

    fn complete_task(&mut self, active: ActiveTask, time: f64) {
        let time_left = active.task.time_left();
        if time_left > 0.0 {
            log_warn!(
                self.ctx,
                "task {} has no output time left but {} time remains in earlier stages",
                active.id,
                time_left
            );
        }
        log_debug!(self.ctx, "task {} completed at {}", active.id, time);
        self.run_stats.register_completion(time - active.admitted_at, time_left);
        self.last_completion = self.last_completion.max(time);
        self.trace.log(TraceEvent::TaskCompleted {
            time,
            task_id: active.id,
            time_left,
        });
    }

    fn schedule_next_tick(&mut self) {
        let now = self.ctx.time();
        if !self.active.is_empty() {
            self.ctx.emit_self(Tick {}, 1.0);
        } else if let Some((_, plan)) = self.pending.front() {
            self.ctx.emit_self(Tick {}, (plan.start_time as f64 - now).max(0.0));
        } else {
            log_info!(self.ctx, "all tasks completed");
        }
    }

    /// Compute final stats after the simulation is over.
    pub fn finalize(&mut self) {
        let makespan = self
            .first_admission
            .map(|first| self.last_completion - first)
            .unwrap_or(0.0);
        self.run_stats.finalize(makespan);
    }
}

impl EventHandler for TickDriver {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            Start {} => {
                log_info!(self.ctx, "starting with {} tasks", self.pending.len());
                self.schedule_next_tick();
            }
            Tick {} => {
                self.admit_tasks();
                self.tick_tasks();
                self.schedule_next_tick();
            }
        })
    }
}

/// Simulation of a workload driven by [TickDriver].
pub struct PipelineSimulation {
    pub sim: Simulation,
    plan: WorkloadPlan,
    trace_path: Option<PathBuf>,
}

impl PipelineSimulation {
    pub fn new(seed: u64, plan: WorkloadPlan, trace_path: Option<PathBuf>) -> Self {
        PipelineSimulation {
            sim: Simulation::new(seed),
            plan,
            trace_path,
        }
    }

    pub fn run(self) -> RunStats {
        self.run_with_trace().0
    }

    /// Run simulation and return its trace alongside the stats.
    pub fn run_with_trace(mut self) -> (RunStats, Trace) {
        let driver = Rc::new(RefCell::new(TickDriver::new(
            self.plan,
            self.sim.create_context("driver"),
        )));
        let driver_id = self.sim.add_handler("driver", driver.clone());

        self.sim.create_context("root").emit_now(Start {}, driver_id);
        self.sim.step_until_no_events();

        driver.borrow_mut().finalize();
        let driver = driver.borrow();
        if let Some(path) = &self.trace_path {
            if let Err(e) = driver.trace().save(path) {
                log::error!("can't write trace to {}: {}", path.display(), e);
            }
        }
        (driver.run_stats().clone(), driver.trace().clone())
    }
}
