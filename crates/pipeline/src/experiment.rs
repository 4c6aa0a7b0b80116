use std::{
    io::Write,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use threadpool::ThreadPool;

use crate::{driver::PipelineSimulation, generator::GeneratorConfig, run_stats::RunStats};

struct Run {
    config: (String, Arc<GeneratorConfig>),
    seed: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub config: String,
    pub seed: u64,
    /// `None` if the generator config couldn't produce a workload.
    pub run_stats: Option<RunStats>,
}

pub struct Experiment {
    configs: Vec<(String, GeneratorConfig)>,
    seeds: Vec<u64>,
    traces_folder: Option<PathBuf>,
}

impl Experiment {
    pub fn new(configs: Vec<(String, GeneratorConfig)>, seeds: Vec<u64>, traces_folder: Option<PathBuf>) -> Self {
        Self {
            configs,
            seeds,
            traces_folder,
        }
    }

    pub fn run(self, threads: usize) -> Vec<RunResult> {
        if let Some(dir) = &self.traces_folder {
            if let Err(e) = std::fs::create_dir_all(dir) {
                log::error!("can't create traces folder {}: {}", dir.display(), e);
            }
        }

        let runs = self
            .configs
            .into_iter()
            .map(|(name, config)| (name, Arc::new(config)))
            .cartesian_product(self.seeds)
            .map(|(config, seed)| Run { config, seed })
            .collect::<Vec<_>>();

        let total_runs = runs.len();

        let finished_run_atomic = Arc::new(AtomicUsize::new(0));
        let results = Arc::new(Mutex::new(Vec::new()));

        let pool = ThreadPool::new(threads.max(1));
        let start_time = Instant::now();
        for run in runs.into_iter() {
            let finished_run_atomic = finished_run_atomic.clone();
            let results = results.clone();
            let traces_folder = self.traces_folder.clone();
            pool.execute(move || {
                let (name, config) = run.config;
                let run_stats = match config.generate(run.seed) {
                    Ok(plan) => {
                        let sim = PipelineSimulation::new(
                            run.seed,
                            plan,
                            traces_folder.map(|folder| folder.join(format!("{}_{}.json", name, run.seed))),
                        );
                        Some(sim.run())
                    }
                    Err(e) => {
                        log::error!("can't generate workload {} with seed {}: {}", name, run.seed, e);
                        None
                    }
                };

                if let Ok(mut results) = results.lock() {
                    results.push(RunResult {
                        config: name,
                        seed: run.seed,
                        run_stats,
                    });
                }

                let finished_runs = finished_run_atomic.fetch_add(1, Ordering::SeqCst) + 1;

                let elapsed = start_time.elapsed();
                let remaining = Duration::from_secs_f64(
                    elapsed.as_secs_f64() / finished_runs as f64 * (total_runs - finished_runs) as f64,
                );
                print!("\r{}", " ".repeat(70));
                print!(
                    "\rFinished {}/{} [{}%] runs in {:.2?}, remaining time: {:.2?}",
                    finished_runs,
                    total_runs,
                    (finished_runs as f64 * 100. / total_runs as f64).round() as i32,
                    elapsed,
                    remaining
                );
                let _ = std::io::stdout().flush();
            });
        }

        pool.join();

        print!("\r{}", " ".repeat(70));
        println!("\rFinished {} runs in {:.2?}", total_runs, start_time.elapsed());

        let mut results = match Arc::try_unwrap(results) {
            Ok(results) => results.into_inner().unwrap_or_else(|e| e.into_inner()),
            Err(results) => results.lock().map(|r| r.clone()).unwrap_or_default(),
        };
        results.sort_by(|a, b| a.config.cmp(&b.config).then(a.seed.cmp(&b.seed)));
        results
    }
}
