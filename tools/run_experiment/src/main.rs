use std::{
    collections::BTreeMap,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use dslab_pipeline::{
    experiment::{Experiment, RunResult},
    generator::GeneratorConfig,
};
use env_logger::Builder;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    generators: Vec<PathBuf>,
    seeds: Vec<u64>,
}

/// Runs batch experiment.
#[derive(Parser, Debug)]
struct Args {
    /// Path to config.
    #[arg(short, long)]
    config: PathBuf,

    /// Path to folder with traces.
    #[arg(short, long, default_value = None)]
    traces: Option<PathBuf>,

    /// Path to file with results.
    #[arg(short, long)]
    output: PathBuf,

    /// Do not run experiments, just read results from --output.
    #[arg(long)]
    precalculated: bool,

    /// Number of threads.
    #[arg(long, default_value_t = std::thread::available_parallelism().unwrap().get())]
    threads: usize,
}

fn filename(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .split('.')
        .next()
        .unwrap()
        .to_string()
}

struct ResultRow {
    name: String,
    runs: usize,
    avg_task_makespan: f64,
    avg_total_makespan: f64,
    cpu_share: f64,
    abandoned_share: f64,
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let config: Config = serde_yaml::from_str(&std::fs::read_to_string(args.config).expect("Can't read config file"))
        .expect("Can't parse config file");

    let result: Vec<RunResult> = if args.precalculated {
        serde_json::from_str(&std::fs::read_to_string(args.output).expect("Can't read file with result"))
            .expect("Can't parse file with result")
    } else {
        let experiment = Experiment::new(
            config
                .generators
                .into_iter()
                .enumerate()
                .map(|(i, path)| {
                    let generator = GeneratorConfig::from_yaml(&path).expect("Can't load generator config");
                    (format!("{}_{}", i, filename(&path)), generator)
                })
                .collect(),
            config.seeds,
            args.traces,
        );

        let result = experiment.run(args.threads);
        File::create(args.output)
            .expect("Can't create output file")
            .write_all(serde_json::to_string_pretty(&result).unwrap().as_bytes())
            .expect("Can't write to output file");
        result
    };

    let mut runs_by_config: BTreeMap<String, Vec<RunResult>> = BTreeMap::new();
    for run in result.into_iter() {
        runs_by_config.entry(run.config.clone()).or_default().push(run);
    }

    let rows = runs_by_config
        .into_iter()
        .map(|(name, runs)| {
            let stats = runs.iter().filter_map(|run| run.run_stats.as_ref()).collect::<Vec<_>>();
            let count = stats.len().max(1) as f64;
            ResultRow {
                name,
                runs: stats.len(),
                avg_task_makespan: stats.iter().map(|s| s.average_task_makespan).sum::<f64>() / count,
                avg_total_makespan: stats.iter().map(|s| s.total_makespan).sum::<f64>() / count,
                cpu_share: stats
                    .iter()
                    .map(|s| {
                        let total = s.network_time + s.cpu_time + s.disk_time;
                        if total > 0.0 {
                            s.cpu_time / total * 100.
                        } else {
                            0.0
                        }
                    })
                    .sum::<f64>()
                    / count,
                abandoned_share: stats
                    .iter()
                    .map(|s| {
                        let total = s.network_time + s.cpu_time + s.disk_time + s.abandoned_time;
                        if total > 0.0 {
                            s.abandoned_time / total * 100.
                        } else {
                            0.0
                        }
                    })
                    .sum::<f64>()
                    / count,
            }
        })
        .collect::<Vec<_>>();

    let width = rows.iter().map(|x| x.name.len()).max().unwrap_or(0).max("config".len());
    println!(
        "| {: <width$} | runs | avg task makespan | avg total makespan | cpu share | abandoned |",
        "config",
        width = width
    );
    println!(
        "|-{:-<width$}-|------|-------------------|--------------------|-----------|-----------|",
        "",
        width = width
    );
    for row in rows.into_iter() {
        println!(
            "| {: <width$} | {: >4} | {: >17.3} | {: >18.3} | {: >8.2}% | {: >8.2}% |",
            row.name,
            row.runs,
            row.avg_task_makespan,
            row.avg_total_makespan,
            row.cpu_share,
            row.abandoned_share,
            width = width
        );
    }
}
