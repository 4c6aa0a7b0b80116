use std::{io::Write, path::PathBuf, time::Instant};

use clap::Parser;
use env_logger::Builder;

use dslab_pipeline::{driver::PipelineSimulation, generator::GeneratorConfig, workload::WorkloadPlan};

/// Runs a single workload with the reference tick driver.
#[derive(Parser, Debug)]
struct Args {
    /// Path to workload YAML.
    #[arg(short, long, conflicts_with = "generator", required_unless_present = "generator")]
    workload: Option<PathBuf>,

    /// Path to generator config YAML.
    #[arg(short, long)]
    generator: Option<PathBuf>,

    /// Seed for the generator and the simulation.
    #[arg(short, long, default_value_t = 123)]
    seed: u64,

    /// Path to trace file.
    #[arg(short, long, default_value = None)]
    trace: Option<PathBuf>,
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let plan = match (args.workload, args.generator) {
        (Some(workload), _) => WorkloadPlan::from_yaml(workload).expect("Can't load workload"),
        (None, Some(generator)) => GeneratorConfig::from_yaml(generator)
            .expect("Can't load generator config")
            .generate(args.seed)
            .expect("Can't generate workload"),
        (None, None) => unreachable!(),
    };
    println!("Loaded {} tasks", plan.len());

    let start_time = Instant::now();
    let run_stats = PipelineSimulation::new(args.seed, plan, args.trace).run();
    println!("\nRun stats:\n{}", serde_yaml::to_string(&run_stats).unwrap());
    println!("Finished in {:.2?}", start_time.elapsed());
}
