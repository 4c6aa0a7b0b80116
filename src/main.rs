use std::io::Write;

use env_logger::Builder;

use dslab_pipeline::{
    driver::PipelineSimulation,
    task::Task,
    workload::{TaskPlan, WorkloadPlan},
};

fn drive_by_hand(mut task: Task) {
    println!("{}", task);
    while task.time_left() > 0.0 {
        let stage = task.current_stage();
        let resource = task.current_resource_class();
        let remaining = task.current_stage_time_remaining();
        task.tick().expect("task has time left");
        println!(
            "  {: <9} on {: <7} {} -> {} (total left: {})",
            stage.to_string(),
            resource.to_string(),
            remaining,
            task.stage_time_remaining(stage),
            task.time_left()
        );
    }
    println!("  complete: {}", task.is_complete());
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    drive_by_hand(Task::map("j1", 2, 1.0, 1).expect("valid durations"));
    drive_by_hand(Task::reduce("j2", 3, 0.0, 2).expect("valid durations"));

    let mut task = Task::map("j3", 5, 5.0, 5).expect("valid durations");
    println!("{}", task);
    let abandoned = task.force_complete_current_stage().expect("input stage can be skipped");
    println!(
        "  skipped {} stage time, now at {} stage with {} time left",
        abandoned,
        task.current_stage(),
        task.time_left()
    );

    let plan = WorkloadPlan::new(vec![
        TaskPlan {
            start_time: 0,
            task: Task::map("j1", 2, 1.0, 1).expect("valid durations"),
        },
        TaskPlan {
            start_time: 1,
            task: Task::reduce("j2", 3, 0.5, 2).expect("valid durations"),
        },
        TaskPlan {
            start_time: 2,
            task: Task::map("j4", 4, 2.0, 0).expect("valid durations"),
        },
    ]);
    let run_stats = PipelineSimulation::new(123, plan, None).run();
    println!("\nRun stats:\n{:#?}", run_stats);
}
