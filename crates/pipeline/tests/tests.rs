use dslab_pipeline::{
    driver::PipelineSimulation,
    error::{TaskError, WorkloadError},
    generator::GeneratorConfig,
    resource::{ResourceClass, StageResources, TaskKind},
    stage::Stage,
    task::{Task, MAX_TASK_TIME},
    trace::TraceEvent,
    workload::{TaskPlan, WorkloadPlan},
};

#[test]
fn time_left_after_construction() {
    for (input, compute, output) in [(0, 0.0, 0), (2, 1.0, 1), (3, 0.0, 2), (7, 2.5, 4)] {
        let map = Task::map("j", input, compute, output).unwrap();
        let reduce = Task::reduce("j", input, compute, output).unwrap();
        let expected = input as f64 + compute + output as f64;
        assert_eq!(map.time_left(), expected);
        assert_eq!(reduce.time_left(), expected);
        assert_eq!(map.current_stage(), Stage::Input);
    }
}

#[test]
fn map_task_scenario() {
    let mut task = Task::map("j1", 2, 1.0, 1).unwrap();
    assert_eq!(task.current_stage(), Stage::Input);
    assert_eq!(task.current_resource_class(), ResourceClass::Disk);
    assert_eq!(task.time_left(), 4.0);

    task.tick().unwrap();
    task.tick().unwrap();
    assert_eq!(task.current_stage(), Stage::Computing);
    assert_eq!(task.current_resource_class(), ResourceClass::Cpu);
    assert_eq!(task.current_stage_time_remaining(), 1.0);
    assert_eq!(task.time_left(), 2.0);

    task.tick().unwrap();
    assert_eq!(task.current_stage(), Stage::Output);
    assert_eq!(task.current_resource_class(), ResourceClass::Disk);
    assert_eq!(task.current_stage_time_remaining(), 1.0);
    assert_eq!(task.time_left(), 1.0);
    assert!(!task.is_complete());

    task.tick().unwrap();
    for stage in Stage::ALL {
        assert_eq!(task.stage_time_remaining(stage), 0.0);
    }
    assert!(task.is_complete());
    assert_eq!(task.time_left(), 0.0);
}

#[test]
fn reduce_task_starts_on_network() {
    let reduce = Task::reduce("j2", 3, 0.0, 2).unwrap();
    let map = Task::map("j2", 3, 0.0, 2).unwrap();
    assert_eq!(reduce.current_resource_class(), ResourceClass::Network);
    assert_eq!(map.current_resource_class(), ResourceClass::Disk);
    assert_eq!(reduce.resource_class(Stage::Output), ResourceClass::Disk);
    assert_eq!(reduce.kind(), Some(TaskKind::Reduce));
}

#[test]
fn ticks_drain_all_stages() {
    let mut task = Task::reduce("j", 3, 4.0, 2).unwrap();
    let mut previous = task.current_stage();
    let ticks = task.time_left() as usize;
    for _ in 0..ticks {
        let before = task.time_left();
        let outcome = task.tick().unwrap();
        assert_eq!(before - task.time_left(), 1.0);
        assert_eq!(outcome.consumed, 1.0);
        assert!(task.current_stage() >= previous);
        assert!(task.current_stage().index() - previous.index() <= 1);
        previous = task.current_stage();
    }
    assert_eq!(task.time_left(), 0.0);
    assert_eq!(task.current_stage(), Stage::Output);
    assert!(task.is_complete());
}

#[test]
fn zero_output_is_complete_immediately() {
    let mut task = Task::map("j", 2, 3.0, 0).unwrap();
    assert!(task.is_complete());
    assert_eq!(task.time_left(), 5.0);
    task.tick().unwrap();
    assert!(task.is_complete());
    assert_eq!(task.time_left(), 4.0);
}

#[test]
fn tick_without_time_left() {
    let mut task = Task::map("j", 1, 0.0, 1).unwrap();
    task.tick().unwrap();
    task.tick().unwrap();
    let stage = task.current_stage();
    assert_eq!(task.tick(), Err(TaskError::ExhaustedTime));
    assert_eq!(task.current_stage(), stage);
    assert_eq!(task.time_left(), 0.0);

    let mut empty = Task::reduce("j", 0, 0.0, 0).unwrap();
    assert_eq!(empty.tick(), Err(TaskError::ExhaustedTime));
    assert_eq!(empty.current_stage(), Stage::Input);
}

#[test]
fn force_complete_from_input() {
    let mut task = Task::map("j3", 5, 5.0, 5).unwrap();
    assert_eq!(task.time_left(), 15.0);
    assert_eq!(task.force_complete_current_stage(), Ok(5.0));
    assert_eq!(task.stage_time_remaining(Stage::Input), 0.0);
    assert_eq!(task.current_stage(), Stage::Computing);
    assert_eq!(task.time_left(), 10.0);
}

#[test]
fn force_complete_on_output_fails() {
    let mut task = Task::map("j", 1, 1.0, 3).unwrap();
    task.force_complete_current_stage().unwrap();
    task.force_complete_current_stage().unwrap();
    assert_eq!(task.current_stage(), Stage::Output);
    assert_eq!(
        task.force_complete_current_stage(),
        Err(TaskError::InvalidTransition { stage: Stage::Output })
    );
    assert_eq!(task.current_stage(), Stage::Output);
    assert_eq!(task.current_stage_time_remaining(), 3.0);
}

#[test]
fn summaries() {
    let map = Task::map("j1", 2, 1.0, 1).unwrap();
    assert_eq!(
        map.to_string(),
        "MapTask with job name: j1, disk (input) time of 2, cpu time of 1, and disk (output) time of 1 (total: 4)"
    );
    let mut reduce = Task::reduce("j2", 3, 0.5, 2).unwrap();
    reduce.tick().unwrap();
    assert_eq!(
        reduce.to_string(),
        "ReduceTask with job name: j2, network (input) time of 3, cpu time of 0.5, and disk (output) time of 2 (total: 4.5)"
    );
}

#[test]
fn workload_from_yaml() {
    let plan = WorkloadPlan::from_yaml_str(
        r#"
tasks:
  - job: late
    kind: Reduce
    start_time: 5
    input: 3
    compute: 0
    output: 2
  - job: early
    kind: Map
    input: 2
    compute: 1.5
    output: 1
"#,
    )
    .unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.tasks[0].start_time, 0);
    assert_eq!(plan.tasks[0].task.job(), "early");
    assert_eq!(plan.tasks[0].task.time_left(), 4.5);
    assert_eq!(plan.tasks[1].start_time, 5);
    assert_eq!(plan.tasks[1].task.current_resource_class(), ResourceClass::Network);
}

#[test]
fn workload_with_invalid_task() {
    let result = WorkloadPlan::from_yaml_str(
        r#"
tasks:
  - {job: a, kind: Map, input: 1, compute: 1, output: 1}
  - {job: b, kind: Map, input: 1, compute: -2, output: 1}
"#,
    );
    assert!(matches!(
        result,
        Err(WorkloadError::InvalidTask {
            index: 1,
            source: TaskError::InvalidArgument(_)
        })
    ));

    let result = WorkloadPlan::from_yaml_str("tasks: [{job: a, kind: Map, input: -1, compute: 1, output: 1}]");
    assert!(matches!(result, Err(WorkloadError::InlineYaml(_))));

    assert!(matches!(
        WorkloadPlan::from_yaml("no/such/workload.yaml"),
        Err(WorkloadError::Io { .. })
    ));
}

const GENERATOR: &str = r#"
jobs:
  - name: sort
    start_time: 3
    map_tasks: 4
    reduce_tasks: 2
    map:
      input: {min: 1, max: 5}
      compute: {min: 0.5, max: 2.0}
      output: {min: 1, max: 3}
    reduce:
      input: {min: 2, max: 2}
      compute: {min: 1.0, max: 1.0}
      output: {min: 1, max: 4}
"#;

#[test]
fn generator_is_deterministic() {
    let config: GeneratorConfig = serde_yaml::from_str(GENERATOR).unwrap();
    let first = config.generate(42).unwrap();
    let second = config.generate(42).unwrap();
    assert_eq!(first.len(), 6);
    for (a, b) in first.tasks.iter().zip(second.tasks.iter()) {
        assert_eq!(a.task.durations(), b.task.durations());
        assert_eq!(a.task.kind(), b.task.kind());
    }

    let kinds = first.tasks.iter().map(|plan| plan.task.kind()).collect::<Vec<_>>();
    assert_eq!(kinds.iter().filter(|kind| **kind == Some(TaskKind::Map)).count(), 4);
    assert_eq!(kinds.iter().filter(|kind| **kind == Some(TaskKind::Reduce)).count(), 2);
    for plan in first.tasks.iter() {
        assert_eq!(plan.start_time, 3);
        assert_eq!(plan.task.job(), "sort");
        let durations = plan.task.durations();
        match plan.task.kind() {
            Some(TaskKind::Map) => {
                assert!((1..=5).contains(&durations.input));
                assert!((0.5..=2.0).contains(&durations.compute));
                assert!((1..=3).contains(&durations.output));
            }
            _ => {
                assert_eq!(durations.input, 2);
                assert_eq!(durations.compute, 1.0);
                assert!((1..=4).contains(&durations.output));
            }
        }
    }
}

#[test]
fn generator_rejects_bad_ranges() {
    let config: GeneratorConfig =
        serde_yaml::from_str(&GENERATOR.replace("{min: 1, max: 5}", "{min: 5, max: 1}")).unwrap();
    assert!(matches!(config.generate(1), Err(WorkloadError::InvalidGenerator(_))));
}

fn plan(tasks: Vec<(u64, Task)>) -> WorkloadPlan {
    WorkloadPlan::new(
        tasks
            .into_iter()
            .map(|(start_time, task)| TaskPlan { start_time, task })
            .collect(),
    )
}

#[test]
fn driver_runs_tasks_to_completion() {
    let plan = plan(vec![
        (0, Task::map("j1", 2, 1.0, 1).unwrap()),
        (0, Task::reduce("j2", 3, 0.0, 2).unwrap()),
        (2, Task::map("j3", 1, 1.0, 0).unwrap()),
    ]);
    let run_stats = PipelineSimulation::new(123, plan, None).run();

    assert_eq!(run_stats.total_task_count, 3);
    assert_eq!(run_stats.map_task_count, 2);
    assert_eq!(run_stats.reduce_task_count, 1);
    assert_eq!(run_stats.completed_task_count, 3);
    assert_eq!(run_stats.failed_task_count, 0);
    assert_eq!(run_stats.total_makespan, 5.0);
    assert_eq!(run_stats.min_task_makespan, 0.0);
    assert_eq!(run_stats.max_task_makespan, 5.0);
    assert!((run_stats.average_task_makespan - 3.0).abs() < 1e-9);
    assert_eq!(run_stats.network_time, 3.0);
    assert_eq!(run_stats.cpu_time, 1.0);
    assert_eq!(run_stats.disk_time, 5.0);
    assert_eq!(run_stats.abandoned_time, 2.0);
}

#[test]
fn driver_waits_for_late_tasks() {
    let plan = plan(vec![(10, Task::map("late", 1, 0.0, 1).unwrap())]);
    let (run_stats, trace) = PipelineSimulation::new(123, plan, None).run_with_trace();

    assert_eq!(run_stats.completed_task_count, 1);
    assert_eq!(run_stats.total_makespan, 2.0);
    assert_eq!(
        trace.events.last(),
        Some(&TraceEvent::TaskCompleted {
            time: 12.0,
            task_id: 0,
            time_left: 0.0,
        })
    );

    let stages = trace
        .events
        .iter()
        .filter_map(|event| match event {
            TraceEvent::StageStarted { time, stage, .. } => Some((*time, *stage)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(
        stages,
        vec![
            (10.0, Stage::Input),
            (11.0, Stage::Computing),
            (11.0, Stage::Output)
        ]
    );
}

#[test]
fn driver_with_empty_workload() {
    let run_stats = PipelineSimulation::new(123, WorkloadPlan::default(), None).run();
    assert_eq!(run_stats.total_task_count, 0);
    assert_eq!(run_stats.total_makespan, 0.0);
    assert_eq!(run_stats.min_task_makespan, 0.0);
}

#[test]
fn driver_on_generated_workload() {
    let config: GeneratorConfig = serde_yaml::from_str(GENERATOR).unwrap();
    let plan = config.generate(7).unwrap();
    let expected_time = plan.tasks.iter().map(|plan| plan.task.time_left()).sum::<f64>();
    let run_stats = PipelineSimulation::new(7, plan, None).run();

    assert_eq!(run_stats.completed_task_count, 6);
    let consumed = run_stats.network_time + run_stats.cpu_time + run_stats.disk_time;
    assert!((consumed - expected_time).abs() < 1e-9);
    assert_eq!(run_stats.abandoned_time, 0.0);
}

#[test]
fn deserialized_task_starts_from_input() {
    let task: Task = serde_json::from_str(
        r#"{
            "job": "j",
            "kind": "Map",
            "resources": {"input": "disk", "output": "disk"},
            "durations": {"input": 1, "compute": 0.0, "output": 1},
            "remaining": {"input": 1, "compute": 0.0, "output": 0},
            "current_stage": "output"
        }"#,
    )
    .unwrap();
    assert_eq!(task.current_stage(), Stage::Input);
    assert_eq!(task.time_left(), 2.0);
    assert!(!task.is_complete());

    let mut restored: Task = serde_json::from_str(&serde_json::to_string(&task).unwrap()).unwrap();
    restored.tick().unwrap();
    restored.tick().unwrap();
    assert!(restored.is_complete());
    assert_eq!(restored.tick(), Err(TaskError::ExhaustedTime));
}

#[test]
fn deserialization_validates_durations() {
    let negative = serde_json::from_str::<Task>(
        r#"{"job": "j", "resources": {"input": "network", "output": "disk"},
            "durations": {"input": 1, "compute": -1.0, "output": 1}}"#,
    );
    assert!(negative.is_err());

    let mismatched = serde_json::from_str::<Task>(
        r#"{"job": "j", "kind": "Map", "resources": {"input": "network", "output": "disk"},
            "durations": {"input": 1, "compute": 1.0, "output": 1}}"#,
    );
    assert!(mismatched.is_err());
}

#[test]
fn total_time_is_bounded() {
    assert!(matches!(
        Task::map("j", MAX_TASK_TIME + 1, 0.0, 1),
        Err(TaskError::InvalidArgument(_))
    ));
    assert!(matches!(
        Task::reduce("j", MAX_TASK_TIME / 2, 0.0, MAX_TASK_TIME / 2 + 1),
        Err(TaskError::InvalidArgument(_))
    ));
    assert!(matches!(
        Task::map("j", u64::MAX, 0.0, u64::MAX),
        Err(TaskError::InvalidArgument(_))
    ));

    let mut task = Task::map("j", MAX_TASK_TIME - 1, 0.0, 1).unwrap();
    let before = task.time_left();
    task.tick().unwrap();
    assert_eq!(before - task.time_left(), 1.0);
}

#[test]
fn custom_resource_classes() {
    let names = ResourceClass::ALL.iter().map(|class| class.to_string()).collect::<Vec<_>>();
    assert_eq!(names, vec!["network", "cpu", "disk"]);

    for input in ResourceClass::ALL {
        let resources = StageResources::new(input, ResourceClass::Network);
        let task = Task::new("j", resources, 1, 1.0, 1).unwrap();
        assert_eq!(task.resources(), resources);
        assert_eq!(task.current_resource_class(), input);
        assert_eq!(task.resource_class(Stage::Computing), ResourceClass::Cpu);
    }
    assert_eq!(Task::reduce("j", 1, 1.0, 1).unwrap().resources(), TaskKind::Reduce.resources());
}
