// tests/scheduler_semantics.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use quantflow::dag::{TaskGraph, TaskRunState};
use quantflow::errors::QuantflowError;
use quantflow::target::{LocalTarget, Output};
use quantflow::task::{Inputs, Task, TaskKey, TaskRef};
use quantflow::{BuildOptions, build, discover, plan};
use quantflow_test_utils::fake_task::{FakeEvent, FakeWorld};
use quantflow_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

fn options(workers: usize) -> BuildOptions {
    BuildOptions {
        workers,
        ..BuildOptions::default()
    }
}

/// Every task starts only after all of its dependencies finished.
fn assert_dependencies_finish_first(world: &FakeWorld, edges: &[(&str, &[&str])]) {
    let events = world.events();
    let position = |event: &FakeEvent| events.iter().position(|e| e == event);

    for (task, deps) in edges {
        let Some(started) = position(&FakeEvent::Started(task.to_string())) else {
            continue;
        };
        for dep in *deps {
            if let Some(finished) = position(&FakeEvent::Finished(dep.to_string())) {
                assert!(
                    finished < started,
                    "{task} started before {dep} finished: {events:?}"
                );
            }
        }
    }
}

fn diamond(world: &FakeWorld) -> &'static [(&'static str, &'static [&'static str])] {
    const EDGES: &[(&str, &[&str])] = &[
        ("top", &["left", "right"]),
        ("left", &["base"]),
        ("right", &["base"]),
        ("base", &[]),
    ];
    for (task, deps) in EDGES {
        world.task(task, deps);
    }
    EDGES
}

#[tokio::test]
async fn diamond_runs_shared_dependency_once() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    let edges = diamond(&world);
    world.delay("left", Duration::from_millis(20));
    world.delay("right", Duration::from_millis(20));

    let report = with_timeout(build(&[world.root("top")], options(4))).await?;

    assert!(report.success(), "{report}");
    assert_eq!(report.count(TaskRunState::Done), 4);
    let started = world.started();
    assert_eq!(started.iter().filter(|n| *n == "base").count(), 1);
    assert_eq!(started.len(), 4);
    assert_eq!(started.first().map(String::as_str), Some("base"));
    assert_eq!(started.last().map(String::as_str), Some("top"));
    assert_dependencies_finish_first(&world, edges);
    Ok(())
}

#[tokio::test]
async fn shared_dependency_of_several_roots_runs_once() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    world.task("a", &["shared"]).task("b", &["shared"]);

    let report = with_timeout(build(&[world.root("a"), world.root("b")], options(2))).await?;

    assert!(report.success());
    assert_eq!(report.tasks.len(), 3);
    assert_eq!(world.started().iter().filter(|n| *n == "shared").count(), 1);
    Ok(())
}

#[test]
fn cycle_is_reported_not_looped() {
    init_tracing();
    let world = FakeWorld::new();
    world.task("a", &["b"]).task("b", &["c"]).task("c", &["a"]);

    let err = discover(&[world.root("a")]).expect_err("cycle must be rejected");
    assert!(err.is_configuration());
    match err {
        QuantflowError::DagCycle(msg) => {
            assert!(msg.contains("Fake(name=a)"), "message: {msg}");
            assert!(msg.contains("Fake(name=c)"), "message: {msg}");
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    init_tracing();
    let world = FakeWorld::new();
    world.task("loop", &["loop"]);

    assert!(matches!(
        discover(&[world.root("loop")]),
        Err(QuantflowError::DagCycle(_))
    ));
}

#[tokio::test]
async fn complete_tasks_prune_their_subgraph() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    world.task("top", &["mid"]).task("mid", &["base"]);
    world.precreate("mid");

    let scheduler = discover(&[world.root("top")])?;
    let state = |name: &str| {
        let id = scheduler
            .graph()
            .id_of(&FakeWorld::key(name))
            .expect("task in graph");
        scheduler.run_state_of(id)
    };
    assert_eq!(state("base"), Some(TaskRunState::Pruned));
    assert_eq!(state("mid"), Some(TaskRunState::AlreadyComplete));
    assert_eq!(state("top"), Some(TaskRunState::Pending));

    let report = with_timeout(build(&[world.root("top")], options(1))).await?;
    assert!(report.success());
    assert_eq!(world.started(), ["top"]);
    assert!(!world.output_path("base").exists());
    Ok(())
}

#[tokio::test]
async fn failure_blocks_dependents_but_not_siblings() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    world
        .task("top", &["left", "right"])
        .task("left", &["bad"])
        .task("right", &[]);
    world.failing("bad");

    let report = with_timeout(build(&[world.root("top")], options(1))).await?;

    assert!(!report.success());
    let state = |name: &str| report.get(&FakeWorld::key(name)).map(|t| t.state);
    assert_eq!(state("bad"), Some(TaskRunState::Failed));
    assert_eq!(state("left"), Some(TaskRunState::UpstreamFailed));
    assert_eq!(state("top"), Some(TaskRunState::UpstreamFailed));
    assert_eq!(state("right"), Some(TaskRunState::Done));

    let started = world.started();
    assert!(!started.contains(&"left".to_string()));
    assert!(!started.contains(&"top".to_string()));
    assert!(world.output_path("right").exists());
    assert!(!world.output_path("bad").exists());

    let bad = report.get(&FakeWorld::key("bad")).expect("bad in report");
    assert!(
        bad.error.as_deref().unwrap_or_default().contains("failed on purpose"),
        "error: {:?}",
        bad.error
    );
    assert_eq!(bad.missing().count(), 1);

    let rendered = report.to_string();
    assert!(rendered.contains("result: FAILED"), "{rendered}");
    Ok(())
}

#[tokio::test]
async fn rerun_after_fixing_failure_only_redoes_incomplete_work() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    world.task("top", &["a", "b"]).task("a", &[]).task("b", &[]);
    world.failing("b");

    let first = with_timeout(build(&[world.root("top")], options(1))).await?;
    assert!(!first.success());
    assert_eq!(world.started().len(), 2);

    world.repair("b");
    let second = with_timeout(build(&[world.root("top")], options(1))).await?;
    assert!(second.success());
    assert_eq!(world.started()[2..], ["b", "top"]);
    assert_eq!(
        second.get(&FakeWorld::key("a")).map(|t| t.state),
        Some(TaskRunState::AlreadyComplete)
    );
    Ok(())
}

#[tokio::test]
async fn second_run_performs_no_work() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    diamond(&world);

    let first = with_timeout(build(&[world.root("top")], options(2))).await?;
    assert!(first.success());
    let runs = world.started().len();
    assert_eq!(runs, 4);

    let second = with_timeout(build(&[world.root("top")], options(2))).await?;
    assert!(second.success());
    assert_eq!(world.started().len(), runs);
    assert_eq!(second.count(TaskRunState::AlreadyComplete), 1);
    assert_eq!(second.count(TaskRunState::Pruned), 3);
    Ok(())
}

#[tokio::test]
async fn worker_limit_bounds_concurrency() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    let leaves = ["l1", "l2", "l3", "l4", "l5", "l6"];
    world.task("root", &leaves);
    for leaf in leaves {
        world.task(leaf, &[]).delay(leaf, Duration::from_millis(30));
    }

    let report = with_timeout(build(&[world.root("root")], options(2))).await?;
    assert!(report.success());
    assert!(world.max_concurrency() <= 2, "events: {:?}", world.events());
    assert_eq!(world.started().last().map(String::as_str), Some("root"));

    let serial = FakeWorld::new();
    serial.task("root", &leaves);
    let report = with_timeout(build(&[serial.root("root")], options(1))).await?;
    assert!(report.success());
    assert_eq!(serial.max_concurrency(), 1);
    Ok(())
}

#[test]
fn missing_external_input_stops_the_run_before_it_starts() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    world.task("top", &["reads"]).external("reads");

    match plan(&[world.root("top")]) {
        Err(QuantflowError::MissingInputs(paths)) => {
            assert_eq!(paths, vec![world.output_path("reads")]);
        }
        other => panic!("expected MissingInputs, got {other:?}"),
    }

    world.precreate("reads");
    let scheduler = plan(&[world.root("top")])?;
    let id = scheduler
        .graph()
        .id_of(&FakeWorld::key("reads"))
        .expect("reads in graph");
    assert_eq!(scheduler.run_state_of(id), Some(TaskRunState::AlreadyComplete));
    Ok(())
}

#[test]
fn keys_ignore_parameter_binding_order() {
    let a = TaskKey::new("SalmonQuant").param("file_id", "s1").param("lib", "A");
    let b = TaskKey::new("SalmonQuant").param("lib", "A").param("file_id", "s1");
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "SalmonQuant(file_id=s1, lib=A)");
    assert_ne!(a, TaskKey::new("SalmonIndex").param("file_id", "s1").param("lib", "A"));
}

#[derive(Debug)]
struct Panicking {
    out: std::path::PathBuf,
}

impl Task for Panicking {
    fn key(&self) -> TaskKey {
        TaskKey::new("Panicking")
    }

    fn output(&self) -> Output {
        LocalTarget::new(&self.out).into()
    }

    fn run(&self, _inputs: &Inputs) -> anyhow::Result<()> {
        panic!("boom");
    }
}

#[tokio::test]
async fn panicking_task_is_reported_as_failed() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root: TaskRef = Arc::new(Panicking {
        out: dir.path().join("never"),
    });

    let report = with_timeout(build(&[root], options(1))).await?;
    assert!(!report.success());
    let task = report.get(&TaskKey::new("Panicking")).expect("in report");
    assert_eq!(task.state, TaskRunState::Failed);
    assert!(task.error.as_deref().unwrap_or_default().contains("panicked"));
    Ok(())
}

#[test]
fn graph_order_puts_dependencies_first() -> TestResult {
    init_tracing();
    let world = FakeWorld::new();
    diamond(&world);

    let graph = TaskGraph::discover(&[world.root("top")])?;
    assert_eq!(graph.len(), 4);
    let pos = |name: &str| {
        let id = graph.id_of(&FakeWorld::key(name)).expect("in graph");
        graph.order().iter().position(|&o| o == id).expect("in order")
    };
    assert!(pos("base") < pos("left"));
    assert!(pos("base") < pos("right"));
    assert!(pos("left") < pos("top"));
    assert!(pos("right") < pos("top"));
    Ok(())
}
