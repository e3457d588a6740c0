// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod target;
pub mod task;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_raw_or_default};
use crate::dag::{Scheduler, TaskGraph};
use crate::engine::{CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{QuantflowError, Result};
use crate::exec::{BlockingExecutorBackend, ExecutorBackend};
use crate::pipeline::{AllReports, PipelineConfig};
use crate::task::TaskRef;

/// Options for [`build`].
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Maximum number of task bodies running at once.
    pub workers: usize,
    /// Turn Ctrl-C into a graceful shutdown.
    pub handle_ctrl_c: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            handle_ctrl_c: false,
        }
    }
}

/// Discover the graph below `roots` and prepare a scheduler for it, without
/// checking that external inputs exist.
pub fn discover(roots: &[TaskRef]) -> Result<Scheduler> {
    let graph = TaskGraph::discover(roots)?;
    Ok(Scheduler::new(graph))
}

/// Like [`discover`], but reject the run if any needed external input is
/// missing.
pub fn plan(roots: &[TaskRef]) -> Result<Scheduler> {
    let scheduler = discover(roots)?;
    let missing = scheduler.missing_external_inputs();
    if !missing.is_empty() {
        return Err(QuantflowError::MissingInputs(missing));
    }
    Ok(scheduler)
}

/// Bring `roots` up to date with the production executor.
///
/// Configuration problems (cycles, bad manifests, missing inputs) come back
/// as `Err` before anything runs. Task failures do not: they are recorded in
/// the returned report.
pub async fn build(roots: &[TaskRef], options: BuildOptions) -> Result<RunReport> {
    build_with(roots, options, BlockingExecutorBackend::new).await
}

/// [`build`] with a caller-supplied executor backend.
pub async fn build_with<E, F>(
    roots: &[TaskRef],
    options: BuildOptions,
    make_executor: F,
) -> Result<RunReport>
where
    E: ExecutorBackend,
    F: FnOnce(mpsc::Sender<RuntimeEvent>) -> E,
{
    let scheduler = plan(roots)?;

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = make_executor(rt_tx.clone());

    // Ctrl-C → graceful shutdown.
    let signal_handle = options.handle_ctrl_c.then(|| {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; finishing running tasks");
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        })
    });
    drop(rt_tx);

    let core = CoreRuntime::new(
        scheduler,
        RuntimeOptions {
            workers: options.workers,
        },
    );
    let report = Runtime::new(core, rt_rx, executor).run().await;

    if let Some(handle) = signal_handle {
        handle.abort();
    }
    report
}

/// The pipeline's top-level tasks.
pub fn pipeline_roots(cfg: Arc<PipelineConfig>) -> Vec<TaskRef> {
    vec![Arc::new(AllReports::new(cfg))]
}

/// Resolve the config for a CLI invocation: file (or defaults), then
/// command-line overrides, then validation.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let (path, explicit) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (default_config_path(), false),
    };
    let mut raw = load_raw_or_default(&path, explicit)?;
    args.apply_overrides(&mut raw);
    ConfigFile::try_from(raw)
}

/// High-level entry point used by `main.rs`.
///
/// Returns whether the run succeeded; errors are configuration problems
/// detected before anything ran.
pub async fn run(args: CliArgs) -> anyhow::Result<bool> {
    let cfg = resolve_config(&args)?;
    let workers = cfg.config.workers;

    let ids = pipeline::manifest::read_manifest(&args.manifest)?;
    info!(samples = ids.len(), manifest = %args.manifest.display(), "manifest loaded");

    let pipeline = PipelineConfig::new(cfg, args.manifest.clone());
    let roots = pipeline_roots(pipeline);

    if args.dry_run {
        let scheduler = discover(&roots)?;
        print_dry_run(&scheduler);
        return Ok(true);
    }

    let report = build(
        &roots,
        BuildOptions {
            workers,
            handle_ctrl_c: true,
        },
    )
    .await?;

    println!("{report}");
    Ok(report.success())
}

/// Dry-run output: every discovered task with its status and outputs.
fn print_dry_run(scheduler: &Scheduler) {
    let report = RunReport::from_scheduler(scheduler);

    println!("quantflow dry-run");
    println!("tasks ({}):", report.tasks.len());
    for task in &report.tasks {
        let status = match task.state {
            dag::TaskRunState::Pending => "would run",
            other => other.label(),
        };
        println!("  - {} [{status}]", task.key);
        for (path, exists) in &task.outputs {
            let mark = if *exists { "exists" } else { "missing" };
            println!("      {mark}: {}", path.display());
        }
    }

    let missing = scheduler.missing_external_inputs();
    if !missing.is_empty() {
        println!();
        println!("missing inputs (a real run would stop here):");
        for path in &missing {
            println!("  - {}", path.display());
        }
    }

    debug!("dry-run complete (no execution)");
}
