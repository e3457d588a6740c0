// src/exec/task_runner.rs

//! Individual task body runner.

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};

/// Run a single task body on the blocking pool and emit exactly one
/// `TaskCompleted` event for it.
///
/// Task bodies are synchronous and may block on subprocesses, so they never
/// run on the async worker threads. A panic is reported as a failure.
pub async fn run_task(task: ScheduledTask, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let ScheduledTask {
        id,
        key,
        task,
        inputs,
    } = task;

    info!(task = %key, id, "starting task");
    let started = Instant::now();

    let joined = tokio::task::spawn_blocking(move || task.run(&inputs)).await;

    let outcome = match joined {
        Ok(Ok(())) => {
            info!(
                task = %key,
                id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task finished"
            );
            TaskOutcome::Success
        }
        Ok(Err(err)) => {
            error!(task = %key, id, error = %format!("{err:#}"), "task failed");
            TaskOutcome::Failed(format!("{err:#}"))
        }
        Err(join_err) => {
            error!(task = %key, id, error = %join_err, "task panicked");
            TaskOutcome::Failed(format!("task panicked: {join_err}"))
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted { id, key, outcome })
        .await
        .is_err()
    {
        error!(id, "runtime is gone; dropping task completion");
    }
}
