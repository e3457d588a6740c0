// src/exec/executor_loop.rs

//! Main executor loop that manages running task bodies.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::task::TaskKey;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what
/// `BlockingExecutorBackend` uses to hand over work. Each scheduled task runs
/// in its own Tokio task, and **per task key there will never be more than
/// one body running at the same time**: a dispatch for a key that is still
/// running is refused and logged.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        // At most one running body per task key.
        let mut active: HashMap<TaskKey, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            handle_scheduled_task(task, &mut active, &runtime_tx);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

/// Handle a newly scheduled task.
fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<TaskKey, JoinHandle<()>>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    active.retain(|_, handle| !handle.is_finished());

    if active.contains_key(&task.key) {
        warn!(
            task = %task.key,
            id = task.id,
            "task already running; refusing duplicate dispatch"
        );
        return;
    }

    let key = task.key.clone();
    let rt_tx = runtime_tx.clone();
    let spawn_key = key.clone();

    let handle = tokio::spawn(async move {
        run_task(task, rt_tx).await;
        debug!(task = %spawn_key, "task runner future finished");
    });

    active.insert(key, handle);
}
