// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`executor_loop`](super::executor_loop).
//!
//! - `BlockingExecutorBackend` is the default implementation used by
//!   `quantflow`. It wraps the `spawn_executor` loop and just forwards
//!   scheduled tasks over an mpsc channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.

use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{QuantflowError, Result};

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled tasks are executed.
///
/// Production code uses [`BlockingExecutorBackend`]; tests can provide their
/// own implementation that doesn't run real task bodies.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Every dispatched task must eventually produce exactly one
    /// `RuntimeEvent::TaskCompleted`, or the runtime waits forever.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor backend used in production.
///
/// The runtime calls `spawn_ready_tasks`, which forwards the tasks to the
/// background executor loop; task bodies then run on tokio's blocking pool.
pub struct BlockingExecutorBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl BlockingExecutorBackend {
    /// Create the backend, wiring it to the given runtime event sender.
    ///
    /// This spawns the background executor loop immediately, so it must be
    /// called from within a Tokio runtime.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for BlockingExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                let key = task.key.clone();
                tx.send(task).await.map_err(|_| {
                    QuantflowError::Other(anyhow!(
                        "executor loop stopped before task {key} could be dispatched"
                    ))
                })?;
            }
            Ok(())
        })
    }
}
