// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::report::RunReport;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Async half of a build.
///
/// Pulls completions and shutdown requests off the event channel, hands
/// them to [`CoreRuntime`], and passes whatever the core wants dispatched
/// on to the executor. Every scheduling decision lives in the core.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Run the build to the end and report what happened to every task.
    ///
    /// The first wave is dispatched before any event is read. A channel
    /// that closes early ends the loop with whatever state the core has.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("quantflow runtime started");

        let first = self.core.start();
        let mut keep_running = self.apply(first).await?;

        while keep_running {
            let Some(event) = self.event_rx.recv().await else {
                warn!("runtime event channel closed before the run finished");
                break;
            };
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            keep_running = self.apply(step).await?;
        }

        info!("runtime exiting");
        Ok(self.core.report())
    }

    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) => self.dispatch(tasks).await?,
                CoreCommand::RequestExit => debug!("core asked to exit"),
            }
        }
        if !step.keep_running {
            info!("nothing left to run; stopping runtime");
        }
        Ok(step.keep_running)
    }

    async fn dispatch(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = tasks.iter().map(|t| t.key.to_string()).collect();
        debug!(?keys, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
