// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is intended to be extensively tested without any Tokio,
//! channels, or processes.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    CoreStep, handle_shutdown, handle_task_completion, step_from_scheduler,
};
use crate::engine::report::RunReport;
use crate::engine::{RuntimeEvent, RuntimeOptions};

/// Pure core runtime state.
///
/// This owns the DAG scheduler and the runtime options. It has **no**
/// channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        let options = RuntimeOptions {
            workers: options.workers.max(1),
        };
        Self { scheduler, options }
    }

    /// Dispatch the first wave of ready tasks.
    ///
    /// If nothing needs to run, the returned step already asks to exit.
    pub fn start(&mut self) -> CoreStep {
        let step = self.scheduler.start(self.options.workers);
        step_from_scheduler(step)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { id, key, outcome } => {
                handle_task_completion(&mut self.scheduler, &self.options, id, &key, outcome)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&mut self.scheduler),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Per-task states as they stand right now.
    pub fn report(&self) -> RunReport {
        RunReport::from_scheduler(&self.scheduler)
    }
}
