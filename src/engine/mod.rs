// src/engine/mod.rs

//! Orchestration engine for quantflow.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the main runtime event loop that reacts to:
//!   - task completion events
//!   - shutdown signals
//! - the run report produced once the run is over
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::TaskId;
use crate::task::TaskKey;

/// Outcome of a task body for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The task returned an error (or panicked); the rendered error chain.
    Failed(String),
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Maximum number of task bodies in flight at once.
    pub workers: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// Events flowing into the runtime from the executor and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task body returned.
    TaskCompleted {
        id: TaskId,
        key: TaskKey,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod report;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use report::{RunReport, TaskReport};
pub use runtime::Runtime;
