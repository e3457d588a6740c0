// src/dag/task_info.rs

//! Per-task run state and the dispatch unit handed to the executor.

use crate::dag::graph::TaskId;
use crate::task::{Inputs, TaskKey, TaskRef};

/// State of a task within one run session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRunState {
    /// Output already existed when the graph was discovered; never run.
    AlreadyComplete,
    /// Incomplete, but only reachable through complete tasks, so nothing
    /// requested needs it.
    Pruned,
    /// Needed and waiting on dependencies.
    Pending,
    /// Dispatched to the executor.
    Running,
    /// `run()` returned successfully.
    Done,
    /// `run()` returned an error (or panicked).
    Failed,
    /// Not run because a dependency failed.
    UpstreamFailed,
    /// Still pending when a shutdown was requested.
    NotStarted,
}

impl TaskRunState {
    /// Whether the task will not change state again in this run.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskRunState::Pending | TaskRunState::Running)
    }

    /// Whether the task's output can be relied on by its dependents.
    pub fn satisfies_dependents(self) -> bool {
        matches!(self, TaskRunState::AlreadyComplete | TaskRunState::Done)
    }

    /// Whether this state counts towards a successful run.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            TaskRunState::AlreadyComplete | TaskRunState::Pruned | TaskRunState::Done
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskRunState::AlreadyComplete => "complete",
            TaskRunState::Pruned => "not needed",
            TaskRunState::Pending => "pending",
            TaskRunState::Running => "running",
            TaskRunState::Done => "done",
            TaskRunState::Failed => "FAILED",
            TaskRunState::UpstreamFailed => "upstream failed",
            TaskRunState::NotStarted => "not started",
        }
    }
}

/// Scheduler bookkeeping for one graph node.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    pub key: TaskKey,
    /// Direct dependencies (graph ids).
    pub deps: Vec<TaskId>,
    pub external: bool,
    pub state: TaskRunState,
    /// Error message for `Failed`, or the failed dependency for
    /// `UpstreamFailed`.
    pub error: Option<String>,
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub key: TaskKey,
    pub task: TaskRef,
    /// Outputs of the task's requirements, by requirement name.
    pub inputs: Inputs,
}
