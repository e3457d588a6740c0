// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::graph::TaskId;
use crate::dag::task_info::ScheduledTask;

/// Structured result of a single scheduler "step".
///
/// Tests use this to drive the DAG by hand and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked failed in this step (the failing task and any
    /// dependents that can no longer run).
    pub newly_failed: Vec<TaskId>,
    /// Whether this step finished the run.
    pub run_just_finished: bool,
}
