// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use tracing::{debug, info};

use crate::dag::graph::{TaskGraph, TaskId};
use crate::dag::task_info::{ScheduledTask, TaskInfo, TaskRunState};
use crate::task::Inputs;

/// Applies state transitions to the scheduler's task table.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    tasks: &'a mut [TaskInfo],
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a TaskGraph, tasks: &'a mut [TaskInfo]) -> Self {
        Self { graph, tasks }
    }

    /// Mark every pending transitive dependent of `failed` as
    /// `UpstreamFailed`.
    ///
    /// Returns the newly failed ids (excluding `failed` itself).
    pub fn mark_dependents_failed(&mut self, failed: TaskId) -> Vec<TaskId> {
        let graph = self.graph;
        let failed_key = self.tasks[failed].key.to_string();
        let mut stack: Vec<TaskId> = graph.dependents_of(failed).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(id) = stack.pop() {
            let info = &mut self.tasks[id];
            if info.state != TaskRunState::Pending {
                // Terminal already, or outside the needed set.
                continue;
            }

            info.state = TaskRunState::UpstreamFailed;
            info.error = Some(format!("dependency {failed_key} failed"));
            debug!(
                task = %info.key,
                upstream = %failed_key,
                "marking dependent as UpstreamFailed"
            );
            newly_failed.push(id);
            stack.extend(graph.dependents_of(id).iter().copied());
        }

        newly_failed
    }

    /// Collect up to `capacity` pending tasks whose dependencies are all
    /// satisfied, mark them `Running` and build their dispatch units.
    ///
    /// Candidates are taken in topological order so dispatch is
    /// deterministic.
    pub fn collect_new_ready_tasks(&mut self, capacity: usize) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();
        if capacity == 0 {
            return ready;
        }

        let graph = self.graph;

        // Decide first, then mutate.
        let candidates: Vec<TaskId> = graph
            .order()
            .iter()
            .copied()
            .filter(|&id| {
                self.tasks[id].state == TaskRunState::Pending
                    && deps_satisfied(&*self.tasks, &self.tasks[id])
            })
            .take(capacity)
            .collect();

        for id in candidates {
            let node = graph.node(id);
            let mut inputs = Inputs::new();
            for (name, dep) in &node.deps {
                inputs.insert(name.clone(), graph.node(*dep).task.output());
            }

            let info = &mut self.tasks[id];
            info.state = TaskRunState::Running;
            info!(task = %info.key, id, "dependencies satisfied; scheduling task");

            ready.push(ScheduledTask {
                id,
                key: info.key.clone(),
                task: node.task.clone(),
                inputs,
            });
        }

        ready
    }

    /// Move every still-pending task to `NotStarted`.
    pub fn abandon_pending(&mut self) -> Vec<TaskId> {
        let mut abandoned = Vec::new();
        for info in self.tasks.iter_mut() {
            if info.state == TaskRunState::Pending {
                info.state = TaskRunState::NotStarted;
                abandoned.push(info.id);
            }
        }
        abandoned
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.iter().all(|info| info.state.is_terminal())
    }
}

/// Whether every dependency of `info` is `Done` or `AlreadyComplete`.
pub fn deps_satisfied(tasks: &[TaskInfo], info: &TaskInfo) -> bool {
    info.deps
        .iter()
        .all(|&dep| tasks[dep].state.satisfies_dependents())
}
