// src/dag/scheduler.rs

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::dag::graph::{TaskGraph, TaskId};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{StateManager, deps_satisfied};
use crate::dag::task_info::{ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::TaskOutcome;

/// Scheduler holds the discovered graph plus per-run state.
///
/// It is responsible for:
/// - deciding which tasks participate in the run (needed and incomplete)
/// - deciding when a task is ready (all dependencies satisfied)
/// - marking tasks as done/failed as completions arrive
/// - failing dependents when a task fails
///
/// It never dispatches the same task id twice: a task leaves `Pending`
/// exactly once.
#[derive(Debug)]
pub struct Scheduler {
    graph: TaskGraph,
    tasks: Vec<TaskInfo>,
    running: usize,
    finished: bool,
}

impl Scheduler {
    /// Build per-run state from a discovered graph.
    pub fn new(graph: TaskGraph) -> Self {
        let needed = graph.needed();

        let tasks = graph
            .nodes()
            .map(|(id, node)| {
                let state = if node.complete {
                    TaskRunState::AlreadyComplete
                } else if needed[id] {
                    TaskRunState::Pending
                } else {
                    TaskRunState::Pruned
                };

                TaskInfo {
                    id,
                    key: node.key.clone(),
                    deps: graph.dependencies_of(id).collect(),
                    external: node.task.is_external(),
                    state,
                    error: None,
                }
            })
            .collect::<Vec<_>>();

        let pending = tasks
            .iter()
            .filter(|t| t.state == TaskRunState::Pending)
            .count();
        info!(
            tasks = tasks.len(),
            pending,
            "scheduler: prepared run"
        );

        Self {
            graph,
            tasks,
            running: 0,
            finished: false,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    pub fn run_state_of(&self, id: TaskId) -> Option<TaskRunState> {
        self.tasks.get(id).map(|t| t.state)
    }

    /// Whether the dependencies of `id` are satisfied right now.
    ///
    /// Returns `None` if the id is unknown.
    pub fn deps_satisfied(&self, id: TaskId) -> Option<bool> {
        let info = self.tasks.get(id)?;
        Some(deps_satisfied(&self.tasks, info))
    }

    /// Number of tasks currently dispatched and not yet completed.
    pub fn running_count(&self) -> usize {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Output paths of external inputs that the run needs but that do not
    /// exist. These can never be produced, so a non-empty result means the
    /// run must not start.
    pub fn missing_external_inputs(&self) -> Vec<PathBuf> {
        self.tasks
            .iter()
            .filter(|t| t.external && t.state == TaskRunState::Pending)
            .flat_map(|t| {
                self.graph
                    .node(t.id)
                    .task
                    .output()
                    .paths()
                    .into_iter()
                    .filter(|p| !p.exists())
            })
            .collect()
    }

    /// Dispatch the first wave of ready tasks, keeping at most
    /// `max_running` in flight.
    pub fn start(&mut self, max_running: usize) -> SchedulerStep {
        debug!(max_running, "scheduler: starting run");
        let newly_scheduled = self.collect_ready(max_running);
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    /// Record the outcome of a running task and schedule whatever became
    /// ready, keeping at most `max_running` in flight.
    pub fn handle_completion(
        &mut self,
        id: TaskId,
        outcome: TaskOutcome,
        max_running: usize,
    ) -> SchedulerStep {
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(id) {
            Some(info) if info.state == TaskRunState::Running => {
                self.running -= 1;
                match outcome {
                    TaskOutcome::Success => {
                        info.state = TaskRunState::Done;
                        info!(task = %info.key, id, "task completed successfully");
                    }
                    TaskOutcome::Failed(message) => {
                        warn!(
                            task = %info.key,
                            id,
                            error = %message,
                            "task failed; failing dependents in this run"
                        );
                        info.state = TaskRunState::Failed;
                        info.error = Some(message);
                        newly_failed.push(id);

                        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                        newly_failed.append(&mut manager.mark_dependents_failed(id));
                    }
                }
            }
            Some(info) => {
                warn!(
                    task = %info.key,
                    id,
                    state = ?info.state,
                    "completion for task that is not running; ignoring"
                );
            }
            None => {
                warn!(id, "completion for unknown task; ignoring");
            }
        }

        let newly_scheduled = self.collect_ready(max_running);
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }

    /// Stop scheduling: pending tasks become `NotStarted`. Running tasks are
    /// left to finish.
    pub fn request_shutdown(&mut self) -> SchedulerStep {
        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let abandoned = manager.abandon_pending();
        if !abandoned.is_empty() {
            info!(
                abandoned = abandoned.len(),
                running = self.running,
                "shutdown requested; not starting remaining tasks"
            );
        }

        let run_just_finished = self.maybe_finish_run();
        SchedulerStep {
            newly_scheduled: Vec::new(),
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    fn collect_ready(&mut self, max_running: usize) -> Vec<ScheduledTask> {
        let capacity = max_running.saturating_sub(self.running);
        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let ready = manager.collect_new_ready_tasks(capacity);
        self.running += ready.len();
        ready
    }

    /// Returns `true` if this call transitioned the run to finished.
    fn maybe_finish_run(&mut self) -> bool {
        if self.finished || self.running > 0 {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks);
        if manager.all_tasks_terminal() {
            info!("scheduler: all tasks terminal; run finished");
            self.finished = true;
            true
        } else {
            false
        }
    }
}
