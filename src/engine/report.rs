// src/engine/report.rs

//! Per-task outcome of one run session.

use std::fmt;
use std::path::PathBuf;

use crate::dag::{Scheduler, TaskId, TaskRunState};
use crate::task::TaskKey;

/// Final state of one task, with what it produced.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub id: TaskId,
    pub key: TaskKey,
    pub state: TaskRunState,
    pub error: Option<String>,
    /// Every concrete output path and whether it exists at report time.
    pub outputs: Vec<(PathBuf, bool)>,
}

impl TaskReport {
    pub fn produced(&self) -> impl Iterator<Item = &PathBuf> {
        self.outputs.iter().filter(|(_, e)| *e).map(|(p, _)| p)
    }

    pub fn missing(&self) -> impl Iterator<Item = &PathBuf> {
        self.outputs.iter().filter(|(_, e)| !*e).map(|(p, _)| p)
    }
}

/// Summary of a finished (or interrupted) run, in topological order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn from_scheduler(scheduler: &Scheduler) -> Self {
        let graph = scheduler.graph();
        let tasks = graph
            .order()
            .iter()
            .map(|&id| {
                let info = &scheduler.tasks()[id];
                let outputs = graph
                    .node(id)
                    .task
                    .output()
                    .paths()
                    .into_iter()
                    .map(|p| {
                        let exists = p.exists();
                        (p, exists)
                    })
                    .collect();

                TaskReport {
                    id,
                    key: info.key.clone(),
                    state: info.state,
                    error: info.error.clone(),
                    outputs,
                }
            })
            .collect();

        Self { tasks }
    }

    /// True iff every task is `Done`, `AlreadyComplete` or `Pruned`.
    pub fn success(&self) -> bool {
        self.tasks.iter().all(|t| t.state.is_success())
    }

    pub fn get(&self, key: &TaskKey) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| &t.key == key)
    }

    /// State of the first task of the given kind.
    pub fn state_of_kind(&self, kind: &str) -> Option<TaskRunState> {
        self.tasks
            .iter()
            .find(|t| t.key.kind() == kind)
            .map(|t| t.state)
    }

    pub fn count(&self, state: TaskRunState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run summary ({} tasks):", self.tasks.len())?;
        for task in &self.tasks {
            writeln!(f, "  [{}] {}", task.state.label(), task.key)?;
            if let Some(error) = &task.error {
                for line in error.lines() {
                    writeln!(f, "      error: {line}")?;
                }
            }
            for path in task.produced() {
                writeln!(f, "      produced: {}", path.display())?;
            }
            for path in task.missing() {
                writeln!(f, "      missing:  {}", path.display())?;
            }
        }

        let failed = self.count(TaskRunState::Failed);
        let upstream = self.count(TaskRunState::UpstreamFailed);
        let not_started = self.count(TaskRunState::NotStarted);
        if self.success() {
            write!(f, "result: success")
        } else {
            write!(
                f,
                "result: FAILED ({failed} failed, {upstream} blocked by failures, {not_started} not started)"
            )
        }
    }
}
