// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{info, warn};

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep, TaskId};
use crate::engine::{RuntimeOptions, TaskOutcome};
use crate::task::TaskKey;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// The run is over; the shell should stop reading events.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute (dispatch tasks, exit).
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Handle a task completion event.
///
/// The completion frees a worker slot; the refill never exceeds the
/// configured worker count.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    options: &RuntimeOptions,
    id: TaskId,
    key: &TaskKey,
    outcome: TaskOutcome,
) -> CoreStep {
    match scheduler.graph().id_of(key) {
        Some(known) if known == id => {}
        _ => {
            warn!(task = %key, id, "completion does not match the task graph; ignoring");
            return CoreStep {
                commands: Vec::new(),
                keep_running: !scheduler.is_finished(),
            };
        }
    }

    let step = scheduler.handle_completion(id, outcome, options.workers);
    step_from_scheduler(step)
}

/// Handle a shutdown request: nothing new is dispatched, running tasks are
/// awaited.
pub fn handle_shutdown(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.request_shutdown();
    let running = scheduler.running_count();
    if running > 0 {
        info!(running, "waiting for running tasks to finish");
    }

    let mut commands = Vec::new();
    let keep_running = !(step.run_just_finished || scheduler.is_finished());
    if !keep_running {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Translate a scheduler step into shell commands.
pub fn step_from_scheduler(step: SchedulerStep) -> CoreStep {
    let mut commands = Vec::new();

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    let keep_running = !step.run_just_finished;
    if step.run_just_finished {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
