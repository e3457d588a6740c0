use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tokio::sync::mpsc;
use quantflow::dag::ScheduledTask;
use quantflow::engine::{RuntimeEvent, TaskOutcome};
use quantflow::errors::{QuantflowError, Result};
use quantflow::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were dispatched (by rendered key)
/// - never runs task bodies
/// - immediately reports `TaskCompleted` for each scheduled task, failing
///   the ones whose kind was marked with [`FakeExecutor::fail_kind`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing_kinds: HashSet<&'static str>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failing_kinds: HashSet::new(),
        }
    }

    pub fn fail_kind(mut self, kind: &'static str) -> Self {
        self.failing_kinds.insert(kind);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing_kinds.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.key.to_string());
                }

                let outcome = if failing.contains(t.key.kind()) {
                    TaskOutcome::Failed(format!("{} failed (fake)", t.key))
                } else {
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    id: t.id,
                    key: t.key.clone(),
                    outcome,
                })
                .await
                .map_err(|e| QuantflowError::Other(anyhow!("runtime channel closed: {e}")))?;
            }
            Ok(())
        })
    }
}
