// src/task/requirements.rs

//! Named dependency lists and the inputs handed to `run()`.

use std::sync::Arc;

use crate::errors::{QuantflowError, Result};
use crate::target::Output;

use super::{Task, TaskRef};

/// Ordered, named upstream dependencies of a task.
///
/// ```
/// use quantflow::task::{ExternalInput, Requirements};
///
/// let reqs = Requirements::new()
///     .with("reference", ExternalInput::file("ReferenceTranscriptome", "ref/tx.fa"))
///     .with("salmon", ExternalInput::file("SalmonBinary", "/usr/bin/salmon"));
/// let names: Vec<&str> = reqs.iter().map(|(name, _)| name).collect();
/// assert_eq!(names, ["reference", "salmon"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    entries: Vec<(String, TaskRef)>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a task without dependencies.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a dependency under `name`. A later entry with the same name
    /// replaces the earlier one.
    pub fn with<T: Task + 'static>(self, name: impl Into<String>, task: T) -> Self {
        self.with_ref(name, Arc::new(task))
    }

    pub fn with_ref(mut self, name: impl Into<String>, task: TaskRef) -> Self {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = task;
        } else {
            self.entries.push((name, task));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskRef)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, TaskRef)> for Requirements {
    fn from_iter<I: IntoIterator<Item = (String, TaskRef)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Requirements::new(), |reqs, (name, task)| reqs.with_ref(name, task))
    }
}

/// Outputs of a task's requirements, by requirement name, in declaration
/// order.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    entries: Vec<(String, Output)>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, output: Output) {
        self.entries.push((name.into(), output));
    }

    pub fn get(&self, name: &str) -> Result<&Output> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o)
            .ok_or_else(|| QuantflowError::ConfigError(format!("task has no input named '{name}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
