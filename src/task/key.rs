// src/task/key.rs

//! Task identity.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Identity of a task instance: a kind tag plus its bound parameters.
///
/// Two tasks with equal keys are the same logical node in a run session.
/// Parameters are kept in a sorted map so key equality never depends on the
/// order in which a constructor bound them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    kind: &'static str,
    params: BTreeMap<&'static str, String>,
}

impl TaskKey {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Bind a parameter. Binding the same name twice keeps the last value.
    pub fn param(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.params.insert(name, value.to_string());
        self
    }

    pub fn path_param(self, name: &'static str, value: &Path) -> Self {
        let rendered = value.display().to_string();
        self.param(name, rendered)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.params.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.params.is_empty() {
            return Ok(());
        }
        write!(f, "(")?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}
