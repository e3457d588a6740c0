// src/task/output.rs

//! Path naming for task outputs.

use std::path::PathBuf;

use crate::target::LocalTarget;

use super::TaskKey;

/// Derives a task's output path from `root`, a naming pattern and a fixed
/// extension.
///
/// The pattern may contain `{task}` (the task kind) and `{<param>}` for any
/// parameter bound in the task key. Unknown placeholders are left as-is.
///
/// ```
/// use std::path::Path;
/// use quantflow::task::{TargetOutput, TaskKey};
///
/// let key = TaskKey::new("SummarizeCounts");
/// let target = TargetOutput::new("data/summary")
///     .ext("_count.csv")
///     .suffix_preserving()
///     .resolve(&key);
/// assert_eq!(target.path(), Path::new("data/summary/SummarizeCounts_count.csv"));
/// assert!(target.is_suffix_preserving());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutput {
    root: PathBuf,
    pattern: String,
    ext: String,
    suffix_preserving: bool,
}

impl TargetOutput {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pattern: "{task}".to_string(),
            ext: ".txt".to_string(),
            suffix_preserving: false,
        }
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = ext.into();
        self
    }

    /// Produce targets whose temporary files keep the extension.
    pub fn suffix_preserving(mut self) -> Self {
        self.suffix_preserving = true;
        self
    }

    /// File name for the given task key, without the root.
    pub fn file_name(&self, key: &TaskKey) -> String {
        let mut name = self.pattern.replace("{task}", key.kind());
        for (param, value) in key.params() {
            name = name.replace(&format!("{{{param}}}"), value);
        }
        name.push_str(&self.ext);
        name
    }

    pub fn path(&self, key: &TaskKey) -> PathBuf {
        self.root.join(self.file_name(key))
    }

    pub fn resolve(&self, key: &TaskKey) -> LocalTarget {
        let path = self.path(key);
        if self.suffix_preserving {
            LocalTarget::suffix_preserving(path)
        } else {
            LocalTarget::new(path)
        }
    }
}
