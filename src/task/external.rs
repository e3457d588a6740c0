// src/task/external.rs

//! Tasks that stand for inputs produced outside the pipeline.

use crate::target::{LocalTarget, Output};

use super::{Inputs, Task, TaskKey};

/// A pre-existing file (reference FASTA, annotation table, a program).
///
/// The engine never runs it; if its output is missing the whole run is
/// rejected before execution starts.
#[derive(Debug, Clone)]
pub struct ExternalInput {
    key: TaskKey,
    output: Output,
}

impl ExternalInput {
    /// A single file, keyed by kind and path.
    pub fn file(kind: &'static str, path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        let key = TaskKey::new(kind).path_param("path", &path);
        Self {
            key,
            output: Output::File(LocalTarget::new(path)),
        }
    }

    /// Arbitrary output shape under an explicit key.
    pub fn with_output(key: TaskKey, output: impl Into<Output>) -> Self {
        Self {
            key,
            output: output.into(),
        }
    }
}

impl Task for ExternalInput {
    fn key(&self) -> TaskKey {
        self.key.clone()
    }

    fn output(&self) -> Output {
        self.output.clone()
    }

    fn is_external(&self) -> bool {
        true
    }

    fn run(&self, _inputs: &Inputs) -> anyhow::Result<()> {
        anyhow::bail!(
            "external input {} is missing and cannot be produced by the pipeline",
            self.key
        )
    }
}
