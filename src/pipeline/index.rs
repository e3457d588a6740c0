// src/pipeline/index.rs

use std::sync::Arc;

use crate::errors::Result;
use crate::exec::{ExternalProgram, ProgramTask};
use crate::target::{FlagTarget, Output};
use crate::task::{Inputs, Requirements, Task, TaskKey};

use super::PipelineConfig;
use super::inputs::{reference_transcriptome, salmon_binary};

/// `salmon index` over the reference transcriptome.
///
/// The index is a directory; it counts as built once `__SUCCESS` appears in
/// it, which only happens after salmon exited successfully.
#[derive(Debug, Clone)]
pub struct SalmonIndex {
    cfg: Arc<PipelineConfig>,
}

impl SalmonIndex {
    pub fn new(cfg: Arc<PipelineConfig>) -> Self {
        Self { cfg }
    }

    fn flag(&self) -> FlagTarget {
        FlagTarget::new(self.cfg.index_dir())
    }
}

impl Task for SalmonIndex {
    fn key(&self) -> TaskKey {
        TaskKey::new("SalmonIndex").path_param("index", &self.cfg.index_dir())
    }

    fn requires(&self) -> Result<Requirements> {
        Ok(Requirements::new()
            .with("reference", reference_transcriptome(&self.cfg))
            .with("salmon", salmon_binary(&self.cfg)))
    }

    fn output(&self) -> Output {
        self.flag().into()
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        self.run_program(inputs)
    }
}

impl ProgramTask for SalmonIndex {
    fn program(&self, inputs: &Inputs) -> anyhow::Result<ExternalProgram> {
        let salmon = inputs.get("salmon")?.as_file()?;
        let reference = inputs.get("reference")?.as_file()?;
        let flag = self.flag();
        flag.ensure_dir()?;

        let settings = &self.cfg.config().salmon;
        let mut program = ExternalProgram::new(salmon.path())
            .label("salmon index")
            .arg("index")
            .arg("-t")
            .arg(reference.path())
            .arg("-i")
            .arg(flag.dir());
        if settings.pass_threads_to_index {
            program = program.arg("-p").arg(settings.threads.to_string());
        }
        Ok(program)
    }

    fn after_success(&self, _inputs: &Inputs) -> anyhow::Result<()> {
        self.flag().publish()
    }
}
