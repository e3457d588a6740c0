// src/pipeline/quant.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::Result;
use crate::exec::{ExternalProgram, ProgramTask};
use crate::target::{FlagTarget, Output};
use crate::task::{Inputs, Requirements, Task, TaskKey};

use super::inputs::{fastq_input, salmon_binary};
use super::{PipelineConfig, QUANT_TABLE, SalmonIndex};

/// `salmon quant` for one sample, into `output/<file_id>/`.
#[derive(Debug, Clone)]
pub struct SalmonQuant {
    cfg: Arc<PipelineConfig>,
    file_id: String,
}

impl SalmonQuant {
    pub fn new(cfg: Arc<PipelineConfig>, file_id: impl Into<String>) -> Self {
        Self {
            cfg,
            file_id: file_id.into(),
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    fn flag(&self) -> FlagTarget {
        FlagTarget::new(self.cfg.sample_dir(&self.file_id))
    }
}

/// Location of `quant.sf` inside a finished quant output.
pub fn quant_table(output: &Output) -> Result<PathBuf> {
    Ok(output.as_flag()?.dir().join(QUANT_TABLE))
}

impl Task for SalmonQuant {
    fn key(&self) -> TaskKey {
        TaskKey::new("SalmonQuant").param("file_id", &self.file_id)
    }

    fn requires(&self) -> Result<Requirements> {
        Ok(Requirements::new()
            .with("fastq", fastq_input(&self.cfg, &self.file_id))
            .with("index", SalmonIndex::new(self.cfg.clone()))
            .with("salmon", salmon_binary(&self.cfg)))
    }

    fn output(&self) -> Output {
        self.flag().into()
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        self.run_program(inputs)
    }
}

impl ProgramTask for SalmonQuant {
    fn program(&self, inputs: &Inputs) -> anyhow::Result<ExternalProgram> {
        let salmon = inputs.get("salmon")?.as_file()?;
        let index = inputs.get("index")?.as_flag()?;
        let fastq = inputs.get("fastq")?;
        let r1 = fastq.member("R1")?.as_file()?;
        let r2 = fastq.member("R2")?.as_file()?;

        let flag = self.flag();
        flag.ensure_dir()?;

        let settings = &self.cfg.config().salmon;
        let mut program = ExternalProgram::new(salmon.path())
            .label(format!("salmon quant ({})", self.file_id))
            .arg("quant")
            .arg("-i")
            .arg(index.dir())
            .arg("-l")
            .arg(&settings.library_type)
            .arg("-1")
            .arg(r1.path())
            .arg("-2")
            .arg(r2.path());
        if settings.pass_threads_to_quant {
            program = program.arg("-p").arg(settings.threads.to_string());
        }
        Ok(program.arg("-o").arg(flag.dir()))
    }

    fn after_success(&self, _inputs: &Inputs) -> anyhow::Result<()> {
        self.flag().publish()
    }
}
