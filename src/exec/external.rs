// src/exec/external.rs

//! External programs as task bodies.

use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

use crate::errors::{QuantflowError, Result};
use crate::task::{Inputs, Task};

/// Number of trailing stderr lines kept for failure reports.
pub const STDERR_TAIL_LINES: usize = 20;

/// A command line to run to completion: program, arguments and an optional
/// working directory.
#[derive(Debug, Clone)]
pub struct ExternalProgram {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    label: Option<String>,
}

impl ExternalProgram {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            label: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Name used in logs and errors instead of the program path.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    fn name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// The command as a single display string (not shell-escaped).
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// Spawn the program and wait for it.
    ///
    /// stdout and stderr are streamed line by line into the log at debug
    /// level. A non-zero exit (or death by signal) becomes
    /// [`QuantflowError::ProgramFailed`] carrying the last
    /// [`STDERR_TAIL_LINES`] lines of stderr.
    pub fn run(&self) -> Result<()> {
        let name = self.name();
        info!(program = %name, cmd = %self.command_line(), "running external program");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("spawning `{}`", self.command_line()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout of `{name}` was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr of `{name}` was not captured"))?;

        // Drain both pipes concurrently so neither can fill up and stall the
        // child.
        let (status, stderr_tail) = thread::scope(|scope| {
            let out = scope.spawn(|| {
                for_each_line(stdout, |line| debug!(program = %name, "stdout: {line}"));
            });
            let err = scope.spawn(|| {
                let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
                for_each_line(stderr, |line| {
                    debug!(program = %name, "stderr: {line}");
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line.to_string());
                });
                tail
            });

            let status = child.wait();
            if out.join().is_err() {
                warn!(program = %name, "stdout reader panicked");
            }
            let tail = err.join().map_err(|_| anyhow!("stderr reader of `{name}` panicked"));
            (status, tail)
        });

        let stderr_tail = stderr_tail?;
        let status = status.with_context(|| format!("waiting for `{name}`"))?;
        debug!(program = %name, exit_code = ?status.code(), "external program exited");

        if status.success() {
            Ok(())
        } else {
            Err(QuantflowError::ProgramFailed {
                program: name,
                code: status.code(),
                stderr_tail: stderr_tail.into_iter().collect(),
            })
        }
    }
}

/// Call `f` for every line of `stream`. Invalid UTF-8 is replaced; only EOF
/// or an I/O error ends the read.
fn for_each_line(stream: impl Read, mut f: impl FnMut(&str)) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                f(line.trim_end_matches(['\n', '\r']));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "reading program output failed");
                break;
            }
        }
    }
}

/// A task whose body is one external program.
///
/// Implementors describe the command; [`ProgramTask::run_program`] runs it
/// and only calls [`ProgramTask::after_success`] once the program has exited
/// successfully, so flag files are never published for a failed run.
pub trait ProgramTask: Task {
    fn program(&self, inputs: &Inputs) -> anyhow::Result<ExternalProgram>;

    fn after_success(&self, _inputs: &Inputs) -> anyhow::Result<()> {
        Ok(())
    }

    fn run_program(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let program = self.program(inputs)?;
        program.run()?;
        self.after_success(inputs)
    }
}

/// Resolve a bare program name against `PATH`.
///
/// Names containing a path separator are returned unchanged, as is a name
/// that cannot be found (so the missing file shows up in pre-flight checks).
pub fn resolve_program(name: &Path) -> PathBuf {
    if name.components().count() > 1 || name.is_absolute() {
        return name.to_path_buf();
    }
    which::which(name).unwrap_or_else(|_| name.to_path_buf())
}
