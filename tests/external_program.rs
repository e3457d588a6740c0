// tests/external_program.rs
#![cfg(unix)]

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;

use quantflow::dag::TaskRunState;
use quantflow::errors::QuantflowError;
use quantflow::exec::external::{STDERR_TAIL_LINES, resolve_program};
use quantflow::exec::{ExternalProgram, ProgramTask};
use quantflow::target::{FlagTarget, Output, Target};
use quantflow::task::{Inputs, Task, TaskKey, TaskRef};
use quantflow::{BuildOptions, build};

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> ExternalProgram {
    ExternalProgram::new("sh").arg("-c").arg(script)
}

#[test]
fn successful_program_returns_ok() -> TestResult {
    init_tracing();
    sh("echo to stdout; echo to stderr >&2").run()?;
    Ok(())
}

#[test]
fn non_zero_exit_carries_code_and_stderr() {
    init_tracing();
    let err = sh("echo first >&2; echo oops >&2; exit 3")
        .label("failing step")
        .run()
        .expect_err("exit 3 must fail");

    match err {
        QuantflowError::ProgramFailed {
            program,
            code,
            stderr_tail,
        } => {
            assert_eq!(program, "failing step");
            assert_eq!(code, Some(3));
            assert_eq!(stderr_tail, ["first", "oops"]);
        }
        other => panic!("expected ProgramFailed, got {other:?}"),
    }
}

#[test]
fn stderr_tail_keeps_only_the_last_lines() {
    init_tracing();
    let err = sh("i=1; while [ $i -le 30 ]; do echo line$i >&2; i=$((i+1)); done; exit 1")
        .run()
        .expect_err("exit 1 must fail");

    let QuantflowError::ProgramFailed { stderr_tail, .. } = err else {
        panic!("expected ProgramFailed, got {err:?}");
    };
    assert_eq!(stderr_tail.len(), STDERR_TAIL_LINES);
    assert_eq!(stderr_tail.first().map(String::as_str), Some("line11"));
    assert_eq!(stderr_tail.last().map(String::as_str), Some("line30"));
}

#[test]
fn invalid_utf8_output_does_not_stop_draining() -> TestResult {
    init_tracing();
    // Enough stderr after the bad byte that a closed pipe would kill the
    // child with SIGPIPE.
    sh("printf 'progress \\377\\n' >&2; sleep 0.2; \
        i=1; while [ $i -le 2000 ]; do echo \"line $i of progress output\" >&2; i=$((i+1)); done; \
        exit 0")
    .run()?;
    Ok(())
}

#[test]
fn invalid_utf8_lines_are_kept_lossily() {
    init_tracing();
    let err = sh("printf 'bad \\377 byte\\n' >&2; echo after >&2; exit 2")
        .run()
        .expect_err("exit 2 must fail");

    let QuantflowError::ProgramFailed { code, stderr_tail, .. } = err else {
        panic!("expected ProgramFailed, got {err:?}");
    };
    assert_eq!(code, Some(2));
    assert_eq!(stderr_tail, ["bad \u{FFFD} byte", "after"]);
}

#[test]
fn missing_program_is_an_error() {
    init_tracing();
    let err = ExternalProgram::new("/definitely/not/here/salmon")
        .run()
        .expect_err("spawn must fail");
    assert!(
        err.to_string().contains("/definitely/not/here/salmon"),
        "error: {err}"
    );
}

#[test]
fn command_line_and_working_directory() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let program = ExternalProgram::new("sh")
        .args(["-c", "pwd > where.txt"])
        .current_dir(dir.path());
    assert_eq!(program.command_line(), "sh -c pwd > where.txt");
    assert_eq!(program.arguments().len(), 2);

    program.run()?;
    let recorded = std::fs::read_to_string(dir.path().join("where.txt"))?;
    assert_eq!(
        PathBuf::from(recorded.trim()).canonicalize()?,
        dir.path().canonicalize()?
    );
    Ok(())
}

#[test]
fn bare_names_resolve_on_path() {
    let sh = resolve_program(std::path::Path::new("sh"));
    assert!(sh.is_absolute(), "resolved to {sh:?}");
    assert!(sh.is_file());
    let mode = std::fs::metadata(&sh).map(|m| m.permissions().mode()).unwrap_or(0);
    assert_ne!(mode & 0o111, 0, "{sh:?} is not executable");

    let explicit = PathBuf::from("./tools/salmon");
    assert_eq!(resolve_program(&explicit), explicit);
    let unknown = PathBuf::from("no-such-tool-anywhere");
    assert_eq!(resolve_program(&unknown), unknown);
}

/// A program task that fills a directory and publishes a flag.
#[derive(Debug)]
struct ShellStep {
    dir: PathBuf,
    script: &'static str,
}

impl ShellStep {
    fn flag(&self) -> FlagTarget {
        FlagTarget::new(&self.dir)
    }
}

impl Task for ShellStep {
    fn key(&self) -> TaskKey {
        TaskKey::new("ShellStep").path_param("dir", &self.dir)
    }

    fn output(&self) -> Output {
        self.flag().into()
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        self.run_program(inputs)
    }
}

impl ProgramTask for ShellStep {
    fn program(&self, _inputs: &Inputs) -> anyhow::Result<ExternalProgram> {
        self.flag().ensure_dir()?;
        Ok(sh(self.script).current_dir(&self.dir))
    }

    fn after_success(&self, _inputs: &Inputs) -> anyhow::Result<()> {
        self.flag().publish()
    }
}

#[tokio::test]
async fn failed_program_task_does_not_write_its_flag() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let step = ShellStep {
        dir: dir.path().join("index"),
        script: "echo partial > part.bin; echo 'index build failed' >&2; exit 1",
    };
    let flag = step.flag();
    let root: TaskRef = Arc::new(step);

    let report = build(&[root], BuildOptions::default()).await?;

    assert!(!report.success());
    assert_eq!(report.state_of_kind("ShellStep"), Some(TaskRunState::Failed));
    assert!(flag.dir().join("part.bin").exists());
    assert!(!flag.exists());

    let task = &report.tasks[0];
    let error = task.error.as_deref().unwrap_or_default();
    assert!(error.contains("exit code 1"), "error: {error}");
    assert!(error.contains("index build failed"), "error: {error}");
    Ok(())
}

#[tokio::test]
async fn successful_program_task_writes_its_flag() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let step = ShellStep {
        dir: dir.path().join("index"),
        script: "echo done > part.bin",
    };
    let flag = step.flag();
    let root: TaskRef = Arc::new(step);

    let report = build(&[root], BuildOptions::default()).await?;

    assert!(report.success(), "{report}");
    assert!(flag.exists());
    assert_eq!(report.tasks[0].produced().count(), 1);
    Ok(())
}
