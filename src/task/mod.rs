// src/task/mod.rs

//! Task model.
//!
//! A task is a node in the dependency graph: it has an identity
//! ([`TaskKey`]), declares named upstream [`Requirements`], declares its own
//! [`Output`], and knows how to produce that output in [`Task::run`].
//!
//! - [`key`] defines task identity.
//! - [`requirements`] holds the dependency builder and the [`Inputs`] handed
//!   to `run()`.
//! - [`output`] derives output paths from a naming pattern.
//! - [`external`] provides tasks that only assert a pre-existing input.

pub mod external;
pub mod key;
pub mod output;
pub mod requirements;

use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::Result;
use crate::target::Output;

pub use external::ExternalInput;
pub use key::TaskKey;
pub use output::TargetOutput;
pub use requirements::{Inputs, Requirements};

/// Shared handle to a task instance in the graph.
pub type TaskRef = Arc<dyn Task>;

pub trait Task: Send + Sync + Debug {
    /// Identity of this instance.
    fn key(&self) -> TaskKey;

    /// Upstream tasks this one needs, by name.
    ///
    /// Called during graph discovery only. It may perform bounded,
    /// side-effect-free I/O (e.g. reading the sample manifest) to decide what
    /// it needs; errors here are configuration errors.
    fn requires(&self) -> Result<Requirements> {
        Ok(Requirements::none())
    }

    /// Where this task's artifact lives.
    fn output(&self) -> Output;

    /// Whether the work is already done.
    fn complete(&self) -> bool {
        self.output().exists()
    }

    /// True for tasks that cannot produce their output and only assert that
    /// it already exists.
    fn is_external(&self) -> bool {
        false
    }

    /// Produce the output.
    ///
    /// Only called when `complete()` is false and every requirement is
    /// complete. `inputs` holds the outputs of [`Task::requires`] by name.
    fn run(&self, inputs: &Inputs) -> anyhow::Result<()>;
}
