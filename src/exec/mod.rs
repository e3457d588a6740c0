// src/exec/mod.rs

//! Task execution layer.
//!
//! This module is responsible for actually running the bodies of scheduled
//! tasks and reporting back to the orchestration runtime via
//! `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the background loop that tracks running tasks
//!   and refuses duplicate dispatches of the same task identity.
//! - [`task_runner`] runs one task body on the blocking pool.
//! - [`external`] wraps external programs (salmon, perl scripts) as task
//!   bodies.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `BlockingExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod external;
pub mod task_runner;

pub use backend::{BlockingExecutorBackend, ExecutorBackend};
pub use executor_loop::spawn_executor;
pub use external::{ExternalProgram, ProgramTask};
