// src/target/mod.rs

//! Durable, existence-checkable artifacts.
//!
//! - [`local`] holds single-file targets with atomic publication.
//! - [`flag`] holds directory targets completed by a `__SUCCESS` sentinel.
//! - [`Output`] is what a task declares: one of the above, or a named group.

pub mod flag;
pub mod local;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::{QuantflowError, Result};

pub use flag::{FlagTarget, SUCCESS_FLAG};
pub use local::LocalTarget;

/// Anything whose existence reflects durable storage.
///
/// Implementations must hit the filesystem on every call; there is no
/// in-memory cache of existence.
pub trait Target {
    fn exists(&self) -> bool;

    /// Every concrete path backing this target.
    fn paths(&self) -> Vec<PathBuf>;
}

/// Named sub-targets, e.g. `{"R1", "R2"}` or `{"count", "tpm"}`.
///
/// A group exists only if every member exists. An empty group exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetGroup {
    members: BTreeMap<String, Output>,
}

impl TargetGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, output: impl Into<Output>) -> Self {
        self.members.insert(name.into(), output.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Output> {
        self.members.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Target for TargetGroup {
    fn exists(&self) -> bool {
        self.members.values().all(Output::exists)
    }

    fn paths(&self) -> Vec<PathBuf> {
        self.members.values().flat_map(Output::paths).collect()
    }
}

/// The artifact a task declares as its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    File(LocalTarget),
    Flag(FlagTarget),
    Group(TargetGroup),
}

impl Output {
    pub fn exists(&self) -> bool {
        match self {
            Output::File(t) => t.exists(),
            Output::Flag(t) => t.exists(),
            Output::Group(g) => g.exists(),
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            Output::File(t) => t.paths(),
            Output::Flag(t) => t.paths(),
            Output::Group(g) => g.paths(),
        }
    }

    /// Expect a single-file output.
    pub fn as_file(&self) -> Result<&LocalTarget> {
        match self {
            Output::File(t) => Ok(t),
            other => Err(shape_error("a file", other)),
        }
    }

    /// Expect a flag-guarded directory output.
    pub fn as_flag(&self) -> Result<&FlagTarget> {
        match self {
            Output::Flag(t) => Ok(t),
            other => Err(shape_error("a flag directory", other)),
        }
    }

    /// Look up a named member of a group output.
    pub fn member(&self, name: &str) -> Result<&Output> {
        match self {
            Output::Group(g) => g.get(name).ok_or_else(|| {
                QuantflowError::ConfigError(format!("output group has no member '{name}'"))
            }),
            other => Err(shape_error("a group", other)),
        }
    }
}

impl Target for Output {
    fn exists(&self) -> bool {
        Output::exists(self)
    }

    fn paths(&self) -> Vec<PathBuf> {
        Output::paths(self)
    }
}

impl From<LocalTarget> for Output {
    fn from(t: LocalTarget) -> Self {
        Output::File(t)
    }
}

impl From<FlagTarget> for Output {
    fn from(t: FlagTarget) -> Self {
        Output::Flag(t)
    }
}

impl From<TargetGroup> for Output {
    fn from(g: TargetGroup) -> Self {
        Output::Group(g)
    }
}

fn shape_error(expected: &str, got: &Output) -> QuantflowError {
    let got = match got {
        Output::File(_) => "a file",
        Output::Flag(_) => "a flag directory",
        Output::Group(_) => "a group",
    };
    QuantflowError::ConfigError(format!("expected output to be {expected}, found {got}"))
}
