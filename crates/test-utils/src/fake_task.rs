use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use tempfile::TempDir;
use quantflow::errors::Result;
use quantflow::target::{LocalTarget, Output};
use quantflow::task::{Inputs, Requirements, Task, TaskKey, TaskRef};

/// Something a fake task did while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Started(String),
    Finished(String),
}

#[derive(Debug, Default, Clone)]
struct FakeSpec {
    deps: Vec<String>,
    failing: bool,
    external: bool,
    delay: Option<Duration>,
}

#[derive(Debug)]
struct WorldInner {
    dir: TempDir,
    specs: Mutex<BTreeMap<String, FakeSpec>>,
    events: Mutex<Vec<FakeEvent>>,
}

/// A scripted graph of file-producing tasks living in a temporary directory.
///
/// Tasks are declared by name and refer to their dependencies by name, so
/// any shape (including cycles) can be described. Each task writes
/// `<dir>/<name>.out`; its body records start and finish events.
#[derive(Debug, Clone)]
pub struct FakeWorld {
    inner: Arc<WorldInner>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WorldInner {
                dir: TempDir::new().expect("create temp dir for fake world"),
                specs: Mutex::new(BTreeMap::new()),
                events: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn dir(&self) -> &Path {
        self.inner.dir.path()
    }

    /// Declare `name` depending on `deps`.
    pub fn task(&self, name: &str, deps: &[&str]) -> &Self {
        let mut specs = self.inner.specs.lock().unwrap();
        let spec = specs.entry(name.to_string()).or_default();
        spec.deps = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Make `name`'s body fail without producing output.
    pub fn failing(&self, name: &str) -> &Self {
        self.update(name, |spec| spec.failing = true)
    }

    /// Undo [`FakeWorld::failing`].
    pub fn repair(&self, name: &str) -> &Self {
        self.update(name, |spec| spec.failing = false)
    }

    /// Mark `name` as an external input (never run).
    pub fn external(&self, name: &str) -> &Self {
        self.update(name, |spec| spec.external = true)
    }

    /// Make `name`'s body sleep before writing its output.
    pub fn delay(&self, name: &str, delay: Duration) -> &Self {
        self.update(name, |spec| spec.delay = Some(delay))
    }

    /// Create `name`'s output up front.
    pub fn precreate(&self, name: &str) -> &Self {
        std::fs::write(self.output_path(name), name).expect("precreate fake output");
        self
    }

    fn update(&self, name: &str, f: impl FnOnce(&mut FakeSpec)) -> &Self {
        let mut specs = self.inner.specs.lock().unwrap();
        f(specs.entry(name.to_string()).or_default());
        self
    }

    fn spec(&self, name: &str) -> FakeSpec {
        self.inner
            .specs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.dir().join(format!("{name}.out"))
    }

    pub fn handle(&self, name: &str) -> FakeTask {
        FakeTask {
            world: self.clone(),
            name: name.to_string(),
        }
    }

    pub fn root(&self, name: &str) -> TaskRef {
        Arc::new(self.handle(name))
    }

    pub fn key(name: &str) -> TaskKey {
        TaskKey::new("Fake").param("name", name)
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.inner.events.lock().unwrap().clone()
    }

    /// Names of tasks whose body ran, in start order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Started(name) => Some(name),
                FakeEvent::Finished(_) => None,
            })
            .collect()
    }

    /// Largest number of bodies that were running at the same moment.
    pub fn max_concurrency(&self) -> usize {
        let mut running = BTreeSet::new();
        let mut max = 0;
        for event in self.events() {
            match event {
                FakeEvent::Started(name) => {
                    running.insert(name);
                    max = max.max(running.len());
                }
                FakeEvent::Finished(name) => {
                    running.remove(&name);
                }
            }
        }
        max
    }

    fn record(&self, event: FakeEvent) {
        self.inner.events.lock().unwrap().push(event);
    }
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// One task of a [`FakeWorld`].
#[derive(Debug, Clone)]
pub struct FakeTask {
    world: FakeWorld,
    name: String,
}

impl Task for FakeTask {
    fn key(&self) -> TaskKey {
        FakeWorld::key(&self.name)
    }

    fn requires(&self) -> Result<Requirements> {
        Ok(self
            .world
            .spec(&self.name)
            .deps
            .into_iter()
            .map(|dep| {
                let task: TaskRef = Arc::new(self.world.handle(&dep));
                (dep, task)
            })
            .collect())
    }

    fn output(&self) -> Output {
        Output::File(LocalTarget::new(self.world.output_path(&self.name)))
    }

    fn is_external(&self) -> bool {
        self.world.spec(&self.name).external
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let spec = self.world.spec(&self.name);
        self.world.record(FakeEvent::Started(self.name.clone()));

        for (name, output) in inputs.iter() {
            if !output.exists() {
                bail!("input {name} of {} is missing", self.name);
            }
        }

        if let Some(delay) = spec.delay {
            std::thread::sleep(delay);
        }

        let result = if spec.failing {
            Err(anyhow::anyhow!("{} failed on purpose", self.name))
        } else {
            self.output().as_file()?.write_bytes(self.name.as_bytes())
        };

        self.world.record(FakeEvent::Finished(self.name.clone()));
        result
    }
}
