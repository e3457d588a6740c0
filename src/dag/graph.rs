// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::errors::{QuantflowError, Result};
use crate::task::{TaskKey, TaskRef};

/// Index of a node in a [`TaskGraph`].
pub type TaskId = usize;

/// Requirement chains deeper than this are treated as runaway discovery.
const MAX_DEPTH: usize = 4096;

/// A discovered task instance plus its adjacency.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub key: TaskKey,
    pub task: TaskRef,
    /// Direct dependencies, by requirement name, in declaration order.
    pub deps: Vec<(String, TaskId)>,
    /// Direct dependents: nodes that list this one as a requirement.
    pub dependents: Vec<TaskId>,
    /// `complete()` as evaluated at discovery time.
    pub complete: bool,
}

/// The transitive closure of requirements rooted at the requested tasks,
/// deduplicated by [`TaskKey`].
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<TaskKey, TaskId>,
    roots: Vec<TaskId>,
    /// Topological order: every node appears after all of its dependencies.
    order: Vec<TaskId>,
}

impl TaskGraph {
    /// Walk `requires()` from `roots`, building one node per distinct key.
    ///
    /// Fails fast with [`QuantflowError::DagCycle`] if a task (transitively)
    /// requires itself.
    pub fn discover(roots: &[TaskRef]) -> Result<Self> {
        let mut discovery = Discovery::default();
        let mut root_ids = Vec::new();

        for root in roots {
            let id = discovery.visit(root.clone())?;
            if !root_ids.contains(&id) {
                root_ids.push(id);
            }
        }

        let Discovery {
            mut nodes, index, ..
        } = discovery;

        for id in 0..nodes.len() {
            let deps: Vec<TaskId> = nodes[id].deps.iter().map(|(_, d)| *d).collect();
            for dep in deps {
                if !nodes[dep].dependents.contains(&id) {
                    nodes[dep].dependents.push(id);
                }
            }
        }

        let order = topological_order(&nodes)?;

        debug!(
            nodes = nodes.len(),
            roots = root_ids.len(),
            "task graph discovered"
        );

        Ok(Self {
            nodes,
            index,
            roots: root_ids,
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: TaskId) -> &GraphNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (TaskId, &GraphNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn id_of(&self, key: &TaskKey) -> Option<TaskId> {
        self.index.get(key).copied()
    }

    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// Immediate dependencies of a node.
    pub fn dependencies_of(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.nodes[id].deps.iter().map(|(_, d)| *d)
    }

    /// Immediate dependents of a node.
    pub fn dependents_of(&self, id: TaskId) -> &[TaskId] {
        &self.nodes[id].dependents
    }

    /// Which nodes the requested roots actually need.
    ///
    /// Roots are needed; an incomplete needed node needs its dependencies.
    /// Anything reachable only through a complete node is not needed: it is
    /// part of the graph but will not be scheduled.
    pub fn needed(&self) -> Vec<bool> {
        let mut needed = vec![false; self.nodes.len()];
        for &root in &self.roots {
            needed[root] = true;
        }

        // Dependents come later in `order`, so walking it backwards visits
        // every dependent before its dependencies.
        for &id in self.order.iter().rev() {
            if needed[id] && !self.nodes[id].complete {
                for dep in self.dependencies_of(id) {
                    needed[dep] = true;
                }
            }
        }

        needed
    }
}

#[derive(Default)]
struct Discovery {
    nodes: Vec<GraphNode>,
    index: HashMap<TaskKey, TaskId>,
    /// Keys on the current DFS path, in order.
    path: Vec<TaskKey>,
    on_path: HashSet<TaskKey>,
}

impl Discovery {
    fn visit(&mut self, task: TaskRef) -> Result<TaskId> {
        let key = task.key();

        if self.on_path.contains(&key) {
            return Err(QuantflowError::DagCycle(self.describe_cycle(&key)));
        }
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }
        if self.path.len() >= MAX_DEPTH {
            return Err(QuantflowError::ConfigError(format!(
                "requirement chain deeper than {MAX_DEPTH} tasks below {key}"
            )));
        }

        self.path.push(key.clone());
        self.on_path.insert(key.clone());

        let requirements = task.requires()?;
        let mut deps = Vec::with_capacity(requirements.len());
        for (name, dep) in requirements.iter() {
            let dep_id = self.visit(dep.clone())?;
            deps.push((name.to_string(), dep_id));
        }

        self.path.pop();
        self.on_path.remove(&key);

        let complete = task.complete();
        let id = self.nodes.len();
        debug!(task = %key, id, complete, "discovered task");

        self.index.insert(key.clone(), id);
        self.nodes.push(GraphNode {
            key,
            task,
            deps,
            dependents: Vec::new(),
            complete,
        });

        Ok(id)
    }

    fn describe_cycle(&self, repeated: &TaskKey) -> String {
        let start = self
            .path
            .iter()
            .position(|k| k == repeated)
            .unwrap_or(0);
        let mut chain: Vec<String> = self.path[start..].iter().map(|k| k.to_string()).collect();
        chain.push(repeated.to_string());
        chain.join(" -> ")
    }
}

/// Order nodes so dependencies come first, via petgraph.
///
/// Edge direction: dep -> dependent.
fn topological_order(nodes: &[GraphNode]) -> Result<Vec<TaskId>> {
    let mut graph: DiGraph<TaskId, ()> = DiGraph::with_capacity(nodes.len(), 0);
    let indices: Vec<NodeIndex> = (0..nodes.len()).map(|id| graph.add_node(id)).collect();

    for (id, node) in nodes.iter().enumerate() {
        for (_, dep) in &node.deps {
            graph.add_edge(indices[*dep], indices[id], ());
        }
    }

    match toposort(&graph, None) {
        Ok(sorted) => Ok(sorted.into_iter().map(|idx| graph[idx]).collect()),
        Err(cycle) => {
            let id = graph[cycle.node_id()];
            Err(QuantflowError::DagCycle(format!(
                "involving task '{}'",
                nodes[id].key
            )))
        }
    }
}
