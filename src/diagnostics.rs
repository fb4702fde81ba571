//! Inspecting graphs and reporting failures.
//!
//! Neither of these influences evaluation. A [`Blueprint`] is a snapshot of
//! the shape of a graph, [`report`] renders failure causes as structured
//! `tracing` events.

use std::collections::HashMap;
use std::fmt::Write;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::engine::{Inspect, NodeId, NodeKind};
use crate::error::{Cause, Label};

/// One node of a [`Blueprint`].
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: Option<Label>,
    /// Name of the produced type, for display only.
    pub output: &'static str,
}

/// The shape of a computation graph, flattened into a `petgraph` graph.
///
/// Nodes shared by several parents appear once. Edges point from a
/// dependency to the node that depends on it, and carry the position of the
/// dependency in its parent's declaration order.
#[derive(Debug, Clone)]
pub struct Blueprint {
    graph: DiGraph<NodeInfo, usize>,
    root: NodeIndex,
}

impl Blueprint {
    pub fn of(computation: &dyn Inspect) -> Self {
        let mut graph = DiGraph::new();
        let mut seen = HashMap::new();
        let root = visit(computation, &mut graph, &mut seen);

        Self { graph, root }
    }

    pub fn graph(&self) -> &DiGraph<NodeInfo, usize> {
        &self.graph
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes ordered so that every dependency comes before its dependents.
    pub fn topological_order(&self) -> Vec<NodeIndex> {
        // Construction only ever references existing nodes.
        toposort(&self.graph, None).unwrap_or_default()
    }

    /// Renders the graph as a Mermaid flowchart.
    pub fn render_mermaid(&self) -> String {
        let mut f = String::new();
        writeln!(f, "graph LR").ok();

        for index in self.graph.node_indices() {
            let node = &self.graph[index];
            let name = match &node.label {
                Some(label) => format!("{:?}\\n{}", node.kind, label),
                None => format!("{:?}", node.kind),
            };

            writeln!(f, "    {}[\"{}\"]", index.index(), escape(&name)).ok();
        }

        for edge in self.graph.edge_indices() {
            let Some((source, target)) = self.graph.edge_endpoints(edge) else {
                continue;
            };

            writeln!(
                f,
                "    {} -- \"{}\" --> {}",
                source.index(),
                escape(self.graph[source].output),
                target.index()
            )
            .ok();
        }

        f
    }
}

fn visit(
    node: &dyn Inspect,
    graph: &mut DiGraph<NodeInfo, usize>,
    seen: &mut HashMap<NodeId, NodeIndex>,
) -> NodeIndex {
    if let Some(&index) = seen.get(&node.id()) {
        return index;
    }

    let index = graph.add_node(NodeInfo {
        id: node.id(),
        kind: node.kind(),
        label: node.label().cloned(),
        output: node.output_type(),
    });
    seen.insert(node.id(), index);

    for (position, dependency) in node.dependencies().iter().enumerate() {
        let source = visit(dependency.as_ref(), graph, seen);
        graph.add_edge(source, index, position);
    }

    index
}

fn escape(text: &str) -> String {
    text.replace('"', "#quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Emits one `warn` event per cause, with the owner and scope of the failing
/// combinator as separate fields when the cause carries a label.
pub fn report(causes: &[Cause]) {
    for cause in causes {
        let error = cause
            .underlying()
            .map(|error| format!("{error:#}"))
            .unwrap_or_default();

        match cause.label() {
            Some(label) => tracing::warn!(
                owner = label.owner(),
                scope = label.scope(),
                kind = ?cause.kind(),
                path = ?cause.path(),
                error = %error,
                "{}",
                cause.context()
            ),
            None => tracing::warn!(
                kind = ?cause.kind(),
                path = ?cause.path(),
                error = %error,
                "{}",
                cause.context()
            ),
        }
    }
}
