//! Call-graph data structures shared by the reachability engine and the
//! taint overlay.
//!
//! Nodes are keyed by a stable string handle (`"<file>:<symbol>"`, or just
//! `"<file>"` when the symbol could not be resolved) rather than by object
//! identity, so cyclic call graphs and dynamic dispatch are a non-issue and
//! serialization is trivial.
//!
//! The graph is mutable only while it is being built;
//! [`CallGraph::freeze`] consumes the builder and returns an
//! [`ImmutableCallGraph`] that exposes read-only queries, which is how later
//! components (entry-point detection, reachability, taint) are prevented
//! from mutating it.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable string handle for a call-graph node: `"<file>:<symbol>"` or
/// `"<file>"` when the symbol is unresolved.
pub type NodeHandle = String;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("graph is frozen and cannot be mutated")]
    Frozen,
    #[error("graph consistency invariant violated: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Attributes carried by every call-graph node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeData {
    pub file: String,
    pub symbol: Option<String>,
    /// `true` for nodes standing in for a call into library-owned code.
    pub is_external: bool,
    /// `(ecosystem, name)` key of the dependency this external node belongs
    /// to. Always `None` for project-owned nodes.
    pub package: Option<String>,
}

impl NodeData {
    pub fn project(file: impl Into<String>, symbol: Option<String>) -> Self {
        Self {
            file: file.into(),
            symbol,
            is_external: false,
            package: None,
        }
    }

    pub fn external(
        file: impl Into<String>,
        symbol: Option<String>,
        package: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            symbol,
            is_external: true,
            package: Some(package.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CallType {
    Direct,
    DirectMethod,
    Dynamic,
    Import,
    Reflective,
    Conditional,
}

impl CallType {
    /// Upper bound on edge confidence imposed purely by the call kind,
    /// before any per-site adjustment. Dynamic dispatch and reflection are
    /// capped ("confidence <= 0.6").
    pub fn max_confidence(self) -> f64 {
        match self {
            CallType::Dynamic | CallType::Reflective => 0.6,
            CallType::Conditional => 0.75,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub call_type: CallType,
    pub confidence: f64,
}

impl EdgeData {
    pub fn new(call_type: CallType, confidence: f64) -> Self {
        Self {
            call_type,
            confidence: confidence.clamp(0.0, call_type.max_confidence()),
        }
    }
}

/// A directed call-graph edge as exposed to callers (handle-addressed, not
/// index-addressed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeHandle,
    pub to: NodeHandle,
    pub call_type: CallType,
    pub confidence: f64,
}

/// Mutable call graph under construction. Only `vulnscan-reachability`'s
/// source parser & call-graph builder should hold one of these; every
/// downstream consumer works with an [`ImmutableCallGraph`].
#[derive(Default)]
pub struct CallGraph {
    graph: StableDiGraph<NodeData, EdgeData>,
    handles: HashMap<NodeHandle, NodeIndex>,
    index_to_handle: HashMap<NodeIndex, NodeHandle>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node if absent, returning its handle. Re-inserting the same
    /// handle with different data overwrites the attributes (the builder
    /// typically resolves richer attributes in a later pass).
    pub fn upsert_node(&mut self, handle: impl Into<String>, data: NodeData) -> NodeHandle {
        let handle = handle.into();
        match self.handles.get(&handle) {
            Some(idx) => {
                self.graph[*idx] = data;
            }
            None => {
                let idx = self.graph.add_node(data);
                self.handles.insert(handle.clone(), idx);
                self.index_to_handle.insert(idx, handle.clone());
            }
        }
        handle
    }

    pub fn has_node(&self, handle: &str) -> bool {
        self.handles.contains_key(handle)
    }

    pub fn node(&self, handle: &str) -> Option<&NodeData> {
        self.handles.get(handle).map(|idx| &self.graph[*idx])
    }

    /// Add a directed edge. Both endpoints are created (as bare project
    /// nodes) if they don't already exist, since call sites are often
    /// discovered before their target's own definition is parsed.
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        call_type: CallType,
        confidence: f64,
    ) -> NodeHandle {
        let from = from.into();
        let to = to.into();
        let from_idx = self.get_or_add_index(&from);
        let to_idx = self.get_or_add_index(&to);
        self.graph
            .add_edge(from_idx, to_idx, EdgeData::new(call_type, confidence));
        from
    }

    fn get_or_add_index(&mut self, handle: &str) -> NodeIndex {
        if let Some(idx) = self.handles.get(handle) {
            return *idx;
        }
        let idx = self
            .graph
            .add_node(NodeData::project(handle.to_string(), None));
        self.handles.insert(handle.to_string(), idx);
        self.index_to_handle.insert(idx, handle.to_string());
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Consume the builder, publishing an immutable, read-only view. This is
    /// the single enforcement point for the rule that the graph is mutated
    /// only while it's being built.
    pub fn freeze(self) -> ImmutableCallGraph {
        ImmutableCallGraph {
            graph: self.graph,
            handles: self.handles,
            index_to_handle: self.index_to_handle,
        }
    }
}

/// Read-only call graph. Entry-point detection, reachability analysis, and
/// the taint overlay all hold one of these and cannot mutate it.
#[derive(Clone)]
pub struct ImmutableCallGraph {
    graph: StableDiGraph<NodeData, EdgeData>,
    handles: HashMap<NodeHandle, NodeIndex>,
    index_to_handle: HashMap<NodeIndex, NodeHandle>,
}

impl ImmutableCallGraph {
    pub fn node(&self, handle: &str) -> Option<&NodeData> {
        self.handles.get(handle).map(|idx| &self.graph[*idx])
    }

    pub fn has_node(&self, handle: &str) -> bool {
        self.handles.contains_key(handle)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn handles(&self) -> impl Iterator<Item = &NodeHandle> {
        self.handles.keys()
    }

    /// Outgoing edges from `handle`, i.e. calls `handle` makes.
    pub fn outgoing(&self, handle: &str) -> Vec<Edge> {
        let Some(idx) = self.handles.get(handle) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*idx, Direction::Outgoing)
            .map(|e| Edge {
                from: handle.to_string(),
                to: self.handle_of(e.target()),
                call_type: e.weight().call_type,
                confidence: e.weight().confidence,
            })
            .collect()
    }

    /// Incoming edges into `handle`, i.e. who calls `handle`. This is the
    /// reverse-adjacency query needed for backward traversal; because both
    /// directions are served from the same underlying graph, forward/reverse
    /// consistency holds by construction rather than by manually-synchronized
    /// bookkeeping.
    pub fn incoming(&self, handle: &str) -> Vec<Edge> {
        let Some(idx) = self.handles.get(handle) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*idx, Direction::Incoming)
            .map(|e| Edge {
                from: self.handle_of(e.source()),
                to: handle.to_string(),
                call_type: e.weight().call_type,
                confidence: e.weight().confidence,
            })
            .collect()
    }

    pub fn all_edges(&self) -> Vec<Edge> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (s, t) = self.graph.edge_endpoints(e)?;
                let w = &self.graph[e];
                Some(Edge {
                    from: self.handle_of(s),
                    to: self.handle_of(t),
                    call_type: w.call_type,
                    confidence: w.confidence,
                })
            })
            .collect()
    }

    fn handle_of(&self, idx: NodeIndex) -> NodeHandle {
        self.index_to_handle.get(&idx).cloned().unwrap_or_default()
    }

    /// Verifies that for every forward edge there is a matching reverse
    /// entry. Exposed so integration tests (and, in principle, a
    /// `FatalError` check at scan start) can assert it cheaply without
    /// walking the whole graph by hand.
    pub fn check_consistency(&self) -> Result<()> {
        for edge in self.all_edges() {
            let reverse = self.incoming(&edge.to);
            let found = reverse
                .iter()
                .any(|e| e.from == edge.from && e.call_type == edge.call_type);
            if !found {
                return Err(GraphError::Inconsistent(format!(
                    "edge {} -> {} missing from reverse adjacency",
                    edge.from, edge.to
                )));
            }
        }
        Ok(())
    }
}
