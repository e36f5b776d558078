//! Taint/data-flow overlay.
//!
//! Runs only over the subgraph a reachability finding actually touches: the
//! nodes on the witness path, plus their one-hop neighbors. A full
//! whole-graph fixed point is deliberately out of scope — this is a
//! triage-grade approximation, not a general dataflow solver.

use std::collections::{HashMap, HashSet};

use vulnscan_core::model::{CallPath, TaintVerdict};
use vulnscan_graph::ImmutableCallGraph;

use crate::catalogs::{is_sanitizer, match_source, SourceCategory};
use crate::ParsedFile;

/// A node's local taint summary, computed from its own source text plus
/// whatever its one-hop callees contribute, iterated to a fixed point.
#[derive(Clone, Default)]
struct NodeSummary {
    tainted: bool,
    category: Option<SourceCategory>,
    sanitized_by: Vec<String>,
}

/// Restricts analysis to `path` nodes and their direct neighbors,
/// scans each node's own file text for source/sanitizer patterns, then
/// iterates propagation along edges until no summary changes.
fn build_summaries(
    graph: &ImmutableCallGraph,
    parsed_files: &HashMap<String, ParsedFile>,
    scope: &HashSet<String>,
) -> HashMap<String, NodeSummary> {
    let mut summaries: HashMap<String, NodeSummary> = HashMap::new();

    for handle in scope {
        let mut summary = NodeSummary::default();
        if let Some(node) = graph.node(handle) {
            if let Some(parsed) = parsed_files.get(&node.file) {
                if let Some(category) = match_source(&parsed.source) {
                    summary.tainted = true;
                    summary.category = Some(category);
                }
                if let Some(symbol) = &node.symbol {
                    if is_sanitizer(symbol) {
                        summary.sanitized_by.push(symbol.clone());
                    }
                }
            }
        }
        if let Some(symbol) = handle.rsplit(['.', ':']).next() {
            if is_sanitizer(symbol) {
                summary.sanitized_by.push(symbol.to_string());
            }
        }
        summaries.insert(handle.clone(), summary);
    }

    // Fixed-point propagation: a node becomes tainted if any callee within
    // scope is tainted and this node does not itself sanitize the value.
    let mut changed = true;
    while changed {
        changed = false;
        for handle in scope {
            if summaries.get(handle).map(|s| s.tainted).unwrap_or(false) {
                continue;
            }
            if !summaries
                .get(handle)
                .map(|s| s.sanitized_by.is_empty())
                .unwrap_or(true)
            {
                continue;
            }
            let mut inherited = None;
            for edge in graph.outgoing(handle) {
                if !scope.contains(&edge.to) {
                    continue;
                }
                if let Some(callee) = summaries.get(&edge.to) {
                    if callee.tainted {
                        inherited = callee.category.or(inherited);
                    }
                }
            }
            if let Some(category) = inherited {
                let summary = summaries.get_mut(handle).unwrap();
                summary.tainted = true;
                summary.category = Some(category);
                changed = true;
            }
        }
    }

    summaries
}

fn one_hop_scope(graph: &ImmutableCallGraph, path: &CallPath) -> HashSet<String> {
    let mut scope: HashSet<String> = path.iter().cloned().collect();
    for node in path {
        for edge in graph.outgoing(node) {
            scope.insert(edge.to);
        }
        for edge in graph.incoming(node) {
            scope.insert(edge.from);
        }
    }
    scope
}

/// Walks `path` looking for the strongest source/sanitizer evidence,
/// combining the source category's weight with a reduction per distinct
/// sanitizer encountered downstream of it and a mild per-hop length
/// penalty. Returns [`TaintVerdict::clean`] (confidence 1.0, untainted)
/// when no source is observed anywhere on the path.
pub fn analyze_taint(
    graph: &ImmutableCallGraph,
    parsed_files: &HashMap<String, ParsedFile>,
    path: &CallPath,
) -> TaintVerdict {
    if path.is_empty() {
        return TaintVerdict::clean();
    }

    let scope = one_hop_scope(graph, path);
    let summaries = build_summaries(graph, parsed_files, &scope);

    let mut best_category: Option<SourceCategory> = None;
    let mut observed_sources = Vec::new();
    let mut observed_sanitizers = Vec::new();

    for handle in path {
        if let Some(summary) = summaries.get(handle) {
            if summary.tainted {
                if let Some(category) = summary.category {
                    if best_category.map(|b| category.weight() > b.weight()).unwrap_or(true) {
                        best_category = Some(category);
                    }
                    let label = category.label().to_string();
                    if !observed_sources.contains(&label) {
                        observed_sources.push(label);
                    }
                }
            }
            for s in &summary.sanitized_by {
                if !observed_sanitizers.contains(s) {
                    observed_sanitizers.push(s.clone());
                }
            }
        }
    }

    let Some(category) = best_category else {
        return TaintVerdict::clean();
    };

    let sanitizer_reduction = 1.0 - (0.35 * observed_sanitizers.len() as f64).min(0.9);
    let length_penalty = 0.97_f64.powi((path.len().saturating_sub(1)) as i32);
    let confidence = (category.weight() * sanitizer_reduction * length_penalty).clamp(0.0, 1.0);

    let is_tainted = observed_sanitizers.is_empty() || confidence > 0.5;

    TaintVerdict {
        is_tainted,
        confidence,
        observed_sources,
        observed_sanitizers,
        witness_path: Some(path.clone()),
    }
}
