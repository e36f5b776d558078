//! Reachability engine: BFS from entry points to nodes representing a
//! vulnerable dependency's symbols (or the dependency itself, when no
//! symbol list is known), with a confidence score blended from path
//! length, edge confidence, entry-point quality, and function-match
//! precision.

use std::collections::{HashSet, VecDeque};

use vulnscan_core::model::{CallPath, EntryPoint};
use vulnscan_graph::ImmutableCallGraph;

pub struct ReachabilityOutcome {
    pub reachable: bool,
    pub confidence: f64,
    pub paths: Vec<CallPath>,
    pub truncated: bool,
}

/// Whether a target node is an exact `affected_functions` match (qualified
/// `"package.symbol"` form), a partial method-name-only match (unqualified
/// `"package:symbol"` form), or a package-level hit (no symbol list known).
#[derive(Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    Exact,
    Partial,
    PackageOnly,
}

fn classify_target(handle: &str, package: &str, affected_functions: &[String]) -> Option<TargetKind> {
    if affected_functions.is_empty() {
        let prefix = format!("{package}:");
        if handle == prefix.trim_end_matches(':') || handle.starts_with(&prefix) || handle.starts_with(&format!("{package}.")) {
            return Some(TargetKind::PackageOnly);
        }
        return None;
    }

    for f in affected_functions {
        if handle == format!("{package}.{f}") {
            return Some(TargetKind::Exact);
        }
        if handle == format!("{package}:{f}") {
            return Some(TargetKind::Partial);
        }
    }
    None
}

/// Runs BFS from every entry point over the forward call graph, recording
/// up to `max_paths_per_target` paths to any node matching `package`
/// (optionally narrowed to `affected_functions`), then returns the highest-
/// confidence result. `min_finding_confidence` only decides the `reachable`
/// flag — sub-threshold findings are still returned (informative, not an
/// error)
pub fn analyze_reachability(
    graph: &ImmutableCallGraph,
    entry_points: &[EntryPoint],
    package: &str,
    affected_functions: &[String],
    max_branch_depth: usize,
    max_traversal_depth: usize,
    max_paths_per_target: usize,
    min_finding_confidence: f64,
) -> ReachabilityOutcome {
    let mut found: Vec<(CallPath, f64)> = Vec::new();
    let mut truncated = false;

    for ep in entry_points {
        if !graph.has_node(&ep.node) {
            continue;
        }
        if found.len() >= max_paths_per_target {
            break;
        }

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(ep.node.clone());
        // (node, path-so-far, cumulative-edge-confidence-product, total-steps)
        let mut queue: VecDeque<(String, CallPath, f64, usize)> = VecDeque::new();
        queue.push_back((ep.node.clone(), vec![ep.node.clone()], 1.0, 0));

        let mut steps_taken = 0usize;

        while let Some((node, path, product, branch_depth)) = queue.pop_front() {
            steps_taken += 1;
            if steps_taken > max_traversal_depth {
                truncated = true;
                break;
            }
            if branch_depth >= max_branch_depth {
                continue;
            }

            for edge in graph.outgoing(&node) {
                if visited.contains(&edge.to) {
                    continue;
                }
                visited.insert(edge.to.clone());

                let mut next_path = path.clone();
                next_path.push(edge.to.clone());
                let next_product = product * edge.confidence;

                if let Some(kind) = classify_target(&edge.to, package, affected_functions) {
                    let confidence = path_confidence(next_product, next_path.len(), ep.confidence, kind);
                    found.push((next_path.clone(), confidence));
                    if found.len() >= max_paths_per_target {
                        break;
                    }
                }

                queue.push_back((edge.to, next_path, next_product, branch_depth + 1));
            }
            if found.len() >= max_paths_per_target {
                break;
            }
        }
    }

    found.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    found.truncate(max_paths_per_target);

    let best_confidence = found.first().map(|(_, c)| *c).unwrap_or(0.0);
    ReachabilityOutcome {
        reachable: best_confidence >= min_finding_confidence,
        confidence: best_confidence,
        paths: found.into_iter().map(|(p, _)| p).collect(),
        truncated,
    }
}

/// `start * 0.95^(len-1) * entry_point_confidence`, plus the function-match
/// bonus, clamped to `[0,1]`.
fn path_confidence(edge_product: f64, path_len: usize, entry_point_confidence: f64, kind: TargetKind) -> f64 {
    let length_penalty = 0.95_f64.powi((path_len.saturating_sub(1)) as i32);
    let bonus = match kind {
        TargetKind::Exact => 0.10,
        TargetKind::Partial => 0.05,
        TargetKind::PackageOnly => 0.0,
    };
    (edge_product * length_penalty * entry_point_confidence + bonus).clamp(0.0, 1.0)
}
