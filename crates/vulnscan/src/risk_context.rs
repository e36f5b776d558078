//! Derives [`vulnscan_risk::RiskContext`] from the call graph, the matched
//! entry point, and a reachability witness path — the fields the
//! feature vector needs that no single component computes on its own.

use std::collections::HashMap;

use vulnscan_core::model::{CallPath, EntryPoint, SignalKind};
use vulnscan_graph::{CallType, ImmutableCallGraph};
use vulnscan_reachability::ParsedFile;
use vulnscan_risk::RiskContext;

use once_cell::sync::Lazy;
use regex::Regex;

static AUTH_GUARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)require_?auth|authenticate|is_?authenticated|@login_required|ensureAuthenticated|passport\.authenticate|jwt\.verify").unwrap()
});
static ERROR_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\btry\b|\bcatch\b|\bexcept\b|\brescue\b|\.catch\(").unwrap()
});
static BACKGROUND_WORK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cron|schedule|worker|queue\.process|job|setInterval|celery\.task").unwrap()
});

/// Highest-confidence signal on an entry point, used to weight its type
/// and decide whether it sits in the project's "main" request/command flow.
fn dominant_signal(entry_point: &EntryPoint) -> Option<SignalKind> {
    entry_point
        .signals
        .iter()
        .filter(|s| !s.kind.is_negative())
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
        .map(|s| s.kind)
}

fn entry_point_type_weight(kind: Option<SignalKind>) -> f64 {
    match kind {
        Some(SignalKind::HttpHandler) | Some(SignalKind::ServerInit) => 0.9,
        Some(SignalKind::MainFunction) | Some(SignalKind::CliCommand) => 0.8,
        Some(SignalKind::EventHandler) => 0.5,
        Some(SignalKind::PackageExport) => 0.4,
        Some(SignalKind::NoIncomingCalls) => 0.3,
        Some(SignalKind::TestFile) | None => 0.1,
    }
}

fn in_main_flow(kind: Option<SignalKind>) -> bool {
    matches!(kind, Some(SignalKind::HttpHandler) | Some(SignalKind::MainFunction) | Some(SignalKind::CliCommand))
}

fn is_background(kind: Option<SignalKind>, path: &CallPath, parsed_files: &HashMap<String, ParsedFile>) -> bool {
    if matches!(kind, Some(SignalKind::EventHandler)) {
        return true;
    }
    path_source_matches(path, parsed_files, &BACKGROUND_WORK)
}

fn path_source_matches(path: &CallPath, parsed_files: &HashMap<String, ParsedFile>, pattern: &Regex) -> bool {
    path.iter()
        .filter_map(|handle| handle.split(':').next())
        .filter_map(|file| parsed_files.get(file))
        .any(|parsed| pattern.is_match(&parsed.source))
}

fn has_conditional_edge(graph: &ImmutableCallGraph, path: &CallPath) -> bool {
    path.windows(2).any(|pair| {
        graph
            .outgoing(&pair[0])
            .into_iter()
            .any(|edge| edge.to == pair[1] && edge.call_type == CallType::Conditional)
    })
}

/// Builds the context an orchestrator owes the risk scorer for one
/// `(entry_point, witness path)` pair. `path` is empty when reachability
/// analysis found no live path at all (the scorer still runs, scoring the
/// unreachable case on its own merits).
pub fn build(
    graph: &ImmutableCallGraph,
    parsed_files: &HashMap<String, ParsedFile>,
    entry_point: Option<&EntryPoint>,
    path: &CallPath,
    reachability_confidence: f64,
    transitive: bool,
) -> RiskContext {
    let dominant = entry_point.and_then(dominant_signal);

    RiskContext {
        reachability_confidence,
        path_length: path.len(),
        in_main_flow: in_main_flow(dominant),
        behind_auth: path_source_matches(path, parsed_files, &AUTH_GUARD),
        has_conditional_edge: has_conditional_edge(graph, path),
        has_error_handler: path_source_matches(path, parsed_files, &ERROR_HANDLER),
        is_background: is_background(dominant, path, parsed_files),
        entry_point_type_weight: entry_point_type_weight(dominant),
        transitive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::model::Signal;

    fn ep(kind: SignalKind, confidence: f64) -> EntryPoint {
        EntryPoint {
            node: "a.js:handler".into(),
            signals: vec![Signal {
                kind,
                rationale: "test".into(),
                evidence_span: String::new(),
                confidence,
            }],
            confidence,
        }
    }

    #[test]
    fn http_handler_is_main_flow_with_high_type_weight() {
        let entry = ep(SignalKind::HttpHandler, 0.9);
        let ctx = build(
            &vulnscan_graph::CallGraph::new().freeze(),
            &HashMap::new(),
            Some(&entry),
            &vec![],
            0.5,
            false,
        );
        assert!(ctx.in_main_flow);
        assert_eq!(ctx.entry_point_type_weight, 0.9);
    }

    #[test]
    fn event_handler_is_flagged_background() {
        let entry = ep(SignalKind::EventHandler, 0.55);
        let ctx = build(
            &vulnscan_graph::CallGraph::new().freeze(),
            &HashMap::new(),
            Some(&entry),
            &vec![],
            0.5,
            false,
        );
        assert!(ctx.is_background);
        assert!(!ctx.in_main_flow);
    }

    #[test]
    fn no_entry_point_defaults_to_low_weight_non_main_flow() {
        let ctx = build(
            &vulnscan_graph::CallGraph::new().freeze(),
            &HashMap::new(),
            None,
            &vec![],
            0.0,
            true,
        );
        assert!(!ctx.in_main_flow);
        assert!(ctx.transitive);
        assert_eq!(ctx.entry_point_type_weight, 0.1);
    }
}
