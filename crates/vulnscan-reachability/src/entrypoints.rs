//! Entry-point detection: eight independently-scored signals, blended with
//! a co-occurrence boost, filtered by a configurable threshold. Every
//! retained entry point keeps its full signal list with rationale, since
//! callers (output formatters in particular) surface it end to end.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use vulnscan_core::model::{EntryPoint, Signal, SignalKind};
use vulnscan_graph::ImmutableCallGraph;

use crate::frontend::ParsedFile;

struct SignalPattern {
    kind: SignalKind,
    regex: &'static Lazy<Regex>,
    rationale: &'static str,
    weight: f64,
}

static HTTP_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"app\.(get|post|put|delete|patch|use)\s*\(|@(app|router)\.(route|get|post|put|delete)|#\[(get|post|put|delete|patch)\(|\.route\(|HttpServer::new|web::resource|@RequestMapping|@GetMapping|@PostMapping",
    )
    .unwrap()
});
static MAIN_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"if\s+__name__\s*==\s*['"]__main__['"]|fn\s+main\s*\(|public\s+static\s+void\s+main|func\s+main\s*\("#).unwrap()
});
static CLI_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"clap::Parser|#\[derive\(Parser\)\]|argparse\.ArgumentParser|yargs\(|commander\.|Click\.command|@click\.command").unwrap()
});
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.on\s*\(\s*['\"]|addEventListener\(|@app\.on_event|subscribe\s*\(|kafka|amqp|EventEmitter").unwrap()
});
static SERVER_INIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.listen\s*\(|createServer\(|HttpServer::new|app\.run\s*\(|uvicorn\.run|net\.Listen\(").unwrap()
});

const SIGNAL_PATTERNS: &[(SignalKind, &Lazy<Regex>, &str, f64)] = &[
    (SignalKind::HttpHandler, &HTTP_HANDLER, "matches an HTTP route-registration pattern", 0.9),
    (SignalKind::MainFunction, &MAIN_FUNCTION, "contains the language's canonical top-level entry idiom", 0.9),
    (SignalKind::CliCommand, &CLI_COMMAND, "registers subcommands via a CLI dispatch idiom", 0.85),
    (SignalKind::EventHandler, &EVENT_HANDLER, "subscribes to an event bus / message broker / websocket", 0.55),
    (SignalKind::ServerInit, &SERVER_INIT, "constructs and starts a server object", 0.55),
];

fn test_file_pattern(path: &str) -> bool {
    static TEST_PATH: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(^|/)(tests?|spec|__tests__)/|[_.-]test[_.]|test[_.-]|\.spec\.|_spec\.").unwrap()
    });
    TEST_PATH.is_match(path)
}

/// Per-file signal scan plus graph-derived signals (no-incoming-calls,
/// package-export) and the weighted-blend aggregation.
pub fn detect_entry_points(
    parsed_files: &HashMap<String, ParsedFile>,
    graph: &ImmutableCallGraph,
    min_confidence: f64,
) -> Vec<EntryPoint> {
    let mut entry_points = Vec::new();

    for (file, parsed) in parsed_files {
        let mut signals = Vec::new();

        for (kind, pattern, rationale, weight) in SIGNAL_PATTERNS {
            if let Some(m) = pattern.find(&parsed.source) {
                signals.push(Signal {
                    kind: *kind,
                    rationale: rationale.to_string(),
                    evidence_span: m.as_str().to_string(),
                    confidence: *weight,
                });
            }
        }

        if is_package_export(file, parsed) {
            signals.push(Signal {
                kind: SignalKind::PackageExport,
                rationale: "file is re-exported from the project's declared package entry".to_string(),
                evidence_span: file.clone(),
                confidence: 0.6,
            });
        }

        if has_no_incoming_calls(file, graph) {
            signals.push(Signal {
                kind: SignalKind::NoIncomingCalls,
                rationale: "file has zero incoming import/call edges in the graph".to_string(),
                evidence_span: file.clone(),
                confidence: 0.3,
            });
        }

        if test_file_pattern(file) {
            signals.push(Signal {
                kind: SignalKind::TestFile,
                rationale: "filename/location matches a test pattern".to_string(),
                evidence_span: file.clone(),
                confidence: 0.8,
            });
        }

        if signals.is_empty() {
            continue;
        }

        let confidence = aggregate(&signals);
        if confidence >= min_confidence {
            let node = if graph.has_node(file) {
                file.clone()
            } else {
                format!("{file}:unknown")
            };
            entry_points.push(EntryPoint {
                node,
                signals,
                confidence,
            });
        }
    }

    entry_points
}

/// Weighted blend: scale each positive signal's confidence so that a single
/// strong positive (an HTTP handler or `main` function on its own, weight
/// 0.9) clears the default `min_entry_point_confidence` threshold of 0.6
/// unaided, subtract negative (test-file) signal confidence, then apply a
/// co-occurrence boost when two or more positive signals (of any weight)
/// are present together.
fn aggregate(signals: &[Signal]) -> f64 {
    const POSITIVE_SCALE: f64 = 0.75;
    const CO_OCCURRENCE_BOOST: f64 = 0.15;

    let mut positive = 0.0_f64;
    let mut negative = 0.0_f64;
    let mut positive_count = 0;

    for s in signals {
        if s.kind.is_negative() {
            negative += s.confidence;
        } else {
            positive += s.confidence * POSITIVE_SCALE;
            positive_count += 1;
        }
    }

    let mut score = positive;
    if positive_count >= 2 {
        score += CO_OCCURRENCE_BOOST;
    }
    (score - negative).clamp(0.0, 1.0)
}

fn is_package_export(file: &str, parsed: &ParsedFile) -> bool {
    let base = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    matches!(base.as_str(), "index" | "lib" | "mod" | "__init__" | "main")
        && parsed.symbols.iter().any(|s| s.is_exported)
}

fn has_no_incoming_calls(file: &str, graph: &ImmutableCallGraph) -> bool {
    if !graph.has_node(file) {
        return false;
    }
    graph.incoming(file).is_empty()
        && graph
            .node(file)
            .map(|n| n.symbol.is_none())
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_graph::CallGraph;

    fn file(source: &str) -> ParsedFile {
        ParsedFile {
            source: source.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn http_handler_and_server_init_co_occur_and_boost_confidence() {
        let mut files = HashMap::new();
        files.insert(
            "server.js".to_string(),
            file("app.get('/x', handler);\napp.listen(3000);\n"),
        );
        let graph = CallGraph::new().freeze();
        let eps = detect_entry_points(&files, &graph, 0.6);
        assert_eq!(eps.len(), 1);
        assert!(eps[0].confidence > 0.6);
    }

    #[test]
    fn test_file_pattern_suppresses_weak_signals() {
        let mut files = HashMap::new();
        files.insert(
            "src/tests/helper_test.js".to_string(),
            file("function helper() {}\n"),
        );
        let graph = CallGraph::new().freeze();
        let eps = detect_entry_points(&files, &graph, 0.6);
        assert!(eps.is_empty());
    }

    #[test]
    fn main_function_alone_clears_default_threshold_but_stays_below_a_boosted_score() {
        let mut files = HashMap::new();
        files.insert("main.rs".to_string(), file("fn main() {}\n"));
        let graph = CallGraph::new().freeze();
        let eps = detect_entry_points(&files, &graph, 0.6);
        assert_eq!(eps.len(), 1);
        assert!(eps[0].confidence >= 0.6);
        assert!(eps[0].confidence < 1.0);
    }
}
