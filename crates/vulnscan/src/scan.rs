//! Scan orchestration: wires the phases together in strict sequence
//! (discover manifests → extract dependencies → resolve vulnerabilities,
//! independently of building the call graph → build the call graph →
//! detect entry points → check reachability → overlay taint → score risk).

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use vulnscan_core::model::{
    Dependency, DependencyKey, FailedManifest, ManifestKind, ReachabilityFinding, Statistics,
};
use vulnscan_core::ScanConfig;
use vulnscan_vulnerabilities::{osv::OsvFeed, VulnerabilityFeed, VulnerabilityResolver};

use crate::risk_context;

pub struct ScanReport {
    pub findings: Vec<ReachabilityFinding>,
    pub statistics: Statistics,
    pub failed_manifests: Vec<FailedManifest>,
}

/// When both a primary manifest and a lockfile exist for the same
/// ecosystem in a workspace, the lockfile wins — it carries resolved
/// versions, which is what feed matching and the `DependencyKey`
/// actually need. Central manifests (BOMs / version catalogs) are
/// extracted independently and never displace either.
fn extract_dependencies(
    workspaces: &[vulnscan_core::model::Workspace],
    config: &ScanConfig,
    failed_manifests: &mut Vec<FailedManifest>,
) -> Vec<Dependency> {
    let mut by_key: HashMap<(vulnscan_core::model::Ecosystem, String), (ManifestKind, Dependency)> =
        HashMap::new();
    let mut centrally_managed = Vec::new();

    for workspace in workspaces {
        for manifest in &workspace.manifests {
            let extracted = match vulnscan_extract::extract_from_manifest(manifest, config) {
                Ok(deps) => deps,
                Err(e) => {
                    failed_manifests.push(FailedManifest {
                        path: manifest.absolute_path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for dep in extracted {
                if manifest.kind == ManifestKind::Central {
                    centrally_managed.push(dep);
                    continue;
                }
                let slot_key = (dep.ecosystem, dep.name.clone());
                match by_key.get(&slot_key) {
                    Some((existing_kind, _)) if *existing_kind == ManifestKind::Lockfile && manifest.kind != ManifestKind::Lockfile => {
                        // lockfile entry already present, primary manifest doesn't displace it
                    }
                    _ => {
                        by_key.insert(slot_key, (manifest.kind, dep));
                    }
                }
            }
        }
    }

    let mut deps: Vec<Dependency> = by_key.into_values().map(|(_, dep)| dep).collect();
    deps.extend(centrally_managed);
    deps
}

pub fn cache_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".vulnscan")
        .join("cache")
}

pub fn model_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".vulnscan")
        .join("model.json")
}

pub fn feedback_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".vulnscan")
        .join("feedback.jsonl")
}

pub fn run(root: &Path, config: &ScanConfig, learned_risk: bool) -> anyhow::Result<ScanReport> {
    let cache = vulnscan_cache::CacheStore::open(cache_dir()).ok();
    let feeds: Vec<Box<dyn VulnerabilityFeed>> = config
        .enabled_feeds
        .iter()
        .filter_map(|name| match name.as_str() {
            "osv" => Some(Box::new(OsvFeed::new(config.feed_timeout_seconds)) as Box<dyn VulnerabilityFeed>),
            other => {
                tracing::warn!(feed = other, "unknown feed name in configuration, ignoring");
                None
            }
        })
        .collect();
    let resolver = VulnerabilityResolver::new(feeds, cache);
    run_with_resolver(root, config, learned_risk, &resolver)
}

/// Runs the same pipeline as [`run`] against an already-constructed
/// resolver, so a caller that already has vulnerability data in hand (a
/// fixture replay, a test) can drive manifest discovery, the call graph,
/// reachability, taint, and risk scoring without a live feed query.
pub fn run_with_resolver(
    root: &Path,
    config: &ScanConfig,
    learned_risk: bool,
    resolver: &VulnerabilityResolver,
) -> anyhow::Result<ScanReport> {
    let start = Instant::now();

    // A. Manifest discovery.
    let discovery = vulnscan_core::discover(root, config);
    let mut failed_manifests = discovery.failed_manifests.clone();

    // B. Dependency extraction, lockfile-over-primary precedence.
    let dependencies = extract_dependencies(&discovery.workspaces, config, &mut failed_manifests);

    // C. Vulnerability resolution (independent of D).
    let vulnerabilities: HashMap<DependencyKey, Vec<_>> = resolver.resolve(&dependencies);

    // D. Call-graph construction.
    let build_result = vulnscan_reachability::build_call_graph(root, &dependencies);
    let graph = build_result.graph;
    let parsed_files = build_result.parsed_files;

    // E. Entry-point detection.
    let entry_points =
        vulnscan_reachability::detect_entry_points(&parsed_files, &graph, config.min_entry_point_confidence);

    let mut findings = Vec::new();
    let mut tainted_count = 0usize;
    let mut reachable_count = 0usize;
    let mut by_severity: HashMap<String, u32> = HashMap::new();

    let model = learned_risk
        .then(|| vulnscan_risk::ModelStore::new(model_path()).load())
        .flatten();
    let scorer = match &model {
        Some(m) => vulnscan_risk::RiskScorer::learned(m),
        None => vulnscan_risk::RiskScorer::default_mode(),
    };

    for dependency in &dependencies {
        let Some(vulns) = vulnerabilities.get(&dependency.key()) else {
            continue;
        };

        for vulnerability in vulns {
            // F. Reachability analysis: BFS from every entry point to a
            // node matching this vulnerability's affected package/symbols.
            let affected_functions = vulnerability.affected_functions.clone().unwrap_or_default();
            let outcome = vulnscan_reachability::analyze_reachability(
                &graph,
                &entry_points,
                &dependency.name,
                &affected_functions,
                config.max_branch_depth,
                config.max_traversal_depth,
                config.max_paths_per_target,
                config.min_finding_confidence,
            );

            let witness = outcome.paths.first().cloned().unwrap_or_default();

            // G. Taint overlay, restricted to the witness path (only run
            // when data-flow analysis is enabled; otherwise treat as clean
            // accordingly).
            let taint = if config.enable_data_flow {
                vulnscan_taint::analyze_taint(&graph, &parsed_files, &witness)
            } else {
                vulnscan_core::model::TaintVerdict::clean()
            };

            let matched_entry = entry_points.iter().find(|ep| Some(&ep.node) == witness.first());

            // H. Risk scoring.
            let ctx = risk_context::build(
                &graph,
                &parsed_files,
                matched_entry,
                &witness,
                outcome.confidence,
                dependency.transitive,
            );
            let risk = scorer.score(vulnerability, &taint, &ctx);

            if outcome.reachable {
                reachable_count += 1;
            }
            if taint.is_tainted {
                tainted_count += 1;
            }
            *by_severity.entry(format!("{:?}", vulnerability.severity)).or_insert(0) += 1;

            findings.push(ReachabilityFinding {
                vulnerability: vulnerability.clone(),
                dependency: dependency.clone(),
                reachable: outcome.reachable,
                confidence: outcome.confidence,
                paths: outcome.paths,
                taint,
                risk,
                truncated: outcome.truncated,
            });
        }
    }

    findings.sort_by(|a, b| {
        b.risk
            .score
            .partial_cmp(&a.risk.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.vulnerability.canonical_id.cmp(&b.vulnerability.canonical_id))
    });

    let statistics = Statistics {
        total_dependencies: dependencies.len(),
        total_vulnerabilities: findings.len(),
        by_severity,
        reachable_count,
        tainted_count,
        entry_point_count: entry_points.len(),
        manifest_count: discovery.workspaces.iter().map(|w| w.manifests.len()).sum(),
        failed_manifest_count: failed_manifests.len(),
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    Ok(ScanReport {
        findings,
        statistics,
        failed_manifests,
    })
}
