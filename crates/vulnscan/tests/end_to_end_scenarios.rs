//! End-to-end scan pipeline tests: real project fixtures on disk, run
//! through manifest discovery, extraction, call-graph construction, entry
//! point detection, reachability, taint, and risk scoring. Vulnerability
//! data comes from a [`StaticFeed`] fixture rather than a live network
//! query, so these stay hermetic.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tempfile::tempdir;
use vulnscan::scan;
use vulnscan_core::model::{AffectedPackage, Ecosystem, Severity, VersionRange, Vulnerability};
use vulnscan_core::ScanConfig;
use vulnscan_vulnerabilities::{StaticFeed, VulnerabilityResolver};

fn npm_project(dir: &Path, extra_file: &str, extra_source: &str) {
    fs::write(
        dir.join("package.json"),
        r#"{"name":"fixture","dependencies":{"lodash":"4.17.0"}}"#,
    )
    .unwrap();
    fs::write(
        dir.join("package-lock.json"),
        r#"{"lockfileVersion":3,"packages":{"":{},"node_modules/lodash":{"version":"4.17.0"}}}"#,
    )
    .unwrap();
    fs::write(dir.join(extra_file), extra_source).unwrap();
}

fn lodash_vuln(source: &str, severity: Severity) -> Vulnerability {
    let mut sources = HashSet::new();
    sources.insert(source.to_string());
    Vulnerability {
        canonical_id: "CVE-2024-1234".into(),
        aliases: vec![],
        summary: Some("prototype pollution in merge".into()),
        severity,
        cvss_base: Some(7.5),
        affected_packages: vec![AffectedPackage {
            ecosystem: Ecosystem::Npm,
            name: "lodash".into(),
            ranges: vec![VersionRange {
                introduced: Some("0.0.0".into()),
                fixed: Some("4.17.21".into()),
                last_affected: None,
            }],
        }],
        affected_functions: Some(vec!["merge".to_string()]),
        references: vec![],
        epss_score: Some(0.4),
        epss_percentile: None,
        kev_listed: false,
        kev_due_date: None,
        sources,
    }
}

fn resolver_with(vulns: Vec<Vulnerability>) -> VulnerabilityResolver {
    let feed = StaticFeed {
        name: "fixture",
        vulns,
    };
    VulnerabilityResolver::new(vec![Box::new(feed)], None)
}

#[test]
fn tiny_reachable_http_handler_calling_vulnerable_symbol() {
    let tmp = tempdir().unwrap();
    npm_project(
        tmp.path(),
        "server.js",
        "const lodash = require('lodash');\n\
         function handler(req, res) {\n  lodash.merge(config, {});\n}\n\
         app.post('/x', handler);\n\
         app.listen(3000);\n",
    );

    let resolver = resolver_with(vec![lodash_vuln("fixture", Severity::High)]);
    let report = scan::run_with_resolver(tmp.path(), &ScanConfig::default(), false, &resolver).unwrap();

    assert_eq!(report.statistics.reachable_count, 1);
    let finding = report.findings.iter().find(|f| f.reachable).expect("one reachable finding");
    assert!(finding.confidence >= 0.9, "confidence {} should be >= 0.9", finding.confidence);
    assert_eq!(finding.paths[0].len(), 3);
    assert!(!finding.taint.is_tainted);
}

#[test]
fn tiny_unreachable_symbol_called_only_from_an_orphan_file() {
    let tmp = tempdir().unwrap();
    npm_project(
        tmp.path(),
        "orphan.js",
        "const lodash = require('lodash');\nfunction doStuff() {\n  lodash.merge(x, y);\n}\n",
    );

    let resolver = resolver_with(vec![lodash_vuln("fixture", Severity::High)]);
    let report = scan::run_with_resolver(tmp.path(), &ScanConfig::default(), false, &resolver).unwrap();

    assert_eq!(report.statistics.reachable_count, 0);
    let finding = &report.findings[0];
    assert!(!finding.reachable);
    assert_eq!(finding.confidence, 0.0);
}

#[test]
fn dead_utility_imported_by_nothing_stays_unreachable() {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join("package.json"),
        r#"{"name":"fixture","dependencies":{"lodash":"4.17.0"}}"#,
    )
    .unwrap();
    fs::write(
        tmp.path().join("package-lock.json"),
        r#"{"lockfileVersion":3,"packages":{"":{},"node_modules/lodash":{"version":"4.17.0"}}}"#,
    )
    .unwrap();
    fs::write(
        tmp.path().join("main.js"),
        "function main() {\n  console.log('hi');\n}\nmain();\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("utility.js"),
        "const lodash = require('lodash');\nfunction helper() {\n  lodash.merge(a, b);\n}\n",
    )
    .unwrap();

    let resolver = resolver_with(vec![lodash_vuln("fixture", Severity::High)]);
    let report = scan::run_with_resolver(tmp.path(), &ScanConfig::default(), false, &resolver).unwrap();

    assert_eq!(report.statistics.reachable_count, 0);
}

#[test]
fn taint_positive_when_http_body_flows_unchanged_to_the_symbol() {
    let tmp = tempdir().unwrap();
    npm_project(
        tmp.path(),
        "server.js",
        "const lodash = require('lodash');\n\
         function handler(req, res) {\n  lodash.merge(req.body, {});\n}\n\
         app.post('/x', handler);\n\
         app.listen(3000);\n",
    );

    let resolver = resolver_with(vec![lodash_vuln("fixture", Severity::High)]);
    let report = scan::run_with_resolver(tmp.path(), &ScanConfig::default(), false, &resolver).unwrap();

    let finding = report.findings.iter().find(|f| f.reachable).expect("one reachable finding");
    assert!(finding.taint.is_tainted);
    assert!(finding.taint.observed_sources.contains(&"http_body".to_string()));
    assert!(finding.taint.observed_sanitizers.is_empty());
}

#[test]
fn taint_sanitized_path_scores_lower_than_the_unsanitized_equivalent() {
    let unsanitized = tempdir().unwrap();
    npm_project(
        unsanitized.path(),
        "server.js",
        "const lodash = require('lodash');\n\
         function handler(req, res) {\n  lodash.merge(req.body, {});\n}\n\
         app.post('/x', handler);\n\
         app.listen(3000);\n",
    );

    let sanitized = tempdir().unwrap();
    npm_project(
        sanitized.path(),
        "server.js",
        "const lodash = require('lodash');\n\
         function escape(value) {\n  return lodash.merge(value, {});\n}\n\
         function handler(req, res) {\n  escape(req.body);\n}\n\
         app.post('/x', handler);\n\
         app.listen(3000);\n",
    );

    let resolver = resolver_with(vec![lodash_vuln("fixture", Severity::High)]);
    let unsanitized_report =
        scan::run_with_resolver(unsanitized.path(), &ScanConfig::default(), false, &resolver).unwrap();
    let resolver = resolver_with(vec![lodash_vuln("fixture", Severity::High)]);
    let sanitized_report =
        scan::run_with_resolver(sanitized.path(), &ScanConfig::default(), false, &resolver).unwrap();

    let unsanitized_finding = unsanitized_report
        .findings
        .iter()
        .find(|f| f.reachable)
        .expect("unsanitized finding reachable");
    let sanitized_finding = sanitized_report
        .findings
        .iter()
        .find(|f| f.reachable)
        .expect("sanitized finding reachable");

    assert!(!sanitized_finding.taint.observed_sanitizers.is_empty());
    assert!(sanitized_finding.taint.confidence < unsanitized_finding.taint.confidence);
    assert!(sanitized_finding.risk.score < unsanitized_finding.risk.score);
}

#[test]
fn multi_feed_merge_keeps_one_finding_with_both_sources_and_the_higher_severity() {
    let tmp = tempdir().unwrap();
    npm_project(
        tmp.path(),
        "server.js",
        "const lodash = require('lodash');\n\
         function handler(req, res) {\n  lodash.merge(config, {});\n}\n\
         app.post('/x', handler);\n\
         app.listen(3000);\n",
    );

    let feed_a = StaticFeed {
        name: "feed_a",
        vulns: vec![lodash_vuln("feed_a", Severity::Medium)],
    };
    let feed_b = StaticFeed {
        name: "feed_b",
        vulns: vec![lodash_vuln("feed_b", Severity::Critical)],
    };
    let resolver = VulnerabilityResolver::new(vec![Box::new(feed_a), Box::new(feed_b)], None);

    let report = scan::run_with_resolver(tmp.path(), &ScanConfig::default(), false, &resolver).unwrap();

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.vulnerability.severity, Severity::Critical);
    assert!(finding.vulnerability.sources.contains("feed_a"));
    assert!(finding.vulnerability.sources.contains("feed_b"));
}
