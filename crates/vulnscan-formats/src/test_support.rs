//! Shared finding fixture for format module tests.

use vulnscan_core::model::{
    AffectedPackage, Dependency, Ecosystem, RiskAssessment, RiskLevel, ReachabilityFinding,
    Severity, TaintVerdict, Vulnerability,
};

pub fn sample_finding() -> ReachabilityFinding {
    ReachabilityFinding {
        vulnerability: Vulnerability {
            canonical_id: "CVE-2024-1234".to_string(),
            aliases: vec!["GHSA-xxxx-yyyy-zzzz".to_string()],
            summary: Some("Prototype pollution in merge()".to_string()),
            severity: Severity::Critical,
            cvss_base: Some(9.8),
            affected_packages: vec![AffectedPackage {
                ecosystem: Ecosystem::Npm,
                name: "lodash".to_string(),
                ranges: vec![],
            }],
            affected_functions: Some(vec!["merge".to_string()]),
            references: vec!["https://example.invalid/advisory".to_string()],
            epss_score: Some(0.87),
            epss_percentile: Some(0.95),
            kev_listed: true,
            kev_due_date: None,
            sources: Default::default(),
        },
        dependency: Dependency {
            name: "lodash".to_string(),
            version: Some("4.17.15".to_string()),
            ecosystem: Ecosystem::Npm,
            manifest_ref: "package.json".into(),
            transitive: false,
        },
        reachable: true,
        confidence: 0.91,
        paths: vec![vec!["a.js:main".to_string(), "lodash.merge".to_string()]],
        taint: TaintVerdict {
            is_tainted: true,
            confidence: 0.8,
            observed_sources: vec!["http_body".to_string()],
            observed_sanitizers: vec![],
            witness_path: Some(vec!["a.js:main".to_string(), "lodash.merge".to_string()]),
        },
        risk: RiskAssessment {
            score: 87.5,
            level: RiskLevel::Critical,
            top_factors: vec![],
        },
        truncated: false,
    }
}
