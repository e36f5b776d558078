//! Canonical JSON output. Must round-trip losslessly : the
//! wrapper is a straight `serde`-derived struct over the core model types,
//! so nothing here renames or drops a field the way the human-facing
//! formatters do.

use serde::{Deserialize, Serialize};
use vulnscan_core::model::{ReachabilityFinding, Statistics};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub statistics: Statistics,
    pub findings: Vec<ReachabilityFinding>,
}

pub fn render(findings: &[ReachabilityFinding], statistics: &Statistics) -> serde_json::Result<String> {
    let report = JsonReport {
        statistics: statistics.clone(),
        findings: findings.to_vec(),
    };
    serde_json::to_string_pretty(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_finding;

    #[test]
    fn round_trips_through_serde() {
        let findings = vec![sample_finding()];
        let stats = Statistics {
            total_dependencies: 1,
            total_vulnerabilities: 1,
            reachable_count: 1,
            ..Default::default()
        };
        let json = render(&findings, &stats).unwrap();
        let parsed: JsonReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.statistics.total_dependencies, 1);
    }
}
