//! SARIF 2.1.0 output (struct shapes, builder methods, locations derived
//! from a dependency manifest path plus a rule per distinct vulnerability
//! ID so duplicate findings across workspaces collapse under one rule).

use serde::{Deserialize, Serialize};
use vulnscan_core::model::{ReachabilityFinding, Severity};

pub const SARIF_VERSION: &str = "2.1.0";
pub const SCHEMA_URI: &str = "https://json.schemastore.org/sarif-2.1.0.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifReport {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub tool: Tool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub driver: Driver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub name: String,
    pub version: String,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub short_description: MessageString,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageString {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: MessageString,
    pub locations: Vec<Location>,
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    pub artifact_location: ArtifactLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

fn sarif_level(severity: Severity, reachable: bool) -> &'static str {
    if !reachable {
        return "note";
    }
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Unknown => "note",
    }
}

pub fn render(findings: &[ReachabilityFinding], tool_version: &str) -> SarifReport {
    let mut rules = Vec::new();
    let mut results = Vec::new();
    let mut seen_rules = std::collections::HashSet::new();

    for f in findings {
        let id = &f.vulnerability.canonical_id;
        if seen_rules.insert(id.clone()) {
            rules.push(Rule {
                id: id.clone(),
                short_description: MessageString {
                    text: f
                        .vulnerability
                        .summary
                        .clone()
                        .unwrap_or_else(|| format!("Vulnerability {id}")),
                },
            });
        }

        let uri = f
            .dependency
            .manifest_ref
            .to_string_lossy()
            .replace('\\', "/");

        results.push(SarifResult {
            rule_id: id.clone(),
            level: sarif_level(f.vulnerability.severity, f.reachable).to_string(),
            message: MessageString {
                text: format!(
                    "{} affects {}@{} (reachable: {}, risk: {:.0}/100)",
                    id,
                    f.dependency.name,
                    f.dependency.version.clone().unwrap_or_else(|| "unresolved".to_string()),
                    f.reachable,
                    f.risk.score,
                ),
            },
            locations: vec![Location {
                physical_location: PhysicalLocation {
                    artifact_location: ArtifactLocation { uri },
                },
            }],
            properties: serde_json::json!({
                "confidence": f.confidence,
                "isTainted": f.taint.is_tainted,
                "riskLevel": format!("{:?}", f.risk.level),
            }),
        });
    }

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SCHEMA_URI.to_string(),
        runs: vec![Run {
            tool: Tool {
                driver: Driver {
                    name: "vulnscan".to_string(),
                    version: tool_version.to_string(),
                    rules,
                },
            },
            results,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_finding;

    #[test]
    fn unreachable_finding_downgrades_to_note_level() {
        let mut finding = sample_finding();
        finding.reachable = false;
        let report = render(&[finding], "0.1.0");
        assert_eq!(report.runs[0].results[0].level, "note");
    }

    #[test]
    fn reachable_critical_finding_is_an_error() {
        let report = render(&[sample_finding()], "0.1.0");
        assert_eq!(report.runs[0].results[0].level, "error");
        assert_eq!(report.runs[0].tool.driver.rules.len(), 1);
    }

    #[test]
    fn duplicate_vulnerability_ids_collapse_to_one_rule() {
        let findings = vec![sample_finding(), sample_finding()];
        let report = render(&findings, "0.1.0");
        assert_eq!(report.runs[0].tool.driver.rules.len(), 1);
        assert_eq!(report.runs[0].results.len(), 2);
    }

    #[test]
    fn serializes_with_the_expected_schema_version() {
        let report = render(&[sample_finding()], "0.1.0");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("2.1.0"));
    }
}
