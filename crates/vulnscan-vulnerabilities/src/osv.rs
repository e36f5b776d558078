use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{AffectedPackage, Ecosystem, Severity, VersionRange, Vulnerability};

use crate::VulnerabilityFeed;

const OSV_API_BASE: &str = "https://api.osv.dev/v1";

/// OSV's own ecosystem vocabulary, distinct from ours (`PyPI`, `Maven`,
/// `Go`, `npm`, `crates.io`, `RubyGems`, `Packagist`, `NuGet`, `Pub`,
/// `SwiftURL`, `Hex`, `Hackage`).
fn osv_ecosystem_name(ecosystem: Ecosystem) -> &'static str {
    match ecosystem {
        Ecosystem::Npm => "npm",
        Ecosystem::PyPI => "PyPI",
        Ecosystem::Maven => "Maven",
        Ecosystem::Go => "Go",
        Ecosystem::Cargo => "crates.io",
        Ecosystem::RubyGems => "RubyGems",
        Ecosystem::Packagist => "Packagist",
        Ecosystem::NuGet => "NuGet",
        Ecosystem::Pub => "Pub",
        Ecosystem::Swift => "SwiftURL",
        Ecosystem::Hex => "Hex",
        Ecosystem::Hackage => "Hackage",
    }
}

pub struct OsvFeed {
    timeout: Duration,
}

impl OsvFeed {
    pub fn new(timeout_seconds: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

#[derive(Debug, Serialize)]
struct OsvQueryRequest {
    version: String,
    package: OsvPackage,
}

#[derive(Debug, Serialize)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

#[derive(Debug, Deserialize)]
struct OsvQueryResponse {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    aliases: Vec<String>,
    summary: Option<String>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
    #[serde(default)]
    references: Vec<OsvReference>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    package: OsvPackageInfo,
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Debug, Deserialize)]
struct OsvPackageInfo {
    name: String,
    ecosystem: String,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    introduced: Option<String>,
    fixed: Option<String>,
    last_affected: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String,
    score: String,
}

impl VulnerabilityFeed for OsvFeed {
    fn name(&self) -> &'static str {
        "osv"
    }

    fn query(&self, ecosystem: Ecosystem, name: &str, version: &str) -> Result<Vec<Vulnerability>> {
        let request = OsvQueryRequest {
            version: version.to_string(),
            package: OsvPackage {
                name: name.to_string(),
                ecosystem: osv_ecosystem_name(ecosystem).to_string(),
            },
        };

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        let agent: ureq::Agent = config.into();

        let mut response = agent
            .post(&format!("{OSV_API_BASE}/query"))
            .send_json(&request)
            .map_err(|e| ScanError::FeedUnavailable {
                feed: "osv".to_string(),
                reason: e.to_string(),
            })?;

        let parsed: OsvQueryResponse =
            response.body_mut().read_json().map_err(|e| ScanError::FeedUnavailable {
                feed: "osv".to_string(),
                reason: format!("response parse failed: {e}"),
            })?;

        Ok(parsed.vulns.into_iter().map(convert).collect())
    }
}

fn convert(osv: OsvVulnerability) -> Vulnerability {
    let affected_packages = osv
        .affected
        .into_iter()
        .filter_map(|aff| {
            let ecosystem = ecosystem_from_osv(&aff.package.ecosystem)?;
            let ranges = aff
                .ranges
                .into_iter()
                .flat_map(|r| events_to_ranges(r.events))
                .collect();
            Some(AffectedPackage {
                ecosystem,
                name: aff.package.name,
                ranges,
            })
        })
        .collect();

    let severity = osv
        .severity
        .iter()
        .find(|s| s.severity_type == "CVSS_V3" || s.severity_type == "CVSS_V4")
        .and_then(|s| cvss_vector_base_score(&s.score))
        .map(severity_from_cvss)
        .unwrap_or(Severity::Unknown);

    let cvss_base = osv
        .severity
        .iter()
        .find_map(|s| cvss_vector_base_score(&s.score));

    let mut sources = HashSet::new();
    sources.insert("osv".to_string());

    Vulnerability {
        canonical_id: osv.id.clone(),
        aliases: osv.aliases,
        summary: osv.summary,
        severity,
        cvss_base,
        affected_packages,
        affected_functions: None,
        references: osv.references.into_iter().map(|r| r.url).collect(),
        epss_score: None,
        epss_percentile: None,
        kev_listed: false,
        kev_due_date: None,
        sources,
    }
}

/// Groups OSV `events` into ranges. OSV's events are a flat, ordered list
/// (`introduced`, then optionally `fixed`/`last_affected`, repeating for
/// disjoint ranges); we pair each `introduced` with the next terminator.
fn events_to_ranges(events: Vec<OsvEvent>) -> Vec<VersionRange> {
    let mut ranges = Vec::new();
    let mut current_introduced: Option<String> = None;

    for event in events {
        if let Some(introduced) = event.introduced {
            if let Some(prev) = current_introduced.take() {
                ranges.push(VersionRange {
                    introduced: Some(prev),
                    fixed: None,
                    last_affected: None,
                });
            }
            current_introduced = Some(introduced);
        }
        if let Some(fixed) = event.fixed {
            ranges.push(VersionRange {
                introduced: current_introduced.take(),
                fixed: Some(fixed),
                last_affected: None,
            });
        }
        if let Some(last_affected) = event.last_affected {
            ranges.push(VersionRange {
                introduced: current_introduced.take(),
                fixed: None,
                last_affected: Some(last_affected),
            });
        }
    }
    if let Some(introduced) = current_introduced {
        ranges.push(VersionRange {
            introduced: Some(introduced),
            fixed: None,
            last_affected: None,
        });
    }
    ranges
}

fn ecosystem_from_osv(name: &str) -> Option<Ecosystem> {
    Ecosystem::all()
        .iter()
        .copied()
        .find(|e| osv_ecosystem_name(*e) == name)
}

/// CVSS vectors look like `CVSS:3.1/AV:N/.../S:U/C:H/I:H/A:H`; OSV stores
/// the vector string, not a precomputed base score, so we parse just enough
/// to bucket severity without a full CVSS calculator.
fn cvss_vector_base_score(vector: &str) -> Option<f64> {
    let high_count = vector.matches(":H").count();
    let low_count = vector.matches(":L").count();
    match (high_count, low_count) {
        (h, _) if h >= 2 => Some(9.0),
        (h, _) if h >= 1 => Some(7.5),
        (_, l) if l >= 1 => Some(4.0),
        _ => None,
    }
}

fn severity_from_cvss(score: f64) -> Severity {
    if score >= 9.0 {
        Severity::Critical
    } else if score >= 7.0 {
        Severity::High
    } else if score >= 4.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
