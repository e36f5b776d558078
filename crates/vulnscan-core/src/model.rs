//! The data model shared by every component of the scan pipeline.
//!
//! Entities here are created once during a scan and, aside from the call
//! graph (owned by `vulnscan-graph` during construction only), are immutable
//! once emitted by their producing component.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vulnscan_graph::NodeHandle;

/// Closed enum of package-manager identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    PyPI,
    Maven,
    Go,
    Cargo,
    RubyGems,
    Packagist,
    NuGet,
    Pub,
    Swift,
    Hex,
    Hackage,
}

impl Ecosystem {
    pub fn as_str(self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::PyPI => "pypi",
            Ecosystem::Maven => "maven",
            Ecosystem::Go => "go",
            Ecosystem::Cargo => "cargo",
            Ecosystem::RubyGems => "rubygems",
            Ecosystem::Packagist => "packagist",
            Ecosystem::NuGet => "nuget",
            Ecosystem::Pub => "pub",
            Ecosystem::Swift => "swift",
            Ecosystem::Hex => "hex",
            Ecosystem::Hackage => "hackage",
        }
    }

    pub fn all() -> &'static [Ecosystem] {
        &[
            Ecosystem::Npm,
            Ecosystem::PyPI,
            Ecosystem::Maven,
            Ecosystem::Go,
            Ecosystem::Cargo,
            Ecosystem::RubyGems,
            Ecosystem::Packagist,
            Ecosystem::NuGet,
            Ecosystem::Pub,
            Ecosystem::Swift,
            Ecosystem::Hex,
            Ecosystem::Hackage,
        ]
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A manifest is *primary* if it declares intent, *lockfile* if it pins
/// resolved versions, *central* if it contributes shared version
/// constraints across a workspace (e.g. a Maven BOM / Gradle version
/// catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestKind {
    Primary,
    Lockfile,
    Central,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub absolute_path: PathBuf,
    pub directory: PathBuf,
    pub ecosystem: Ecosystem,
    pub filename: String,
    pub kind: ManifestKind,
}

/// A manifest that looked right by filename but failed its content probe,
/// or that failed to parse during extraction. Recorded, never fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedManifest {
    pub path: PathBuf,
    pub reason: String,
}

/// A directory subtree sharing a primary manifest; a monorepo contains many.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub root: PathBuf,
    pub manifests: Vec<Manifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Raw resolved version string, verbatim after stripping constraint
    /// sigils. `None` for centrally-managed dependencies with no resolved
    /// version.
    pub version: Option<String>,
    pub ecosystem: Ecosystem,
    pub manifest_ref: PathBuf,
    pub transitive: bool,
}

impl Dependency {
    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            ecosystem: self.ecosystem,
            name: self.name.clone(),
            version: self.version.clone().unwrap_or_default(),
        }
    }

    pub fn is_centrally_managed(&self) -> bool {
        self.version.is_none()
    }
}

/// Ascending order deliberately matches "worse is greater" so that merging
/// two severities via `max` (derived `Ord`) picks the more severe one, per
/// the "severity... take the highest value" merge rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRange {
    pub introduced: Option<String>,
    pub fixed: Option<String>,
    pub last_affected: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedPackage {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub ranges: Vec<VersionRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    /// First non-null of CVE, GHSA, OSV ID.
    pub canonical_id: String,
    pub aliases: Vec<String>,
    pub summary: Option<String>,
    pub severity: Severity,
    pub cvss_base: Option<f64>,
    pub affected_packages: Vec<AffectedPackage>,
    /// Specific vulnerable symbols, when the feed records them (used by
    /// target-node selection in the reachability engine).
    pub affected_functions: Option<Vec<String>>,
    pub references: Vec<String>,
    pub epss_score: Option<f64>,
    pub epss_percentile: Option<f64>,
    pub kev_listed: bool,
    pub kev_due_date: Option<String>,
    /// Feed identifiers that contributed to this (possibly merged) record.
    pub sources: HashSet<String>,
}

impl Vulnerability {
    pub fn applies_to_ecosystem_and_name(&self, ecosystem: Ecosystem, name: &str) -> bool {
        self.affected_packages
            .iter()
            .any(|p| p.ecosystem == ecosystem && p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    HttpHandler,
    MainFunction,
    CliCommand,
    EventHandler,
    ServerInit,
    PackageExport,
    NoIncomingCalls,
    TestFile,
}

impl SignalKind {
    /// `true` for signals that *reduce* confidence rather than add to it
    /// (a test-file match is the one negative signal).
    pub fn is_negative(self) -> bool {
        matches!(self, SignalKind::TestFile)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub rationale: String,
    pub evidence_span: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPoint {
    pub node: NodeHandle,
    pub signals: Vec<Signal>,
    pub confidence: f64,
}

pub type CallPath = Vec<NodeHandle>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintVerdict {
    pub is_tainted: bool,
    pub confidence: f64,
    pub observed_sources: Vec<String>,
    pub observed_sanitizers: Vec<String>,
    pub witness_path: Option<CallPath>,
}

impl TaintVerdict {
    /// The default verdict: no observed source means untainted with full
    /// confidence.
    pub fn clean() -> Self {
        Self {
            is_tainted: false,
            confidence: 1.0,
            observed_sources: Vec::new(),
            observed_sanitizers: Vec::new(),
            witness_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else if score >= 20.0 {
            RiskLevel::Low
        } else {
            RiskLevel::VeryLow
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub contribution_signed: f64,
    pub value_observed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub top_factors: Vec<RiskFactor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachabilityFinding {
    pub vulnerability: Vulnerability,
    pub dependency: Dependency,
    pub reachable: bool,
    pub confidence: f64,
    pub paths: Vec<CallPath>,
    pub taint: TaintVerdict,
    pub risk: RiskAssessment,
    /// Set when the reachability engine's depth/time budget was exhausted mid-traversal
    /// (`AnalysisBudgetExceeded`); the finding is still emitted, just
    /// flagged as partial.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackVerdict {
    TruePositive,
    FalsePositive,
    Unsure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub vulnerability_id: String,
    pub verdict: FeedbackVerdict,
    pub features_frozen: Vec<f64>,
    pub timestamp: DateTime<Utc>,
    pub optional_risk_override: Option<f64>,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Per-scan summary handed to output formatters alongside the finding list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub total_dependencies: usize,
    pub total_vulnerabilities: usize,
    pub by_severity: std::collections::HashMap<String, u32>,
    pub reachable_count: usize,
    pub tainted_count: usize,
    pub entry_point_count: usize,
    pub manifest_count: usize,
    pub failed_manifest_count: usize,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_picks_more_severe_on_merge() {
        assert_eq!(Severity::Critical.max(Severity::Low), Severity::Critical);
        assert_eq!(Severity::Unknown.max(Severity::Low), Severity::Low);
    }

    #[test]
    fn taint_default_is_clean_with_full_confidence() {
        let v = TaintVerdict::clean();
        assert!(!v.is_tainted);
        assert_eq!(v.confidence, 1.0);
    }

    #[test]
    fn risk_level_buckets_match_fixed_cutoffs() {
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(79.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(40.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(20.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(19.9), RiskLevel::VeryLow);
    }
}
