//! The 16-entry feature vector risk scoring is built on.

use vulnscan_core::model::{RiskFactor, Severity, TaintVerdict, Vulnerability};

/// Name, normalized value getter, and contribution sign for every feature,
/// in a fixed, stable order. The order here *is*
/// the order `to_vec()`/`names()` return — callers persisting
/// `features_frozen` for feedback must not reorder without a format bump.
pub const FEATURE_NAMES: [&str; 16] = [
    "known_exploitation",
    "exploit_probability",
    "vulnerability_severity",
    "is_tainted",
    "taint_confidence",
    "has_http_source",
    "has_sanitizer",
    "reachability_confidence",
    "path_length",
    "in_main_flow",
    "behind_auth",
    "has_conditional_edge",
    "has_error_handler",
    "is_background",
    "entry_point_type_weight",
    "dependency_transitivity",
];

/// `+1.0` / `-1.0` per feature: whether a higher observed value should push
/// the risk score up or down.
pub const DEFAULT_SIGNS: [f64; 16] = [
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0,
];

/// Fixed per-feature weight magnitudes (sum to 1.0) used by the default
/// scorer, covering all sixteen features in the vector below.
pub const DEFAULT_WEIGHTS: [f64; 16] = [
    0.12, 0.10, 0.12, 0.08, 0.05, 0.06, 0.05, 0.12, 0.03, 0.06, 0.05, 0.03, 0.03, 0.03, 0.04, 0.03,
];

#[derive(Debug, Clone, Default)]
pub struct FeatureVector(pub [f64; 16]);

impl FeatureVector {
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }

    pub fn top_factors(&self, weights: &[f64; 16], n: usize) -> Vec<RiskFactor> {
        let mut factors: Vec<RiskFactor> = self
            .0
            .iter()
            .zip(weights.iter())
            .zip(DEFAULT_SIGNS.iter())
            .zip(FEATURE_NAMES.iter())
            .map(|(((value, weight), sign), name)| RiskFactor {
                name: name.to_string(),
                contribution_signed: value * weight * sign,
                value_observed: *value,
            })
            .collect();
        factors.sort_by(|a, b| {
            b.contribution_signed
                .abs()
                .partial_cmp(&a.contribution_signed.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        factors.truncate(n);
        factors
    }
}

/// Context an orchestrator supplies alongside a vulnerability/taint pair,
/// for the signals the reachability & entry-point components compute but
/// don't carry on `ReachabilityFinding` itself.
#[derive(Debug, Clone, Default)]
pub struct RiskContext {
    pub reachability_confidence: f64,
    pub path_length: usize,
    pub in_main_flow: bool,
    pub behind_auth: bool,
    pub has_conditional_edge: bool,
    pub has_error_handler: bool,
    pub is_background: bool,
    pub entry_point_type_weight: f64,
    pub transitive: bool,
}

fn severity_normalized(vulnerability: &Vulnerability) -> f64 {
    if let Some(cvss) = vulnerability.cvss_base {
        return (cvss / 10.0).clamp(0.0, 1.0);
    }
    match vulnerability.severity {
        Severity::Critical => 1.0,
        Severity::High => 0.75,
        Severity::Medium => 0.5,
        Severity::Low => 0.25,
        Severity::Unknown => 0.0,
    }
}

fn has_http_source(taint: &TaintVerdict) -> bool {
    taint
        .observed_sources
        .iter()
        .any(|s| s.starts_with("http_"))
}

/// Builds the feature vector for one finding, in `FEATURE_NAMES` order.
pub fn extract(vulnerability: &Vulnerability, taint: &TaintVerdict, ctx: &RiskContext) -> FeatureVector {
    let values = [
        if vulnerability.kev_listed { 1.0 } else { 0.0 },
        vulnerability.epss_score.unwrap_or(0.0).clamp(0.0, 1.0),
        severity_normalized(vulnerability),
        if taint.is_tainted { 1.0 } else { 0.0 },
        taint.confidence.clamp(0.0, 1.0),
        if has_http_source(taint) { 1.0 } else { 0.0 },
        if !taint.observed_sanitizers.is_empty() { 1.0 } else { 0.0 },
        ctx.reachability_confidence.clamp(0.0, 1.0),
        (ctx.path_length as f64 / 10.0).min(1.0),
        if ctx.in_main_flow { 1.0 } else { 0.0 },
        if ctx.behind_auth { 1.0 } else { 0.0 },
        if ctx.has_conditional_edge { 1.0 } else { 0.0 },
        if ctx.has_error_handler { 1.0 } else { 0.0 },
        if ctx.is_background { 1.0 } else { 0.0 },
        ctx.entry_point_type_weight.clamp(0.0, 1.0),
        if ctx.transitive { 0.0 } else { 1.0 },
    ];
    FeatureVector(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::model::Ecosystem;

    fn vuln(severity: Severity, cvss: Option<f64>, kev: bool, epss: Option<f64>) -> Vulnerability {
        Vulnerability {
            canonical_id: "CVE-2024-0001".into(),
            aliases: vec![],
            summary: None,
            severity,
            cvss_base: cvss,
            affected_packages: vec![],
            affected_functions: None,
            references: vec![],
            epss_score: epss,
            epss_percentile: None,
            kev_listed: kev,
            kev_due_date: None,
            sources: Default::default(),
        }
    }

    #[test]
    fn dependency_transitivity_is_inverted_from_the_transitive_flag() {
        let v = vuln(Severity::High, Some(8.0), false, None);
        let ctx = RiskContext {
            transitive: true,
            ..Default::default()
        };
        let fv = extract(&v, &TaintVerdict::clean(), &ctx);
        assert_eq!(fv.get("dependency_transitivity"), Some(0.0));
    }

    #[test]
    fn severity_falls_back_to_enum_when_cvss_absent() {
        let v = vuln(Severity::Critical, None, false, None);
        let fv = extract(&v, &TaintVerdict::clean(), &RiskContext::default());
        assert_eq!(fv.get("vulnerability_severity"), Some(1.0));
        let _ = Ecosystem::Npm;
    }

    #[test]
    fn top_factors_are_sorted_by_absolute_contribution() {
        let v = vuln(Severity::Critical, Some(9.8), true, Some(0.9));
        let ctx = RiskContext {
            reachability_confidence: 0.9,
            ..Default::default()
        };
        let fv = extract(&v, &TaintVerdict::clean(), &ctx);
        let factors = fv.top_factors(&DEFAULT_WEIGHTS, 3);
        assert_eq!(factors.len(), 3);
        assert!(factors[0].contribution_signed.abs() >= factors[1].contribution_signed.abs());
    }
}
