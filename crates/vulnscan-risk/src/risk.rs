//! Risk scorer: default weighted-sum mode and, when a learned model is
//! present, logistic-regression mode. Both modes produce the same
//! `RiskAssessment` shape over the full 16-feature vector.

use vulnscan_core::model::{RiskAssessment, RiskLevel, TaintVerdict, Vulnerability};

use crate::features::{self, DEFAULT_SIGNS, DEFAULT_WEIGHTS, RiskContext};
use crate::model::LogisticModel;

pub enum RiskMode<'a> {
    Default,
    Learned(&'a LogisticModel),
}

pub struct RiskScorer<'a> {
    mode: RiskMode<'a>,
}

impl<'a> RiskScorer<'a> {
    pub fn default_mode() -> Self {
        Self {
            mode: RiskMode::Default,
        }
    }

    pub fn learned(model: &'a LogisticModel) -> Self {
        Self {
            mode: RiskMode::Learned(model),
        }
    }

    pub fn score(
        &self,
        vulnerability: &Vulnerability,
        taint: &TaintVerdict,
        ctx: &RiskContext,
    ) -> RiskAssessment {
        let fv = features::extract(vulnerability, taint, ctx);

        let score = match self.mode {
            RiskMode::Default => {
                let raw: f64 = fv
                    .0
                    .iter()
                    .zip(DEFAULT_WEIGHTS.iter())
                    .zip(DEFAULT_SIGNS.iter())
                    .map(|((value, weight), sign)| value * weight * sign)
                    .sum();
                (raw.clamp(0.0, 1.0) * 100.0).clamp(0.0, 100.0)
            }
            RiskMode::Learned(model) => model.predict_probability(&fv.to_vec()) * 100.0,
        };

        let top_factors = fv.top_factors(&DEFAULT_WEIGHTS, 5);

        RiskAssessment {
            score,
            level: RiskLevel::from_score(score),
            top_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::model::{Ecosystem, Severity};

    fn critical_vuln() -> Vulnerability {
        Vulnerability {
            canonical_id: "CVE-2024-9999".into(),
            aliases: vec![],
            summary: None,
            severity: Severity::Critical,
            cvss_base: Some(9.8),
            affected_packages: vec![],
            affected_functions: None,
            references: vec![],
            epss_score: Some(0.95),
            epss_percentile: None,
            kev_listed: true,
            kev_due_date: None,
            sources: Default::default(),
        }
    }

    fn low_vuln() -> Vulnerability {
        Vulnerability {
            canonical_id: "CVE-2024-0001".into(),
            aliases: vec![],
            summary: None,
            severity: Severity::Low,
            cvss_base: Some(2.0),
            affected_packages: vec![],
            affected_functions: None,
            references: vec![],
            epss_score: Some(0.01),
            epss_percentile: None,
            kev_listed: false,
            kev_due_date: None,
            sources: Default::default(),
        }
    }

    #[test]
    fn critical_reachable_tainted_finding_scores_high() {
        let scorer = RiskScorer::default_mode();
        let taint = vulnscan_core::model::TaintVerdict {
            is_tainted: true,
            confidence: 0.9,
            observed_sources: vec!["http_body".into()],
            observed_sanitizers: vec![],
            witness_path: None,
        };
        let ctx = RiskContext {
            reachability_confidence: 0.95,
            path_length: 2,
            in_main_flow: true,
            entry_point_type_weight: 0.9,
            ..Default::default()
        };
        let assessment = scorer.score(&critical_vuln(), &taint, &ctx);
        assert!(assessment.score >= 60.0, "expected high risk, got {}", assessment.score);
        assert!(matches!(assessment.level, RiskLevel::High | RiskLevel::Critical));
    }

    #[test]
    fn unreachable_low_severity_finding_scores_low() {
        let scorer = RiskScorer::default_mode();
        let ctx = RiskContext {
            reachability_confidence: 0.0,
            ..Default::default()
        };
        let assessment = scorer.score(&low_vuln(), &TaintVerdict::clean(), &ctx);
        assert!(assessment.score < 40.0, "expected low risk, got {}", assessment.score);
        let _ = Ecosystem::Npm;
    }

    #[test]
    fn sanitizer_on_path_reduces_score_relative_to_unsanitized() {
        let scorer = RiskScorer::default_mode();
        let ctx = RiskContext {
            reachability_confidence: 0.9,
            ..Default::default()
        };
        let tainted = vulnscan_core::model::TaintVerdict {
            is_tainted: true,
            confidence: 0.8,
            observed_sources: vec!["http_body".into()],
            observed_sanitizers: vec![],
            witness_path: None,
        };
        let mut sanitized = tainted.clone();
        sanitized.observed_sanitizers.push("escape".into());

        let unsanitized_score = scorer.score(&critical_vuln(), &tainted, &ctx).score;
        let sanitized_score = scorer.score(&critical_vuln(), &sanitized, &ctx).score;
        assert!(sanitized_score < unsanitized_score);
    }

    #[test]
    fn top_factors_lists_at_most_five() {
        let scorer = RiskScorer::default_mode();
        let assessment = scorer.score(&critical_vuln(), &TaintVerdict::clean(), &RiskContext::default());
        assert!(assessment.top_factors.len() <= 5);
    }
}
