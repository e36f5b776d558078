//! Human-facing tabular output, using `colored` to draw attention to
//! severity and reachability, scoped to a flat finding table.

use colored::{Color, Colorize};
use vulnscan_core::model::{ReachabilityFinding, RiskLevel, Severity, Statistics};

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Green,
        Severity::Unknown => Color::White,
    }
}

fn risk_label(level: RiskLevel) -> colored::ColoredString {
    match level {
        RiskLevel::Critical => "CRITICAL".color(Color::Red).bold(),
        RiskLevel::High => "HIGH".color(Color::Red),
        RiskLevel::Medium => "MEDIUM".color(Color::Yellow),
        RiskLevel::Low => "LOW".color(Color::Green),
        RiskLevel::VeryLow => "VERY LOW".color(Color::BrightBlack),
    }
}

pub fn render(findings: &[ReachabilityFinding], statistics: &Statistics) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<18} {:<24} {:<10} {:<8} {:<9} {}\n",
        "ID", "PACKAGE", "SEVERITY", "REACH", "RISK", "SUMMARY"
    ));
    out.push_str(&"-".repeat(100));
    out.push('\n');

    for f in findings {
        let severity = f.vulnerability.severity.as_str_label().color(severity_color(f.vulnerability.severity));
        let reach = if f.reachable {
            "yes".green()
        } else {
            "no".dimmed()
        };
        let summary = f
            .vulnerability
            .summary
            .clone()
            .unwrap_or_else(|| "(no summary)".to_string());
        out.push_str(&format!(
            "{:<18} {:<24} {:<10} {:<8} {:<9} {}\n",
            f.vulnerability.canonical_id,
            f.dependency.name,
            severity,
            reach,
            risk_label(f.risk.level),
            summary,
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "{} dependencies, {} vulnerabilities, {} reachable, {} tainted ({} ms)\n",
        statistics.total_dependencies,
        statistics.total_vulnerabilities,
        statistics.reachable_count,
        statistics.tainted_count,
        statistics.elapsed_ms,
    ));

    out
}

trait SeverityLabel {
    fn as_str_label(&self) -> &'static str;
}

impl SeverityLabel for Severity {
    fn as_str_label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_finding;

    #[test]
    fn renders_a_header_and_one_row_per_finding() {
        let findings = vec![sample_finding()];
        let stats = Statistics {
            total_dependencies: 1,
            total_vulnerabilities: 1,
            reachable_count: 1,
            ..Default::default()
        };
        let rendered = render(&findings, &stats);
        assert!(rendered.contains("CVE-2024-1234"));
        assert!(rendered.contains("lodash"));
        assert!(rendered.contains("1 dependencies"));
    }
}
