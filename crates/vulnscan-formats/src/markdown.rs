//! Markdown output, suitable for pasting into a PR description or issue.

use vulnscan_core::model::{ReachabilityFinding, Statistics};

pub fn render(findings: &[ReachabilityFinding], statistics: &Statistics) -> String {
    let mut out = String::new();

    out.push_str("# Vulnerability Scan Report\n\n");
    out.push_str(&format!(
        "{} dependencies scanned, {} vulnerabilities found, {} reachable, {} tainted.\n\n",
        statistics.total_dependencies,
        statistics.total_vulnerabilities,
        statistics.reachable_count,
        statistics.tainted_count,
    ));

    if findings.is_empty() {
        out.push_str("No vulnerabilities found.\n");
        return out;
    }

    out.push_str("| ID | Package | Severity | Reachable | Risk | Summary |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for f in findings {
        out.push_str(&format!(
            "| {} | {} | {:?} | {} | {:.0} ({:?}) | {} |\n",
            f.vulnerability.canonical_id,
            f.dependency.name,
            f.vulnerability.severity,
            if f.reachable { "yes" } else { "no" },
            f.risk.score,
            f.risk.level,
            f.vulnerability
                .summary
                .clone()
                .unwrap_or_else(|| "-".to_string())
                .replace('|', "\\|"),
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_finding;

    #[test]
    fn renders_a_markdown_table_row_per_finding() {
        let findings = vec![sample_finding()];
        let rendered = render(&findings, &Statistics::default());
        assert!(rendered.contains("| CVE-2024-1234 |"));
        assert!(rendered.starts_with("# Vulnerability Scan Report"));
    }

    #[test]
    fn empty_findings_says_so_plainly() {
        let rendered = render(&[], &Statistics::default());
        assert!(rendered.contains("No vulnerabilities found."));
    }
}
