//! Minimal self-contained HTML report: no external assets, so it can be
//! attached to a CI run as a single file.

use vulnscan_core::model::{ReachabilityFinding, Statistics};

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn render(findings: &[ReachabilityFinding], statistics: &Statistics) -> String {
    let mut rows = String::new();
    for f in findings {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:?}</td><td>{}</td><td>{:.0}</td><td>{}</td></tr>\n",
            escape(&f.vulnerability.canonical_id),
            escape(&f.dependency.name),
            f.vulnerability.severity,
            if f.reachable { "yes" } else { "no" },
            f.risk.score,
            escape(&f.vulnerability.summary.clone().unwrap_or_default()),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Vulnerability Scan Report</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; }}
th {{ background: #f2f2f2; }}
</style>
</head><body>
<h1>Vulnerability Scan Report</h1>
<p>{} dependencies, {} vulnerabilities, {} reachable, {} tainted.</p>
<table>
<tr><th>ID</th><th>Package</th><th>Severity</th><th>Reachable</th><th>Risk</th><th>Summary</th></tr>
{}
</table>
</body></html>
"#,
        statistics.total_dependencies,
        statistics.total_vulnerabilities,
        statistics.reachable_count,
        statistics.tainted_count,
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_finding;

    #[test]
    fn escapes_html_in_summaries() {
        let mut finding = sample_finding();
        finding.vulnerability.summary = Some("<script>alert(1)</script>".to_string());
        let rendered = render(&[finding], &Statistics::default());
        assert!(!rendered.contains("<script>alert"));
        assert!(rendered.contains("&lt;script&gt;"));
    }

    #[test]
    fn includes_totals_in_the_body() {
        let stats = Statistics {
            total_dependencies: 3,
            ..Default::default()
        };
        let rendered = render(&[], &stats);
        assert!(rendered.contains("3 dependencies"));
    }
}
