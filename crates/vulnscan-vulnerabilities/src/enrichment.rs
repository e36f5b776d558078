//! EPSS/KEV enrichment: when data is available, a vulnerability is enriched
//! with an EPSS probability/percentile and a boolean indicating inclusion
//! in a known-exploited-vulnerabilities catalog.
//!
//! Both catalogs are large, slowly-changing, and published as flat files
//! (FIRST.org's EPSS CSV export, CISA's KEV JSON catalog) rather than a
//! per-query API, so we load them once from a path named by an environment
//! variable and look up by canonical ID / alias. Absence of either variable
//! degrades gracefully: enrichment becomes a no-op rather than an error.

use std::collections::HashMap;
use std::sync::OnceLock;

use vulnscan_core::model::Vulnerability;

#[derive(Debug, Clone, Copy)]
struct Epss {
    score: f64,
    percentile: f64,
}

fn epss_catalog() -> &'static HashMap<String, Epss> {
    static CATALOG: OnceLock<HashMap<String, Epss>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let Ok(path) = std::env::var("VULNSCAN_EPSS_CSV") else {
            return HashMap::new();
        };
        load_epss_csv(&path).unwrap_or_default()
    })
}

fn kev_catalog() -> &'static HashMap<String, Option<String>> {
    static CATALOG: OnceLock<HashMap<String, Option<String>>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let Ok(path) = std::env::var("VULNSCAN_KEV_JSON") else {
            return HashMap::new();
        };
        load_kev_json(&path).unwrap_or_default()
    })
}

/// Parses a `cve,epss,percentile` CSV (FIRST.org's export format),
/// tolerating the `#`-prefixed metadata comment line it ships with.
fn load_epss_csv(path: &str) -> Option<HashMap<String, Epss>> {
    let content = std::fs::read_to_string(path).ok()?;
    let mut out = HashMap::new();
    for line in content.lines() {
        if line.trim().is_empty() || line.starts_with('#') || line.to_lowercase().starts_with("cve") {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 3 {
            continue;
        }
        if let (Ok(score), Ok(percentile)) = (parts[1].trim().parse(), parts[2].trim().parse()) {
            out.insert(parts[0].trim().to_string(), Epss { score, percentile });
        }
    }
    Some(out)
}

/// Parses CISA's `{"vulnerabilities":[{"cveID":..,"dueDate":..}, ...]}` KEV
/// catalog export into an ID -> optional-due-date map.
fn load_kev_json(path: &str) -> Option<HashMap<String, Option<String>>> {
    let content = std::fs::read_to_string(path).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&content).ok()?;
    let entries = parsed.get("vulnerabilities")?.as_array()?;
    let mut out = HashMap::new();
    for entry in entries {
        let Some(id) = entry.get("cveID").and_then(|v| v.as_str()) else {
            continue;
        };
        let due_date = entry
            .get("dueDate")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        out.insert(id.to_string(), due_date);
    }
    Some(out)
}

fn find<'a, T>(catalog: &'a HashMap<String, T>, canonical_id: &str, aliases: &[String]) -> Option<&'a T> {
    catalog
        .get(canonical_id)
        .or_else(|| aliases.iter().find_map(|a| catalog.get(a)))
}

/// Fills in `epss_score`/`epss_percentile`/`kev_listed`/`kev_due_date` on a
/// merged record from whichever catalogs are configured, leaving already
/// feed-populated fields untouched (a feed's own EPSS data, if any, wins).
pub fn enrich(mut v: Vulnerability) -> Vulnerability {
    if v.epss_score.is_none() {
        if let Some(epss) = find(epss_catalog(), &v.canonical_id, &v.aliases) {
            v.epss_score = Some(epss.score);
            v.epss_percentile = Some(epss.percentile);
        }
    }
    if !v.kev_listed {
        if let Some(due_date) = find(kev_catalog(), &v.canonical_id, &v.aliases) {
            v.kev_listed = true;
            v.kev_due_date = due_date.clone();
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epss_csv_parses_around_comment_and_header() {
        let csv = "#model_version:v2023.03.01,score_date:2024-01-01\ncve,epss,percentile\nCVE-2024-1,0.45,0.9\n";
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), csv).unwrap();
        let parsed = load_epss_csv(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(parsed.get("CVE-2024-1").unwrap().score, 0.45);
    }

    #[test]
    fn kev_json_parses_known_catalog_shape() {
        let json = r#"{"vulnerabilities":[{"cveID":"CVE-2024-1","dueDate":"2024-06-01"}]}"#;
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), json).unwrap();
        let parsed = load_kev_json(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(parsed.get("CVE-2024-1").unwrap().as_deref(), Some("2024-06-01"));
    }
}
