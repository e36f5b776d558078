//! Cross-feed merge : "two records from different feeds are
//! merged iff they share any identifier in their alias set; the merged
//! record's `sources` is the union and `severity`/`cvss_base` take the
//! maximum."

use vulnscan_core::model::Vulnerability;

/// Every identifier a record can be recognized by: its canonical ID plus
/// its declared aliases.
fn identifiers(v: &Vulnerability) -> Vec<&str> {
    let mut ids = vec![v.canonical_id.as_str()];
    ids.extend(v.aliases.iter().map(|s| s.as_str()));
    ids
}

fn shares_identifier(a: &Vulnerability, b: &Vulnerability) -> bool {
    let a_ids = identifiers(a);
    identifiers(b).iter().any(|id| a_ids.contains(id))
}

fn merge_two(mut a: Vulnerability, b: Vulnerability) -> Vulnerability {
    for alias in b.aliases {
        if !a.aliases.contains(&alias) && alias != a.canonical_id {
            a.aliases.push(alias);
        }
    }
    if !a.aliases.contains(&b.canonical_id) && b.canonical_id != a.canonical_id {
        a.aliases.push(b.canonical_id);
    }
    a.severity = a.severity.max(b.severity);
    a.cvss_base = match (a.cvss_base, b.cvss_base) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    };
    if a.summary.is_none() {
        a.summary = b.summary;
    }
    for pkg in b.affected_packages {
        if !a
            .affected_packages
            .iter()
            .any(|p| p.ecosystem == pkg.ecosystem && p.name == pkg.name)
        {
            a.affected_packages.push(pkg);
        }
    }
    if let Some(funcs) = b.affected_functions {
        let existing = a.affected_functions.get_or_insert_with(Vec::new);
        for f in funcs {
            if !existing.contains(&f) {
                existing.push(f);
            }
        }
    }
    for reference in b.references {
        if !a.references.contains(&reference) {
            a.references.push(reference);
        }
    }
    a.epss_score = a.epss_score.or(b.epss_score);
    a.epss_percentile = a.epss_percentile.or(b.epss_percentile);
    a.kev_listed = a.kev_listed || b.kev_listed;
    a.kev_due_date = a.kev_due_date.or(b.kev_due_date);
    a.sources.extend(b.sources);
    a
}

/// Merges a flat list of vulnerability records (possibly from several
/// feeds, possibly containing duplicates for the same underlying
/// vulnerability) into one record per distinct identifier-cluster.
pub fn merge_vulnerabilities(records: Vec<Vulnerability>) -> Vec<Vulnerability> {
    let mut merged: Vec<Vulnerability> = Vec::new();
    for record in records {
        match merged.iter().position(|m| shares_identifier(m, &record)) {
            Some(idx) => {
                let existing = merged.remove(idx);
                merged.push(merge_two(existing, record));
            }
            None => merged.push(record),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use vulnscan_core::model::{Ecosystem, Severity};

    fn v(id: &str, aliases: &[&str], severity: Severity, source: &str) -> Vulnerability {
        let mut sources = HashSet::new();
        sources.insert(source.to_string());
        Vulnerability {
            canonical_id: id.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            summary: None,
            severity,
            cvss_base: None,
            affected_packages: vec![],
            affected_functions: None,
            references: vec![],
            epss_score: None,
            epss_percentile: None,
            kev_listed: false,
            kev_due_date: None,
            sources,
        }
    }

    #[test]
    fn records_sharing_an_alias_merge_into_one() {
        let a = v("CVE-2024-1", &["GHSA-aaaa"], Severity::Medium, "nvd");
        let b = v("GHSA-aaaa", &[], Severity::Critical, "ghsa");
        let merged = merge_vulnerabilities(vec![a, b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::Critical);
        assert_eq!(merged[0].sources.len(), 2);
    }

    #[test]
    fn unrelated_records_stay_distinct() {
        let a = v("CVE-2024-1", &[], Severity::Medium, "nvd");
        let b = v("CVE-2024-2", &[], Severity::High, "nvd");
        let merged = merge_vulnerabilities(vec![a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn severity_takes_the_maximum_on_merge() {
        let a = v("CVE-2024-1", &[], Severity::Low, "a");
        let b = v("CVE-2024-1", &[], Severity::Critical, "b");
        let merged = merge_vulnerabilities(vec![a, b]);
        assert_eq!(merged[0].severity, Severity::Critical);
    }
}
