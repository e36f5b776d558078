//! Version-range matching: a dependency is affected if its resolved version
//! falls within any range of any applicable affected-package entry.
//!
//! Ecosystems don't share one version scheme. We try a semver-aware compare
//! first since OSV normalizes most ranges to `SEMVER` events; if either side
//! fails to parse as semver we fall back to a numeric-component compare,
//! which handles the common `1.2.3.4`-style versions semver rejects outright
//! (Maven, NuGet) without pulling in a second full version-parsing crate per
//! ecosystem.

use vulnscan_core::model::VersionRange;

pub fn version_in_range(version: &str, range: &VersionRange) -> bool {
    if let Some(introduced) = &range.introduced {
        if compare_versions(version, introduced) == std::cmp::Ordering::Less {
            return false;
        }
    }
    if let Some(fixed) = &range.fixed {
        if compare_versions(version, fixed) != std::cmp::Ordering::Less {
            return false;
        }
    }
    if let Some(last_affected) = &range.last_affected {
        if compare_versions(version, last_affected) == std::cmp::Ordering::Greater {
            return false;
        }
    }
    true
}

fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let a = a.trim_start_matches('v');
    let b = b.trim_start_matches('v');

    if let (Ok(sa), Ok(sb)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return sa.cmp(&sb);
    }

    compare_numeric_components(a, b)
}

/// Compares dot-separated numeric components left to right; a version with
/// fewer components is treated as padded with zeros (`1.2` == `1.2.0`), and
/// any non-numeric component falls back to a lexicographic tiebreak so the
/// comparison degrades gracefully instead of panicking.
fn compare_numeric_components(a: &str, b: &str) -> std::cmp::Ordering {
    let pa: Vec<&str> = a.split(['.', '-', '+']).collect();
    let pb: Vec<&str> = b.split(['.', '-', '+']).collect();
    let len = pa.len().max(pb.len());

    for i in 0..len {
        let ca = pa.get(i).copied().unwrap_or("0");
        let cb = pb.get(i).copied().unwrap_or("0");
        match (ca.parse::<u64>(), cb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => match na.cmp(&nb) {
                std::cmp::Ordering::Equal => continue,
                other => return other,
            },
            _ => {
                let ord = ca.cmp(cb);
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
        }
    }
    std::cmp::Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(introduced: Option<&str>, fixed: Option<&str>) -> VersionRange {
        VersionRange {
            introduced: introduced.map(String::from),
            fixed: fixed.map(String::from),
            last_affected: None,
        }
    }

    #[test]
    fn version_below_introduced_is_unaffected() {
        assert!(!version_in_range("1.0.0", &range(Some("1.2.0"), Some("1.5.0"))));
    }

    #[test]
    fn version_in_open_range_is_affected() {
        assert!(version_in_range("1.3.0", &range(Some("1.2.0"), Some("1.5.0"))));
    }

    #[test]
    fn fixed_version_itself_is_unaffected() {
        assert!(!version_in_range("1.5.0", &range(Some("1.0.0"), Some("1.5.0"))));
    }

    #[test]
    fn non_semver_maven_style_versions_still_compare() {
        assert!(version_in_range("2.4.1.1", &range(Some("2.4.0"), Some("2.5.0"))));
    }

    #[test]
    fn unbounded_range_with_no_fixed_version_matches_anything_above_introduced() {
        assert!(version_in_range("99.0.0", &range(Some("1.0.0"), None)));
    }
}
