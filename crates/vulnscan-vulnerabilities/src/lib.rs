//! Vulnerability resolver.
//!
//! Queries one or more [`VulnerabilityFeed`]s concurrently (task-parallel
//! I/O, hidden behind the synchronous [`VulnerabilityResolver::resolve`]
//! contract) and merges the results by alias-set union.
//! Every feed call goes through `vulnscan-cache` first; a cache hit skips
//! the network entirely, a miss is queried live and the response cached for
//! next time. A single feed erroring degrades to an empty contribution —
//! the resolver never propagates a `FeedUnavailable` to its caller.

mod enrichment;
mod merge;
pub mod osv;
mod version_match;

use std::collections::HashMap;

use vulnscan_cache::CacheStore;
use vulnscan_core::errors::Result;
use vulnscan_core::model::{Dependency, DependencyKey, Vulnerability};

pub use merge::merge_vulnerabilities;
pub use version_match::version_in_range;

/// One implementation per feed. Feeds are responsible for their own
/// retries, rate-limiting, and authentication; the resolver only handles
/// merge, caching, and failure isolation.
pub trait VulnerabilityFeed: Send + Sync {
    fn name(&self) -> &'static str;
    fn query(
        &self,
        ecosystem: vulnscan_core::model::Ecosystem,
        name: &str,
        version: &str,
    ) -> Result<Vec<Vulnerability>>;
}

/// A feed backed by a fixed, in-memory record set rather than a live
/// network query. Used by callers that already have vulnerability data in
/// hand — offline scans replaying a saved fixture, and tests exercising the
/// resolver/reachability pipeline without depending on network access.
pub struct StaticFeed {
    pub name: &'static str,
    pub vulns: Vec<Vulnerability>,
}

impl VulnerabilityFeed for StaticFeed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn query(
        &self,
        _ecosystem: vulnscan_core::model::Ecosystem,
        _name: &str,
        _version: &str,
    ) -> Result<Vec<Vulnerability>> {
        Ok(self.vulns.clone())
    }
}

pub struct VulnerabilityResolver {
    feeds: Vec<Box<dyn VulnerabilityFeed>>,
    cache: Option<CacheStore>,
}

impl VulnerabilityResolver {
    pub fn new(feeds: Vec<Box<dyn VulnerabilityFeed>>, cache: Option<CacheStore>) -> Self {
        Self { feeds, cache }
    }

    fn query_key(ecosystem: vulnscan_core::model::Ecosystem, name: &str, version: &str) -> String {
        format!("{}:{name}:{version}", ecosystem.as_str())
    }

    /// Queries every enabled feed for `dependency`, merging results by alias
    /// union and enriching with EPSS/KEV when available.
    /// A feed timing out or erroring contributes nothing to this
    /// dependency's result rather than failing the whole resolve.
    fn query_dependency(&self, dependency: &Dependency) -> Vec<Vulnerability> {
        let Some(version) = dependency.version.as_deref() else {
            return Vec::new();
        };
        let key = Self::query_key(dependency.ecosystem, &dependency.name, version);

        let mut per_feed: Vec<Vec<Vulnerability>> = Vec::new();
        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .feeds
                .iter()
                .map(|feed| {
                    let key = key.clone();
                    scope.spawn(move || self.query_one_feed(feed.as_ref(), dependency, &key, version))
                })
                .collect();
            for handle in handles {
                if let Ok(result) = handle.join() {
                    per_feed.push(result);
                }
            }
        });

        let flattened: Vec<Vulnerability> = per_feed.into_iter().flatten().collect();
        let merged = merge_vulnerabilities(flattened);
        merged
            .into_iter()
            .map(enrichment::enrich)
            .collect()
    }

    fn query_one_feed(
        &self,
        feed: &dyn VulnerabilityFeed,
        dependency: &Dependency,
        cache_key: &str,
        version: &str,
    ) -> Vec<Vulnerability> {
        if let Some(cache) = &self.cache {
            if let Ok(Some(entry)) = cache.get(feed.name(), cache_key) {
                if let Ok(vulns) = serde_json::from_str::<Vec<Vulnerability>>(&entry.payload) {
                    return vulns;
                }
            }
        }

        match feed.query(dependency.ecosystem, &dependency.name, version) {
            Ok(vulns) => {
                if let Some(cache) = &self.cache {
                    if let Ok(payload) = serde_json::to_string(&vulns) {
                        let _ = cache.put(feed.name(), cache_key, &payload);
                    }
                }
                vulns
            }
            Err(e) => {
                tracing::warn!(feed = feed.name(), dependency = %dependency.name, error = %e, "feed query failed, contributing nothing");
                Vec::new()
            }
        }
    }

    /// Resolves vulnerabilities for every dependency, filtering by version
    /// range and returning a map keyed by `(ecosystem, name,
    /// version)`.
    pub fn resolve(
        &self,
        dependencies: &[Dependency],
    ) -> HashMap<DependencyKey, Vec<Vulnerability>> {
        let mut out = HashMap::new();
        for dep in dependencies {
            let Some(version) = dep.version.as_deref() else {
                continue;
            };
            let candidates = self.query_dependency(dep);
            let applicable: Vec<Vulnerability> = candidates
                .into_iter()
                .filter(|v| {
                    v.affected_packages.iter().any(|pkg| {
                        pkg.ecosystem == dep.ecosystem
                            && pkg.name == dep.name
                            && pkg.ranges.iter().any(|r| version_in_range(version, r))
                    })
                })
                .collect();
            if !applicable.is_empty() {
                out.insert(dep.key(), applicable);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use vulnscan_core::model::{AffectedPackage, Ecosystem, Severity, VersionRange};

    struct FixedFeed {
        name: &'static str,
        vulns: Vec<Vulnerability>,
    }

    impl VulnerabilityFeed for FixedFeed {
        fn name(&self) -> &'static str {
            self.name
        }
        fn query(&self, _: Ecosystem, _: &str, _: &str) -> Result<Vec<Vulnerability>> {
            Ok(self.vulns.clone())
        }
    }

    fn dep(name: &str, version: &str) -> Dependency {
        Dependency {
            name: name.to_string(),
            version: Some(version.to_string()),
            ecosystem: Ecosystem::Npm,
            manifest_ref: "package.json".into(),
            transitive: false,
        }
    }

    fn vuln(id: &str, name: &str, fixed: &str) -> Vulnerability {
        let mut sources = HashSet::new();
        sources.insert("test".to_string());
        Vulnerability {
            canonical_id: id.to_string(),
            aliases: vec![],
            summary: None,
            severity: Severity::High,
            cvss_base: Some(7.5),
            affected_packages: vec![AffectedPackage {
                ecosystem: Ecosystem::Npm,
                name: name.to_string(),
                ranges: vec![VersionRange {
                    introduced: Some("0.0.0".into()),
                    fixed: Some(fixed.into()),
                    last_affected: None,
                }],
            }],
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
    fn resolves_only_dependencies_in_affected_range() {
        let feed = FixedFeed {
            name: "test",
            vulns: vec![vuln("CVE-2024-1", "lodash", "4.17.21")],
        };
        let resolver = VulnerabilityResolver::new(vec![Box::new(feed)], None);

        let vulnerable = dep("lodash", "4.17.0");
        let fixed = dep("lodash", "4.17.21");
        let result = resolver.resolve(&[vulnerable.clone(), fixed]);

        assert_eq!(result.len(), 1);
        assert!(result.contains_key(&vulnerable.key()));
    }

    #[test]
    fn centrally_managed_dependency_with_no_version_is_skipped() {
        let resolver = VulnerabilityResolver::new(vec![], None);
        let mut d = dep("lodash", "1.0.0");
        d.version = None;
        let result = resolver.resolve(&[d]);
        assert!(result.is_empty());
    }
}
