//! Dependency extractor.
//!
//! One [`DependencyExtractor`] per ecosystem, registered in
//! [`extractors()`]. [`extract_from_manifest`] is the orchestration entry
//! point the scan pipeline calls per discovered manifest: it enforces the
//! size/count caps from `ScanConfig` so a single oversized or adversarial
//! manifest degrades (records a `ManifestParsing` error, contributes no
//! dependencies) instead of aborting the whole scan.

mod cargo;
mod fallback;
mod go;
mod maven;
mod npm;
mod nuget;
mod packagist;
mod pypi;
mod rubygems;

use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest};
use vulnscan_core::ScanConfig;

/// One implementation per ecosystem. Implementations receive only the
/// manifest's path and kind; they read and parse the file themselves so a
/// parse failure can be attributed to the exact file that caused it.
pub trait DependencyExtractor: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;
    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>>;
}

/// Registry of every concrete extractor. Ecosystems with no entry here fall
/// through to [`fallback::GenericFallbackExtractor`] in
/// [`extract_from_manifest`] — discovery still finds their manifests, but
/// extraction yields zero dependencies rather than guessing at an unfamiliar
/// format. See DESIGN.md for which ecosystems this applies to.
pub fn extractors() -> Vec<Box<dyn DependencyExtractor>> {
    vec![
        Box::new(npm::NpmExtractor),
        Box::new(pypi::PyPiExtractor),
        Box::new(cargo::CargoExtractor),
        Box::new(maven::MavenExtractor),
        Box::new(go::GoExtractor),
        Box::new(rubygems::RubyGemsExtractor),
        Box::new(packagist::PackagistExtractor),
        Box::new(nuget::NuGetExtractor),
    ]
}

/// Strips the leading constraint sigil from a version string
/// (`^1.2.3` / `~1.2.3` / `>=1.2.3` / `==1.2.3` / `~=1.2.3`), leaving the
/// bare version the feed-matching stage expects. Ranges (`>=1,<2`) are left
/// as-is; they are not single versions and callers should treat them as
/// unresolved rather than guess.
pub fn strip_version_sigil(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains(',') || trimmed.contains("||") {
        return trimmed.to_string();
    }
    trimmed
        .trim_start_matches("~=")
        .trim_start_matches(">=")
        .trim_start_matches("<=")
        .trim_start_matches('^')
        .trim_start_matches('~')
        .trim_start_matches('=')
        .trim_start_matches('>')
        .trim_start_matches('<')
        .trim_start_matches('=')
        .trim()
        .to_string()
}

/// Runs the matching extractor for `manifest`, enforcing the size and count
/// caps from the scan configuration before and after parsing. Never panics and never returns a
/// `Fatal` error; an oversized or unparsable manifest is reported through
/// the returned `Err` so the caller can record it in `failed_manifests` and
/// continue with the rest of the scan.
pub fn extract_from_manifest(manifest: &Manifest, config: &ScanConfig) -> Result<Vec<Dependency>> {
    let metadata = std::fs::metadata(&manifest.absolute_path).map_err(|e| ScanError::FileSystem {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })?;
    if metadata.len() > config.max_file_size_bytes {
        return Err(ScanError::ManifestParsing {
            path: manifest.absolute_path.clone(),
            reason: format!(
                "manifest is {} bytes, exceeds max_file_size_bytes ({})",
                metadata.len(),
                config.max_file_size_bytes
            ),
        });
    }

    let extractor = extractors()
        .into_iter()
        .find(|e| e.ecosystem() == manifest.ecosystem);

    let mut dependencies = match extractor {
        Some(extractor) => extractor.extract(manifest)?,
        None => fallback::GenericFallbackExtractor.extract(manifest)?,
    };

    if dependencies.len() > config.max_dependencies_per_manifest {
        tracing::warn!(
            manifest = %manifest.absolute_path.display(),
            found = dependencies.len(),
            cap = config.max_dependencies_per_manifest,
            "truncating dependency list to max_dependencies_per_manifest"
        );
        dependencies.truncate(config.max_dependencies_per_manifest);
    }

    Ok(dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_caret_and_tilde() {
        assert_eq!(strip_version_sigil("^1.2.3"), "1.2.3");
        assert_eq!(strip_version_sigil("~1.2.3"), "1.2.3");
        assert_eq!(strip_version_sigil(">=1.2.3"), "1.2.3");
        assert_eq!(strip_version_sigil("==1.2.3"), "1.2.3");
        assert_eq!(strip_version_sigil("~=1.2.3"), "1.2.3");
    }

    #[test]
    fn leaves_compound_ranges_untouched() {
        assert_eq!(strip_version_sigil(">=1.0,<2.0"), ">=1.0,<2.0");
    }
}
