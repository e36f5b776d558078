use vulnscan_core::errors::Result;
use vulnscan_core::model::{Dependency, Ecosystem, Manifest};

use crate::DependencyExtractor;

/// Used for ecosystems the discoverer recognizes (the manifest pattern registry
/// covers all 12) but that have no dedicated parser yet: pub, Swift,
/// Hex, Hackage. Discovery still reports the manifest so the scan's
/// statistics aren't silently missing it; extraction degrades to an empty
/// dependency list rather than guessing at an unfamiliar format. See
/// DESIGN.md for the ecosystem coverage decision.
pub struct GenericFallbackExtractor;

impl DependencyExtractor for GenericFallbackExtractor {
    fn ecosystem(&self) -> Ecosystem {
        // Never consulted through the registry lookup; only reached via the
        // `None` branch in `extract_from_manifest`.
        Ecosystem::Pub
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        tracing::warn!(
            ecosystem = %manifest.ecosystem,
            path = %manifest.absolute_path.display(),
            "no dependency extractor registered for this ecosystem; yielding zero dependencies"
        );
        Ok(Vec::new())
    }
}
