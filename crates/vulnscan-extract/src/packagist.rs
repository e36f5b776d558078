use std::collections::HashMap;

use serde::Deserialize;
use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest, ManifestKind};

use crate::{strip_version_sigil, DependencyExtractor};

pub struct PackagistExtractor;

/// Platform pseudo-packages (`php`, extensions like `ext-json`) describe the
/// runtime, not an installable dependency; Composer itself never resolves
/// them to a registry version.
fn is_platform_package(name: &str) -> bool {
    name == "php" || name.starts_with("ext-") || name.starts_with("lib-") || name == "composer-plugin-api"
}

#[derive(Debug, Deserialize)]
struct ComposerJson {
    #[serde(default)]
    require: Option<HashMap<String, String>>,
    #[serde(rename = "require-dev", default)]
    require_dev: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ComposerLock {
    #[serde(default)]
    packages: Vec<LockPackage>,
    #[serde(rename = "packages-dev", default)]
    packages_dev: Vec<LockPackage>,
}

#[derive(Debug, Deserialize)]
struct LockPackage {
    name: String,
    version: String,
}

impl DependencyExtractor for PackagistExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Packagist
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        match manifest.kind {
            ManifestKind::Lockfile => parse_composer_lock(manifest),
            _ => parse_composer_json(manifest),
        }
    }
}

fn read(manifest: &Manifest) -> Result<String> {
    std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })
}

fn parse_composer_json(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let doc: ComposerJson = serde_json::from_str(&content).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })?;

    let mut deps = Vec::new();
    for (name, version) in doc.require.unwrap_or_default() {
        if is_platform_package(&name) {
            continue;
        }
        deps.push(Dependency {
            name,
            version: Some(strip_version_sigil(&version)),
            ecosystem: Ecosystem::Packagist,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: false,
        });
    }
    for (name, version) in doc.require_dev.unwrap_or_default() {
        if is_platform_package(&name) {
            continue;
        }
        deps.push(Dependency {
            name,
            version: Some(strip_version_sigil(&version)),
            ecosystem: Ecosystem::Packagist,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: false,
        });
    }
    Ok(deps)
}

fn parse_composer_lock(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let lock: ComposerLock = serde_json::from_str(&content).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })?;

    let to_dep = |p: LockPackage, manifest: &Manifest| Dependency {
        name: p.name,
        version: Some(p.version.trim_start_matches('v').to_string()),
        ecosystem: Ecosystem::Packagist,
        manifest_ref: manifest.absolute_path.clone(),
        transitive: true,
    };

    let mut deps: Vec<Dependency> = lock
        .packages
        .into_iter()
        .map(|p| to_dep(p, manifest))
        .collect();
    deps.extend(lock.packages_dev.into_iter().map(|p| to_dep(p, manifest)));
    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(filename: &str, contents: &str, kind: ManifestKind) -> (tempfile::TempDir, Manifest) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(filename);
        std::fs::write(&path, contents).unwrap();
        let m = Manifest {
            directory: tmp.path().to_path_buf(),
            filename: filename.to_string(),
            absolute_path: path,
            ecosystem: Ecosystem::Packagist,
            kind,
        };
        (tmp, m)
    }

    #[test]
    fn skips_platform_packages() {
        let (_tmp, m) = manifest(
            "composer.json",
            r#"{"require":{"php":">=8.1","ext-json":"*","monolog/monolog":"^3.0"}}"#,
            ManifestKind::Primary,
        );
        let deps = PackagistExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "monolog/monolog");
    }

    #[test]
    fn lockfile_includes_dev_packages() {
        let (_tmp, m) = manifest(
            "composer.lock",
            r#"{"packages":[{"name":"monolog/monolog","version":"3.2.0"}],"packages-dev":[{"name":"phpunit/phpunit","version":"10.0.0"}]}"#,
            ManifestKind::Lockfile,
        );
        let deps = PackagistExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 2);
    }
}
