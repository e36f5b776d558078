use std::collections::HashMap;

use serde::Deserialize;
use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest, ManifestKind};

use crate::{strip_version_sigil, DependencyExtractor};

pub struct NpmExtractor;

#[derive(Debug, Deserialize)]
struct PackageLock {
    #[serde(default)]
    packages: Option<HashMap<String, PackageLockEntry>>,
}

#[derive(Debug, Deserialize)]
struct PackageLockEntry {
    version: Option<String>,
    #[serde(default)]
    dev: bool,
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: Option<HashMap<String, String>>,
    #[serde(rename = "devDependencies", default)]
    dev_dependencies: Option<HashMap<String, String>>,
}

impl DependencyExtractor for NpmExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        match manifest.kind {
            ManifestKind::Lockfile => parse_package_lock(manifest),
            _ => parse_package_json(manifest),
        }
    }
}

fn read(manifest: &Manifest) -> Result<String> {
    std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })
}

fn parse_package_lock(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let lock: PackageLock =
        serde_json::from_str(&content).map_err(|e| ScanError::ManifestParsing {
            path: manifest.absolute_path.clone(),
            reason: e.to_string(),
        })?;

    let mut deps = Vec::new();
    for (pkg_path, entry) in lock.packages.unwrap_or_default() {
        if pkg_path.is_empty() {
            continue;
        }
        let Some(version) = entry.version else {
            continue;
        };
        let name = pkg_path
            .rsplit("node_modules/")
            .next()
            .unwrap_or(&pkg_path)
            .to_string();
        deps.push(Dependency {
            name,
            version: Some(version),
            ecosystem: Ecosystem::Npm,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: pkg_path.matches("node_modules/").count() > 1,
        });
        let _ = entry.dev;
    }
    Ok(deps)
}

fn parse_package_json(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let pkg: PackageJson = serde_json::from_str(&content).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })?;

    let mut deps = Vec::new();
    for (name, version) in pkg.dependencies.unwrap_or_default() {
        deps.push(Dependency {
            name,
            version: Some(strip_version_sigil(&version)),
            ecosystem: Ecosystem::Npm,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: false,
        });
    }
    for (name, version) in pkg.dev_dependencies.unwrap_or_default() {
        deps.push(Dependency {
            name,
            version: Some(strip_version_sigil(&version)),
            ecosystem: Ecosystem::Npm,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: false,
        });
    }
    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn manifest(kind: ManifestKind, path: PathBuf) -> Manifest {
        Manifest {
            directory: path.parent().unwrap().to_path_buf(),
            filename: path.file_name().unwrap().to_string_lossy().to_string(),
            absolute_path: path,
            ecosystem: Ecosystem::Npm,
            kind,
        }
    }

    #[test]
    fn parses_direct_and_dev_dependencies() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"dependencies":{"express":"^4.18.0"},"devDependencies":{"jest":"^29.0.0"}}"#,
        )
        .unwrap();

        let deps = NpmExtractor.extract(&manifest(ManifestKind::Primary, path)).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "express" && d.version.as_deref() == Some("4.18.0")));
    }

    #[test]
    fn lockfile_entries_resolve_exact_versions() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("package-lock.json");
        std::fs::write(
            &path,
            r#"{"lockfileVersion":3,"packages":{"":{},"node_modules/express":{"version":"4.18.2"}}}"#,
        )
        .unwrap();

        let deps = NpmExtractor.extract(&manifest(ManifestKind::Lockfile, path)).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "express");
        assert_eq!(deps[0].version.as_deref(), Some("4.18.2"));
    }
}
