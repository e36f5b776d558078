use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest, ManifestKind};

use crate::DependencyExtractor;

pub struct CargoExtractor;

impl DependencyExtractor for CargoExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Cargo
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        match manifest.kind {
            ManifestKind::Lockfile => parse_cargo_lock(manifest),
            _ => parse_cargo_toml(manifest),
        }
    }
}

fn read(manifest: &Manifest) -> Result<toml::Value> {
    let content =
        std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
            path: manifest.absolute_path.clone(),
            reason: e.to_string(),
        })?;
    toml::from_str(&content).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })
}

const DEPENDENCY_TABLES: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];

fn parse_cargo_toml(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let value = read(manifest)?;
    let mut deps = Vec::new();

    for table_name in DEPENDENCY_TABLES {
        let Some(table) = value.get(table_name).and_then(|v| v.as_table()) else {
            continue;
        };
        for (name, spec) in table {
            let Some(dep) = cargo_dependency(name, spec, manifest) else {
                continue;
            };
            deps.push(dep);
        }
    }

    if let Some(workspace_deps) = value
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(|v| v.as_table())
    {
        for (name, spec) in workspace_deps {
            let Some(dep) = cargo_dependency(name, spec, manifest) else {
                continue;
            };
            deps.push(dep);
        }
    }

    Ok(deps)
}

fn cargo_dependency(name: &str, spec: &toml::Value, manifest: &Manifest) -> Option<Dependency> {
    let version = match spec {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Table(t) => {
            if t.contains_key("path") || t.contains_key("git") {
                // Local/vcs dependencies carry no resolvable registry version.
                return None;
            }
            t.get("version")
                .and_then(|v| v.as_str())
                .map(|v| v.to_string())
        }
        _ => None,
    }
    .map(|v| crate::strip_version_sigil(&v));

    Some(Dependency {
        name: name.to_string(),
        version,
        ecosystem: Ecosystem::Cargo,
        manifest_ref: manifest.absolute_path.clone(),
        transitive: false,
    })
}

fn parse_cargo_lock(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let value = read(manifest)?;
    let mut deps = Vec::new();

    if let Some(packages) = value.get("package").and_then(|v| v.as_array()) {
        for package in packages {
            let Some(table) = package.as_table() else {
                continue;
            };
            let Some(name) = table.get("name").and_then(|v| v.as_str()) else {
                continue;
            };
            let version = table.get("version").and_then(|v| v.as_str());
            // A lockfile entry with no "source" key is the workspace's own
            // crate, not a dependency pulled from a registry.
            let is_local = !table.contains_key("source");
            if is_local {
                continue;
            }
            deps.push(Dependency {
                name: name.to_string(),
                version: version.map(|v| v.to_string()),
                ecosystem: Ecosystem::Cargo,
                manifest_ref: manifest.absolute_path.clone(),
                transitive: true,
            });
        }
    }

    Ok(deps)
}
