use serde::Deserialize;
use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest};

use crate::{strip_version_sigil, DependencyExtractor};

pub struct PyPiExtractor;

impl DependencyExtractor for PyPiExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::PyPI
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        match manifest.filename.as_str() {
            "pyproject.toml" => parse_pyproject(manifest),
            "poetry.lock" => parse_poetry_lock(manifest),
            _ => parse_requirements_txt(manifest),
        }
    }
}

fn read(manifest: &Manifest) -> Result<String> {
    std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })
}

/// `pip` accepts `==`, `>=`, `<=`, `~=`, `!=`, `>`, `<` as version
/// specifiers; a bare name with none of these has no resolvable version.
const SPECIFIERS: &[&str] = &["==", "~=", ">=", "<=", "!=", ">", "<"];

fn parse_requirement_line(line: &str) -> Option<(String, Option<String>)> {
    let line = line.split('#').next()?.trim();
    if line.is_empty() || line.starts_with('-') {
        return None;
    }
    for spec in SPECIFIERS {
        if let Some((name, version)) = line.split_once(spec) {
            let name = name.trim().split(&['[', ';'][..]).next()?.trim();
            if name.is_empty() {
                return None;
            }
            return Some((name.to_string(), Some(strip_version_sigil(version))));
        }
    }
    let name = line.split(&['[', ';'][..]).next()?.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), None))
}

fn parse_requirements_txt(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let mut deps = Vec::new();
    for line in content.lines() {
        if let Some((name, version)) = parse_requirement_line(line) {
            deps.push(Dependency {
                name,
                version,
                ecosystem: Ecosystem::PyPI,
                manifest_ref: manifest.absolute_path.clone(),
                transitive: false,
            });
        }
    }
    Ok(deps)
}

#[derive(Debug, Deserialize, Default)]
struct PyProject {
    #[serde(default)]
    project: Option<ProjectTable>,
}

#[derive(Debug, Deserialize, Default)]
struct ProjectTable {
    #[serde(default)]
    dependencies: Vec<String>,
}

fn parse_pyproject(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let doc: PyProject = toml::from_str(&content).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })?;

    let mut deps = Vec::new();
    for spec in doc.project.unwrap_or_default().dependencies {
        if let Some((name, version)) = parse_requirement_line(&spec) {
            deps.push(Dependency {
                name,
                version,
                ecosystem: Ecosystem::PyPI,
                manifest_ref: manifest.absolute_path.clone(),
                transitive: false,
            });
        }
    }
    Ok(deps)
}

#[derive(Debug, Deserialize)]
struct PoetryLock {
    #[serde(default, rename = "package")]
    packages: Vec<PoetryPackage>,
}

#[derive(Debug, Deserialize)]
struct PoetryPackage {
    name: String,
    version: String,
    #[serde(default)]
    category: Option<String>,
}

fn parse_poetry_lock(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let lock: PoetryLock = toml::from_str(&content).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })?;

    Ok(lock
        .packages
        .into_iter()
        .map(|p| Dependency {
            name: p.name,
            version: Some(p.version),
            ecosystem: Ecosystem::PyPI,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: p.category.as_deref() != Some("main"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::model::ManifestKind;

    fn manifest(filename: &str, contents: &str) -> (tempfile::TempDir, Manifest) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(filename);
        std::fs::write(&path, contents).unwrap();
        let m = Manifest {
            directory: tmp.path().to_path_buf(),
            filename: filename.to_string(),
            absolute_path: path,
            ecosystem: Ecosystem::PyPI,
            kind: ManifestKind::Primary,
        };
        (tmp, m)
    }

    #[test]
    fn parses_pinned_and_unpinned_requirements() {
        let (_tmp, m) = manifest("requirements.txt", "flask==2.3.0\nrequests\n# comment\n");
        let deps = PyPiExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps
            .iter()
            .any(|d| d.name == "flask" && d.version.as_deref() == Some("2.3.0")));
        assert!(deps.iter().any(|d| d.name == "requests" && d.version.is_none()));
    }

    #[test]
    fn parses_pyproject_dependencies() {
        let (_tmp, m) = manifest(
            "pyproject.toml",
            "[project]\nname = \"x\"\ndependencies = [\"flask>=2.0\"]\n",
        );
        let deps = PyPiExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "flask");
        assert_eq!(deps[0].version.as_deref(), Some("2.0"));
    }
}
