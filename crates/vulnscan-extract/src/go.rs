use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest, ManifestKind};

use crate::DependencyExtractor;

pub struct GoExtractor;

impl DependencyExtractor for GoExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        match manifest.kind {
            ManifestKind::Lockfile => parse_go_sum(manifest),
            _ => parse_go_mod(manifest),
        }
    }
}

fn read(manifest: &Manifest) -> Result<String> {
    std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })
}

fn parse_go_mod(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let mut deps = Vec::new();
    let mut in_require_block = false;

    for raw_line in content.lines() {
        let line = raw_line.trim();

        if line.starts_with("require (") {
            in_require_block = true;
            continue;
        }
        if in_require_block && line == ")" {
            in_require_block = false;
            continue;
        }
        if !(line.starts_with("require ") || in_require_block) {
            continue;
        }

        let line = line.strip_prefix("require ").unwrap_or(line);
        let line = line.split("//").next().unwrap_or(line).trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        deps.push(Dependency {
            name: parts[0].to_string(),
            version: Some(parts[1].trim_start_matches('v').to_string()),
            ecosystem: Ecosystem::Go,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: false,
        });
    }

    Ok(deps)
}

/// go.sum has two lines per module (the module hash and its go.mod hash);
/// dedup by module name so each dependency appears once.
fn parse_go_sum(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let mut seen = std::collections::HashSet::new();
    let mut deps = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }
        let name = parts[0].to_string();
        if !seen.insert(name.clone()) {
            continue;
        }
        let version = parts[1].trim_start_matches('v').trim_end_matches("/go.mod");
        deps.push(Dependency {
            name,
            version: Some(version.to_string()),
            ecosystem: Ecosystem::Go,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: true,
        });
    }

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
            ecosystem: Ecosystem::Go,
            kind,
        };
        (tmp, m)
    }

    #[test]
    fn parses_require_block_and_single_line_require() {
        let (_tmp, m) = manifest(
            "go.mod",
            "module example.com/myproject\n\ngo 1.21\n\nrequire (\n    github.com/gin-gonic/gin v1.9.1\n    golang.org/x/crypto v0.14.0 // indirect\n)\n",
            ManifestKind::Primary,
        );
        let deps = GoExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "github.com/gin-gonic/gin");
        assert_eq!(deps[0].version.as_deref(), Some("1.9.1"));
    }

    #[test]
    fn go_sum_deduplicates_module_and_go_mod_hash_lines() {
        let (_tmp, m) = manifest(
            "go.sum",
            "github.com/gin-gonic/gin v1.9.1 h1:abc=\ngithub.com/gin-gonic/gin v1.9.1/go.mod h1:def=\n",
            ManifestKind::Lockfile,
        );
        let deps = GoExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].version.as_deref(), Some("1.9.1"));
    }
}
