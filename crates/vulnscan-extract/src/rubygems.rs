use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest, ManifestKind};

use crate::DependencyExtractor;

pub struct RubyGemsExtractor;

impl DependencyExtractor for RubyGemsExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::RubyGems
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        match manifest.kind {
            ManifestKind::Lockfile => parse_gemfile_lock(manifest),
            _ => parse_gemfile(manifest),
        }
    }
}

fn read(manifest: &Manifest) -> Result<String> {
    std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
        path: manifest.absolute_path.clone(),
        reason: e.to_string(),
    })
}

/// Gemfile declares intent only (`gem "rails", "~> 7.0"`); the version
/// constraint is optional and usually resolved by Gemfile.lock instead.
fn parse_gemfile(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let mut deps = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if !line.starts_with("gem ") {
            continue;
        }
        let rest = &line[4..];
        let mut parts = rest.split(',');
        let Some(name_token) = parts.next() else {
            continue;
        };
        let name = name_token.trim().trim_matches(['"', '\''].as_slice());
        if name.is_empty() {
            continue;
        }
        let version = parts
            .next()
            .map(|v| v.trim().trim_matches(['"', '\''].as_slice()).to_string())
            .filter(|v| !v.starts_with(':'));

        deps.push(Dependency {
            name: name.to_string(),
            version: version.map(|v| crate::strip_version_sigil(&v)),
            ecosystem: Ecosystem::RubyGems,
            manifest_ref: manifest.absolute_path.clone(),
            transitive: false,
        });
    }

    Ok(deps)
}

/// The `specs:` block lists every resolved gem, direct and transitive alike,
/// two-space indented as `name (version)`.
fn parse_gemfile_lock(manifest: &Manifest) -> Result<Vec<Dependency>> {
    let content = read(manifest)?;
    let mut deps = Vec::new();
    let mut in_specs = false;

    for line in content.lines() {
        if line.trim() == "specs:" {
            in_specs = true;
            continue;
        }
        if line.is_empty() {
            in_specs = false;
            continue;
        }
        // Top-level gem entries are indented exactly 4 spaces; their own
        // dependency constraints are nested one level deeper and skipped.
        if !in_specs || !line.starts_with("    ") || line.starts_with("      ") {
            continue;
        }
        let trimmed = line.trim();
        let Some(paren_start) = trimmed.find('(') else {
            continue;
        };
        let Some(paren_end) = trimmed.find(')') else {
            continue;
        };
        let name = trimmed[..paren_start].trim();
        let version = &trimmed[paren_start + 1..paren_end];
        if name.is_empty() {
            continue;
        }
        deps.push(Dependency {
            name: name.to_string(),
            version: Some(version.to_string()),
            ecosystem: Ecosystem::RubyGems,
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
            ecosystem: Ecosystem::RubyGems,
            kind,
        };
        (tmp, m)
    }

    #[test]
    fn parses_gemfile_constraints() {
        let (_tmp, m) = manifest(
            "Gemfile",
            "source \"https://rubygems.org\"\ngem \"rails\", \"~> 7.0\"\ngem \"pg\"\n",
            ManifestKind::Primary,
        );
        let deps = RubyGemsExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "rails" && d.version.as_deref() == Some("7.0")));
        assert!(deps.iter().any(|d| d.name == "pg" && d.version.is_none()));
    }

    #[test]
    fn parses_gemfile_lock_specs_block() {
        let (_tmp, m) = manifest(
            "Gemfile.lock",
            "GEM\n  remote: https://rubygems.org/\n  specs:\n    rails (7.0.4)\n    pg (1.4.5)\n\nPLATFORMS\n  ruby\n",
            ManifestKind::Lockfile,
        );
        let deps = RubyGemsExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "rails" && d.version.as_deref() == Some("7.0.4")));
    }
}
