//! Manifest discovery: walks a project tree looking for manifests.
//!
//! A path counts as a manifest only if its basename matches one of the
//! [`crate::ecosystems::registry`] patterns *and* the file's content passes
//! that pattern's probe; files that match by name but fail the probe are
//! recorded in `failed_manifests` rather than silently dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::ecosystems;
use crate::model::{FailedManifest, Manifest, ManifestKind, Workspace};

/// Directories never descended into, regardless of depth budget.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    "vendor",
    ".gradle",
    ".mypy_cache",
];

pub struct DiscoveryResult {
    pub workspaces: Vec<Workspace>,
    pub failed_manifests: Vec<FailedManifest>,
}

/// Walks `root` up to `config.max_walk_depth` levels deep and classifies
/// every file encountered against the manifest pattern registry. Manifests
/// are grouped into a [`Workspace`] rooted at the nearest ancestor directory
/// (starting from the manifest's own directory and walking up) that
/// contains a primary or central manifest; a directory tree with no primary
/// or central manifest anywhere above it contributes no workspace, even if
/// a stray lockfile is present.
pub fn discover(root: &Path, config: &ScanConfig) -> DiscoveryResult {
    let patterns = ecosystems::registry();
    let mut failed_manifests = Vec::new();
    let mut by_dir: BTreeMap<PathBuf, Vec<Manifest>> = BTreeMap::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .max_depth(config.max_walk_depth)
        .into_iter()
        .filter_entry(|e| {
            e.file_name()
                .to_str()
                .map(|name| !EXCLUDED_DIRS.contains(&name))
                .unwrap_or(true)
        })
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_path = entry.path();
        let Some(file_name) = file_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let candidates: Vec<_> = patterns
            .iter()
            .filter(|p| (p.filename_matches)(file_name))
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let bytes = match std::fs::read(file_path) {
            Ok(b) => b,
            Err(e) => {
                failed_manifests.push(FailedManifest {
                    path: file_path.to_path_buf(),
                    reason: format!("unreadable: {e}"),
                });
                continue;
            }
        };

        match candidates.iter().find(|p| (p.probe)(&bytes)) {
            Some(pattern) => {
                let directory = file_path.parent().unwrap_or(root).to_path_buf();
                by_dir.entry(directory.clone()).or_default().push(Manifest {
                    absolute_path: file_path.to_path_buf(),
                    directory,
                    ecosystem: pattern.ecosystem,
                    filename: file_name.to_string(),
                    kind: pattern.kind,
                });
            }
            None => {
                failed_manifests.push(FailedManifest {
                    path: file_path.to_path_buf(),
                    reason: format!(
                        "matched filename for {} but failed content probe",
                        candidates[0].description
                    ),
                });
            }
        }
    }

    DiscoveryResult {
        workspaces: group_into_workspaces(by_dir),
        failed_manifests,
    }
}

/// Groups discovered manifests into one [`Workspace`] per nearest-ancestor
/// directory containing a primary or central manifest. A directory holding
/// only a lockfile (no primary manifest of its own) is folded into the
/// workspace rooted at the closest ancestor directory that does have one; a
/// directory with no such ancestor anywhere above it is dropped, since
/// there's no primary manifest to scope dependency extraction against.
fn group_into_workspaces(by_dir: BTreeMap<PathBuf, Vec<Manifest>>) -> Vec<Workspace> {
    let anchors: Vec<&PathBuf> = by_dir
        .iter()
        .filter(|(_, manifests)| {
            manifests
                .iter()
                .any(|m| matches!(m.kind, ManifestKind::Primary | ManifestKind::Central))
        })
        .map(|(dir, _)| dir)
        .collect();

    let mut grouped: BTreeMap<PathBuf, Vec<Manifest>> = BTreeMap::new();
    for (dir, manifests) in by_dir {
        if let Some(anchor) = nearest_anchor(&dir, &anchors) {
            grouped.entry(anchor).or_default().extend(manifests);
        }
    }

    grouped
        .into_iter()
        .map(|(root, manifests)| Workspace { root, manifests })
        .collect()
}

/// Walks from `dir` up through its ancestors (including `dir` itself) and
/// returns the first one present in `anchors`, or `None` if no ancestor
/// anchors a workspace.
fn nearest_anchor(dir: &Path, anchors: &[&PathBuf]) -> Option<PathBuf> {
    let mut current = Some(dir);
    while let Some(d) = current {
        if anchors.iter().any(|a| a.as_path() == d) {
            return Some(d.to_path_buf());
        }
        current = d.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn finds_npm_manifest_in_project_root() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"name":"x","dependencies":{}}"#);

        let result = discover(tmp.path(), &ScanConfig::default());
        assert_eq!(result.workspaces.len(), 1);
        assert_eq!(result.workspaces[0].manifests.len(), 1);
        assert!(result.failed_manifests.is_empty());
    }

    #[test]
    fn skips_node_modules_directory_entirely() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"name":"x"}"#);
        let nested = tmp.path().join("node_modules").join("some-lib");
        fs::create_dir_all(&nested).unwrap();
        write(&nested, "package.json", r#"{"name":"some-lib"}"#);

        let result = discover(tmp.path(), &ScanConfig::default());
        assert_eq!(result.workspaces.len(), 1);
    }

    #[test]
    fn records_name_match_that_fails_content_probe() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", "not json at all {{{");

        let result = discover(tmp.path(), &ScanConfig::default());
        assert!(result.workspaces.is_empty());
        assert_eq!(result.failed_manifests.len(), 1);
    }

    #[test]
    fn respects_max_walk_depth() {
        let tmp = tempfile::tempdir().unwrap();
        let mut deep = tmp.path().to_path_buf();
        for i in 0..5 {
            deep = deep.join(format!("level{i}"));
        }
        fs::create_dir_all(&deep).unwrap();
        write(&deep, "Cargo.toml", "[package]\nname=\"x\"\nversion=\"0.1.0\"\n");

        let mut cfg = ScanConfig::default();
        cfg.max_walk_depth = 2;
        let result = discover(tmp.path(), &cfg);
        assert!(result.workspaces.is_empty());
    }

    #[test]
    fn lockfile_in_a_subdirectory_is_grouped_under_the_ancestor_primary_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "Cargo.toml", "[package]\nname=\"x\"\nversion=\"0.1.0\"\n");
        let nested = tmp.path().join("sub");
        fs::create_dir_all(&nested).unwrap();
        write(&nested, "Cargo.lock", "version = 3\n");

        let result = discover(tmp.path(), &ScanConfig::default());
        assert_eq!(result.workspaces.len(), 1);
        assert_eq!(result.workspaces[0].root, tmp.path());
        assert_eq!(result.workspaces[0].manifests.len(), 2);
    }

    #[test]
    fn orphaned_lockfile_with_no_ancestor_primary_manifest_contributes_no_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("sub");
        fs::create_dir_all(&nested).unwrap();
        write(&nested, "Cargo.lock", "version = 3\n");

        let result = discover(tmp.path(), &ScanConfig::default());
        assert!(result.workspaces.is_empty());
    }

    #[test]
    fn sibling_nested_packages_each_anchor_their_own_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("packages").join("a");
        let b = tmp.path().join("packages").join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        write(&a, "package.json", r#"{"name":"a"}"#);
        write(&b, "package.json", r#"{"name":"b"}"#);

        let result = discover(tmp.path(), &ScanConfig::default());
        assert_eq!(result.workspaces.len(), 2);
        assert!(result.workspaces.iter().all(|w| w.manifests.len() == 1));
    }

    #[test]
    fn distinct_ecosystems_in_same_directory_both_discovered() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "package.json", r#"{"name":"x"}"#);
        write(
            tmp.path(),
            "Cargo.toml",
            "[package]\nname=\"x\"\nversion=\"0.1.0\"\n",
        );

        let result = discover(tmp.path(), &ScanConfig::default());
        assert_eq!(result.workspaces.len(), 1);
        assert_eq!(result.workspaces[0].manifests.len(), 2);
    }
}
