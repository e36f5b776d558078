//! Configuration loading: an optional `vulnscan.toml` layered underneath
//! CLI flags. Unknown keys are rejected at load.

use std::path::Path;

use serde::Deserialize;
use vulnscan_core::{ScanConfig, ScanError};

/// Mirrors [`ScanConfig`]'s tunables as all-optional fields so a partial
/// `vulnscan.toml` only overrides what it mentions. `deny_unknown_fields`
/// is what actually rejects unrecognized keys; `ScanConfig` itself stays
/// permissive since it is also built up programmatically.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    project_path: Option<String>,
    max_walk_depth: Option<usize>,
    min_finding_confidence: Option<f64>,
    min_entry_point_confidence: Option<f64>,
    enable_data_flow: Option<bool>,
    enable_learned_risk_model: Option<bool>,
    enabled_feeds: Option<Vec<String>>,
    max_file_size_bytes: Option<u64>,
    max_json_size_bytes: Option<u64>,
    max_dependencies_per_manifest: Option<usize>,
    max_traversal_depth: Option<usize>,
    max_branch_depth: Option<usize>,
    max_paths_per_target: Option<usize>,
    feed_timeout_seconds: Option<u64>,
}

impl TomlConfig {
    fn apply(self, mut cfg: ScanConfig) -> ScanConfig {
        if let Some(v) = self.project_path {
            cfg.project_path = v;
        }
        if let Some(v) = self.max_walk_depth {
            cfg.max_walk_depth = v;
        }
        if let Some(v) = self.min_finding_confidence {
            cfg.min_finding_confidence = v;
        }
        if let Some(v) = self.min_entry_point_confidence {
            cfg.min_entry_point_confidence = v;
        }
        if let Some(v) = self.enable_data_flow {
            cfg.enable_data_flow = v;
        }
        if let Some(v) = self.enable_learned_risk_model {
            cfg.enable_learned_risk_model = v;
        }
        if let Some(v) = self.enabled_feeds {
            cfg.enabled_feeds = v;
        }
        if let Some(v) = self.max_file_size_bytes {
            cfg.max_file_size_bytes = v;
        }
        if let Some(v) = self.max_json_size_bytes {
            cfg.max_json_size_bytes = v;
        }
        if let Some(v) = self.max_dependencies_per_manifest {
            cfg.max_dependencies_per_manifest = v;
        }
        if let Some(v) = self.max_traversal_depth {
            cfg.max_traversal_depth = v;
        }
        if let Some(v) = self.max_branch_depth {
            cfg.max_branch_depth = v;
        }
        if let Some(v) = self.max_paths_per_target {
            cfg.max_paths_per_target = v;
        }
        if let Some(v) = self.feed_timeout_seconds {
            cfg.feed_timeout_seconds = v;
        }
        cfg
    }
}

/// Loads `path` (if given) or `./vulnscan.toml` (if present) over
/// [`ScanConfig::default`], then validates the merged result. A missing
/// optional file is not an error; a present-but-malformed one is.
pub fn load(explicit_path: Option<&str>) -> Result<ScanConfig, ScanError> {
    let candidate = explicit_path
        .map(|p| p.to_string())
        .unwrap_or_else(|| "vulnscan.toml".to_string());
    let path = Path::new(&candidate);

    let mut cfg = ScanConfig::default();
    if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| ScanError::FileSystem {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let parsed: TomlConfig = toml::from_str(&content)
            .map_err(|e| ScanError::Validation(format!("{}: {e}", path.display())))?;
        cfg = parsed.apply(cfg);
    } else if let Some(explicit) = explicit_path {
        return Err(ScanError::Validation(format!(
            "config file not found: {explicit}"
        )));
    }

    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_file_falls_back_to_defaults() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg.max_traversal_depth, ScanConfig::default().max_traversal_depth);
    }

    #[test]
    fn explicit_missing_path_is_rejected() {
        assert!(load(Some("/nonexistent/vulnscan.toml")).is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vulnscan.toml");
        std::fs::write(&path, "bogus_key = 1\n").unwrap();
        let err = load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
    }
}
