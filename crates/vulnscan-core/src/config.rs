//! Typed configuration backing the scanner's command-line options.
//!
//! `ScanConfig` is the single structure every tunable signal weight,
//! threshold, and penalty is centralized into, so policy can be tuned
//! without touching the analysis code it governs. The CLI crate layers
//! flags and an optional `vulnscan.toml` on top of [`ScanConfig::default`]
//! and calls [`ScanConfig::validate`] before a scan starts.

use serde::{Deserialize, Serialize};

use crate::errors::ScanError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub project_path: String,
    pub max_walk_depth: usize,
    pub min_finding_confidence: f64,
    pub min_entry_point_confidence: f64,
    pub enable_data_flow: bool,
    pub enable_learned_risk_model: bool,
    pub enabled_feeds: Vec<String>,
    pub max_file_size_bytes: u64,
    pub max_json_size_bytes: u64,
    pub max_dependencies_per_manifest: usize,
    pub max_traversal_depth: usize,
    /// Per-branch BFS depth cap (default 10); `max_traversal_depth` is the
    /// absolute safety cap (default 100).
    pub max_branch_depth: usize,
    pub max_paths_per_target: usize,
    pub feed_timeout_seconds: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            project_path: ".".to_string(),
            max_walk_depth: 10,
            min_finding_confidence: 0.5,
            min_entry_point_confidence: 0.6,
            enable_data_flow: true,
            enable_learned_risk_model: false,
            enabled_feeds: vec!["osv".to_string()],
            max_file_size_bytes: 50 * 1024 * 1024,
            max_json_size_bytes: 10 * 1024 * 1024,
            max_dependencies_per_manifest: 10_000,
            max_traversal_depth: 100,
            max_branch_depth: 10,
            max_paths_per_target: 3,
            feed_timeout_seconds: 30,
        }
    }
}

impl ScanConfig {
    /// Validates the loaded configuration, rejecting out-of-range values
    /// with a typed `ValidationError` (never a panic).
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_walk_depth == 0 {
            return Err(ScanError::Validation(
                "max_walk_depth must be >= 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_finding_confidence) {
            return Err(ScanError::Validation(
                "min_finding_confidence must be in [0,1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_entry_point_confidence) {
            return Err(ScanError::Validation(
                "min_entry_point_confidence must be in [0,1]".to_string(),
            ));
        }
        if self.max_dependencies_per_manifest == 0 {
            return Err(ScanError::Validation(
                "max_dependencies_per_manifest must be >= 1".to_string(),
            ));
        }
        if self.max_traversal_depth == 0 || self.max_traversal_depth > 100_000 {
            return Err(ScanError::Validation(
                "max_traversal_depth must be in [1, 100000]".to_string(),
            ));
        }
        if self.max_branch_depth == 0 || self.max_branch_depth > self.max_traversal_depth {
            return Err(ScanError::Validation(
                "max_branch_depth must be >= 1 and <= max_traversal_depth".to_string(),
            ));
        }
        if self.max_paths_per_target == 0 {
            return Err(ScanError::Validation(
                "max_paths_per_target must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let mut cfg = ScanConfig::default();
        cfg.min_finding_confidence = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_max_dependencies_is_rejected() {
        let mut cfg = ScanConfig::default();
        cfg.max_dependencies_per_manifest = 0;
        assert!(cfg.validate().is_err());
    }
}
