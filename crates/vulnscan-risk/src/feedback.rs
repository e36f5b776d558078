//! Persistent feedback store (append-only JSON-lines) and the serialized,
//! version-tagged learned model file.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::warn;
use vulnscan_core::model::{FeedbackRecord, FeedbackVerdict};

use crate::errors::{Result, RiskError};
use crate::model::LogisticModel;

pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, record: &FeedbackRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)
            .map_err(|e| RiskError::MalformedFeedback(e.to_string()))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Readers snapshot the whole file at call time ; a line
    /// that fails to parse is skipped with a warning rather than aborting
    /// the read, since the store is append-only and one bad line shouldn't
    /// poison every later training run.
    pub fn load_all(&self) -> Result<Vec<FeedbackRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedbackRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping malformed feedback record"),
            }
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.load_all()?.len())
    }
}

/// Excludes `unsure` verdicts, matching the training contract
/// (only true/false-positive records carry a usable label).
pub fn labeled_examples(records: &[FeedbackRecord]) -> Vec<(Vec<f64>, f64)> {
    records
        .iter()
        .filter_map(|r| match r.verdict {
            FeedbackVerdict::TruePositive => Some((r.features_frozen.clone(), 1.0)),
            FeedbackVerdict::FalsePositive => Some((r.features_frozen.clone(), 0.0)),
            FeedbackVerdict::Unsure => None,
        })
        .collect()
}

/// `true` when feedback count has crossed the initial threshold, or grown
/// by at least `growth_fraction` since `last_trained_count`.
pub fn should_retrain(
    current_count: usize,
    last_trained_count: usize,
    min_threshold: usize,
    growth_fraction: f64,
) -> bool {
    if current_count < min_threshold {
        return false;
    }
    if last_trained_count == 0 {
        return true;
    }
    let growth = (current_count as f64 - last_trained_count as f64) / last_trained_count as f64;
    growth >= growth_fraction
}

pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(&self, model: &LogisticModel) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(model)
            .map_err(|e| RiskError::CorruptModel(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Returns `None` (rather than an error) on a missing or corrupt file,
    /// so callers can fall back to default weights and log instead of
    /// ever raising out of scoring.
    pub fn load(&self) -> Option<LogisticModel> {
        let bytes = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice::<LogisticModel>(&bytes) {
            Ok(model) if !model.is_stale_format() => Some(model),
            Ok(_) => {
                warn!(path = %self.path.display(), "risk model file has an unsupported version, ignoring");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "risk model file is corrupt, falling back to default weights");
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn record(verdict: FeedbackVerdict) -> FeedbackRecord {
        FeedbackRecord {
            vulnerability_id: "CVE-2024-0001".into(),
            verdict,
            features_frozen: vec![0.5; 16],
            timestamp: Utc::now(),
            optional_risk_override: None,
            rationale: None,
        }
    }

    #[test]
    fn append_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.jsonl"));
        store.append(&record(FeedbackVerdict::TruePositive)).unwrap();
        store.append(&record(FeedbackVerdict::FalsePositive)).unwrap();
        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn unsure_records_are_excluded_from_training_labels() {
        let records = vec![
            record(FeedbackVerdict::TruePositive),
            record(FeedbackVerdict::Unsure),
            record(FeedbackVerdict::FalsePositive),
        ];
        let labeled = labeled_examples(&records);
        assert_eq!(labeled.len(), 2);
    }

    #[test]
    fn retrain_trigger_fires_on_initial_threshold_and_growth() {
        assert!(!should_retrain(10, 0, 20, 0.5));
        assert!(should_retrain(20, 0, 20, 0.5));
        assert!(should_retrain(31, 20, 20, 0.5));
        assert!(!should_retrain(25, 20, 20, 0.5));
    }

    #[test]
    fn corrupt_model_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = ModelStore::new(path);
        assert!(store.load().is_none());
    }
}
