//! Command handlers: one CLI verb, each returning the
//! process exit code its row in that table documents rather than calling
//! `std::process::exit` itself (that stays in `main`).

use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::Utc;
use vulnscan_core::model::{FeedbackRecord, FeedbackVerdict, ReachabilityFinding, Severity};
use vulnscan_formats::OutputFormat;

use crate::cli::{CacheCommands, MlCommands};
use crate::{config, scan};

/// Feedback is only considered usable for training once at least this many
/// labeled (non-`unsure`) records have accumulated.
const MIN_TRAINING_EXAMPLES: usize = 20;
/// Auto-retraining only triggers again once the feedback store has grown by
/// at least this fraction since the last trained model's sample count.
const RETRAIN_GROWTH_FRACTION: f64 = 0.25;
const TRAINING_LEARNING_RATE: f64 = 0.1;
const TRAINING_EPOCHS: usize = 500;

fn parse_severity(raw: &str) -> Result<Severity> {
    match raw.to_lowercase().as_str() {
        "unknown" => Ok(Severity::Unknown),
        "low" => Ok(Severity::Low),
        "medium" => Ok(Severity::Medium),
        "high" => Ok(Severity::High),
        "critical" => Ok(Severity::Critical),
        other => Err(anyhow!("unknown severity filter: {other}")),
    }
}

fn apply_filters(
    findings: Vec<ReachabilityFinding>,
    min_confidence: Option<f64>,
    min_severity: Option<Severity>,
    reachable_only: bool,
) -> Vec<ReachabilityFinding> {
    findings
        .into_iter()
        .filter(|f| min_confidence.map(|m| f.confidence >= m).unwrap_or(true))
        .filter(|f| min_severity.map(|m| f.vulnerability.severity >= m).unwrap_or(true))
        .filter(|f| !reachable_only || f.reachable)
        .collect()
}

#[allow(clippy::too_many_arguments)]
pub fn handle_scan(
    path: &str,
    format: &str,
    out: Option<&str>,
    min_confidence: Option<f64>,
    min_severity: Option<&str>,
    reachable_only: bool,
    learned_risk: bool,
    config_path: Option<&str>,
) -> Result<i32> {
    let cfg = config::load(config_path)?;
    let min_severity = min_severity.map(parse_severity).transpose()?;
    let output_format = OutputFormat::from_str(format).map_err(|e| anyhow!(e))?;

    let report = scan::run(std::path::Path::new(path), &cfg, learned_risk)?;
    let findings = apply_filters(report.findings, min_confidence, min_severity, reachable_only);

    let rendered = match output_format {
        OutputFormat::Table => vulnscan_formats::table::render(&findings, &report.statistics),
        OutputFormat::Json => vulnscan_formats::json::render(&findings, &report.statistics)?,
        OutputFormat::Markdown => vulnscan_formats::markdown::render(&findings, &report.statistics),
        OutputFormat::Html => vulnscan_formats::html::render(&findings, &report.statistics),
        OutputFormat::Sarif => {
            let sarif = vulnscan_formats::sarif::render(&findings, env!("CARGO_PKG_VERSION"));
            serde_json::to_string_pretty(&sarif)?
        }
    };

    match out {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }

    if !report.failed_manifests.is_empty() {
        tracing::warn!(count = report.failed_manifests.len(), "some manifests failed to parse");
    }

    Ok(if findings.iter().any(|f| f.reachable) { 1 } else { 0 })
}

pub fn handle_feedback(
    vulnerability_id: &str,
    verdict: &str,
    rationale: Option<&str>,
    risk_override: Option<f64>,
) -> Result<i32> {
    let verdict = match verdict.to_lowercase().as_str() {
        "true-positive" | "true_positive" | "tp" => FeedbackVerdict::TruePositive,
        "false-positive" | "false_positive" | "fp" => FeedbackVerdict::FalsePositive,
        "unsure" => FeedbackVerdict::Unsure,
        other => {
            eprintln!("invalid verdict: {other} (expected true-positive|false-positive|unsure)");
            return Ok(1);
        }
    };

    // The frozen feature vector comes from a fresh scan of the current
    // project so the record reflects the finding's actual features rather
    // than a guess; feedback is keyed to a past finding by its vulnerability ID.
    let cfg = config::load(None)?;
    let report = scan::run(std::path::Path::new("."), &cfg, false)?;
    let Some(finding) = report
        .findings
        .iter()
        .find(|f| f.vulnerability.canonical_id == vulnerability_id)
    else {
        eprintln!("no finding with vulnerability ID {vulnerability_id} in the current scan");
        return Ok(1);
    };

    let ctx = vulnscan_risk::RiskContext {
        reachability_confidence: finding.confidence,
        path_length: finding.paths.first().map(|p| p.len()).unwrap_or(0),
        transitive: finding.dependency.transitive,
        ..Default::default()
    };
    let features = vulnscan_risk::extract(&finding.vulnerability, &finding.taint, &ctx);

    let record = FeedbackRecord {
        vulnerability_id: vulnerability_id.to_string(),
        verdict,
        features_frozen: features.to_vec(),
        timestamp: Utc::now(),
        optional_risk_override: risk_override,
        rationale: rationale.map(str::to_string),
    };

    vulnscan_risk::FeedbackStore::new(scan::feedback_path()).append(&record)?;
    Ok(0)
}

pub fn handle_ml(action: MlCommands) -> Result<i32> {
    match action {
        MlCommands::Train => {
            let store = vulnscan_risk::FeedbackStore::new(scan::feedback_path());
            let records = store.load_all()?;
            let examples = vulnscan_risk::labeled_examples(&records);
            if examples.len() < MIN_TRAINING_EXAMPLES {
                println!(
                    "insufficient labeled feedback to train ({} of {} required)",
                    examples.len(),
                    MIN_TRAINING_EXAMPLES
                );
                return Ok(1);
            }

            let training_examples: Vec<vulnscan_risk::TrainingExample> = examples
                .into_iter()
                .map(|(features, label)| vulnscan_risk::TrainingExample { features, label })
                .collect();
            let model = vulnscan_risk::train(&training_examples, TRAINING_LEARNING_RATE, TRAINING_EPOCHS);
            vulnscan_risk::ModelStore::new(scan::model_path()).save(&model)?;
            println!("trained on {} labeled examples", model.trained_on_samples);
            Ok(0)
        }
        MlCommands::Status => {
            let store = vulnscan_risk::FeedbackStore::new(scan::feedback_path());
            let count = store.count()?;
            let model_store = vulnscan_risk::ModelStore::new(scan::model_path());
            let trained_on = model_store.load().map(|m| m.trained_on_samples).unwrap_or(0);
            let due = vulnscan_risk::should_retrain(count, trained_on, MIN_TRAINING_EXAMPLES, RETRAIN_GROWTH_FRACTION);
            println!("feedback records: {count}");
            println!("trained on: {trained_on}");
            println!("retrain due: {due}");
            Ok(0)
        }
    }
}

pub fn handle_cache(action: CacheCommands) -> Result<i32> {
    match action {
        CacheCommands::Clear => {
            let store = vulnscan_cache::CacheStore::open(scan::cache_dir())?;
            store.clear()?;
            println!("cache cleared");
            Ok(0)
        }
    }
}
