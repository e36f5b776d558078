//! Command-line surface: one `Cli`/`Commands` pair built with `clap`'s
//! derive macros.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vulnscan", version, about = "Dependency vulnerability scanner with reachability, taint, and risk analysis", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a project for reachable, risk-scored vulnerabilities
    #[command(after_help = "EXAMPLES:
  # Scan the current directory, table output
  vulnscan scan

  # CI-friendly SARIF for code-scanning upload
  vulnscan scan --format sarif --out findings.sarif

  # Only list findings with a live call path
  vulnscan scan --reachable-only

  # Use a learned risk model instead of the default weighted sum
  vulnscan scan --learned-risk")]
    Scan {
        /// Path to the project to scan (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
        /// Output format
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
        /// Write the report to a file instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<String>,
        /// Drop findings below this reachability confidence
        #[arg(long, value_name = "0..1")]
        min_confidence: Option<f64>,
        /// Drop findings below this severity (low|medium|high|critical)
        #[arg(long, value_name = "SEVERITY")]
        min_severity: Option<String>,
        /// Only emit findings with a live call path
        #[arg(long)]
        reachable_only: bool,
        /// Use the learned risk model instead of the default weighted sum
        #[arg(long)]
        learned_risk: bool,
        /// Path to a vulnscan.toml configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<String>,
        /// Increase logging verbosity (-v, -vv)
        #[arg(short = 'v', long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Record a verdict for a past finding, used to train the learned risk model
    Feedback {
        /// Canonical vulnerability ID (CVE/GHSA/OSV) the verdict applies to
        #[arg(long, value_name = "ID")]
        vulnerability_id: String,
        /// Verdict: true-positive | false-positive | unsure
        #[arg(long, value_name = "VERDICT")]
        verdict: String,
        /// Free-text rationale, stored alongside the record
        #[arg(long)]
        rationale: Option<String>,
        /// Override the computed risk score with a manual value (0-100)
        #[arg(long, value_name = "0..100")]
        risk_override: Option<f64>,
    },

    /// Machine-learning subcommands for the learned risk model
    #[command(subcommand)]
    Ml(MlCommands),

    /// Cache maintenance subcommands
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(Subcommand, Debug)]
pub enum MlCommands {
    /// Retrain the learned risk model from recorded feedback
    Train,
    /// Report feedback counts and whether a retrain is due
    Status,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Remove every cached vulnerability feed response
    Clear,
}
