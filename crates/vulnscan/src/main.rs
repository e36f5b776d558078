use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod risk_context;
mod scan;

use cli::{Cli, Commands};

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Scan {
        path: ".".into(),
        format: "table".into(),
        out: None,
        min_confidence: None,
        min_severity: None,
        reachable_only: false,
        learned_risk: false,
        config: None,
        verbose: 0,
    });

    match command {
        Commands::Scan {
            path,
            format,
            out,
            min_confidence,
            min_severity,
            reachable_only,
            learned_risk,
            config,
            verbose,
        } => {
            init_tracing(verbose);
            let exit_code = commands::handle_scan(
                &path,
                &format,
                out.as_deref(),
                min_confidence,
                min_severity.as_deref(),
                reachable_only,
                learned_risk,
                config.as_deref(),
            )?;
            std::process::exit(exit_code);
        }
        Commands::Feedback {
            vulnerability_id,
            verdict,
            rationale,
            risk_override,
        } => {
            init_tracing(0);
            let exit_code =
                commands::handle_feedback(&vulnerability_id, &verdict, rationale.as_deref(), risk_override)?;
            std::process::exit(exit_code);
        }
        Commands::Ml(action) => {
            init_tracing(0);
            let exit_code = commands::handle_ml(action)?;
            std::process::exit(exit_code);
        }
        Commands::Cache(action) => {
            init_tracing(0);
            let exit_code = commands::handle_cache(action)?;
            std::process::exit(exit_code);
        }
    }
}
