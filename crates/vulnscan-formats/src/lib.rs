//! Output formatters: table, JSON, SARIF, Markdown, HTML. Every formatter
//! is a pure function over `Vec<ReachabilityFinding>` plus the scan's
//! `Statistics` record.

pub mod html;
pub mod json;
pub mod markdown;
pub mod sarif;
pub mod table;

#[cfg(test)]
mod test_support;

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Sarif,
    Markdown,
    Html,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "sarif" => Ok(Self::Sarif),
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
