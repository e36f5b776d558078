//! Taint/data-flow overlay.
//!
//! Consumes the call graph and parsed-file set produced by
//! `vulnscan-reachability` and, given a reachability witness path, decides
//! whether attacker-controlled data plausibly reaches the vulnerable call.

pub mod catalogs;
pub mod overlay;

pub use catalogs::{is_sanitizer, match_source, SourceCategory, SANITIZERS};
pub use overlay::analyze_taint;
pub use vulnscan_reachability::ParsedFile;
