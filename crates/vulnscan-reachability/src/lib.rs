//! Source parsing & call-graph construction, entry-point detection, and the
//! reachability engine.

pub mod builder;
pub mod entrypoints;
pub mod frontend;
pub mod frontends;
pub mod reachability;

pub use builder::{build_call_graph, BuildResult};
pub use entrypoints::detect_entry_points;
pub use frontend::{CallSite, ImportDecl, ImportOrigin, LanguageFrontend, ParsedFile, SymbolDef};
pub use reachability::{analyze_reachability, ReachabilityOutcome};
