//! The error taxonomy from shared across every component so
//! collaborator boundaries can wrap failures uniformly. Kinds, not types:
//! every non-fatal variant degrades the scan (recorded, skipped) rather than
//! aborting it; only `Fatal` aborts, and it is reserved for internal
//! invariant violations, never user-data-dependent paths.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Malformed user input or configuration; raised pre-scan.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// A single manifest could not be parsed; recorded in `failed_manifests`.
    #[error("failed to parse manifest {path}: {reason}")]
    ManifestParsing { path: PathBuf, reason: String },

    /// Read/stat failure on a specific file.
    #[error("file system error on {path}: {reason}")]
    FileSystem { path: PathBuf, reason: String },

    /// A specific vulnerability feed failed; contributes nothing.
    #[error("feed '{feed}' unavailable: {reason}")]
    FeedUnavailable { feed: String, reason: String },

    /// A cache record's HMAC did not verify.
    #[error("cache integrity check failed: {0}")]
    Integrity(String),

    /// Depth or time cap reached mid-traversal; partial result returned.
    #[error("analysis budget exceeded: {0}")]
    AnalysisBudgetExceeded(String),

    /// Internal invariant violation. Never raised by user-data-dependent
    /// code paths.
    #[error("internal invariant violated: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// Exit-code policy: only fatal-vs-non-fatal is distinguished by
    /// the error itself; "reachable findings present" is a separate,
    /// orthogonal signal computed from the finding list.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::Fatal(_))
    }
}

impl From<vulnscan_graph::GraphError> for ScanError {
    fn from(e: vulnscan_graph::GraphError) -> Self {
        match e {
            vulnscan_graph::GraphError::Inconsistent(msg) => ScanError::Fatal(msg),
            other => ScanError::Fatal(other.to_string()),
        }
    }
}
