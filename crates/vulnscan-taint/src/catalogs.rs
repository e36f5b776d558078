//! Static taint source/sanitizer catalogs.
//!
//! Source and sanitizer patterns live in this one module rather than
//! per-language or per-analysis-mode copies — see DESIGN.md for why a
//! single canonical catalog was chosen over scattering the lists across
//! the reachability front-ends.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered worst-to-best is backwards here on purpose: `weight()` returns a
/// plain "how trustworthy is this input" score used directly in the taint
/// confidence formula, so HTTP body (least trustworthy) gets the highest
/// weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    HttpBody,
    HttpQuery,
    HttpHeader,
    Environment,
    ProcessArgs,
    SocketPayload,
}

impl SourceCategory {
    pub fn weight(self) -> f64 {
        match self {
            SourceCategory::HttpBody => 1.0,
            SourceCategory::HttpQuery => 0.85,
            SourceCategory::HttpHeader => 0.7,
            SourceCategory::SocketPayload => 0.75,
            SourceCategory::ProcessArgs => 0.55,
            SourceCategory::Environment => 0.4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceCategory::HttpBody => "http_body",
            SourceCategory::HttpQuery => "http_query",
            SourceCategory::HttpHeader => "http_header",
            SourceCategory::Environment => "environment",
            SourceCategory::ProcessArgs => "process_args",
            SourceCategory::SocketPayload => "socket_payload",
        }
    }
}

pub struct SourcePattern {
    pub category: SourceCategory,
    pub regex: Lazy<Regex>,
}

macro_rules! source_pattern {
    ($category:expr, $re:expr) => {
        SourcePattern {
            category: $category,
            regex: Lazy::new(|| Regex::new($re).unwrap()),
        }
    };
}

pub static SOURCE_PATTERNS: &[SourcePattern] = &[
    source_pattern!(SourceCategory::HttpBody, r"req\.body|request\.(get_json|json|data|form)|ctx\.request\.body"),
    source_pattern!(SourceCategory::HttpQuery, r"req\.query|request\.(args|GET|query_params)|\.searchParams"),
    source_pattern!(SourceCategory::HttpHeader, r"req\.headers|request\.headers|getHeader\("),
    source_pattern!(SourceCategory::Environment, r"process\.env|os\.environ|std::env::var"),
    source_pattern!(SourceCategory::ProcessArgs, r"process\.argv|sys\.argv|std::env::args"),
    source_pattern!(SourceCategory::SocketPayload, r"socket\.(recv|read)|\.on\(\s*['\"]data['\"]"),
];

/// Function names whose output is considered untainted regardless of
/// input, independent of ecosystem. Names are matched case-sensitively
/// against call-site callees and function symbols (`"escape"` matches
/// `html.escape`, `shlex.quote`, `encodeURIComponent`'s suffix heuristics,
/// etc., via substring containment in [`is_sanitizer`]).
pub const SANITIZERS: &[&str] = &[
    "escape",
    "sanitize",
    "sanitise",
    "validate",
    "quote",
    "parameterize",
    "encodeURIComponent",
    "escapeHtml",
    "bleach_clean",
    "clean",
    "strip_tags",
];

pub fn is_sanitizer(name: &str) -> bool {
    SANITIZERS.iter().any(|s| name.contains(s))
}

pub fn match_source(text: &str) -> Option<SourceCategory> {
    SOURCE_PATTERNS
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| p.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_body_outranks_environment() {
        assert!(SourceCategory::HttpBody.weight() > SourceCategory::Environment.weight());
    }

    #[test]
    fn recognizes_common_sanitizer_names() {
        assert!(is_sanitizer("html.escape"));
        assert!(is_sanitizer("shlex_quote"));
        assert!(!is_sanitizer("do_work"));
    }

    #[test]
    fn matches_http_body_source_text() {
        assert_eq!(match_source("const data = req.body.name;"), Some(SourceCategory::HttpBody));
    }
}
