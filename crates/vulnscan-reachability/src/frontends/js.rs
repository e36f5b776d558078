//! JavaScript/TypeScript front-end (pattern-based — a full parser-driven
//! front-end is out of scope for the analytical core,
//! which requires only "parse -> iterate symbols -> iterate calls").

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::frontend::{CallSite, ImportDecl, ImportOrigin, LanguageFrontend, ParsedFile, SymbolDef};

static FUNCTION_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)\s*\(").unwrap());
static ARROW_CONST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?const\s+(\w+)\s*=\s*(?:async\s*)?\([^)]*\)\s*=>").unwrap()
});
static METHOD_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:async\s+)?(\w+)\s*\([^)]*\)\s*\{").unwrap());
static REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static IMPORT_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+.*?\s+from\s+['"]([^'"]+)['"]"#).unwrap());
static CALL_SITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:([A-Za-z_$][\w.$]*)\.)?([A-Za-z_$]\w*)\s*\(").unwrap());
static DYNAMIC_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]+\]\s*\(|\beval\s*\(|new\s+Function\s*\(").unwrap());

const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "typeof",
];

pub struct JsFrontend;

impl LanguageFrontend for JsFrontend {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "ts", "tsx", "mjs", "cjs"]
    }

    fn parse_file(&self, _path: &Path, content: &str) -> ParsedFile {
        let mut symbols = Vec::new();
        for caps in FUNCTION_DECL.captures_iter(content) {
            symbols.push(symbol(&caps[1], content));
        }
        for caps in ARROW_CONST.captures_iter(content) {
            symbols.push(symbol(&caps[1], content));
        }
        for caps in METHOD_DECL.captures_iter(content) {
            let name = &caps[1];
            if !KEYWORDS.contains(&name) && !symbols.iter().any(|s: &SymbolDef| s.name == name) {
                symbols.push(symbol(name, content));
            }
        }

        let mut imports = Vec::new();
        for caps in REQUIRE.captures_iter(content) {
            imports.push(import_decl(&caps[1]));
        }
        for caps in IMPORT_FROM.captures_iter(content) {
            imports.push(import_decl(&caps[1]));
        }

        let calls = extract_calls(content, &symbols);

        ParsedFile {
            symbols,
            calls,
            imports,
            source: content.to_string(),
        }
    }
}

fn symbol(name: &str, content: &str) -> SymbolDef {
    SymbolDef {
        name: name.to_string(),
        is_exported: content.contains(&format!("export function {name}"))
            || content.contains(&format!("export const {name}"))
            || content.contains(&format!("module.exports.{name}"))
            || content.contains(&format!("exports.{name}")),
        is_test: false,
    }
}

fn import_decl(path: &str) -> ImportDecl {
    let origin = if path.starts_with('.') {
        ImportOrigin::Project(path.to_string())
    } else {
        let package = path.split('/').next().unwrap_or(path);
        let package = if package.starts_with('@') {
            path.splitn(3, '/').take(2).collect::<Vec<_>>().join("/")
        } else {
            package.to_string()
        };
        ImportOrigin::External(package)
    };
    ImportDecl {
        symbol: path.to_string(),
        origin,
    }
}

/// Approximates "which function am I in" by tracking brace depth against
/// each known function's declaration line, and flags a call as
/// `conditional` when it textually sits inside an `if (` block guarded by a
/// runtime-only value (`process.env`, `req.`, `process.argv`).
fn extract_calls(content: &str, symbols: &[SymbolDef]) -> Vec<CallSite> {
    let mut calls = Vec::new();
    let mut current_fn: Option<String> = None;
    let mut depth_stack: Vec<(String, i32)> = Vec::new();
    let mut depth = 0i32;
    let mut conditional_depth: Option<i32> = None;

    for line in content.lines() {
        let opens = line.matches('{').count() as i32;
        let closes = line.matches('}').count() as i32;

        for sym in symbols {
            if line.contains(&sym.name) && (line.contains('(') && line.contains(')') || line.contains('{')) {
                let looks_like_decl = line.contains("function")
                    || line.contains("=>")
                    || line.trim_start().starts_with(&sym.name);
                if looks_like_decl && !depth_stack.iter().any(|(n, _)| n == &sym.name) {
                    depth_stack.push((sym.name.clone(), depth));
                    current_fn = Some(sym.name.clone());
                }
            }
        }

        let is_conditional_guard = line.contains("if (") || line.contains("if(");
        let guard_runtime = line.contains("process.env")
            || line.contains("req.")
            || line.contains("process.argv")
            || line.contains("request.");
        if is_conditional_guard && guard_runtime && conditional_depth.is_none() {
            conditional_depth = Some(depth);
        }

        let is_dynamic_line = DYNAMIC_CALL.is_match(line);
        for caps in CALL_SITE.captures_iter(line) {
            let callee = caps.get(2).unwrap().as_str().to_string();
            if KEYWORDS.contains(&callee.as_str()) {
                continue;
            }
            let receiver = caps.get(1).map(|m| m.as_str().to_string());
            calls.push(CallSite {
                caller_symbol: current_fn.clone(),
                callee,
                receiver,
                is_dynamic: is_dynamic_line,
                is_conditional: conditional_depth.is_some(),
            });
        }

        depth += opens - closes;
        depth_stack.retain(|(_, d)| depth > *d);
        if depth_stack.is_empty() {
            current_fn = None;
        } else {
            current_fn = depth_stack.last().map(|(n, _)| n.clone());
        }
        if let Some(guard_depth) = conditional_depth {
            if depth <= guard_depth {
                conditional_depth = None;
            }
        }
    }
    calls
}
