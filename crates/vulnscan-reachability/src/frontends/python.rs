//! Python front-end (pattern + lightweight statement walk). Indentation stands in
//! for brace depth when tracking which function a call site belongs to.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::frontend::{CallSite, ImportDecl, ImportOrigin, LanguageFrontend, ParsedFile, SymbolDef};

static DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)def\s+(\w+)\s*\(").unwrap());
static IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*import\s+([\w.]+)").unwrap());
static FROM_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*from\s+([\w.]+)\s+import").unwrap());
static CALL_SITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:([A-Za-z_]\w*)\.)?([A-Za-z_]\w*)\s*\(").unwrap());
static DYNAMIC_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgetattr\s*\(|\beval\s*\(|\bexec\s*\(|\b__import__\s*\(").unwrap());

const KEYWORDS: &[&str] = &["if", "for", "while", "with", "def", "class", "return", "print"];

pub struct PythonFrontend;

impl LanguageFrontend for PythonFrontend {
    fn language(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn parse_file(&self, _path: &Path, content: &str) -> ParsedFile {
        let mut symbols = Vec::new();
        for caps in DEF.captures_iter(content) {
            let name = caps[2].to_string();
            let indent = caps[1].len();
            symbols.push((
                indent,
                SymbolDef {
                    is_exported: indent == 0 && !name.starts_with('_'),
                    is_test: name.starts_with("test_"),
                    name,
                },
            ));
        }

        let mut imports = Vec::new();
        for line in content.lines() {
            if let Some(caps) = IMPORT.captures(line) {
                imports.push(import_decl(&caps[1]));
            } else if let Some(caps) = FROM_IMPORT.captures(line) {
                imports.push(import_decl(&caps[1]));
            }
        }

        let calls = extract_calls(content, &symbols);

        ParsedFile {
            symbols: symbols.into_iter().map(|(_, s)| s).collect(),
            calls,
            imports,
            source: content.to_string(),
        }
    }
}

fn import_decl(module: &str) -> ImportDecl {
    let origin = if module.starts_with('.') {
        ImportOrigin::Project(module.to_string())
    } else {
        let top = module.split('.').next().unwrap_or(module);
        ImportOrigin::External(top.to_string())
    };
    ImportDecl {
        symbol: module.to_string(),
        origin,
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn extract_calls(content: &str, symbols: &[(usize, SymbolDef)]) -> Vec<CallSite> {
    let mut calls = Vec::new();
    let mut stack: Vec<(String, usize)> = Vec::new();
    let mut conditional_guard: Option<usize> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);

        while stack.last().is_some_and(|(_, d)| indent <= *d) {
            stack.pop();
        }
        if let Some(guard_indent) = conditional_guard {
            if indent <= guard_indent {
                conditional_guard = None;
            }
        }

        if let Some(caps) = DEF.captures(line) {
            let def_indent = caps[1].len();
            let name = caps[2].to_string();
            if symbols.iter().any(|(_, s)| s.name == name) {
                stack.push((name, def_indent));
            }
            continue;
        }

        let trimmed = line.trim_start();
        if (trimmed.starts_with("if ") || trimmed.starts_with("elif "))
            && (trimmed.contains("os.environ")
                || trimmed.contains("sys.argv")
                || trimmed.contains("request."))
            && conditional_guard.is_none()
        {
            conditional_guard = Some(indent);
        }

        let current_fn = stack.last().map(|(n, _)| n.clone());
        let is_dynamic = DYNAMIC_CALL.is_match(line);
        for caps in CALL_SITE.captures_iter(line) {
            let callee = caps.get(2).unwrap().as_str().to_string();
            if KEYWORDS.contains(&callee.as_str()) {
                continue;
            }
            calls.push(CallSite {
                caller_symbol: current_fn.clone(),
                callee,
                receiver: caps.get(1).map(|m| m.as_str().to_string()),
                is_dynamic,
                is_conditional: conditional_guard.is_some(),
            });
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_function_and_call() {
        let parsed = PythonFrontend.parse_file(
            Path::new("a.py"),
            "def handler(request):\n    do_work(request)\n",
        );
        assert!(parsed.symbols.iter().any(|s| s.name == "handler"));
        assert!(parsed.calls.iter().any(|c| c.callee == "do_work"));
    }

    #[test]
    fn from_import_resolves_to_external_top_level_package() {
        let parsed = PythonFrontend.parse_file(Path::new("a.py"), "from flask import Flask\n");
        assert!(matches!(&parsed.imports[0].origin, ImportOrigin::External(p) if p == "flask"));
    }

    #[test]
    fn relative_import_resolves_to_project_origin() {
        let parsed = PythonFrontend.parse_file(Path::new("a.py"), "from .models import User\n");
        assert!(matches!(&parsed.imports[0].origin, ImportOrigin::Project(p) if p == ".models"));
    }

    #[test]
    fn call_guarded_by_env_check_is_marked_conditional() {
        let src = "def handler():\n    if os.environ.get('X'):\n        dangerous_call()\n";
        let parsed = PythonFrontend.parse_file(Path::new("a.py"), src);
        let call = parsed.calls.iter().find(|c| c.callee == "dangerous_call").unwrap();
        assert!(call.is_conditional);
    }
}
