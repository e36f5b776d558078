//! Call-graph builder : import resolution, call extraction,
//! conditional marking. Ties project files together and ties
//! project-to-external imports to dependency-owned external nodes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use vulnscan_core::model::Dependency;
use vulnscan_graph::{CallGraph, CallType, ImmutableCallGraph, NodeData};
use walkdir::WalkDir;

use crate::frontend::{ImportOrigin, LanguageFrontend, ParsedFile};
use crate::frontends::frontends;

const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "__pycache__",
    ".venv",
    "venv",
    "vendor",
];

pub struct BuildResult {
    pub graph: ImmutableCallGraph,
    /// Parsed files keyed by their graph-relative path, reused by the
    /// entry-point detector so files aren't re-parsed.
    pub parsed_files: HashMap<String, ParsedFile>,
}

/// Parses every source file under `root` with a registered front-end and
/// assembles the call graph: one node per exported/private function
/// (`"<file>:<symbol>"`), one bare-file node for module-scope references
/// with an edge into each of its own symbols, `import` edges between
/// project files, and external nodes for project-to-dependency imports,
/// keyed to the matching entry in `dependencies` when one exists.
pub fn build_call_graph(root: &Path, dependencies: &[Dependency]) -> BuildResult {
    let frontends = frontends();
    let mut parsed_files: HashMap<String, ParsedFile> = HashMap::new();
    let mut frontend_by_ext: HashMap<&str, &dyn LanguageFrontend> = HashMap::new();
    for fe in &frontends {
        for ext in fe.file_extensions() {
            frontend_by_ext.insert(ext, fe.as_ref());
        }
    }

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.file_name()
                .to_str()
                .map(|n| !EXCLUDED_DIRS.contains(&n))
                .unwrap_or(true)
        })
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(frontend) = frontend_by_ext.get(ext) else {
            continue;
        };
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let rel = relative_handle(root, path);
        let parsed = frontend.parse_file(path, &content);
        parsed_files.insert(rel, parsed);
    }

    // Global symbol -> defining file(s), used as the Direct-call resolution
    // fallback when a call site's receiver doesn't pin it to an import.
    let mut symbol_index: HashMap<String, Vec<String>> = HashMap::new();
    for (file, parsed) in &parsed_files {
        for sym in &parsed.symbols {
            symbol_index
                .entry(sym.name.clone())
                .or_default()
                .push(file.clone());
        }
    }

    let mut graph = CallGraph::new();
    for (file, parsed) in &parsed_files {
        for sym in &parsed.symbols {
            let handle = format!("{file}:{}", sym.name);
            graph.upsert_node(handle, NodeData::project(file.clone(), Some(sym.name.clone())));
        }
        if !graph.has_node(file) {
            graph.upsert_node(file.clone(), NodeData::project(file.clone(), None));
        }
    }

    // An entry point is detected at file granularity (no signal pins it to
    // a specific function), but vulnerable targets and call edges live on
    // symbol nodes. Without an edge from a file into its own symbols, BFS
    // starting at a file entry point could only follow `import` edges and
    // would never step into a handler function's body. One edge per symbol
    // closes that gap at full confidence, since "this file defines this
    // function" is certain, not inferred.
    for (file, parsed) in &parsed_files {
        for sym in &parsed.symbols {
            let handle = format!("{file}:{}", sym.name);
            graph.add_edge(file.clone(), handle, CallType::Import, 1.0);
        }
    }

    for (file, parsed) in &parsed_files {
        for import in &parsed.imports {
            match &import.origin {
                ImportOrigin::Project(rel_import) => {
                    if let Some(target_file) = resolve_project_import(file, rel_import, &parsed_files) {
                        graph.add_edge(file.clone(), target_file, CallType::Import, 1.0);
                    }
                }
                ImportOrigin::External(package) => {
                    let external_handle = format!("{package}:*");
                    graph.upsert_node(
                        external_handle.clone(),
                        NodeData::external(package.clone(), None, matched_dependency(package, dependencies)),
                    );
                    graph.add_edge(file.clone(), external_handle, CallType::Import, 1.0);
                }
            }
        }

        for call in &parsed.calls {
            let caller_handle = match &call.caller_symbol {
                Some(sym) => format!("{file}:{sym}"),
                None => file.clone(),
            };

            let external_match = call.receiver.as_deref().and_then(|recv| {
                parsed
                    .imports
                    .iter()
                    .find_map(|imp| match &imp.origin {
                        ImportOrigin::External(pkg) if alias_matches(pkg, recv) => Some(pkg.clone()),
                        _ => None,
                    })
            });

            if let Some(package) = external_match {
                let qualified = format!("{package}.{}", call.callee);
                let unqualified = format!("{package}:{}", call.callee);
                graph.upsert_node(
                    qualified.clone(),
                    NodeData::external(package.clone(), Some(call.callee.clone()), package.clone()),
                );
                graph.upsert_node(
                    unqualified.clone(),
                    NodeData::external(package.clone(), Some(call.callee.clone()), package.clone()),
                );
                let call_type = classify(call.is_dynamic, call.is_conditional, true);
                let confidence = base_confidence(call.is_dynamic, call.is_conditional);
                graph.add_edge(caller_handle.clone(), qualified, call_type, confidence);
                graph.add_edge(caller_handle, unqualified, call_type, confidence);
                continue;
            }

            let local_target = parsed
                .symbols
                .iter()
                .find(|s| s.name == call.callee)
                .map(|_| format!("{file}:{}", call.callee))
                .or_else(|| {
                    symbol_index
                        .get(&call.callee)
                        .and_then(|files| files.first())
                        .map(|f| format!("{f}:{}", call.callee))
                });

            if let Some(target) = local_target {
                let call_type = classify(call.is_dynamic, call.is_conditional, call.receiver.is_some());
                let confidence = base_confidence(call.is_dynamic, call.is_conditional);
                graph.add_edge(caller_handle, target, call_type, confidence);
            }
        }
    }

    BuildResult {
        graph: graph.freeze(),
        parsed_files,
    }
}

fn classify(is_dynamic: bool, is_conditional: bool, has_receiver: bool) -> CallType {
    if is_dynamic {
        CallType::Dynamic
    } else if is_conditional {
        CallType::Conditional
    } else if has_receiver {
        CallType::DirectMethod
    } else {
        CallType::Direct
    }
}

fn base_confidence(is_dynamic: bool, is_conditional: bool) -> f64 {
    match (is_dynamic, is_conditional) {
        (true, _) => 0.5,
        (false, true) => 0.7,
        (false, false) => 1.0,
    }
}

fn relative_handle(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Resolves a relative project import (`./util`, `..models`, `crate::foo`)
/// against the parsed-file set by matching path suffixes; ambiguity is
/// broken by picking the shortest matching candidate, which is usually the
/// most specific.
fn resolve_project_import(
    from_file: &str,
    import_path: &str,
    parsed_files: &HashMap<String, ParsedFile>,
) -> Option<String> {
    let from_dir = Path::new(from_file).parent().unwrap_or(Path::new(""));
    let cleaned = import_path.trim_start_matches("crate::").replace("::", "/");
    let cleaned = cleaned.trim_start_matches("self/").trim_start_matches("super/");
    let joined = if import_path.starts_with('.') {
        from_dir.join(cleaned.trim_start_matches("./"))
    } else {
        PathBuf::from(cleaned)
    };
    let stem = joined.to_string_lossy().replace('\\', "/");

    parsed_files
        .keys()
        .filter(|k| {
            let k_stem = k.rsplit_once('.').map(|(s, _)| s).unwrap_or(k.as_str());
            k_stem.ends_with(&*stem) || k.ends_with(&format!("{stem}.rs"))
        })
        .min_by_key(|k| k.len())
        .cloned()
}

fn alias_matches(package: &str, local_alias: &str) -> bool {
    let last = package.rsplit('/').next().unwrap_or(package);
    last.eq_ignore_ascii_case(local_alias)
}

fn matched_dependency(package: &str, dependencies: &[Dependency]) -> String {
    dependencies
        .iter()
        .find(|d| d.name == package)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| package.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vulnscan_core::model::Ecosystem;

    #[test]
    fn builds_edges_between_project_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.js"), "const { helper } = require('./b');\nfunction main() { helper(); }\n").unwrap();
        fs::write(tmp.path().join("b.js"), "function helper() {}\nmodule.exports = { helper };\n").unwrap();

        let result = build_call_graph(tmp.path(), &[]);
        assert!(result.graph.node_count() > 0);
        assert!(!result.graph.outgoing("a.js:main").is_empty());
    }

    #[test]
    fn file_node_has_an_edge_into_each_of_its_own_symbols() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("server.js"),
            "function handler(req, res) {\n  doWork();\n}\n",
        )
        .unwrap();

        let result = build_call_graph(tmp.path(), &[]);
        let out = result.graph.outgoing("server.js");
        assert!(out.iter().any(|e| e.to == "server.js:handler"));
    }

    #[test]
    fn external_import_creates_both_qualified_and_unqualified_edges() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("app.js"),
            "const lodash = require('lodash');\nfunction run() { lodash.merge(a, b); }\n",
        )
        .unwrap();

        let dep = Dependency {
            name: "lodash".to_string(),
            version: Some("4.17.0".to_string()),
            ecosystem: Ecosystem::Npm,
            manifest_ref: "package.json".into(),
            transitive: false,
        };
        let result = build_call_graph(tmp.path(), &[dep]);
        let out = result.graph.outgoing("app.js:run");
        assert!(out.iter().any(|e| e.to == "lodash.merge"));
        assert!(out.iter().any(|e| e.to == "lodash:merge"));
    }
}
