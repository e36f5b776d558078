//! The interface a per-language front-end implements: parse a source file,
//! iterate its symbols, iterate its call sites. Concrete front-ends live in
//! `frontends/`; a file extension with no registered front-end degrades to
//! dependency-only reporting.

use std::path::Path;

/// Where an imported symbol comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOrigin {
    /// Another file in the project, referenced by a path relative to the
    /// importing file (e.g. `./util`, `..models`) — resolved against the
    /// project's file set by the builder, not the front-end.
    Project(String),
    /// An external package (a dependency name, not yet tied to a specific
    /// resolved version).
    External(String),
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub symbol: String,
    pub origin: ImportOrigin,
}

/// A function/method definition in a parsed file.
#[derive(Debug, Clone)]
pub struct SymbolDef {
    pub name: String,
    pub is_exported: bool,
    pub is_test: bool,
}

/// A call site inside some function body.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// The enclosing function's name, if the call site is inside one
    /// (`None` for top-level/module-scope calls).
    pub caller_symbol: Option<String>,
    /// Bare callee name, used as the unqualified fallback resolution
    /// target when no receiver/import pins the call to a specific file.
    pub callee: String,
    /// Receiver expression text when the call has the form `obj.method()`,
    /// used to build the qualified `"package.method"` target.
    pub receiver: Option<String>,
    pub is_dynamic: bool,
    pub is_conditional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub symbols: Vec<SymbolDef>,
    pub calls: Vec<CallSite>,
    pub imports: Vec<ImportDecl>,
    /// Raw source, retained for entry-point pattern matching so that
    /// signal detection doesn't need to re-read the file.
    pub source: String,
}

pub trait LanguageFrontend: Send + Sync {
    fn language(&self) -> &'static str;
    fn file_extensions(&self) -> &'static [&'static str];
    fn parse_file(&self, path: &Path, content: &str) -> ParsedFile;
}

pub fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}
