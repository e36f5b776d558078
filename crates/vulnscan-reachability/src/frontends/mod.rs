mod js;
mod python;
mod rust_lang;

use crate::frontend::LanguageFrontend;

/// The front-ends with a registered implementation. Go, Java, Ruby, and PHP
/// are recognized by the ecosystem/manifest registry in `vulnscan-core` so
/// their dependencies still flow through extraction and vulnerability
/// resolution, but they have no entry here, so call-graph construction
/// degrades to dependency-only reporting for those languages — a scope
/// decision recorded in DESIGN.md rather than guessed silently.
pub fn frontends() -> Vec<Box<dyn LanguageFrontend>> {
    vec![
        Box::new(js::JsFrontend),
        Box::new(python::PythonFrontend),
        Box::new(rust_lang::RustFrontend),
    ]
}
