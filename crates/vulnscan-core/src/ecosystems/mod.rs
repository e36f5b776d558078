mod patterns;

pub use patterns::{registry, ManifestPattern};
