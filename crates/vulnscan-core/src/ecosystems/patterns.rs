//! Static manifest-pattern registry: for each ecosystem, a filename test and
//! a cheap content probe. Both must pass for a file to be classified as a
//! manifest — filename alone is insufficient.

use crate::model::{Ecosystem, ManifestKind};

pub struct ManifestPattern {
    pub ecosystem: Ecosystem,
    pub kind: ManifestKind,
    pub filename_matches: fn(&str) -> bool,
    pub probe: fn(&[u8]) -> bool,
    pub description: &'static str,
}

fn is_json(bytes: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(bytes).is_ok()
}

fn json_has_key(bytes: &[u8], key: &str) -> bool {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(serde_json::Value::Object(map)) => map.contains_key(key),
        _ => false,
    }
}

fn toml_has_table(bytes: &[u8], table: &str) -> bool {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return false;
    };
    match text.parse::<toml::Value>() {
        Ok(toml::Value::Table(t)) => {
            if table.contains('.') {
                let mut cur = &toml::Value::Table(t);
                for part in table.split('.') {
                    match cur.get(part) {
                        Some(v) => cur = v,
                        None => return false,
                    }
                }
                true
            } else {
                t.contains_key(table)
            }
        }
        _ => false,
    }
}

fn nonempty_text(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}

fn looks_like_xml_project(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes)
        .map(|s| s.contains("<project") || s.contains("<Project"))
        .unwrap_or(false)
}

fn starts_with_module(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes)
        .map(|s| s.trim_start().starts_with("module "))
        .unwrap_or(false)
}

fn go_sum_shape(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes)
        .map(|s| {
            s.lines()
                .filter(|l| !l.trim().is_empty())
                .all(|l| l.split_whitespace().count() >= 2)
        })
        .unwrap_or(false)
}

fn yaml_like(bytes: &[u8]) -> bool {
    serde_yaml::from_slice::<serde_yaml::Value>(bytes).is_ok()
}

fn eq_ignore_ext(name: &str, expected: &str) -> bool {
    name.eq_ignore_ascii_case(expected)
}

fn suffix(name: &str, ext: &str) -> bool {
    name.to_ascii_lowercase().ends_with(ext)
}

macro_rules! fname {
    ($expected:literal) => {{
        fn f(name: &str) -> bool {
            eq_ignore_ext(name, $expected)
        }
        f as fn(&str) -> bool
    }};
}

macro_rules! fsuffix {
    ($ext:literal) => {{
        fn f(name: &str) -> bool {
            suffix(name, $ext)
        }
        f as fn(&str) -> bool
    }};
}

/// Registry covering every supported ecosystem's manifest/lockfile
/// patterns. Ecosystems without a concrete dependency extractor
/// (`vulnscan-extract`) still appear here, so discovery finds them even
/// though extraction degrades to a best-effort fallback for those — see
/// DESIGN.md.
pub fn registry() -> Vec<ManifestPattern> {
    vec![
        ManifestPattern {
            ecosystem: Ecosystem::Npm,
            kind: ManifestKind::Primary,
            filename_matches: fname!("package.json"),
            probe: |b| json_has_key(b, "name") || json_has_key(b, "dependencies"),
            description: "npm package manifest",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Npm,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("package-lock.json"),
            probe: |b| json_has_key(b, "lockfileVersion") || json_has_key(b, "packages"),
            description: "npm lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::PyPI,
            kind: ManifestKind::Primary,
            filename_matches: fname!("pyproject.toml"),
            probe: |b| toml_has_table(b, "project") || toml_has_table(b, "tool.poetry"),
            description: "Python project manifest",
        },
        ManifestPattern {
            ecosystem: Ecosystem::PyPI,
            kind: ManifestKind::Primary,
            filename_matches: fname!("requirements.txt"),
            probe: nonempty_text,
            description: "pip requirements file",
        },
        ManifestPattern {
            ecosystem: Ecosystem::PyPI,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("poetry.lock"),
            probe: |b| toml_has_table(b, "package") || nonempty_text(b),
            description: "poetry lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Maven,
            kind: ManifestKind::Primary,
            filename_matches: fname!("pom.xml"),
            probe: looks_like_xml_project,
            description: "Maven project object model",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Go,
            kind: ManifestKind::Primary,
            filename_matches: fname!("go.mod"),
            probe: starts_with_module,
            description: "Go module manifest",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Go,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("go.sum"),
            probe: go_sum_shape,
            description: "Go checksum lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Cargo,
            kind: ManifestKind::Primary,
            filename_matches: fname!("Cargo.toml"),
            probe: |b| toml_has_table(b, "package") || toml_has_table(b, "workspace"),
            description: "Cargo manifest",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Cargo,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("Cargo.lock"),
            probe: |b| toml_has_table(b, "package") || nonempty_text(b),
            description: "Cargo lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::RubyGems,
            kind: ManifestKind::Primary,
            filename_matches: fname!("Gemfile"),
            probe: nonempty_text,
            description: "Bundler Gemfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::RubyGems,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("Gemfile.lock"),
            probe: |b| {
                std::str::from_utf8(b)
                    .map(|s| s.contains("GEM") || s.contains("specs:"))
                    .unwrap_or(false)
            },
            description: "Bundler lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Packagist,
            kind: ManifestKind::Primary,
            filename_matches: fname!("composer.json"),
            probe: |b| json_has_key(b, "require") || json_has_key(b, "name"),
            description: "Composer manifest",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Packagist,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("composer.lock"),
            probe: |b| json_has_key(b, "packages"),
            description: "Composer lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::NuGet,
            kind: ManifestKind::Primary,
            filename_matches: fsuffix!(".csproj"),
            probe: looks_like_xml_project,
            description: ".NET project file",
        },
        ManifestPattern {
            ecosystem: Ecosystem::NuGet,
            kind: ManifestKind::Central,
            filename_matches: fname!("packages.lock.json"),
            probe: is_json,
            description: "NuGet central package lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Pub,
            kind: ManifestKind::Primary,
            filename_matches: fname!("pubspec.yaml"),
            probe: yaml_like,
            description: "Dart/Flutter pubspec",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Pub,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("pubspec.lock"),
            probe: yaml_like,
            description: "pub lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Swift,
            kind: ManifestKind::Primary,
            filename_matches: fname!("Package.swift"),
            probe: |b| {
                std::str::from_utf8(b)
                    .map(|s| s.contains("import PackageDescription"))
                    .unwrap_or(false)
            },
            description: "Swift package manifest",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Swift,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("Package.resolved"),
            probe: is_json,
            description: "Swift resolved package graph",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Hex,
            kind: ManifestKind::Primary,
            filename_matches: fname!("mix.exs"),
            probe: |b| {
                std::str::from_utf8(b)
                    .map(|s| s.contains("defmodule") && s.contains("def project"))
                    .unwrap_or(false)
            },
            description: "Mix (Elixir) project file",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Hex,
            kind: ManifestKind::Lockfile,
            filename_matches: fname!("mix.lock"),
            probe: nonempty_text,
            description: "Mix lockfile",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Hackage,
            kind: ManifestKind::Primary,
            filename_matches: fsuffix!(".cabal"),
            probe: nonempty_text,
            description: "Cabal package description",
        },
        ManifestPattern {
            ecosystem: Ecosystem::Hackage,
            kind: ManifestKind::Central,
            filename_matches: fname!("stack.yaml"),
            probe: yaml_like,
            description: "Stack project resolver",
        },
    ]
}
