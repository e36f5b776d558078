use std::collections::HashMap;

use serde::Deserialize;
use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest};

use crate::DependencyExtractor;

pub struct MavenExtractor;

#[derive(Debug, Deserialize)]
struct Pom {
    #[serde(default)]
    properties: Option<HashMap<String, String>>,
    #[serde(default)]
    dependencies: Option<Dependencies>,
    #[serde(rename = "dependencyManagement", default)]
    dependency_management: Option<DependencyManagement>,
}

#[derive(Debug, Deserialize)]
struct Dependencies {
    #[serde(rename = "dependency", default)]
    dependency: Vec<PomDependency>,
}

#[derive(Debug, Deserialize)]
struct DependencyManagement {
    #[serde(default)]
    dependencies: Option<Dependencies>,
}

#[derive(Debug, Deserialize)]
struct PomDependency {
    #[serde(rename = "groupId")]
    group_id: String,
    #[serde(rename = "artifactId")]
    artifact_id: String,
    #[serde(default)]
    version: Option<String>,
}

impl DependencyExtractor for MavenExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        let content =
            std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
                path: manifest.absolute_path.clone(),
                reason: e.to_string(),
            })?;

        let pom: Pom = serde_xml_rs::from_str(&content).map_err(|e| ScanError::ManifestParsing {
            path: manifest.absolute_path.clone(),
            reason: e.to_string(),
        })?;

        let properties = pom.properties.unwrap_or_default();

        let mut dep_management: HashMap<String, String> = HashMap::new();
        if let Some(dm) = pom.dependency_management {
            if let Some(deps) = dm.dependencies {
                for dep in deps.dependency {
                    if let Some(version) = dep.version {
                        let key = format!("{}:{}", dep.group_id, dep.artifact_id);
                        dep_management.insert(key, resolve_property(&version, &properties));
                    }
                }
            }
        }

        let mut deps = Vec::new();
        for dep in pom.dependencies.unwrap_or(Dependencies { dependency: Vec::new() }).dependency {
            let version = match dep.version {
                Some(v) => Some(resolve_property(&v, &properties)),
                None => {
                    let key = format!("{}:{}", dep.group_id, dep.artifact_id);
                    dep_management.get(&key).cloned()
                }
            };
            deps.push(Dependency {
                name: format!("{}:{}", dep.group_id, dep.artifact_id),
                version,
                ecosystem: Ecosystem::Maven,
                manifest_ref: manifest.absolute_path.clone(),
                transitive: false,
            });
        }

        Ok(deps)
    }
}

/// Resolves `${property}` placeholders one level deep; unresolvable
/// placeholders are left in place rather than dropped, so the dependency
/// still surfaces (with an unmatchable version) instead of disappearing.
fn resolve_property(value: &str, properties: &HashMap<String, String>) -> String {
    let mut result = value.to_string();
    while let Some(start) = result.find("${") {
        let Some(end_rel) = result[start..].find('}') else {
            break;
        };
        let end = start + end_rel;
        let property_name = &result[start + 2..end];
        let resolved = properties
            .get(property_name)
            .cloned()
            .unwrap_or_else(|| result[start..=end].to_string());
        let had_placeholder = resolved.contains("${");
        result.replace_range(start..=end, &resolved);
        if had_placeholder {
            break;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::model::ManifestKind;

    fn manifest(contents: &str) -> (tempfile::TempDir, Manifest) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pom.xml");
        std::fs::write(&path, contents).unwrap();
        let m = Manifest {
            directory: tmp.path().to_path_buf(),
            filename: "pom.xml".to_string(),
            absolute_path: path,
            ecosystem: Ecosystem::Maven,
            kind: ManifestKind::Primary,
        };
        (tmp, m)
    }

    #[test]
    fn parses_direct_dependencies() {
        let (_tmp, m) = manifest(
            r#"<project>
    <dependencies>
        <dependency>
            <groupId>org.springframework</groupId>
            <artifactId>spring-core</artifactId>
            <version>5.3.20</version>
        </dependency>
    </dependencies>
</project>"#,
        );
        let deps = MavenExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "org.springframework:spring-core");
        assert_eq!(deps[0].version.as_deref(), Some("5.3.20"));
    }

    #[test]
    fn resolves_property_and_dependency_management_versions() {
        let (_tmp, m) = manifest(
            r#"<project>
    <properties>
        <spring.version>5.3.20</spring.version>
    </properties>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>com.example</groupId>
                <artifactId>bom-managed</artifactId>
                <version>2.0.0</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
    <dependencies>
        <dependency>
            <groupId>org.springframework</groupId>
            <artifactId>spring-core</artifactId>
            <version>${spring.version}</version>
        </dependency>
        <dependency>
            <groupId>com.example</groupId>
            <artifactId>bom-managed</artifactId>
        </dependency>
    </dependencies>
</project>"#,
        );
        let deps = MavenExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "org.springframework:spring-core" && d.version.as_deref() == Some("5.3.20")));
        assert!(deps.iter().any(|d| d.name == "com.example:bom-managed" && d.version.as_deref() == Some("2.0.0")));
    }
}
