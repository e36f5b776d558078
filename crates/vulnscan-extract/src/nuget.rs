use serde::Deserialize;
use vulnscan_core::errors::{Result, ScanError};
use vulnscan_core::model::{Dependency, Ecosystem, Manifest};

use crate::DependencyExtractor;

pub struct NuGetExtractor;

#[derive(Debug, Deserialize)]
struct Project {
    #[serde(rename = "ItemGroup", default)]
    item_groups: Vec<ItemGroup>,
}

#[derive(Debug, Deserialize, Default)]
struct ItemGroup {
    #[serde(rename = "PackageReference", default)]
    package_references: Vec<PackageReference>,
}

#[derive(Debug, Deserialize)]
struct PackageReference {
    #[serde(rename = "Include", default)]
    include: Option<String>,
    #[serde(rename = "Version", default)]
    version: Option<String>,
}

impl DependencyExtractor for NuGetExtractor {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NuGet
    }

    fn extract(&self, manifest: &Manifest) -> Result<Vec<Dependency>> {
        let content =
            std::fs::read_to_string(&manifest.absolute_path).map_err(|e| ScanError::ManifestParsing {
                path: manifest.absolute_path.clone(),
                reason: e.to_string(),
            })?;

        let project: Project = serde_xml_rs::from_str(&content).map_err(|e| ScanError::ManifestParsing {
            path: manifest.absolute_path.clone(),
            reason: e.to_string(),
        })?;

        let mut deps = Vec::new();
        for group in project.item_groups {
            for reference in group.package_references {
                let Some(name) = reference.include else {
                    continue;
                };
                deps.push(Dependency {
                    name,
                    version: reference.version,
                    ecosystem: Ecosystem::NuGet,
                    manifest_ref: manifest.absolute_path.clone(),
                    transitive: false,
                });
            }
        }
        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::model::ManifestKind;

    #[test]
    fn parses_package_references() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.csproj");
        std::fs::write(
            &path,
            r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="13.0.3" />
    <PackageReference Include="Serilog" Version="3.1.1" />
  </ItemGroup>
</Project>"#,
        )
        .unwrap();
        let m = Manifest {
            directory: tmp.path().to_path_buf(),
            filename: "app.csproj".to_string(),
            absolute_path: path,
            ecosystem: Ecosystem::NuGet,
            kind: ManifestKind::Primary,
        };

        let deps = NuGetExtractor.extract(&m).unwrap();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "Newtonsoft.Json" && d.version.as_deref() == Some("13.0.3")));
    }
}
