use crate::inventory::domain::{Component, OrganizationSummary, ScanResult};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use anyhow::bail;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct Document {
    #[serde(rename = "spdxVersion")]
    spdx_version: String,
    #[serde(rename = "dataLicense")]
    data_license: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(rename = "documentNamespace")]
    document_namespace: String,
    #[serde(rename = "creationInfo")]
    creation_info: CreationInfo,
    packages: Vec<Package>,
    relationships: Vec<Relationship>,
}

#[derive(Debug, Serialize)]
struct CreationInfo {
    created: String,
    creators: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Package {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(rename = "versionInfo")]
    version_info: String,
    #[serde(rename = "downloadLocation")]
    download_location: String,
    #[serde(rename = "filesAnalyzed")]
    files_analyzed: bool,
    #[serde(rename = "licenseConcluded")]
    license_concluded: String,
    #[serde(rename = "copyrightText")]
    copyright_text: String,
    #[serde(rename = "externalRefs", skip_serializing_if = "Vec::is_empty")]
    external_refs: Vec<ExternalRef>,
}

#[derive(Debug, Serialize)]
struct ExternalRef {
    #[serde(rename = "referenceCategory")]
    reference_category: String,
    #[serde(rename = "referenceType")]
    reference_type: String,
    #[serde(rename = "referenceLocator")]
    reference_locator: String,
}

#[derive(Debug, Serialize)]
struct Relationship {
    #[serde(rename = "spdxElementId")]
    spdx_element_id: String,
    #[serde(rename = "relationshipType")]
    relationship_type: String,
    #[serde(rename = "relatedSpdxElement")]
    related_spdx_element: String,
}

/// SpdxFormatter adapter for generating SPDX 2.3 JSON documents
///
/// This adapter implements the ReportFormatter port for SPDX format.
/// Like CycloneDX, an SPDX document describes a single repository.
/// Audit findings have no place in the SPDX model and are omitted.
pub struct SpdxFormatter;

impl SpdxFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpdxFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for SpdxFormatter {
    fn format_repository(&self, result: &ScanResult) -> Result<String> {
        let name = result.metadata.repository().to_string();
        let packages = self.build_packages(&result.components);
        let relationships = packages
            .iter()
            .map(|package| Relationship {
                spdx_element_id: "SPDXRef-DOCUMENT".to_string(),
                relationship_type: "DESCRIBES".to_string(),
                related_spdx_element: package.spdx_id.clone(),
            })
            .collect();

        let document = Document {
            spdx_version: "SPDX-2.3".to_string(),
            data_license: "CC0-1.0".to_string(),
            spdx_id: "SPDXRef-DOCUMENT".to_string(),
            document_namespace: format!(
                "https://spdx.org/spdxdocs/{}-{}",
                sanitize_id_fragment(&name),
                Uuid::new_v4()
            ),
            name,
            creation_info: CreationInfo {
                // SPDX requires second precision and a literal Z suffix.
                created: result
                    .metadata
                    .timestamp()
                    .format("%Y-%m-%dT%H:%M:%SZ")
                    .to_string(),
                creators: vec![format!(
                    "Tool: {}-{}",
                    result.metadata.tool_name(),
                    result.metadata.tool_version()
                )],
            },
            packages,
            relationships,
        };

        serde_json::to_string_pretty(&document).map_err(Into::into)
    }

    fn format_organization(&self, _summary: &OrganizationSummary) -> Result<String> {
        bail!("SPDX documents describe a single repository; use markdown, text or html for organization reports")
    }

    fn supports_organization(&self) -> bool {
        false
    }
}

impl SpdxFormatter {
    /// Build SPDX packages from the inventory
    fn build_packages(&self, components: &[Component]) -> Vec<Package> {
        components
            .iter()
            .enumerate()
            .map(|(index, component)| Package {
                spdx_id: format!(
                    "SPDXRef-Package-{}-{}",
                    index,
                    sanitize_id_fragment(component.name())
                ),
                name: component.name().to_string(),
                version_info: component.version().to_string(),
                download_location: "NOASSERTION".to_string(),
                files_analyzed: false,
                license_concluded: component
                    .license()
                    .unwrap_or("NOASSERTION")
                    .to_string(),
                copyright_text: "NOASSERTION".to_string(),
                external_refs: component
                    .package_url()
                    .map(|purl| {
                        vec![ExternalRef {
                            reference_category: "PACKAGE-MANAGER".to_string(),
                            reference_type: "purl".to_string(),
                            reference_locator: purl.to_string(),
                        }]
                    })
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// SPDX identifiers only allow letters, digits, `.` and `-`.
fn sanitize_id_fragment(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::domain::{DependencyScope, ScanMetadata};

    fn sample_result() -> ScanResult {
        let components = vec![
            Component::new("golang.org/x/text", "v0.14.0", DependencyScope::Direct)
                .unwrap()
                .with_purl("golang"),
            Component::new("flask", "2.3.0", DependencyScope::Direct)
                .unwrap()
                .with_license("BSD-3-Clause")
                .with_purl("pypi"),
        ];
        let metadata = ScanMetadata::new(
            "demo-repo".to_string(),
            vec!["go".to_string(), "python".to_string()],
        );
        ScanResult::new(metadata, components, None)
    }

    #[test]
    fn test_document_shell() {
        let formatter = SpdxFormatter::new();
        let output = formatter.format_repository(&sample_result()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["spdxVersion"], "SPDX-2.3");
        assert_eq!(parsed["dataLicense"], "CC0-1.0");
        assert_eq!(parsed["SPDXID"], "SPDXRef-DOCUMENT");
        assert_eq!(parsed["name"], "demo-repo");
        assert!(parsed["documentNamespace"]
            .as_str()
            .unwrap()
            .starts_with("https://spdx.org/spdxdocs/demo-repo-"));
        assert!(parsed["creationInfo"]["created"]
            .as_str()
            .unwrap()
            .ends_with('Z'));
    }

    #[test]
    fn test_package_identifiers_are_sanitized() {
        let formatter = SpdxFormatter::new();
        let output = formatter.format_repository(&sample_result()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let packages = parsed["packages"].as_array().unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0]["SPDXID"], "SPDXRef-Package-0-golang.org-x-text");
        assert_eq!(packages[0]["licenseConcluded"], "NOASSERTION");
        assert_eq!(packages[1]["licenseConcluded"], "BSD-3-Clause");
        assert_eq!(
            packages[1]["externalRefs"][0]["referenceLocator"],
            "pkg:pypi/flask@2.3.0"
        );
    }

    #[test]
    fn test_document_describes_every_package() {
        let formatter = SpdxFormatter::new();
        let output = formatter.format_repository(&sample_result()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let relationships = parsed["relationships"].as_array().unwrap();
        assert_eq!(relationships.len(), 2);
        for relationship in relationships {
            assert_eq!(relationship["spdxElementId"], "SPDXRef-DOCUMENT");
            assert_eq!(relationship["relationshipType"], "DESCRIBES");
        }
    }

    #[test]
    fn test_organization_summaries_are_rejected() {
        let formatter = SpdxFormatter::new();
        let summary = OrganizationSummary::from_outcomes("acme".to_string(), Vec::new());

        assert!(!formatter.supports_organization());
        assert!(formatter.format_organization(&summary).is_err());
    }
}
