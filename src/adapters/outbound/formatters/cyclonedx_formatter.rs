use crate::inventory::domain::{Component as InventoryComponent, DependencyScope, ScanResult};
use crate::inventory::domain::{Finding, OrganizationSummary};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use anyhow::bail;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct Bom {
    #[serde(rename = "bomFormat")]
    bom_format: String,
    #[serde(rename = "specVersion")]
    spec_version: String,
    version: u32,
    #[serde(rename = "serialNumber")]
    serial_number: String,
    metadata: Metadata,
    components: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vulnerabilities: Option<Vec<Vulnerability>>,
}

#[derive(Debug, Serialize)]
struct Metadata {
    timestamp: String,
    tools: Vec<Tool>,
    component: SubjectComponent,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    version: String,
}

/// The repository being described, recorded as the BOM subject.
#[derive(Debug, Serialize)]
struct SubjectComponent {
    #[serde(rename = "type")]
    component_type: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct Component {
    #[serde(rename = "type")]
    component_type: String,
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    licenses: Option<Vec<License>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
}

#[derive(Debug, Serialize)]
struct License {
    license: LicenseContent,
}

#[derive(Debug, Serialize)]
struct LicenseContent {
    name: String,
}

#[derive(Debug, Serialize)]
struct Vulnerability {
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    ratings: Vec<Rating>,
    affects: Vec<Affect>,
}

#[derive(Debug, Serialize)]
struct Rating {
    severity: String,
}

#[derive(Debug, Serialize)]
struct Affect {
    #[serde(rename = "ref")]
    bom_ref: String,
}

/// CycloneDxFormatter adapter for generating CycloneDX 1.6 JSON documents
///
/// This adapter implements the ReportFormatter port for CycloneDX format.
/// A CycloneDX BOM describes a single repository, so organization summaries
/// are not supported.
pub struct CycloneDxFormatter;

impl CycloneDxFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CycloneDxFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for CycloneDxFormatter {
    fn format_repository(&self, result: &ScanResult) -> Result<String> {
        let bom = Bom {
            bom_format: "CycloneDX".to_string(),
            spec_version: "1.6".to_string(),
            version: 1,
            serial_number: format!("urn:uuid:{}", Uuid::new_v4()),
            metadata: self.build_metadata(result),
            components: self.build_components(&result.components),
            vulnerabilities: result
                .vulnerabilities
                .as_ref()
                .map(|findings| self.build_vulnerabilities(findings)),
        };

        serde_json::to_string_pretty(&bom).map_err(Into::into)
    }

    fn format_organization(&self, _summary: &OrganizationSummary) -> Result<String> {
        bail!("CycloneDX documents describe a single repository; use markdown, text or html for organization reports")
    }

    fn supports_organization(&self) -> bool {
        false
    }
}

impl CycloneDxFormatter {
    /// Build BOM metadata from the scan result
    fn build_metadata(&self, result: &ScanResult) -> Metadata {
        Metadata {
            timestamp: result.metadata.timestamp().to_rfc3339(),
            tools: vec![Tool {
                name: result.metadata.tool_name().to_string(),
                version: result.metadata.tool_version().to_string(),
            }],
            component: SubjectComponent {
                component_type: "application".to_string(),
                name: result.metadata.repository().to_string(),
            },
        }
    }

    /// Build BOM components from the inventory
    fn build_components(&self, components: &[InventoryComponent]) -> Vec<Component> {
        components
            .iter()
            .map(|c| Component {
                component_type: c.component_type().as_str().to_string(),
                name: c.name().to_string(),
                version: c.version().to_string(),
                group: c.group().map(str::to_string),
                scope: scope_label(c.scope()).to_string(),
                licenses: c.license().map(|name| {
                    vec![License {
                        license: LicenseContent {
                            name: name.to_string(),
                        },
                    }]
                }),
                purl: c.package_url().map(str::to_string),
            })
            .collect()
    }

    /// Build BOM vulnerabilities from audit findings
    fn build_vulnerabilities(&self, findings: &[Finding]) -> Vec<Vulnerability> {
        findings
            .iter()
            .map(|finding| Vulnerability {
                bom_ref: finding.id.clone(),
                id: finding.id.clone(),
                description: finding.description.clone(),
                ratings: vec![Rating {
                    severity: finding.severity.as_str().to_string(),
                }],
                affects: vec![Affect {
                    bom_ref: finding.component.clone(),
                }],
            })
            .collect()
    }
}

fn scope_label(scope: DependencyScope) -> &'static str {
    match scope {
        DependencyScope::Dev => "optional",
        DependencyScope::Direct | DependencyScope::Transitive => "required",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::domain::{ScanMetadata, Severity};

    fn sample_result() -> ScanResult {
        let components = vec![
            InventoryComponent::new("requests", "2.28.1", DependencyScope::Direct)
                .unwrap()
                .with_license("Apache-2.0")
                .with_purl("pypi"),
            InventoryComponent::new("pytest", "7.4.0", DependencyScope::Dev)
                .unwrap()
                .with_purl("pypi"),
        ];
        let metadata = ScanMetadata::new("demo-repo".to_string(), vec!["python".to_string()]);
        ScanResult::new(metadata, components, None)
    }

    #[test]
    fn test_repository_document_shape() {
        let formatter = CycloneDxFormatter::new();
        let output = formatter.format_repository(&sample_result()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["bomFormat"], "CycloneDX");
        assert_eq!(parsed["specVersion"], "1.6");
        assert_eq!(parsed["version"], 1);
        assert!(parsed["serialNumber"]
            .as_str()
            .unwrap()
            .starts_with("urn:uuid:"));
        assert_eq!(parsed["metadata"]["component"]["name"], "demo-repo");
        assert_eq!(parsed["components"][0]["name"], "requests");
        assert_eq!(parsed["components"][0]["purl"], "pkg:pypi/requests@2.28.1");
        assert_eq!(parsed["components"][0]["scope"], "required");
        assert_eq!(parsed["components"][1]["scope"], "optional");
        assert!(parsed.get("vulnerabilities").is_none());
    }

    #[test]
    fn test_license_is_nested_object() {
        let formatter = CycloneDxFormatter::new();
        let output = formatter.format_repository(&sample_result()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            parsed["components"][0]["licenses"][0]["license"]["name"],
            "Apache-2.0"
        );
        assert!(parsed["components"][1].get("licenses").is_none());
    }

    #[test]
    fn test_findings_become_vulnerabilities() {
        let mut result = sample_result();
        result.vulnerabilities = Some(vec![Finding {
            component: "requests@2.28.1".to_string(),
            id: "GHSA-j8r2-6x86-q33q".to_string(),
            severity: Severity::Medium,
            description: Some("Proxy-Authorization leak".to_string()),
        }]);

        let formatter = CycloneDxFormatter::new();
        let output = formatter.format_repository(&result).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let vuln = &parsed["vulnerabilities"][0];
        assert_eq!(vuln["id"], "GHSA-j8r2-6x86-q33q");
        assert_eq!(vuln["ratings"][0]["severity"], "medium");
        assert_eq!(vuln["affects"][0]["ref"], "requests@2.28.1");
    }

    #[test]
    fn test_organization_summaries_are_rejected() {
        let formatter = CycloneDxFormatter::new();
        let summary = OrganizationSummary::from_outcomes("acme".to_string(), Vec::new());

        assert!(!formatter.supports_organization());
        assert!(formatter.format_organization(&summary).is_err());
    }
}
