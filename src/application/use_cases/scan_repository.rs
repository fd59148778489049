//! Use case for scanning a single repository working copy.

use std::path::Path;
use std::sync::Arc;

use crate::application::dto::{RepositoryScanRequest, ScanSettings};
use crate::application::use_cases::AuditComponentsUseCase;
use crate::inventory::domain::{Component, Finding, ScanMetadata, ScanResult};
use crate::inventory::services::ComponentMerger;
use crate::ports::outbound::{ScanObserver, VulnerabilitySource};
use crate::scanners::{ScanContext, ScannerRegistry};
use crate::shared::{Result, ScanError};

/// ScanRepositoryUseCase - orchestrates one repository scan
///
/// Detection runs across every registered ecosystem scanner and all
/// matches are scanned; a polyglot repository contributes components
/// from each of its ecosystems. A scanner failure downgrades to a
/// warning so the remaining ecosystems still produce output. The only
/// fatal condition is a repository path that does not exist.
///
/// # Type Parameters
/// * `V` - VulnerabilitySource implementation used when auditing
pub struct ScanRepositoryUseCase<V>
where
    V: VulnerabilitySource + Clone,
{
    registry: Arc<ScannerRegistry>,
    vulnerability_source: Option<V>,
    observer: Arc<dyn ScanObserver>,
    settings: ScanSettings,
}

impl<V> ScanRepositoryUseCase<V>
where
    V: VulnerabilitySource + Clone,
{
    /// Creates a new use case instance with injected dependencies
    pub fn new(
        registry: Arc<ScannerRegistry>,
        vulnerability_source: Option<V>,
        observer: Arc<dyn ScanObserver>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            registry,
            vulnerability_source,
            observer,
            settings,
        }
    }

    /// Executes the repository scan
    ///
    /// # Arguments
    /// * `request` - Scan request carrying the path and per-scan options
    ///
    /// # Returns
    /// ScanResult with the deduplicated inventory, derived statistics
    /// and optional audit findings
    ///
    /// # Errors
    /// Returns `ScanError::PathNotFound` when the repository path does
    /// not exist or is not a directory. Everything else degrades to
    /// warnings and a possibly partial result.
    pub async fn execute(&self, request: RepositoryScanRequest) -> Result<ScanResult> {
        let path = request.repository_path.as_path();

        // Step 1: Validate the repository path
        self.validate_path(path)?;
        let label = self.repository_label(&request);
        self.observer
            .info(&format!("🔍 Scanning repository: {}", label));

        // Step 2: Detect applicable ecosystems
        let scanners = self.registry.applicable_scanners(path);
        let technologies: Vec<String> = scanners
            .iter()
            .map(|scanner| scanner.id().to_string())
            .collect();
        if scanners.is_empty() {
            self.observer.warn(&format!(
                "No supported package manifests found in {}",
                path.display()
            ));
        } else {
            self.observer.info(&format!(
                "✅ Detected technologies: {}",
                technologies.join(", ")
            ));
        }

        // Step 3: Extract components from every matching ecosystem
        let context = ScanContext::new(
            request.include_dev,
            self.settings.tool_timeout,
            self.settings.max_depth,
            &self.settings.ignore_patterns,
            Arc::clone(&self.observer),
        );
        let mut components = Vec::new();
        for scanner in &scanners {
            self.observer
                .info(&format!("📦 Extracting {} dependencies...", scanner.id()));
            match scanner.scan(&context, path).await {
                Ok(mut found) => {
                    self.observer
                        .info(&format!("✅ {}: {} component(s)", scanner.id(), found.len()));
                    components.append(&mut found);
                }
                Err(error) => {
                    self.observer
                        .warn(&format!("{} extraction failed: {}", scanner.id(), error));
                }
            }
        }

        // Step 4: Deduplicate the combined inventory
        let components = ComponentMerger::merge(components);
        self.observer.info(&format!(
            "📊 Inventory: {} unique component(s)",
            components.len()
        ));

        // Step 5: Audit against vulnerability data when requested
        let vulnerabilities = self.audit_if_requested(&request, &components).await;

        // Step 6: Assemble the scan result
        let metadata = ScanMetadata::new(label, technologies);
        Ok(ScanResult::new(metadata, components, vulnerabilities))
    }

    /// Ensures the requested path is an existing directory.
    fn validate_path(&self, path: &Path) -> Result<()> {
        let metadata = std::fs::metadata(path).map_err(|error| ScanError::PathNotFound {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        if !metadata.is_dir() {
            return Err(ScanError::PathNotFound {
                path: path.to_path_buf(),
                reason: "Path exists but is not a directory".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Resolves the display identity for the scanned repository.
    ///
    /// Falls back to the directory name when the request carries no
    /// explicit name.
    fn repository_label(&self, request: &RepositoryScanRequest) -> String {
        if let Some(name) = &request.repository_name {
            return name.clone();
        }
        request
            .repository_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| request.repository_path.display().to_string())
    }

    /// Runs the vulnerability audit when the request asks for one.
    ///
    /// Returns `Some(vec![])` when the audit ran and found nothing, so
    /// reports can distinguish "clean" from "not audited".
    async fn audit_if_requested(
        &self,
        request: &RepositoryScanRequest,
        components: &[Component],
    ) -> Option<Vec<Finding>> {
        if !request.audit {
            return None;
        }
        let Some(source) = &self.vulnerability_source else {
            // No vulnerability source configured - skip the audit
            return None;
        };

        self.observer
            .info("🔐 Checking components for known vulnerabilities...");
        let audit = AuditComponentsUseCase::new(source.clone(), Arc::clone(&self.observer));
        let findings = audit.execute(components).await;

        if findings.is_empty() {
            self.observer
                .completion("✅ Vulnerability check complete: No known vulnerabilities found");
        } else {
            self.observer.completion(&format!(
                "✅ Vulnerability check complete: {} finding(s)",
                findings.len()
            ));
        }
        Some(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::VulnerabilityRecord;
    use crate::scanners::NullObserver;
    use async_trait::async_trait;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Clone)]
    struct FixedSource {
        records: Vec<VulnerabilityRecord>,
    }

    #[async_trait]
    impl VulnerabilitySource for FixedSource {
        async fn query(&self, _package_url: &str) -> Result<Vec<VulnerabilityRecord>> {
            Ok(self.records.clone())
        }
    }

    fn settings() -> ScanSettings {
        ScanSettings::new(Duration::from_secs(30), 5, Vec::new())
    }

    fn use_case(source: Option<FixedSource>) -> ScanRepositoryUseCase<FixedSource> {
        ScanRepositoryUseCase::new(
            Arc::new(ScannerRegistry::new()),
            source,
            Arc::new(NullObserver),
            settings(),
        )
    }

    fn request(path: &Path, audit: bool) -> RepositoryScanRequest {
        RepositoryScanRequest::new(path.to_path_buf(), None, false, audit)
    }

    #[tokio::test]
    async fn test_missing_path_is_fatal() {
        let use_case = use_case(None);
        let result = use_case
            .execute(request(Path::new("/does/not/exist"), false))
            .await;

        let error = result.unwrap_err();
        let scan_error = error.downcast_ref::<ScanError>().unwrap();
        assert!(matches!(scan_error, ScanError::PathNotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("README.md");
        fs::write(&file, "hello").unwrap();

        let use_case = use_case(None);
        let result = use_case.execute(request(&file, false)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_directory_yields_empty_result() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(None);

        let result = use_case.execute(request(dir.path(), false)).await.unwrap();
        assert!(result.components.is_empty());
        assert!(result.metadata.technologies().is_empty());
        assert_eq!(result.stats.total_components, 0);
        assert!(result.vulnerabilities.is_none());
    }

    #[tokio::test]
    async fn test_python_manifest_scan() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests==2.28.1\n").unwrap();

        let use_case = use_case(None);
        let result = use_case.execute(request(dir.path(), false)).await.unwrap();

        assert_eq!(result.metadata.technologies(), &["python".to_string()]);
        assert_eq!(result.components.len(), 1);
        assert_eq!(result.components[0].name(), "requests");
        assert_eq!(result.components[0].version(), "2.28.1");
        assert_eq!(result.stats.total_components, 1);
        assert_eq!(result.stats.direct_deps, 1);
    }

    #[tokio::test]
    async fn test_polyglot_repository_unions_ecosystems() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask==2.3.0\n").unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module example.com/app\n\nrequire github.com/pkg/errors v0.9.1\n",
        )
        .unwrap();

        let use_case = use_case(None);
        let result = use_case.execute(request(dir.path(), false)).await.unwrap();

        assert_eq!(
            result.metadata.technologies(),
            &["python".to_string(), "go".to_string()]
        );
        let names: Vec<&str> = result.components.iter().map(|c| c.name()).collect();
        assert!(names.contains(&"flask"));
        assert!(names.contains(&"github.com/pkg/errors"));
    }

    #[tokio::test]
    async fn test_audit_attaches_findings() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "requests==2.28.1\n").unwrap();

        let source = FixedSource {
            records: vec![VulnerabilityRecord {
                id: "GHSA-j8r2-6x86-q33q".to_string(),
                summary: Some("Proxy-Authorization header leak".to_string()),
                severity: Some("moderate".to_string()),
            }],
        };
        let use_case = use_case(Some(source));
        let result = use_case.execute(request(dir.path(), true)).await.unwrap();

        let findings = result.vulnerabilities.as_ref().unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].component, "requests@2.28.1");
        assert_eq!(result.vulnerability_count(), 1);
    }

    #[tokio::test]
    async fn test_audit_without_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(None);

        let result = use_case.execute(request(dir.path(), true)).await.unwrap();
        assert!(result.vulnerabilities.is_none());
    }

    #[tokio::test]
    async fn test_name_defaults_to_directory_name() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("widget-api");
        fs::create_dir(&project).unwrap();

        let use_case = use_case(None);
        let result = use_case
            .execute(RepositoryScanRequest::new(
                project.clone(),
                None,
                false,
                false,
            ))
            .await
            .unwrap();
        assert_eq!(result.metadata.repository(), "widget-api");

        let named = use_case
            .execute(RepositoryScanRequest::new(
                project,
                Some("acme/widget-api".to_string()),
                false,
                false,
            ))
            .await
            .unwrap();
        assert_eq!(named.metadata.repository(), "acme/widget-api");
    }

    #[test]
    fn test_request_construction() {
        let request =
            RepositoryScanRequest::new(PathBuf::from("/tmp/repo"), None, true, false);
        assert!(request.include_dev);
        assert!(!request.audit);
    }
}
