/// Integration tests for the application layer
mod test_utilities;

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use test_utilities::mocks::*;

use repo_sbom::prelude::*;

fn scan_settings() -> ScanSettings {
    ScanSettings::new(Duration::from_secs(30), 5, Vec::new())
}

fn repository_use_case(
    source: Option<MockVulnerabilitySource>,
    observer: &MockScanObserver,
) -> ScanRepositoryUseCase<MockVulnerabilitySource> {
    ScanRepositoryUseCase::new(
        Arc::new(ScannerRegistry::new()),
        source,
        Arc::new(observer.clone()),
        scan_settings(),
    )
}

fn organization_use_case(
    host: MockRepositoryHost,
    cloner: MockRepositoryCloner,
    observer: &MockScanObserver,
) -> ScanOrganizationUseCase<MockRepositoryHost, MockRepositoryCloner, MockVulnerabilitySource> {
    let repository_scanner = repository_use_case(None, observer);
    ScanOrganizationUseCase::new(
        host,
        cloner,
        repository_scanner,
        Arc::new(observer.clone()),
        Arc::new(AtomicBool::new(false)),
    )
}

fn organization_request(workers: usize) -> OrganizationScanRequest {
    OrganizationScanRequest::new(
        "acme".to_string(),
        false,
        false,
        RepoVisibility::default(),
        RepoFilters::default(),
        false,
        workers,
    )
}

#[tokio::test]
async fn test_scan_repository_happy_path() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("requirements.txt"),
        "requests==2.28.1\nurllib3==1.26.18\n",
    )
    .unwrap();

    let observer = MockScanObserver::new();
    let use_case = repository_use_case(None, &observer);

    let request = RepositoryScanRequest::new(dir.path().to_path_buf(), None, false, false);
    let result = use_case.execute(request).await;

    assert!(result.is_ok());
    let result = result.unwrap();
    assert_eq!(result.metadata.technologies(), &["python".to_string()]);
    assert_eq!(result.components.len(), 2);
    assert_eq!(result.stats.total_components, 2);
    assert_eq!(result.stats.direct_deps, 2);
    assert!(result.vulnerabilities.is_none());

    let messages = observer.get_messages();
    assert!(messages
        .iter()
        .any(|m| m.contains("Detected technologies: python")));
}

#[tokio::test]
async fn test_scan_repository_polyglot_union() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("requirements.txt"), "flask==2.3.0\n").unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"name": "web", "dependencies": {"express": "4.18.2"}}"#,
    )
    .unwrap();

    let observer = MockScanObserver::new();
    let use_case = repository_use_case(None, &observer);

    let request = RepositoryScanRequest::new(dir.path().to_path_buf(), None, false, false);
    let result = use_case.execute(request).await.unwrap();

    assert_eq!(
        result.metadata.technologies(),
        &["python".to_string(), "node".to_string()]
    );

    let flask = result
        .components
        .iter()
        .find(|c| c.name() == "flask")
        .unwrap();
    assert_eq!(flask.package_url(), Some("pkg:pypi/flask@2.3.0"));
    let express = result
        .components
        .iter()
        .find(|c| c.name() == "express")
        .unwrap();
    assert_eq!(express.package_url(), Some("pkg:npm/express@4.18.2"));
}

#[tokio::test]
async fn test_scan_repository_merges_duplicates_across_modules() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("requirements.txt"),
        "requests==2.28.1\nflask==2.3.0\n",
    )
    .unwrap();
    let nested = dir.path().join("services").join("api");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("requirements.txt"), "requests==2.28.1\n").unwrap();

    let observer = MockScanObserver::new();
    let use_case = repository_use_case(None, &observer);

    let request = RepositoryScanRequest::new(dir.path().to_path_buf(), None, false, false);
    let result = use_case.execute(request).await.unwrap();

    // requests appears in both manifests but only once in the inventory
    assert_eq!(result.components.len(), 2);
    assert_eq!(
        result
            .components
            .iter()
            .filter(|c| c.name() == "requests")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_scan_repository_dev_scope_honored() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("requirements.txt"), "requests==2.28.1\n").unwrap();
    fs::write(dir.path().join("requirements-dev.txt"), "pytest==7.4.0\n").unwrap();

    let observer = MockScanObserver::new();
    let use_case = repository_use_case(None, &observer);

    let without_dev =
        RepositoryScanRequest::new(dir.path().to_path_buf(), None, false, false);
    let result = use_case.execute(without_dev).await.unwrap();
    assert_eq!(result.components.len(), 1);
    assert_eq!(result.stats.dev_deps, 0);

    let with_dev = RepositoryScanRequest::new(dir.path().to_path_buf(), None, true, false);
    let result = use_case.execute(with_dev).await.unwrap();
    assert_eq!(result.components.len(), 2);
    assert_eq!(result.stats.dev_deps, 1);
}

#[tokio::test]
async fn test_scan_repository_missing_path_fails() {
    let observer = MockScanObserver::new();
    let use_case = repository_use_case(None, &observer);

    let request = RepositoryScanRequest::new(
        Path::new("/nonexistent/path/that/does/not/exist").to_path_buf(),
        None,
        false,
        false,
    );
    let result = use_case.execute(request).await;

    assert!(result.is_err());
    let error = result.unwrap_err();
    let scan_error = error.downcast_ref::<ScanError>().unwrap();
    assert!(matches!(scan_error, ScanError::PathNotFound { .. }));
}

#[tokio::test]
async fn test_scan_repository_audit_attaches_findings() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("requirements.txt"), "requests==2.28.1\n").unwrap();

    let source = MockVulnerabilitySource::new().with_vulnerability(
        "pkg:pypi/requests@2.28.1",
        "GHSA-j8r2-6x86-q33q",
        "moderate",
        "Proxy-Authorization header leak",
    );
    let observer = MockScanObserver::new();
    let use_case = repository_use_case(Some(source), &observer);

    let request = RepositoryScanRequest::new(dir.path().to_path_buf(), None, false, true);
    let result = use_case.execute(request).await.unwrap();

    let findings = result.vulnerabilities.as_ref().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].component, "requests@2.28.1");
    assert_eq!(findings[0].id, "GHSA-j8r2-6x86-q33q");
    assert_eq!(findings[0].severity, Severity::Medium);
    assert_eq!(result.vulnerability_count(), 1);

    let messages = observer.get_messages();
    assert!(messages
        .iter()
        .any(|m| m.starts_with("Completed:") && m.contains("Vulnerability check")));
}

#[tokio::test]
async fn test_scan_repository_audit_source_failure_swallowed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("requirements.txt"), "requests==2.28.1\n").unwrap();

    let observer = MockScanObserver::new();
    let use_case = repository_use_case(Some(MockVulnerabilitySource::with_failure()), &observer);

    let request = RepositoryScanRequest::new(dir.path().to_path_buf(), None, false, true);
    let result = use_case.execute(request).await;

    // The audit ran and found nothing; the scan itself still succeeds.
    assert!(result.is_ok());
    let result = result.unwrap();
    assert_eq!(result.vulnerabilities.as_ref().unwrap().len(), 0);

    let messages = observer.get_messages();
    assert!(messages
        .iter()
        .any(|m| m.starts_with("Warning:") && m.contains("vulnerability lookup failed")));
}

#[tokio::test]
async fn test_scan_organization_happy_path() {
    let host = MockRepositoryHost::new()
        .with_repository("api")
        .with_repository("web");
    let cloner = MockRepositoryCloner::new()
        .with_manifest("api", "requirements.txt", "requests==2.28.1\n")
        .with_manifest(
            "web",
            "package.json",
            r#"{"dependencies": {"react": "18.2.0"}}"#,
        );
    let observer = MockScanObserver::new();
    let use_case = organization_use_case(host, cloner, &observer);

    let summary = use_case.execute(organization_request(2)).await.unwrap();

    assert_eq!(summary.organization, "acme");
    assert_eq!(summary.repositories.len(), 2);
    assert_eq!(summary.successful_scans, 2);
    assert_eq!(summary.failed_scans, 0);
    assert!(!summary.has_failures());
    assert_eq!(summary.total_components, 2);

    // Outcomes keep the listing order regardless of which worker won
    assert_eq!(summary.repositories[0].name, "api");
    assert_eq!(summary.repositories[1].name, "web");
    assert_eq!(summary.repositories[0].status, RepositoryStatus::Success);

    assert_eq!(summary.technology_distribution.get("python"), Some(&1));
    assert_eq!(summary.technology_distribution.get("node"), Some(&1));
}

#[tokio::test]
async fn test_scan_organization_records_clone_failure() {
    let host = MockRepositoryHost::new()
        .with_repository("api")
        .with_repository("legacy")
        .with_repository("web");
    let cloner = MockRepositoryCloner::new()
        .with_manifest("api", "requirements.txt", "requests==2.28.1\n")
        .with_failing("legacy")
        .with_manifest("web", "requirements.txt", "flask==2.3.0\n");
    let observer = MockScanObserver::new();
    let use_case = organization_use_case(host, cloner, &observer);

    let summary = use_case.execute(organization_request(2)).await.unwrap();

    assert_eq!(summary.successful_scans, 2);
    assert_eq!(summary.failed_scans, 1);
    assert!(summary.has_failures());

    let failed = &summary.repositories[1];
    assert_eq!(failed.name, "legacy");
    assert_eq!(failed.status, RepositoryStatus::Failed);
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("could not read from remote"));

    let messages = observer.get_messages();
    assert!(messages
        .iter()
        .any(|m| m.starts_with("Warning:") && m.contains("Skipping legacy")));
}

#[tokio::test]
async fn test_scan_organization_listing_failure_is_fatal() {
    let observer = MockScanObserver::new();
    let use_case = organization_use_case(
        MockRepositoryHost::with_failure(),
        MockRepositoryCloner::new(),
        &observer,
    );

    let result = use_case.execute(organization_request(2)).await;

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("listing failure"));
}

#[tokio::test]
async fn test_scan_organization_progress_reporting() {
    let host = MockRepositoryHost::new()
        .with_repository("one")
        .with_repository("two");
    let cloner = MockRepositoryCloner::new()
        .with_manifest("one", "requirements.txt", "requests==2.28.1\n")
        .with_manifest("two", "requirements.txt", "flask==2.3.0\n");
    let observer = MockScanObserver::new();
    let use_case = organization_use_case(host, cloner, &observer);

    let _summary = use_case.execute(organization_request(1)).await.unwrap();

    let messages = observer.get_messages();
    assert!(observer.message_count() > 0);
    assert!(messages.iter().any(|m| m.contains("Progress: 2/2")));
    assert!(messages
        .iter()
        .any(|m| m.starts_with("Completed:") && m.contains("Organization scan complete")));
}
