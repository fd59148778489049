/// Mock implementations for testing
mod mock_repository_cloner;
mod mock_repository_host;
mod mock_scan_observer;
mod mock_vulnerability_source;

pub use mock_repository_cloner::MockRepositoryCloner;
pub use mock_repository_host::MockRepositoryHost;
pub use mock_scan_observer::MockScanObserver;
pub use mock_vulnerability_source::MockVulnerabilitySource;
