//! repo-sbom - dependency inventory and SBOM generation for polyglot repositories
//!
//! This library scans repositories across seven package ecosystems (Maven,
//! Python, Node.js, Go, Ruby, Rust and Flutter), merges what the scanners
//! report into one deduplicated component inventory, optionally
//! cross-references the inventory against the OSV vulnerability database,
//! and renders the outcome as CycloneDX, SPDX, Markdown, text or HTML
//! reports. Whole GitHub organizations can be scanned with bounded
//! parallelism.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`inventory`): Component model, merge rules, results
//! - **Scanners** (`scanners`): Per-ecosystem dependency extraction
//! - **Application Layer** (`application`): Use cases and orchestration
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use repo_sbom::prelude::*;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<()> {
//! // Create collaborators
//! let registry = Arc::new(ScannerRegistry::new());
//! let observer: Arc<dyn ScanObserver> = Arc::new(SilentScanObserver::new());
//! let settings = ScanSettings::new(Duration::from_secs(300), 5, Vec::new());
//!
//! // Create use case with injected dependencies
//! let use_case =
//!     ScanRepositoryUseCase::new(registry, Some(OsvClient::new()?), observer, settings);
//!
//! // Execute
//! let request = RepositoryScanRequest::new(PathBuf::from("."), None, false, true);
//! let result = use_case.execute(request).await?;
//!
//! // Format output
//! let formatter = CycloneDxFormatter::new();
//! let output = formatter.format_repository(&result)?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod inventory;
pub mod ports;
pub mod scanners;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::{SilentScanObserver, StderrScanObserver};
    pub use crate::adapters::outbound::filesystem::ReportSink;
    pub use crate::adapters::outbound::formatters::{
        CycloneDxFormatter, HtmlFormatter, MarkdownFormatter, SpdxFormatter, TextFormatter,
    };
    pub use crate::adapters::outbound::git::GitCloner;
    pub use crate::adapters::outbound::network::{GithubClient, OsvClient};
    pub use crate::application::dto::{
        OrganizationScanRequest, OutputFormat, RepositoryScanRequest, ScanSettings,
    };
    pub use crate::application::factories::FormatterFactory;
    pub use crate::application::use_cases::{
        AuditComponentsUseCase, ScanOrganizationUseCase, ScanRepositoryUseCase,
    };
    pub use crate::config::Settings;
    pub use crate::inventory::domain::{
        Component, ComponentType, DependencyScope, Finding, OrganizationSummary,
        RepositoryOutcome, RepositoryStatus, ScanMetadata, ScanResult, ScanStats, Severity,
    };
    pub use crate::inventory::services::ComponentMerger;
    pub use crate::ports::outbound::{
        RepoDescriptor, RepoFilters, RepoVisibility, ReportFormatter, RepositoryCloner,
        RepositoryHost, ScanObserver, VulnerabilityRecord, VulnerabilitySource,
    };
    pub use crate::scanners::{EcosystemScanner, ScanContext, ScannerRegistry};
    pub use crate::shared::{ExitCode, Result, ScanError};
}
