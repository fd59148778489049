/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (console, network, git, file system).
pub mod report_formatter;
pub mod repository_cloner;
pub mod repository_host;
pub mod scan_observer;
pub mod vulnerability_source;

pub use report_formatter::ReportFormatter;
pub use repository_cloner::RepositoryCloner;
pub use repository_host::{RepoDescriptor, RepoFilters, RepoVisibility, RepositoryHost};
pub use scan_observer::ScanObserver;
pub use vulnerability_source::{VulnerabilityRecord, VulnerabilitySource};
