/// Domain models - canonical value types shared by every scanner and report
pub mod component;
pub mod org_summary;
pub mod scan_result;

pub use component::{Component, ComponentKey, ComponentType, DependencyScope};
pub use org_summary::{OrganizationSummary, RepositoryOutcome, RepositoryStatus};
pub use scan_result::{Finding, ScanMetadata, ScanResult, ScanStats, Severity};
