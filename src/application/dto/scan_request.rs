use std::path::PathBuf;
use std::time::Duration;

use crate::ports::outbound::{RepoFilters, RepoVisibility};

/// ScanSettings - resolved configuration shared by every scan
///
/// Carries the config-derived knobs the scanners need. The per-request
/// options (dev inclusion, audit) live on the request DTOs instead.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Ceiling for one external tool invocation.
    pub tool_timeout: Duration,
    /// Directory depth bound for the manifest walk.
    pub max_depth: usize,
    /// Glob patterns excluded from file walks.
    pub ignore_patterns: Vec<String>,
}

impl ScanSettings {
    pub fn new(tool_timeout: Duration, max_depth: usize, ignore_patterns: Vec<String>) -> Self {
        Self {
            tool_timeout,
            max_depth,
            ignore_patterns,
        }
    }
}

/// RepositoryScanRequest - request DTO for scanning one repository
#[derive(Debug, Clone)]
pub struct RepositoryScanRequest {
    /// Path to the repository working copy.
    pub repository_path: PathBuf,
    /// Display identity; defaults to the directory name when absent.
    pub repository_name: Option<String>,
    /// Whether development dependencies are included.
    pub include_dev: bool,
    /// Whether to cross-reference components against vulnerability data.
    pub audit: bool,
}

impl RepositoryScanRequest {
    pub fn new(
        repository_path: PathBuf,
        repository_name: Option<String>,
        include_dev: bool,
        audit: bool,
    ) -> Self {
        Self {
            repository_path,
            repository_name,
            include_dev,
            audit,
        }
    }
}

/// OrganizationScanRequest - request DTO for scanning a whole
/// organization
#[derive(Debug, Clone)]
pub struct OrganizationScanRequest {
    pub organization: String,
    pub include_dev: bool,
    pub audit: bool,
    pub visibility: RepoVisibility,
    pub filters: RepoFilters,
    /// Clone over SSH instead of https.
    pub use_ssh: bool,
    /// Upper bound on concurrent repository scans.
    pub parallel_workers: usize,
}

impl OrganizationScanRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        organization: String,
        include_dev: bool,
        audit: bool,
        visibility: RepoVisibility,
        filters: RepoFilters,
        use_ssh: bool,
        parallel_workers: usize,
    ) -> Self {
        Self {
            organization,
            include_dev,
            audit,
            visibility,
            filters,
            use_ssh,
            parallel_workers,
        }
    }
}
