use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Terminal status of one repository within an organization scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryStatus {
    Success,
    Failed,
}

impl RepositoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryStatus::Success => "success",
            RepositoryStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RepositoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-repository outcome inside an organization summary.
///
/// A failed repository keeps zero counts but stays listed, with the
/// failure reason preserved for the report.
#[derive(Debug, Clone)]
pub struct RepositoryOutcome {
    pub name: String,
    pub status: RepositoryStatus,
    pub components: usize,
    pub vulnerabilities: usize,
    pub technologies: Vec<String>,
    pub error: Option<String>,
}

impl RepositoryOutcome {
    pub fn success(
        name: String,
        components: usize,
        vulnerabilities: usize,
        technologies: Vec<String>,
    ) -> Self {
        Self {
            name,
            status: RepositoryStatus::Success,
            components,
            vulnerabilities,
            technologies,
            error: None,
        }
    }

    pub fn failure(name: String, error: String) -> Self {
        Self {
            name,
            status: RepositoryStatus::Failed,
            components: 0,
            vulnerabilities: 0,
            technologies: Vec::new(),
            error: Some(error),
        }
    }
}

/// Aggregation over N repository scans of one organization.
///
/// `repositories` preserves the candidate-list order regardless of scan
/// completion order. Totals cover successful scans only, so
/// `successful_scans + failed_scans` always equals `repositories.len()`.
#[derive(Debug, Clone)]
pub struct OrganizationSummary {
    pub organization: String,
    pub scan_date: DateTime<Utc>,
    pub repositories: Vec<RepositoryOutcome>,
    pub total_components: usize,
    pub total_vulnerabilities: usize,
    pub successful_scans: usize,
    pub failed_scans: usize,
    pub technology_distribution: BTreeMap<String, usize>,
}

impl OrganizationSummary {
    /// Builds the summary from ordered per-repository outcomes,
    /// computing every derived total.
    pub fn from_outcomes(organization: String, repositories: Vec<RepositoryOutcome>) -> Self {
        let mut total_components = 0;
        let mut total_vulnerabilities = 0;
        let mut successful_scans = 0;
        let mut failed_scans = 0;
        let mut technology_distribution = BTreeMap::new();

        for outcome in &repositories {
            match outcome.status {
                RepositoryStatus::Success => {
                    successful_scans += 1;
                    total_components += outcome.components;
                    total_vulnerabilities += outcome.vulnerabilities;
                    for technology in &outcome.technologies {
                        *technology_distribution
                            .entry(technology.clone())
                            .or_insert(0) += 1;
                    }
                }
                RepositoryStatus::Failed => failed_scans += 1,
            }
        }

        Self {
            organization,
            scan_date: Utc::now(),
            repositories,
            total_components,
            total_vulnerabilities,
            successful_scans,
            failed_scans,
            technology_distribution,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed_scans > 0
    }
}
