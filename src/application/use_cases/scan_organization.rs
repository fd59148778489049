//! Use case for scanning every repository of an organization.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tempfile::TempDir;

use crate::application::dto::{OrganizationScanRequest, RepositoryScanRequest};
use crate::application::use_cases::ScanRepositoryUseCase;
use crate::inventory::domain::{OrganizationSummary, RepositoryOutcome};
use crate::ports::outbound::{
    RepoDescriptor, RepoFilters, RepositoryCloner, RepositoryHost, ScanObserver,
    VulnerabilitySource,
};
use crate::scanners::manifest_walk::wildcard_match;
use crate::shared::Result;

/// ScanOrganizationUseCase - orchestrates a whole-organization scan
///
/// Repositories are listed from the hosting platform, narrowed by the
/// configured filters, then cloned and scanned by a bounded pool of
/// concurrent workers. Each worker gets its own temporary workspace
/// that is removed when the scan of that repository finishes. A failed
/// clone or scan is recorded in the summary and never aborts the run;
/// only the initial repository listing can fail the whole operation.
///
/// # Type Parameters
/// * `H` - RepositoryHost implementation (platform API)
/// * `C` - RepositoryCloner implementation
/// * `V` - VulnerabilitySource implementation used when auditing
pub struct ScanOrganizationUseCase<H, C, V>
where
    H: RepositoryHost,
    C: RepositoryCloner,
    V: VulnerabilitySource + Clone,
{
    host: H,
    cloner: C,
    repository_scanner: ScanRepositoryUseCase<V>,
    observer: Arc<dyn ScanObserver>,
    cancel: Arc<AtomicBool>,
}

impl<H, C, V> ScanOrganizationUseCase<H, C, V>
where
    H: RepositoryHost,
    C: RepositoryCloner,
    V: VulnerabilitySource + Clone,
{
    /// Creates a new use case instance with injected dependencies
    ///
    /// # Arguments
    /// * `host` - Hosting platform API client
    /// * `cloner` - Working-copy acquisition
    /// * `repository_scanner` - Per-repository scan use case
    /// * `observer` - Sink for progress and warnings
    /// * `cancel` - Cooperative cancellation flag; once set, repositories
    ///   that have not started are recorded as failed instead of scanned
    pub fn new(
        host: H,
        cloner: C,
        repository_scanner: ScanRepositoryUseCase<V>,
        observer: Arc<dyn ScanObserver>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            host,
            cloner,
            repository_scanner,
            observer,
            cancel,
        }
    }

    /// Executes the organization scan
    ///
    /// # Arguments
    /// * `request` - Organization, filters and worker settings
    ///
    /// # Returns
    /// OrganizationSummary listing every selected repository in candidate
    /// order, with aggregate totals over the successful scans
    ///
    /// # Errors
    /// Returns an error only when the repository listing itself fails;
    /// per-repository problems are recorded in the summary instead.
    pub async fn execute(&self, request: OrganizationScanRequest) -> Result<OrganizationSummary> {
        // Step 1: List candidate repositories from the hosting platform
        self.observer.info(&format!(
            "🔍 Fetching repositories for organization: {}",
            request.organization
        ));
        let candidates = self
            .host
            .list_organization_repositories(&request.organization, request.visibility)
            .await?;
        let candidate_count = candidates.len();

        // Step 2: Apply the configured filters
        let selected = filter_repositories(candidates, &request.filters);
        self.observer.info(&format!(
            "✅ Selected {} of {} repositories",
            selected.len(),
            candidate_count
        ));
        if selected.is_empty() {
            self.observer
                .warn("No repositories matched the configured filters");
            return Ok(OrganizationSummary::from_outcomes(
                request.organization.clone(),
                Vec::new(),
            ));
        }

        // Step 3: Clone and scan with a bounded worker pool
        let total = selected.len();
        let workers = request.parallel_workers.max(1);
        self.observer.info(&format!(
            "📦 Scanning {} repositories ({} parallel workers)",
            total, workers
        ));

        let completed = AtomicUsize::new(0);
        let mut slots: Vec<Option<RepositoryOutcome>> = Vec::new();
        slots.resize_with(total, || None);
        {
            let request = &request;
            let completed = &completed;
            let mut results = stream::iter(selected.into_iter().enumerate())
                .map(|(index, repository)| async move {
                    let name = repository.name.clone();
                    let outcome = self.scan_one(repository, request).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.observer.progress(done, total, Some(&name));
                    (index, outcome)
                })
                .buffer_unordered(workers);

            // Workers finish in scan-duration order; the indexed slots
            // restore candidate order.
            while let Some((index, outcome)) = results.next().await {
                slots[index] = Some(outcome);
            }
        }
        let outcomes: Vec<RepositoryOutcome> = slots.into_iter().flatten().collect();

        // Step 4: Aggregate into the organization summary
        let summary = OrganizationSummary::from_outcomes(request.organization.clone(), outcomes);
        self.observer.completion(&format!(
            "✅ Organization scan complete: {} scanned, {} failed",
            summary.successful_scans, summary.failed_scans
        ));
        Ok(summary)
    }

    /// Clones and scans one repository in an isolated workspace.
    ///
    /// Every failure path returns a failed outcome rather than an
    /// error; one broken repository must not abort the organization
    /// scan. The workspace is removed when this function returns.
    async fn scan_one(
        &self,
        repository: RepoDescriptor,
        request: &OrganizationScanRequest,
    ) -> RepositoryOutcome {
        if self.cancel.load(Ordering::SeqCst) {
            return RepositoryOutcome::failure(
                repository.name,
                "Scan cancelled before start".to_string(),
            );
        }

        let workspace = match TempDir::new() {
            Ok(workspace) => workspace,
            Err(error) => {
                return RepositoryOutcome::failure(
                    repository.name,
                    format!("Failed to create scan workspace: {}", error),
                );
            }
        };

        let url = self.host.clone_url(&repository, request.use_ssh);
        let destination = workspace.path().join(&repository.name);
        if let Err(error) = self.cloner.clone_repository(&url, &destination).await {
            self.observer
                .warn(&format!("Skipping {}: {}", repository.name, error));
            return RepositoryOutcome::failure(repository.name, error.to_string());
        }

        let scan_request = RepositoryScanRequest::new(
            destination,
            Some(repository.name.clone()),
            request.include_dev,
            request.audit,
        );
        match self.repository_scanner.execute(scan_request).await {
            Ok(result) => RepositoryOutcome::success(
                repository.name,
                result.stats.total_components,
                result.vulnerability_count(),
                result.metadata.technologies().to_vec(),
            ),
            Err(error) => {
                self.observer
                    .warn(&format!("Scan of {} failed: {}", repository.name, error));
                RepositoryOutcome::failure(repository.name, error.to_string())
            }
        }
    }
}

/// Applies the narrowing filters to the candidate list, preserving the
/// platform's listing order. An empty filter set keeps everything.
fn filter_repositories(
    candidates: Vec<RepoDescriptor>,
    filters: &RepoFilters,
) -> Vec<RepoDescriptor> {
    if filters.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|repository| matches_filters(repository, filters))
        .collect()
}

fn matches_filters(repository: &RepoDescriptor, filters: &RepoFilters) -> bool {
    if !filters.languages.is_empty() {
        let language = repository.language.as_deref().unwrap_or("");
        if !filters
            .languages
            .iter()
            .any(|wanted| wanted.eq_ignore_ascii_case(language))
        {
            return false;
        }
    }

    if !filters.topics.is_empty()
        && !filters.topics.iter().any(|wanted| {
            repository
                .topics
                .iter()
                .any(|topic| topic.eq_ignore_ascii_case(wanted))
        })
    {
        return false;
    }

    if let Some(min_size) = filters.min_size_kb {
        if repository.size < min_size {
            return false;
        }
    }

    if !filters.include_patterns.is_empty()
        && !filters
            .include_patterns
            .iter()
            .any(|pattern| wildcard_match(&repository.name, pattern))
    {
        return false;
    }

    // Exclusion wins over inclusion.
    if filters
        .exclude_patterns
        .iter()
        .any(|pattern| wildcard_match(&repository.name, pattern))
    {
        return false;
    }

    true
}
