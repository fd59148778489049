use crate::shared::Result;
use async_trait::async_trait;

/// One repository as described by the hosting platform.
#[derive(Debug, Clone, Default)]
pub struct RepoDescriptor {
    pub name: String,
    pub clone_url: String,
    pub ssh_url: String,
    pub private: bool,
    pub fork: bool,
    pub archived: bool,
    pub language: Option<String>,
    /// Repository size in kilobytes, as reported by the platform.
    pub size: u64,
    pub default_branch: Option<String>,
    pub topics: Vec<String>,
}

/// Visibility flags applied when listing an organization's repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepoVisibility {
    pub include_private: bool,
    pub include_forks: bool,
    pub include_archived: bool,
}

/// Optional narrowing filters applied after the visibility pass.
///
/// Name patterns support `*` wildcards; an empty filter set keeps
/// every repository.
#[derive(Debug, Clone, Default)]
pub struct RepoFilters {
    pub languages: Vec<String>,
    pub topics: Vec<String>,
    pub min_size_kb: Option<u64>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl RepoFilters {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.topics.is_empty()
            && self.min_size_kb.is_none()
            && self.include_patterns.is_empty()
            && self.exclude_patterns.is_empty()
    }
}

/// RepositoryHost port for the source-hosting platform
///
/// This port abstracts the platform API (e.g. GitHub) used to list an
/// organization's repositories and derive URLs a clone can use.
///
/// # Async Support
/// Listing is async; implementations must be `Send + Sync` so the
/// organization orchestrator can share them across workers.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Lists the organization's repositories, already narrowed by the
    /// visibility flags.
    ///
    /// # Errors
    /// Returns an error for authentication failures, missing
    /// organizations, and network problems. Rate limiting is handled
    /// inside the implementation (wait until the advertised reset, then
    /// retry) and is not surfaced as an error.
    async fn list_organization_repositories(
        &self,
        organization: &str,
        visibility: RepoVisibility,
    ) -> Result<Vec<RepoDescriptor>>;

    /// Returns the URL a `git clone` should use for this repository.
    ///
    /// Private repositories get the access token injected into the
    /// https URL when one is configured; without a token the URL is
    /// returned unmodified and the clone is expected to fail visibly.
    fn clone_url(&self, repository: &RepoDescriptor, use_ssh: bool) -> String;
}
