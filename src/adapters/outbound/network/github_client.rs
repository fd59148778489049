use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::ports::outbound::{RepoDescriptor, RepoVisibility, RepositoryHost};
use crate::shared::{Result, ScanError};

/// GitHub REST v3 client for listing organization repositories
///
/// Pages through `/orgs/{org}/repos` until an empty page, mapping the
/// platform's error statuses onto `HostingApiError` with actionable
/// hints. Rate limiting is handled inside the client: a 403 with an
/// exhausted `X-RateLimit-Remaining` records the advertised reset time
/// in process-wide state, and every worker sleeps until that reset
/// before its next request instead of surfacing an error.
pub struct GithubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
    /// Epoch second at which the current rate-limit window resets.
    rate_limited_until: Arc<Mutex<Option<i64>>>,
}

impl GithubClient {
    const API_ENDPOINT: &'static str = "https://api.github.com";
    const TIMEOUT_SECONDS: u64 = 30;
    const PAGE_SIZE: u32 = 100;

    /// Creates a new GitHub API client
    ///
    /// # Arguments
    /// * `token` - Personal access token; unauthenticated requests work
    ///   for public organizations but hit much lower rate limits
    pub fn new(token: Option<String>) -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_url: Self::API_ENDPOINT.to_string(),
            token,
            rate_limited_until: Arc::new(Mutex::new(None)),
        })
    }

    /// Fetches one page of the organization's repository listing,
    /// waiting out a rate-limit window and retrying when one is hit.
    async fn fetch_page(&self, organization: &str, page: u32) -> Result<Vec<GithubRepo>> {
        loop {
            self.wait_for_rate_limit().await;

            let url = format!("{}/orgs/{}/repos", self.api_url, organization);
            let mut request = self
                .client
                .get(&url)
                .header("Accept", "application/vnd.github.v3+json")
                .query(&[
                    ("per_page", Self::PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                    ("type", "all".to_string()),
                ]);
            if let Some(token) = &self.token {
                request = request.header("Authorization", format!("token {}", token));
            }
            let response = request.send().await?;

            match response.status() {
                status if status.is_success() => {
                    let repos: Vec<GithubRepo> = response.json().await?;
                    return Ok(repos);
                }
                StatusCode::UNAUTHORIZED => {
                    return Err(ScanError::HostingApiError {
                        reason: "Authentication failed (401)".to_string(),
                        hint: "Check that GITHUB_TOKEN is set to a valid token".to_string(),
                    }
                    .into());
                }
                StatusCode::FORBIDDEN => {
                    if let Some(reset_epoch) = rate_limit_reset(&response) {
                        self.note_rate_limit(reset_epoch);
                        continue;
                    }
                    return Err(ScanError::HostingApiError {
                        reason: "Access forbidden (403)".to_string(),
                        hint: "The token may lack permission to list this organization"
                            .to_string(),
                    }
                    .into());
                }
                StatusCode::NOT_FOUND => {
                    return Err(ScanError::HostingApiError {
                        reason: format!("Organization '{}' not found (404)", organization),
                        hint: "Check the organization name and token scopes".to_string(),
                    }
                    .into());
                }
                status => {
                    return Err(ScanError::HostingApiError {
                        reason: format!("GitHub API returned status code {}", status),
                        hint: "Retry later or check https://www.githubstatus.com".to_string(),
                    }
                    .into());
                }
            }
        }
    }

    /// Sleeps until the shared rate-limit window resets, if one is
    /// recorded. The sleep happens outside the lock so waiting workers
    /// never block each other.
    async fn wait_for_rate_limit(&self) {
        let deadline = {
            let guard = match self.rate_limited_until.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard
        };
        let Some(reset_epoch) = deadline else {
            return;
        };

        let now = Utc::now().timestamp();
        if reset_epoch > now {
            tokio::time::sleep(Duration::from_secs((reset_epoch - now) as u64 + 1)).await;
        }

        let mut guard = match self.rate_limited_until.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard == Some(reset_epoch) {
            *guard = None;
        }
    }

    fn note_rate_limit(&self, reset_epoch: i64) {
        let mut guard = match self.rate_limited_until.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(reset_epoch);
    }
}

#[async_trait]
impl RepositoryHost for GithubClient {
    async fn list_organization_repositories(
        &self,
        organization: &str,
        visibility: RepoVisibility,
    ) -> Result<Vec<RepoDescriptor>> {
        let mut repositories = Vec::new();

        let mut page = 1;
        loop {
            let batch = self.fetch_page(organization, page).await?;
            if batch.is_empty() {
                break;
            }
            repositories.extend(batch);
            page += 1;
        }

        Ok(repositories
            .into_iter()
            .filter(|repo| visibility_allows(repo, visibility))
            .map(GithubRepo::into_descriptor)
            .collect())
    }

    fn clone_url(&self, repository: &RepoDescriptor, use_ssh: bool) -> String {
        if use_ssh {
            return repository.ssh_url.clone();
        }
        if repository.private {
            if let (Some(token), Some(rest)) = (
                self.token.as_deref(),
                repository.clone_url.strip_prefix("https://"),
            ) {
                return format!("https://{}@{}", token, rest);
            }
        }
        repository.clone_url.clone()
    }
}

fn visibility_allows(repo: &GithubRepo, visibility: RepoVisibility) -> bool {
    (visibility.include_private || !repo.private)
        && (visibility.include_forks || !repo.fork)
        && (visibility.include_archived || !repo.archived)
}

/// Extracts the reset epoch from an exhausted rate-limit response.
fn rate_limit_reset(response: &Response) -> Option<i64> {
    let remaining = response
        .headers()
        .get("x-ratelimit-remaining")?
        .to_str()
        .ok()?;
    if remaining != "0" {
        return None;
    }
    response
        .headers()
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

// GitHub API response structure

#[derive(Debug, Deserialize)]
struct GithubRepo {
    name: String,
    clone_url: String,
    ssh_url: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

impl GithubRepo {
    fn into_descriptor(self) -> RepoDescriptor {
        RepoDescriptor {
            name: self.name,
            clone_url: self.clone_url,
            ssh_url: self.ssh_url,
            private: self.private,
            fork: self.fork,
            archived: self.archived,
            language: self.language,
            size: self.size,
            default_branch: self.default_branch,
            topics: self.topics,
        }
    }
}
