use async_trait::async_trait;
use repo_sbom::prelude::*;

/// Mock RepositoryHost for testing
pub struct MockRepositoryHost {
    pub repositories: Vec<RepoDescriptor>,
    pub should_fail: bool,
}

impl MockRepositoryHost {
    pub fn new() -> Self {
        Self {
            repositories: Vec::new(),
            should_fail: false,
        }
    }

    pub fn with_repository(mut self, name: &str) -> Self {
        self.repositories.push(RepoDescriptor {
            name: name.to_string(),
            clone_url: format!("https://github.com/acme/{}.git", name),
            ssh_url: format!("git@github.com:acme/{}.git", name),
            ..Default::default()
        });
        self
    }

    pub fn with_failure() -> Self {
        Self {
            repositories: Vec::new(),
            should_fail: true,
        }
    }
}

impl Default for MockRepositoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryHost for MockRepositoryHost {
    async fn list_organization_repositories(
        &self,
        _organization: &str,
        _visibility: RepoVisibility,
    ) -> Result<Vec<RepoDescriptor>> {
        if self.should_fail {
            anyhow::bail!("Mock repository listing failure");
        }
        Ok(self.repositories.clone())
    }

    fn clone_url(&self, repository: &RepoDescriptor, use_ssh: bool) -> String {
        if use_ssh {
            repository.ssh_url.clone()
        } else {
            repository.clone_url.clone()
        }
    }
}
