use async_trait::async_trait;
use repo_sbom::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Mock RepositoryCloner for testing that materializes manifest files
/// instead of running git
pub struct MockRepositoryCloner {
    pub manifests: HashMap<String, Vec<(String, String)>>,
    pub failing: HashSet<String>,
}

impl MockRepositoryCloner {
    pub fn new() -> Self {
        Self {
            manifests: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// The named repository clones into a working copy containing this file.
    pub fn with_manifest(mut self, repository: &str, file_name: &str, content: &str) -> Self {
        self.manifests
            .entry(repository.to_string())
            .or_default()
            .push((file_name.to_string(), content.to_string()));
        self
    }

    /// The named repository fails to clone.
    pub fn with_failing(mut self, repository: &str) -> Self {
        self.failing.insert(repository.to_string());
        self
    }
}

impl Default for MockRepositoryCloner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryCloner for MockRepositoryCloner {
    async fn clone_repository(&self, _url: &str, destination: &Path) -> Result<()> {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing.contains(&name) {
            anyhow::bail!("fatal: could not read from remote repository");
        }
        std::fs::create_dir_all(destination)?;
        if let Some(files) = self.manifests.get(&name) {
            for (file_name, content) in files {
                std::fs::write(destination.join(file_name), content)?;
            }
        }
        Ok(())
    }
}
