use crate::shared::Result;
use async_trait::async_trait;
use std::path::Path;

/// RepositoryCloner port for acquiring a local working copy
///
/// Each organization-scan worker clones into its own isolated
/// destination directory, so no two concurrent scans share a
/// filesystem subtree.
#[async_trait]
pub trait RepositoryCloner: Send + Sync {
    /// Clones `url` into `destination`.
    ///
    /// # Errors
    /// Returns an error when the clone exits non-zero or exceeds its
    /// timeout. The caller records the failure for that repository and
    /// continues with the rest of the organization.
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<()>;
}
