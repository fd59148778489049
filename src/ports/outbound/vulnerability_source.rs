use crate::shared::Result;
use async_trait::async_trait;

/// One vulnerability record as returned by the external source.
///
/// Severity is whatever string the database advertises; normalization
/// happens in the audit bridge, scoring never does.
#[derive(Debug, Clone)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub summary: Option<String>,
    pub severity: Option<String>,
}

/// VulnerabilitySource port for querying an external vulnerability feed
///
/// Queried once per component package URL. Callers treat every failure
/// as "zero findings" for that component; a vulnerability-source outage
/// must never fail a scan.
#[async_trait]
pub trait VulnerabilitySource: Send + Sync {
    /// Queries the source for vulnerabilities affecting the package.
    ///
    /// # Arguments
    /// * `package_url` - Canonical purl identifying the package version
    ///
    /// # Errors
    /// Returns an error when the request fails or the source responds
    /// with a non-success status. The audit bridge logs and swallows it.
    async fn query(&self, package_url: &str) -> Result<Vec<VulnerabilityRecord>>;
}
