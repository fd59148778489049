use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::outbound::{VulnerabilityRecord, VulnerabilitySource};
use crate::shared::Result;

/// OSV API client for fetching vulnerability data
///
/// Queries the OSV.dev query API once per package URL. Successful
/// responses are cached for the lifetime of the process, so an
/// organization scan where many repositories share a dependency only
/// queries each purl once. The client clones cheaply; clones share the
/// cache and the underlying connection pool.
///
/// # Security
/// - Per-request timeout (30 seconds)
/// - Does not retry failed requests; the audit bridge treats a failure
///   as zero findings for that component
#[derive(Clone)]
pub struct OsvClient {
    client: Client,
    api_url: String,
    cache: Arc<DashMap<String, Vec<VulnerabilityRecord>>>,
}

impl OsvClient {
    const API_ENDPOINT: &'static str = "https://api.osv.dev/v1/query";
    const TIMEOUT_SECONDS: u64 = 30;

    /// Creates a new OSV API client with default configuration
    pub fn new() -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_url: Self::API_ENDPOINT.to_string(),
            cache: Arc::new(DashMap::new()),
        })
    }
}

#[async_trait]
impl VulnerabilitySource for OsvClient {
    async fn query(&self, package_url: &str) -> Result<Vec<VulnerabilityRecord>> {
        if let Some(cached) = self.cache.get(package_url) {
            return Ok(cached.clone());
        }

        let query = OsvQuery {
            package: OsvPackage {
                purl: package_url.to_string(),
            },
        };
        let response = self.client.post(&self.api_url).json(&query).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("OSV API returned status code {}", response.status());
        }

        let body: OsvResponse = response.json().await?;
        let records: Vec<VulnerabilityRecord> = body
            .vulns
            .into_iter()
            .map(|vuln| VulnerabilityRecord {
                id: vuln.id,
                summary: vuln.summary,
                severity: vuln
                    .database_specific
                    .and_then(|details| details.severity),
            })
            .collect();

        // Only successful lookups are cached; a transient outage should
        // not pin an empty answer for the rest of the run.
        self.cache.insert(package_url.to_string(), records.clone());
        Ok(records)
    }
}

// OSV API request/response structures

#[derive(Debug, Serialize)]
struct OsvQuery {
    package: OsvPackage,
}

#[derive(Debug, Serialize)]
struct OsvPackage {
    purl: String,
}

#[derive(Debug, Deserialize)]
struct OsvResponse {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    database_specific: Option<DatabaseSpecific>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSpecific {
    #[serde(default)]
    severity: Option<String>, // "CRITICAL", "HIGH", "MODERATE", "MEDIUM", "LOW"
}
