use async_trait::async_trait;
use repo_sbom::prelude::*;
use std::collections::HashMap;

/// Mock VulnerabilitySource for testing
#[derive(Clone)]
pub struct MockVulnerabilitySource {
    pub records: HashMap<String, Vec<VulnerabilityRecord>>,
    pub should_fail: bool,
}

impl MockVulnerabilitySource {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            should_fail: false,
        }
    }

    pub fn with_vulnerability(
        mut self,
        package_url: &str,
        id: &str,
        severity: &str,
        summary: &str,
    ) -> Self {
        self.records
            .entry(package_url.to_string())
            .or_default()
            .push(VulnerabilityRecord {
                id: id.to_string(),
                summary: Some(summary.to_string()),
                severity: Some(severity.to_string()),
            });
        self
    }

    pub fn with_failure() -> Self {
        Self {
            records: HashMap::new(),
            should_fail: true,
        }
    }
}

impl Default for MockVulnerabilitySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VulnerabilitySource for MockVulnerabilitySource {
    async fn query(&self, package_url: &str) -> Result<Vec<VulnerabilityRecord>> {
        if self.should_fail {
            anyhow::bail!("Mock vulnerability source failure");
        }
        Ok(self.records.get(package_url).cloned().unwrap_or_default())
    }
}
