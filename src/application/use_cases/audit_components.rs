//! Use case for cross-referencing components against vulnerability data.

use std::sync::Arc;

use crate::inventory::domain::{Component, Finding, Severity};
use crate::ports::outbound::{ScanObserver, VulnerabilitySource};

/// AuditComponentsUseCase - queries a vulnerability source per component
///
/// Every component carrying a package URL is looked up individually.
/// A failed lookup is reported as a warning and scored as zero findings
/// for that component; the audit as a whole never fails the scan.
pub struct AuditComponentsUseCase<V>
where
    V: VulnerabilitySource,
{
    vulnerability_source: V,
    observer: Arc<dyn ScanObserver>,
}

impl<V> AuditComponentsUseCase<V>
where
    V: VulnerabilitySource,
{
    /// Creates a new use case instance with injected dependencies
    ///
    /// # Arguments
    /// * `vulnerability_source` - External vulnerability database client
    /// * `observer` - Sink for progress and warnings
    pub fn new(vulnerability_source: V, observer: Arc<dyn ScanObserver>) -> Self {
        Self {
            vulnerability_source,
            observer,
        }
    }

    /// Audits the given components and returns every finding.
    ///
    /// Components without a package URL cannot be matched against the
    /// database and are skipped silently.
    ///
    /// # Arguments
    /// * `components` - Deduplicated component inventory to audit
    ///
    /// # Returns
    /// * `Vec<Finding>` - Findings across all components, possibly empty
    pub async fn execute(&self, components: &[Component]) -> Vec<Finding> {
        let auditable: Vec<&Component> = components
            .iter()
            .filter(|component| component.package_url().is_some())
            .collect();

        let total = auditable.len();
        let mut findings = Vec::new();

        for (index, component) in auditable.iter().enumerate() {
            self.observer
                .progress(index + 1, total, Some(component.name()));
            findings.extend(self.audit_component(component).await);
        }

        findings
    }

    /// Queries the source for one component, swallowing failures.
    async fn audit_component(&self, component: &Component) -> Vec<Finding> {
        let Some(package_url) = component.package_url() else {
            return Vec::new();
        };

        let records = match self.vulnerability_source.query(package_url).await {
            Ok(records) => records,
            Err(error) => {
                self.observer.warn(&format!(
                    "vulnerability lookup failed for {}: {}",
                    component.name(),
                    error
                ));
                return Vec::new();
            }
        };

        records
            .into_iter()
            .map(|record| Finding {
                component: format!("{}@{}", component.name(), component.version()),
                id: record.id,
                severity: record
                    .severity
                    .as_deref()
                    .map(Severity::parse)
                    .unwrap_or(Severity::Unknown),
                description: record.summary,
            })
            .collect()
    }
}
