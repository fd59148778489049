use crate::inventory::domain::{OrganizationSummary, ScanResult};
use crate::shared::Result;

/// ReportFormatter port for rendering scan output
///
/// This port abstracts the rendering logic for the different report
/// formats (CycloneDX JSON, SPDX JSON, Markdown, plain text, HTML).
/// Formatters treat every field of the result structures as optional or
/// defaultable: an audit-less scan has no vulnerabilities, a failed
/// repository has no technologies, and so on.
pub trait ReportFormatter {
    /// Renders a single-repository report.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    fn format_repository(&self, result: &ScanResult) -> Result<String>;

    /// Renders an organization summary report.
    ///
    /// # Errors
    /// Returns an error if serialization fails or the format has no
    /// organization-level document (CycloneDX and SPDX are
    /// per-repository formats).
    fn format_organization(&self, summary: &OrganizationSummary) -> Result<String>;

    /// Whether this format defines an organization-level document.
    fn supports_organization(&self) -> bool {
        true
    }
}
