use crate::inventory::domain::{
    Component, Finding, OrganizationSummary, RepositoryStatus, ScanResult, ScanStats, Severity,
};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use std::collections::HashSet;

/// Markdown table header for component information
const TABLE_HEADER: &str = "| Package | Version | Scope | License |\n";

/// Markdown table separator line
const TABLE_SEPARATOR: &str = "|---------|---------|-------|---------|\n";

/// Markdown table header for vulnerability information
const VULN_TABLE_HEADER: &str = "| Package | Severity | Advisory | Details |\n";

/// Markdown table separator line for vulnerability table
const VULN_TABLE_SEPARATOR: &str = "|---------|----------|----------|---------|\n";

/// Markdown table header for per-repository results
const REPO_TABLE_HEADER: &str =
    "| Repository | Status | Components | Vulnerabilities | Technologies |\n";

/// Markdown table separator line for per-repository results
const REPO_TABLE_SEPARATOR: &str =
    "|------------|--------|------------|-----------------|--------------|\n";

/// MarkdownFormatter adapter for generating human-readable Markdown reports
///
/// This adapter implements the ReportFormatter port for Markdown format and
/// renders both single-repository inventories and organization summaries.
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Escapes pipe characters and newlines for safe Markdown table rendering
    fn escape_markdown_table_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }

    /// Prefixes the group when present, e.g. `org.apache.commons/commons-lang3`
    fn display_name(component: &Component) -> String {
        match component.group() {
            Some(group) => format!("{}/{}", group, component.name()),
            None => component.name().to_string(),
        }
    }

    fn severity_emoji(severity: Severity) -> &'static str {
        match severity {
            Severity::Critical => "🔴",
            Severity::High => "🟠",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
            Severity::Unknown => "⚪",
        }
    }
}

/// Helper methods for rendering sections
impl MarkdownFormatter {
    /// Renders the repository report header
    fn render_repository_header(&self, output: &mut String, result: &ScanResult) {
        output.push_str("# Software Bill of Materials (SBOM)\n\n");
        output.push_str(&format!(
            "**Repository:** {}\n\n",
            Self::escape_markdown_table_cell(result.metadata.repository())
        ));
        output.push_str(&format!(
            "**Generated:** {}\n\n",
            result.metadata.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "**Tool:** {} {}\n\n",
            result.metadata.tool_name(),
            result.metadata.tool_version()
        ));
        let technologies = result.metadata.technologies();
        if !technologies.is_empty() {
            output.push_str(&format!("**Technologies:** {}\n\n", technologies.join(", ")));
        }
    }

    /// Renders the dependency statistics section
    fn render_stats(&self, output: &mut String, stats: &ScanStats) {
        output.push_str("## Summary\n\n");
        output.push_str("| Metric | Count |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Total components | {} |\n", stats.total_components));
        output.push_str(&format!("| Direct | {} |\n", stats.direct_deps));
        output.push_str(&format!("| Transitive | {} |\n", stats.transitive_deps));
        output.push_str(&format!("| Dev | {} |\n", stats.dev_deps));
        output.push('\n');
    }

    /// Renders the components section
    fn render_components(&self, output: &mut String, components: &[Component]) {
        output.push_str("## Component Inventory\n\n");
        output.push_str(
            "All software components and libraries detected in this repository.\n\n",
        );

        if components.is_empty() {
            output.push_str("*No components found*\n\n");
            return;
        }

        output.push_str(TABLE_HEADER);
        output.push_str(TABLE_SEPARATOR);

        for component in components {
            let license = component.license().unwrap_or("N/A");
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                Self::escape_markdown_table_cell(&Self::display_name(component)),
                Self::escape_markdown_table_cell(component.version()),
                component.scope().as_str(),
                Self::escape_markdown_table_cell(license)
            ));
        }
        output.push('\n');
    }

    /// Renders the vulnerabilities section
    fn render_vulnerabilities(&self, output: &mut String, findings: &[Finding]) {
        output.push_str("## Vulnerability Report\n\n");

        if findings.is_empty() {
            output.push_str("No known vulnerabilities were found.\n\n");
            return;
        }

        let affected: HashSet<&str> = findings.iter().map(|f| f.component.as_str()).collect();
        output.push_str(&format!(
            "**Found {} {} in {} {}.**\n\n",
            findings.len(),
            if findings.len() == 1 {
                "vulnerability"
            } else {
                "vulnerabilities"
            },
            affected.len(),
            if affected.len() == 1 {
                "package"
            } else {
                "packages"
            }
        ));

        output.push_str(VULN_TABLE_HEADER);
        output.push_str(VULN_TABLE_SEPARATOR);

        // Sort by severity (Critical first)
        let mut sorted: Vec<&Finding> = findings.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

        for finding in sorted {
            output.push_str(&format!(
                "| {} | {} {} | {} | {} |\n",
                Self::escape_markdown_table_cell(&finding.component),
                Self::severity_emoji(finding.severity),
                finding.severity.as_str(),
                Self::escape_markdown_table_cell(&finding.id),
                Self::escape_markdown_table_cell(finding.description.as_deref().unwrap_or("")),
            ));
        }
        output.push('\n');

        // Attribution
        output.push_str("---\n\n");
        output
            .push_str("*Vulnerability data provided by [OSV](https://osv.dev) under CC-BY 4.0*\n");
    }

    /// Renders the organization report header
    fn render_organization_header(&self, output: &mut String, summary: &OrganizationSummary) {
        output.push_str(&format!(
            "# Organization Dependency Report: {}\n\n",
            Self::escape_markdown_table_cell(&summary.organization)
        ));
        output.push_str(&format!(
            "**Generated:** {}\n\n",
            summary.scan_date.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "**Repositories:** {} scanned, {} succeeded, {} failed\n\n",
            summary.repositories.len(),
            summary.successful_scans,
            summary.failed_scans
        ));
        output.push_str(&format!(
            "**Total components:** {}\n\n",
            summary.total_components
        ));
        output.push_str(&format!(
            "**Total vulnerabilities:** {}\n\n",
            summary.total_vulnerabilities
        ));
    }

    /// Renders the per-repository results table
    fn render_repository_outcomes(&self, output: &mut String, summary: &OrganizationSummary) {
        output.push_str("## Repository Results\n\n");

        if summary.repositories.is_empty() {
            output.push_str("*No repositories were scanned*\n\n");
            return;
        }

        output.push_str(REPO_TABLE_HEADER);
        output.push_str(REPO_TABLE_SEPARATOR);

        for outcome in &summary.repositories {
            let status = match outcome.status {
                RepositoryStatus::Success => "✅ success",
                RepositoryStatus::Failed => "❌ failed",
            };
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                Self::escape_markdown_table_cell(&outcome.name),
                status,
                outcome.components,
                outcome.vulnerabilities,
                Self::escape_markdown_table_cell(&outcome.technologies.join(", "))
            ));
        }
        output.push('\n');

        let failures: Vec<_> = summary
            .repositories
            .iter()
            .filter(|outcome| outcome.status == RepositoryStatus::Failed)
            .collect();
        if !failures.is_empty() {
            output.push_str("### Failures\n\n");
            for outcome in failures {
                output.push_str(&format!(
                    "- **{}**: {}\n",
                    Self::escape_markdown_table_cell(&outcome.name),
                    Self::escape_markdown_table_cell(outcome.error.as_deref().unwrap_or("unknown error"))
                ));
            }
            output.push('\n');
        }
    }

    /// Renders the technology distribution table
    fn render_technology_distribution(&self, output: &mut String, summary: &OrganizationSummary) {
        if summary.technology_distribution.is_empty() {
            return;
        }

        output.push_str("## Technology Distribution\n\n");
        output.push_str("| Technology | Repositories |\n");
        output.push_str("|------------|--------------|\n");
        for (technology, count) in &summary.technology_distribution {
            output.push_str(&format!("| {} | {} |\n", technology, count));
        }
        output.push('\n');
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format_repository(&self, result: &ScanResult) -> Result<String> {
        let mut output = String::new();

        self.render_repository_header(&mut output, result);
        self.render_stats(&mut output, &result.stats);
        self.render_components(&mut output, &result.components);

        if let Some(findings) = &result.vulnerabilities {
            self.render_vulnerabilities(&mut output, findings);
        }

        Ok(output)
    }

    fn format_organization(&self, summary: &OrganizationSummary) -> Result<String> {
        let mut output = String::new();

        self.render_organization_header(&mut output, summary);
        self.render_repository_outcomes(&mut output, summary);
        self.render_technology_distribution(&mut output, summary);

        Ok(output)
    }
}
