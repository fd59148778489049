use crate::inventory::domain::{
    Component, Finding, OrganizationSummary, RepositoryStatus, ScanResult, ScanStats,
};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use std::collections::HashSet;

/// Inline stylesheet so the report stays a single portable file
const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem auto; max-width: 60rem; color: #1f2933; }
h1 { border-bottom: 2px solid #d9e2ec; padding-bottom: 0.4rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid #d9e2ec; padding: 0.45rem 0.6rem; text-align: left; }
th { background: #f0f4f8; }
tr:nth-child(even) { background: #f8fafc; }
.meta { color: #52606d; }
.badge { border-radius: 0.6rem; padding: 0.1rem 0.55rem; font-size: 0.85rem; color: #fff; white-space: nowrap; }
.severity-critical { background: #b91c1c; }
.severity-high { background: #ea580c; }
.severity-medium { background: #ca8a04; }
.severity-low { background: #15803d; }
.severity-unknown { background: #64748b; }
.status-success { background: #15803d; }
.status-failed { background: #b91c1c; }
.attribution { color: #52606d; font-size: 0.85rem; margin-top: 2rem; }
"#;

/// HtmlFormatter adapter for generating self-contained HTML reports
///
/// This adapter implements the ReportFormatter port for HTML output.
/// The generated page embeds its stylesheet, so a single file can be
/// archived or attached without extra assets.
pub struct HtmlFormatter;

impl HtmlFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Escapes text for safe interpolation into HTML element content
    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    /// Prefixes the group when present
    fn display_name(component: &Component) -> String {
        match component.group() {
            Some(group) => format!("{}/{}", group, component.name()),
            None => component.name().to_string(),
        }
    }
}

/// Helper methods for rendering sections
impl HtmlFormatter {
    fn render_page_open(&self, output: &mut String, title: &str) {
        output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        output.push_str("<meta charset=\"utf-8\">\n");
        output.push_str(&format!("<title>{}</title>\n", Self::escape_html(title)));
        output.push_str(&format!("<style>{}</style>\n", STYLE));
        output.push_str("</head>\n<body>\n");
        output.push_str(&format!("<h1>{}</h1>\n", Self::escape_html(title)));
    }

    fn render_page_close(&self, output: &mut String) {
        output.push_str("</body>\n</html>\n");
    }

    fn render_stats(&self, output: &mut String, stats: &ScanStats) {
        output.push_str("<h2>Summary</h2>\n<table>\n");
        output.push_str("<tr><th>Metric</th><th>Count</th></tr>\n");
        output.push_str(&format!(
            "<tr><td>Total components</td><td>{}</td></tr>\n",
            stats.total_components
        ));
        output.push_str(&format!(
            "<tr><td>Direct</td><td>{}</td></tr>\n",
            stats.direct_deps
        ));
        output.push_str(&format!(
            "<tr><td>Transitive</td><td>{}</td></tr>\n",
            stats.transitive_deps
        ));
        output.push_str(&format!("<tr><td>Dev</td><td>{}</td></tr>\n", stats.dev_deps));
        output.push_str("</table>\n");
    }

    fn render_components(&self, output: &mut String, components: &[Component]) {
        output.push_str("<h2>Component Inventory</h2>\n");

        if components.is_empty() {
            output.push_str("<p class=\"meta\">No components found.</p>\n");
            return;
        }

        output.push_str("<table>\n");
        output.push_str("<tr><th>Package</th><th>Version</th><th>Scope</th><th>License</th></tr>\n");
        for component in components {
            output.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                Self::escape_html(&Self::display_name(component)),
                Self::escape_html(component.version()),
                component.scope().as_str(),
                Self::escape_html(component.license().unwrap_or("N/A"))
            ));
        }
        output.push_str("</table>\n");
    }

    fn render_vulnerabilities(&self, output: &mut String, findings: &[Finding]) {
        output.push_str("<h2>Vulnerability Report</h2>\n");

        if findings.is_empty() {
            output.push_str("<p>No known vulnerabilities were found.</p>\n");
            return;
        }

        let affected: HashSet<&str> = findings.iter().map(|f| f.component.as_str()).collect();
        output.push_str(&format!(
            "<p><strong>Found {} finding(s) across {} package(s).</strong></p>\n",
            findings.len(),
            affected.len()
        ));

        // Sort by severity (Critical first)
        let mut sorted: Vec<&Finding> = findings.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

        output.push_str("<table>\n");
        output.push_str("<tr><th>Package</th><th>Severity</th><th>Advisory</th><th>Details</th></tr>\n");
        for finding in sorted {
            let severity = finding.severity.as_str();
            output.push_str(&format!(
                "<tr><td>{}</td><td><span class=\"badge severity-{}\">{}</span></td><td>{}</td><td>{}</td></tr>\n",
                Self::escape_html(&finding.component),
                severity,
                severity,
                Self::escape_html(&finding.id),
                Self::escape_html(finding.description.as_deref().unwrap_or(""))
            ));
        }
        output.push_str("</table>\n");
        output.push_str(
            "<p class=\"attribution\">Vulnerability data provided by <a href=\"https://osv.dev\">OSV</a> under CC-BY 4.0</p>\n",
        );
    }

    fn render_repository_outcomes(&self, output: &mut String, summary: &OrganizationSummary) {
        output.push_str("<h2>Repository Results</h2>\n");

        if summary.repositories.is_empty() {
            output.push_str("<p class=\"meta\">No repositories were scanned.</p>\n");
            return;
        }

        output.push_str("<table>\n");
        output.push_str(
            "<tr><th>Repository</th><th>Status</th><th>Components</th><th>Vulnerabilities</th><th>Technologies</th></tr>\n",
        );
        for outcome in &summary.repositories {
            let status = outcome.status.as_str();
            output.push_str(&format!(
                "<tr><td>{}</td><td><span class=\"badge status-{}\">{}</span></td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                Self::escape_html(&outcome.name),
                status,
                status,
                outcome.components,
                outcome.vulnerabilities,
                Self::escape_html(&outcome.technologies.join(", "))
            ));
        }
        output.push_str("</table>\n");

        let failures: Vec<_> = summary
            .repositories
            .iter()
            .filter(|outcome| outcome.status == RepositoryStatus::Failed)
            .collect();
        if !failures.is_empty() {
            output.push_str("<h3>Failures</h3>\n<ul>\n");
            for outcome in failures {
                output.push_str(&format!(
                    "<li><strong>{}</strong>: {}</li>\n",
                    Self::escape_html(&outcome.name),
                    Self::escape_html(outcome.error.as_deref().unwrap_or("unknown error"))
                ));
            }
            output.push_str("</ul>\n");
        }
    }

    fn render_technology_distribution(&self, output: &mut String, summary: &OrganizationSummary) {
        if summary.technology_distribution.is_empty() {
            return;
        }

        output.push_str("<h2>Technology Distribution</h2>\n<table>\n");
        output.push_str("<tr><th>Technology</th><th>Repositories</th></tr>\n");
        for (technology, count) in &summary.technology_distribution {
            output.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                Self::escape_html(technology),
                count
            ));
        }
        output.push_str("</table>\n");
    }
}

impl Default for HtmlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HtmlFormatter {
    fn format_repository(&self, result: &ScanResult) -> Result<String> {
        let mut output = String::new();

        self.render_page_open(
            &mut output,
            &format!("SBOM: {}", result.metadata.repository()),
        );
        output.push_str(&format!(
            "<p class=\"meta\">Generated {} by {} {}",
            result.metadata.timestamp().format("%Y-%m-%d %H:%M:%S UTC"),
            Self::escape_html(result.metadata.tool_name()),
            Self::escape_html(result.metadata.tool_version())
        ));
        let technologies = result.metadata.technologies();
        if !technologies.is_empty() {
            output.push_str(&format!(
                " &middot; Technologies: {}",
                Self::escape_html(&technologies.join(", "))
            ));
        }
        output.push_str("</p>\n");

        self.render_stats(&mut output, &result.stats);
        self.render_components(&mut output, &result.components);

        if let Some(findings) = &result.vulnerabilities {
            self.render_vulnerabilities(&mut output, findings);
        }

        self.render_page_close(&mut output);
        Ok(output)
    }

    fn format_organization(&self, summary: &OrganizationSummary) -> Result<String> {
        let mut output = String::new();

        self.render_page_open(
            &mut output,
            &format!("Organization Dependency Report: {}", summary.organization),
        );
        output.push_str(&format!(
            "<p class=\"meta\">Generated {} &middot; {} scanned, {} succeeded, {} failed &middot; {} components, {} vulnerabilities</p>\n",
            summary.scan_date.format("%Y-%m-%d %H:%M:%S UTC"),
            summary.repositories.len(),
            summary.successful_scans,
            summary.failed_scans,
            summary.total_components,
            summary.total_vulnerabilities
        ));

        self.render_repository_outcomes(&mut output, summary);
        self.render_technology_distribution(&mut output, summary);

        self.render_page_close(&mut output);
        Ok(output)
    }
}
