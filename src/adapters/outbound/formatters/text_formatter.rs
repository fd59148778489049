use crate::inventory::domain::{
    Component, Finding, OrganizationSummary, RepositoryStatus, ScanResult, ScanStats,
};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use std::collections::HashSet;

/// Width of the banner rule at the top of each report
const RULE_WIDTH: usize = 72;

/// TextFormatter adapter for generating plain-text reports
///
/// This adapter implements the ReportFormatter port for console-friendly
/// text output, covering both repository and organization reports.
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    fn render_banner(&self, output: &mut String, title: &str) {
        output.push_str(&"=".repeat(RULE_WIDTH));
        output.push('\n');
        output.push_str(title);
        output.push('\n');
        output.push_str(&"=".repeat(RULE_WIDTH));
        output.push_str("\n\n");
    }

    fn render_section(&self, output: &mut String, title: &str) {
        output.push_str(title);
        output.push('\n');
        output.push_str(&"-".repeat(title.len()));
        output.push('\n');
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
impl TextFormatter {
    fn render_stats(&self, output: &mut String, stats: &ScanStats) {
        self.render_section(output, "Summary");
        output.push_str(&format!("Total components: {}\n", stats.total_components));
        output.push_str(&format!("Direct:           {}\n", stats.direct_deps));
        output.push_str(&format!("Transitive:       {}\n", stats.transitive_deps));
        output.push_str(&format!("Dev:              {}\n", stats.dev_deps));
        output.push('\n');
    }

    fn render_components(&self, output: &mut String, components: &[Component]) {
        self.render_section(output, "Components");

        if components.is_empty() {
            output.push_str("(none found)\n\n");
            return;
        }

        output.push_str(&format!(
            "{:<44} {:<16} {:<12} {}\n",
            "NAME", "VERSION", "SCOPE", "LICENSE"
        ));
        for component in components {
            output.push_str(&format!(
                "{:<44} {:<16} {:<12} {}\n",
                Self::display_name(component),
                component.version(),
                component.scope().as_str(),
                component.license().unwrap_or("N/A")
            ));
        }
        output.push('\n');
    }

    fn render_vulnerabilities(&self, output: &mut String, findings: &[Finding]) {
        self.render_section(output, "Vulnerabilities");

        if findings.is_empty() {
            output.push_str("No known vulnerabilities were found.\n\n");
            return;
        }

        let affected: HashSet<&str> = findings.iter().map(|f| f.component.as_str()).collect();
        output.push_str(&format!(
            "Found {} finding(s) across {} package(s).\n\n",
            findings.len(),
            affected.len()
        ));

        // Sort by severity (Critical first)
        let mut sorted: Vec<&Finding> = findings.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

        output.push_str(&format!(
            "{:<36} {:<10} {}\n",
            "PACKAGE", "SEVERITY", "ADVISORY"
        ));
        for finding in sorted {
            output.push_str(&format!(
                "{:<36} {:<10} {}\n",
                finding.component,
                finding.severity.as_str(),
                finding.id
            ));
        }
        output.push('\n');
        output.push_str("Vulnerability data provided by OSV (https://osv.dev) under CC-BY 4.0\n");
    }

    fn render_repository_outcomes(&self, output: &mut String, summary: &OrganizationSummary) {
        self.render_section(output, "Repository Results");

        if summary.repositories.is_empty() {
            output.push_str("(no repositories were scanned)\n\n");
            return;
        }

        output.push_str(&format!(
            "{:<36} {:<9} {:>10} {:>6}  {}\n",
            "NAME", "STATUS", "COMPONENTS", "VULNS", "TECHNOLOGIES"
        ));
        for outcome in &summary.repositories {
            let technologies = match outcome.status {
                RepositoryStatus::Success => outcome.technologies.join(", "),
                RepositoryStatus::Failed => {
                    format!("({})", outcome.error.as_deref().unwrap_or("unknown error"))
                }
            };
            output.push_str(&format!(
                "{:<36} {:<9} {:>10} {:>6}  {}\n",
                outcome.name,
                outcome.status.as_str(),
                outcome.components,
                outcome.vulnerabilities,
                technologies
            ));
        }
        output.push('\n');
    }

    fn render_technology_distribution(&self, output: &mut String, summary: &OrganizationSummary) {
        if summary.technology_distribution.is_empty() {
            return;
        }

        self.render_section(output, "Technology Distribution");
        for (technology, count) in &summary.technology_distribution {
            output.push_str(&format!(
                "{}: {} {}\n",
                technology,
                count,
                if *count == 1 { "repository" } else { "repositories" }
            ));
        }
        output.push('\n');
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for TextFormatter {
    fn format_repository(&self, result: &ScanResult) -> Result<String> {
        let mut output = String::new();

        self.render_banner(&mut output, "Software Bill of Materials");
        output.push_str(&format!("Repository:   {}\n", result.metadata.repository()));
        output.push_str(&format!(
            "Generated:    {}\n",
            result.metadata.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "Tool:         {} {}\n",
            result.metadata.tool_name(),
            result.metadata.tool_version()
        ));
        let technologies = result.metadata.technologies();
        if !technologies.is_empty() {
            output.push_str(&format!("Technologies: {}\n", technologies.join(", ")));
        }
        output.push('\n');

        self.render_stats(&mut output, &result.stats);
        self.render_components(&mut output, &result.components);

        if let Some(findings) = &result.vulnerabilities {
            self.render_vulnerabilities(&mut output, findings);
        }

        Ok(output)
    }

    fn format_organization(&self, summary: &OrganizationSummary) -> Result<String> {
        let mut output = String::new();

        self.render_banner(
            &mut output,
            &format!("Organization Dependency Report: {}", summary.organization),
        );
        output.push_str(&format!(
            "Generated:             {}\n",
            summary.scan_date.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "Repositories:          {} scanned, {} succeeded, {} failed\n",
            summary.repositories.len(),
            summary.successful_scans,
            summary.failed_scans
        ));
        output.push_str(&format!(
            "Total components:      {}\n",
            summary.total_components
        ));
        output.push_str(&format!(
            "Total vulnerabilities: {}\n\n",
            summary.total_vulnerabilities
        ));

        self.render_repository_outcomes(&mut output, summary);
        self.render_technology_distribution(&mut output, summary);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::domain::{DependencyScope, RepositoryOutcome, ScanMetadata, Severity};

    fn create_test_result() -> ScanResult {
        let components = vec![
            Component::new("requests", "2.28.1", DependencyScope::Direct)
                .unwrap()
                .with_license("Apache-2.0"),
            Component::new("urllib3", "1.26.0", DependencyScope::Transitive).unwrap(),
        ];
        let metadata = ScanMetadata::new("demo-repo".to_string(), vec!["python".to_string()]);
        ScanResult::new(metadata, components, None)
    }

    #[test]
    fn test_repository_report() {
        let formatter = TextFormatter::new();
        let text = formatter.format_repository(&create_test_result()).unwrap();

        assert!(text.contains("Software Bill of Materials"));
        assert!(text.contains("Repository:   demo-repo"));
        assert!(text.contains("Total components: 2"));
        assert!(text.contains("requests"));
        assert!(text.contains("Apache-2.0"));
        assert!(text.contains("N/A"));
        assert!(!text.contains("Vulnerabilities"));
    }

    #[test]
    fn test_repository_report_with_findings() {
        let mut result = create_test_result();
        result.vulnerabilities = Some(vec![Finding {
            component: "requests@2.28.1".to_string(),
            id: "GHSA-j8r2-6x86-q33q".to_string(),
            severity: Severity::Medium,
            description: None,
        }]);

        let formatter = TextFormatter::new();
        let text = formatter.format_repository(&result).unwrap();

        assert!(text.contains("Found 1 finding(s) across 1 package(s)."));
        assert!(text.contains("GHSA-j8r2-6x86-q33q"));
        assert!(text.contains("https://osv.dev"));
    }

    #[test]
    fn test_organization_report() {
        let outcomes = vec![
            RepositoryOutcome::success("api".to_string(), 14, 0, vec!["go".to_string()]),
            RepositoryOutcome::failure("legacy".to_string(), "clone failed".to_string()),
        ];
        let summary = OrganizationSummary::from_outcomes("acme".to_string(), outcomes);

        let formatter = TextFormatter::new();
        let text = formatter.format_organization(&summary).unwrap();

        assert!(text.contains("Organization Dependency Report: acme"));
        assert!(text.contains("2 scanned, 1 succeeded, 1 failed"));
        assert!(text.contains("(clone failed)"));
        assert!(text.contains("go: 1 repository"));
    }
}
