use super::component::Component;
use chrono::{DateTime, Utc};

/// Normalized severity of a vulnerability finding.
///
/// The value is passed through from the vulnerability source and only
/// normalized for display and threshold comparison, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parses a severity string from a vulnerability database.
    /// GHSA-style "MODERATE" maps to medium; unrecognized values are Unknown.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" | "moderate" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One vulnerability match returned by the audit bridge for a component.
#[derive(Debug, Clone)]
pub struct Finding {
    pub component: String,
    pub id: String,
    pub severity: Severity,
    pub description: Option<String>,
}

/// Metadata describing one repository scan.
#[derive(Debug, Clone)]
pub struct ScanMetadata {
    repository: String,
    timestamp: DateTime<Utc>,
    technologies: Vec<String>,
    tool_name: String,
    tool_version: String,
}

impl ScanMetadata {
    pub fn new(repository: String, technologies: Vec<String>) -> Self {
        Self {
            repository,
            timestamp: Utc::now(),
            technologies,
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn technologies(&self) -> &[String] {
        &self.technologies
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }
}

/// Derived component counts for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    pub total_components: usize,
    pub direct_deps: usize,
    pub transitive_deps: usize,
    pub dev_deps: usize,
}

impl ScanStats {
    /// Computes stats from a deduplicated component sequence.
    pub fn from_components(components: &[Component]) -> Self {
        use super::component::DependencyScope;

        let mut stats = ScanStats {
            total_components: components.len(),
            ..Default::default()
        };
        for component in components {
            match component.scope() {
                DependencyScope::Direct => stats.direct_deps += 1,
                DependencyScope::Transitive => stats.transitive_deps += 1,
                DependencyScope::Dev => stats.dev_deps += 1,
            }
        }
        stats
    }
}

/// Output of one repository scan.
///
/// `components` is already deduplicated; `vulnerabilities` is present
/// only when an audit was requested (`Some(vec![])` means the audit ran
/// and found nothing).
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub metadata: ScanMetadata,
    pub components: Vec<Component>,
    pub stats: ScanStats,
    pub vulnerabilities: Option<Vec<Finding>>,
}

impl ScanResult {
    pub fn new(
        metadata: ScanMetadata,
        components: Vec<Component>,
        vulnerabilities: Option<Vec<Finding>>,
    ) -> Self {
        let stats = ScanStats::from_components(&components);
        Self {
            metadata,
            components,
            stats,
            vulnerabilities,
        }
    }

    pub fn vulnerability_count(&self) -> usize {
        self.vulnerabilities.as_ref().map_or(0, |v| v.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::domain::component::DependencyScope;

    fn component(name: &str, scope: DependencyScope) -> Component {
        Component::new(name, "1.0.0", scope).unwrap()
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse("High"), Severity::High);
        assert_eq!(Severity::parse("medium"), Severity::Medium);
        assert_eq!(Severity::parse("MODERATE"), Severity::Medium);
        assert_eq!(Severity::parse("low"), Severity::Low);
        assert_eq!(Severity::parse("weird"), Severity::Unknown);
        assert_eq!(Severity::parse(""), Severity::Unknown);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Unknown);
    }

    #[test]
    fn test_stats_from_components() {
        let components = vec![
            component("a", DependencyScope::Direct),
            component("b", DependencyScope::Direct),
            component("c", DependencyScope::Transitive),
            component("d", DependencyScope::Dev),
        ];
        let stats = ScanStats::from_components(&components);
        assert_eq!(stats.total_components, 4);
        assert_eq!(stats.direct_deps, 2);
        assert_eq!(stats.transitive_deps, 1);
        assert_eq!(stats.dev_deps, 1);
        assert_eq!(
            stats.direct_deps + stats.transitive_deps + stats.dev_deps,
            stats.total_components
        );
    }

    #[test]
    fn test_scan_result_total_matches_component_count() {
        let metadata = ScanMetadata::new("acme/widget".to_string(), vec!["rust".to_string()]);
        let components = vec![
            component("serde", DependencyScope::Direct),
            component("tokio", DependencyScope::Direct),
        ];
        let result = ScanResult::new(metadata, components, None);
        assert_eq!(result.stats.total_components, result.components.len());
        assert_eq!(result.vulnerability_count(), 0);
        assert!(result.vulnerabilities.is_none());
    }

    #[test]
    fn test_scan_result_with_audit_findings() {
        let metadata = ScanMetadata::new("acme/widget".to_string(), vec![]);
        let findings = vec![Finding {
            component: "requests".to_string(),
            id: "GHSA-j8r2-6x86-q33q".to_string(),
            severity: Severity::Medium,
            description: Some("Unintended leak of Proxy-Authorization header".to_string()),
        }];
        let result = ScanResult::new(metadata, vec![], Some(findings));
        assert_eq!(result.vulnerability_count(), 1);
    }

    #[test]
    fn test_metadata_carries_tool_identity() {
        let metadata = ScanMetadata::new("acme/widget".to_string(), vec![]);
        assert_eq!(metadata.tool_name(), "repo-sbom");
        assert!(!metadata.tool_version().is_empty());
        assert_eq!(metadata.repository(), "acme/widget");
    }
}
