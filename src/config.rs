//! Configuration support for repo-sbom.
//!
//! Settings merge four layers with ascending precedence: built-in defaults,
//! a YAML file (`sbom-config.yaml` next to the invocation, or an explicit
//! `--config` path), `SBOM_*` environment variables, and command-line flags.
//! A structurally unparsable file is fatal; every other bad value produces a
//! warning and the scan proceeds with the default for that field.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::application::dto::{OutputFormat, ScanSettings};
use crate::inventory::domain::Severity;
use crate::shared::{Result, ScanError};

/// File names probed during auto-discovery, in order.
const CONFIG_FILENAMES: &[&str] = &["sbom-config.yaml", ".sbom-config.yaml"];

const DEFAULT_MAX_DEPTH: usize = 5;
const DEFAULT_PARALLEL_WORKERS: usize = 4;
const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Top-level configuration file schema.
///
/// Every field is optional so a file only overrides what it names.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub scan: Option<ScanSection>,
    pub audit: Option<AuditSection>,
    pub output: Option<OutputSection>,
    pub github: Option<GithubSection>,
    pub timeout: Option<u64>,
    pub verbose: Option<bool>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: BTreeMap<String, serde_yaml_ng::Value>,
}

/// `scan:` section of the configuration file.
#[derive(Debug, Deserialize, Default)]
pub struct ScanSection {
    pub include_dev_dependencies: Option<bool>,
    pub max_depth: Option<usize>,
    pub parallel_workers: Option<usize>,
    pub ignore_patterns: Option<Vec<String>>,
}

/// `audit:` section of the configuration file.
#[derive(Debug, Deserialize, Default)]
pub struct AuditSection {
    pub databases: Option<Vec<String>>,
    pub fail_on_critical: Option<bool>,
    pub severity_threshold: Option<String>,
}

/// `output:` section of the configuration file.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSection {
    pub formats: Option<Vec<String>>,
}

/// `github:` section of the configuration file.
#[derive(Debug, Deserialize, Default)]
pub struct GithubSection {
    pub token: Option<String>,
}

/// Load config from an explicit path. Returns an error if the file cannot
/// be read or parsed.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| ScanError::ConfigParseError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    let config: ConfigFile =
        serde_yaml_ng::from_str(&content).map_err(|e| ScanError::ConfigParseError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if no
/// recognized file is present.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    for name in CONFIG_FILENAMES {
        let config_path = dir.join(name);
        if config_path.exists() {
            return load_config_from_path(&config_path).map(Some);
        }
    }
    Ok(None)
}

/// Fully resolved runtime settings after layering defaults, file and
/// environment. Command-line flags are applied last by the entrypoint.
#[derive(Debug, Clone)]
pub struct Settings {
    pub include_dev: bool,
    pub max_depth: usize,
    pub parallel_workers: usize,
    pub ignore_patterns: Vec<String>,
    pub tool_timeout: Duration,
    pub databases: Vec<String>,
    pub fail_on_critical: bool,
    pub severity_threshold: Severity,
    pub formats: Vec<OutputFormat>,
    pub github_token: Option<String>,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_dev: false,
            max_depth: DEFAULT_MAX_DEPTH,
            parallel_workers: DEFAULT_PARALLEL_WORKERS,
            ignore_patterns: vec![
                "*.test.*".to_string(),
                "node_modules/".to_string(),
                "vendor/".to_string(),
                ".git/".to_string(),
            ],
            tool_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            databases: vec!["osv".to_string()],
            fail_on_critical: true,
            severity_threshold: Severity::Medium,
            formats: vec![OutputFormat::CycloneDxJson, OutputFormat::Html],
            github_token: None,
            verbose: false,
        }
    }
}

impl Settings {
    /// Layer an optional config file and the process environment over the
    /// defaults. Returns the settings together with the warnings produced
    /// by values that had to be ignored.
    pub fn resolve(file: Option<ConfigFile>) -> (Self, Vec<String>) {
        let mut settings = Self::default();
        let mut warnings = Vec::new();

        if let Some(file) = file {
            settings.apply_file(file, &mut warnings);
        }
        settings.apply_env_pairs(std::env::vars(), &mut warnings);

        (settings, warnings)
    }

    /// Apply values from a parsed configuration file.
    fn apply_file(&mut self, file: ConfigFile, warnings: &mut Vec<String>) {
        for key in file.unknown_fields.keys() {
            warnings.push(format!("Unknown config field '{}' will be ignored", key));
        }

        if let Some(scan) = file.scan {
            if let Some(include_dev) = scan.include_dev_dependencies {
                self.include_dev = include_dev;
            }
            if let Some(max_depth) = scan.max_depth {
                self.max_depth = max_depth;
            }
            if let Some(parallel_workers) = scan.parallel_workers {
                self.parallel_workers = parallel_workers;
            }
            if let Some(ignore_patterns) = scan.ignore_patterns {
                self.ignore_patterns = ignore_patterns;
            }
        }

        if let Some(audit) = file.audit {
            if let Some(databases) = audit.databases {
                self.databases = databases;
            }
            if let Some(fail_on_critical) = audit.fail_on_critical {
                self.fail_on_critical = fail_on_critical;
            }
            if let Some(name) = audit.severity_threshold {
                self.apply_severity_name(&name, warnings);
            }
        }

        if let Some(output) = file.output {
            if let Some(names) = output.formats {
                self.apply_format_names(&names, warnings);
            }
        }

        if let Some(github) = file.github {
            if let Some(token) = github.token {
                self.github_token = Some(token);
            }
        }

        if let Some(timeout) = file.timeout {
            self.tool_timeout = Duration::from_secs(timeout);
        }
        if let Some(verbose) = file.verbose {
            self.verbose = verbose;
        }
    }

    /// Apply `SBOM_*` overrides from an iterator of environment pairs.
    ///
    /// Taking the pairs as an argument keeps this testable without
    /// mutating the process environment.
    fn apply_env_pairs(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
        warnings: &mut Vec<String>,
    ) {
        for (key, value) in vars {
            match key.as_str() {
                "SBOM_INCLUDE_DEV" => match parse_bool(&value) {
                    Some(flag) => self.include_dev = flag,
                    None => warnings.push(invalid_env(&key, &value)),
                },
                "SBOM_MAX_DEPTH" => match value.parse::<usize>() {
                    Ok(depth) => self.max_depth = depth,
                    Err(_) => warnings.push(invalid_env(&key, &value)),
                },
                "SBOM_PARALLEL_WORKERS" => match value.parse::<usize>() {
                    Ok(workers) => self.parallel_workers = workers,
                    Err(_) => warnings.push(invalid_env(&key, &value)),
                },
                "SBOM_TIMEOUT" => match value.parse::<u64>() {
                    Ok(seconds) => self.tool_timeout = Duration::from_secs(seconds),
                    Err(_) => warnings.push(invalid_env(&key, &value)),
                },
                "SBOM_FAIL_ON_CRITICAL" => match parse_bool(&value) {
                    Some(flag) => self.fail_on_critical = flag,
                    None => warnings.push(invalid_env(&key, &value)),
                },
                "SBOM_SEVERITY_THRESHOLD" => self.apply_severity_name(&value, warnings),
                "SBOM_OUTPUT_FORMATS" => {
                    let names: Vec<String> =
                        value.split(',').map(|s| s.trim().to_string()).collect();
                    self.apply_format_names(&names, warnings);
                }
                "GITHUB_TOKEN" => {
                    if !value.is_empty() {
                        self.github_token = Some(value);
                    }
                }
                _ => {}
            }
        }
    }

    /// Apply a severity threshold by name, warning when unrecognized.
    fn apply_severity_name(&mut self, name: &str, warnings: &mut Vec<String>) {
        match known_severity(name) {
            Some(severity) => self.severity_threshold = severity,
            None => warnings.push(format!(
                "Invalid severity threshold '{}'; keeping '{}'",
                name, self.severity_threshold
            )),
        }
    }

    /// Replace the format list, skipping names that do not parse. An
    /// all-invalid list keeps the previous formats so reports still come out.
    fn apply_format_names(&mut self, names: &[String], warnings: &mut Vec<String>) {
        let mut formats = Vec::new();
        for name in names {
            match name.parse::<OutputFormat>() {
                Ok(format) => {
                    if !formats.contains(&format) {
                        formats.push(format);
                    }
                }
                Err(_) => warnings.push(format!("Invalid output format '{}' will be ignored", name)),
            }
        }
        if !formats.is_empty() {
            self.formats = formats;
        }
    }

    /// Range checks that do not block the scan; callers print these as
    /// warnings and the affected consumer clamps the value.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.parallel_workers == 0 {
            warnings.push("parallel_workers is 0; the scan will use 1 worker".to_string());
        }
        if self.tool_timeout.is_zero() {
            warnings.push(
                "timeout is 0; external tools will be skipped in favor of manifest parsing"
                    .to_string(),
            );
        }
        for database in &self.databases {
            if database != "osv" {
                warnings.push(format!(
                    "Unsupported vulnerability database '{}' will be ignored",
                    database
                ));
            }
        }
        if !self.databases.iter().any(|d| d == "osv") {
            warnings.push(
                "No supported vulnerability database is configured; audits will be skipped"
                    .to_string(),
            );
        }

        warnings
    }

    /// Scanner-facing view of these settings.
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings::new(
            self.tool_timeout,
            self.max_depth,
            self.ignore_patterns.clone(),
        )
    }
}

fn invalid_env(key: &str, value: &str) -> String {
    format!("Invalid value '{}' for {} will be ignored", value, key)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Severity names accepted as a threshold. Unlike record parsing, an
/// unrecognized name here is a user mistake and must be surfaced.
fn known_severity(name: &str) -> Option<Severity> {
    match name.trim().to_ascii_lowercase().as_str() {
        "critical" => Some(Severity::Critical),
        "high" => Some(Severity::High),
        "medium" | "moderate" => Some(Severity::Medium),
        "low" => Some(Severity::Low),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.include_dev);
        assert_eq!(settings.max_depth, 5);
        assert_eq!(settings.parallel_workers, 4);
        assert!(settings.ignore_patterns.contains(&"node_modules/".to_string()));
        assert_eq!(settings.tool_timeout, Duration::from_secs(300));
        assert_eq!(settings.databases, vec!["osv".to_string()]);
        assert!(settings.fail_on_critical);
        assert_eq!(settings.severity_threshold, Severity::Medium);
        assert_eq!(
            settings.formats,
            vec![OutputFormat::CycloneDxJson, OutputFormat::Html]
        );
        assert!(settings.github_token.is_none());
        assert!(!settings.verbose);
    }

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::write(
            &config_path,
            r#"
scan:
  include_dev_dependencies: true
  max_depth: 8
  parallel_workers: 2
audit:
  fail_on_critical: false
  severity_threshold: high
output:
  formats:
    - markdown
timeout: 120
"#,
        )
        .unwrap();

        let file = load_config_from_path(&config_path).unwrap();
        let mut warnings = Vec::new();
        let mut settings = Settings::default();
        settings.apply_file(file, &mut warnings);

        assert!(warnings.is_empty());
        assert!(settings.include_dev);
        assert_eq!(settings.max_depth, 8);
        assert_eq!(settings.parallel_workers, 2);
        assert!(!settings.fail_on_critical);
        assert_eq!(settings.severity_threshold, Severity::High);
        assert_eq!(settings.formats, vec![OutputFormat::Markdown]);
        assert_eq!(settings.tool_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("sbom-config.yaml"),
            "scan:\n  max_depth: 3\n",
        )
        .unwrap();

        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_some());
        assert_eq!(config.unwrap().scan.unwrap().max_depth, Some(3));
    }

    #[test]
    fn test_discover_config_dotted_fallback() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".sbom-config.yaml"),
            "verbose: true\n",
        )
        .unwrap();

        let config = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.verbose, Some(true));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/sbom-config.yaml"));
        assert!(result.is_err());
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to parse configuration file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.yaml");
        fs::write(&config_path, "scan: [[[broken").unwrap();

        let result = load_config_from_path(&config_path);
        assert!(result.is_err());
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to parse configuration file"));
        assert!(err.contains("bad.yaml"));
    }

    #[test]
    fn test_unknown_fields_warn_but_do_not_abort() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::write(&config_path, "cache:\n  enabled: true\nproxy: http://proxy\n").unwrap();

        let file = load_config_from_path(&config_path).unwrap();
        let mut warnings = Vec::new();
        let mut settings = Settings::default();
        settings.apply_file(file, &mut warnings);

        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("'cache'")));
        assert!(warnings.iter().any(|w| w.contains("'proxy'")));
        assert_eq!(settings.max_depth, 5);
    }

    #[test]
    fn test_invalid_severity_threshold_warns_and_keeps_default() {
        let mut warnings = Vec::new();
        let mut settings = Settings::default();
        settings.apply_severity_name("catastrophic", &mut warnings);

        assert_eq!(settings.severity_threshold, Severity::Medium);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Invalid severity threshold"));
    }

    #[test]
    fn test_invalid_format_warns_and_keeps_previous() {
        let mut warnings = Vec::new();
        let mut settings = Settings::default();
        settings.apply_format_names(&["yaml".to_string()], &mut warnings);

        assert_eq!(
            settings.formats,
            vec![OutputFormat::CycloneDxJson, OutputFormat::Html]
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Invalid output format"));
    }

    #[test]
    fn test_env_overrides() {
        let mut warnings = Vec::new();
        let mut settings = Settings::default();
        settings.apply_env_pairs(
            env(&[
                ("SBOM_INCLUDE_DEV", "true"),
                ("SBOM_MAX_DEPTH", "7"),
                ("SBOM_PARALLEL_WORKERS", "9"),
                ("SBOM_TIMEOUT", "60"),
                ("SBOM_FAIL_ON_CRITICAL", "false"),
                ("SBOM_SEVERITY_THRESHOLD", "high"),
                ("SBOM_OUTPUT_FORMATS", "spdx-json, text"),
                ("GITHUB_TOKEN", "env_token"),
                ("UNRELATED", "ignored"),
            ]),
            &mut warnings,
        );

        assert!(warnings.is_empty());
        assert!(settings.include_dev);
        assert_eq!(settings.max_depth, 7);
        assert_eq!(settings.parallel_workers, 9);
        assert_eq!(settings.tool_timeout, Duration::from_secs(60));
        assert!(!settings.fail_on_critical);
        assert_eq!(settings.severity_threshold, Severity::High);
        assert_eq!(
            settings.formats,
            vec![OutputFormat::SpdxJson, OutputFormat::Text]
        );
        assert_eq!(settings.github_token.as_deref(), Some("env_token"));
    }

    #[test]
    fn test_env_beats_file() {
        let mut warnings = Vec::new();
        let mut settings = Settings::default();
        settings.apply_file(
            ConfigFile {
                scan: Some(ScanSection {
                    max_depth: Some(2),
                    ..Default::default()
                }),
                ..Default::default()
            },
            &mut warnings,
        );
        settings.apply_env_pairs(env(&[("SBOM_MAX_DEPTH", "9")]), &mut warnings);

        assert_eq!(settings.max_depth, 9);
    }

    #[test]
    fn test_invalid_env_value_warns() {
        let mut warnings = Vec::new();
        let mut settings = Settings::default();
        settings.apply_env_pairs(env(&[("SBOM_MAX_DEPTH", "lots")]), &mut warnings);

        assert_eq!(settings.max_depth, 5);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("SBOM_MAX_DEPTH"));
    }

    #[test]
    fn test_validate_flags_zero_workers_and_foreign_databases() {
        let mut settings = Settings::default();
        settings.parallel_workers = 0;
        settings.databases = vec!["osv".to_string(), "nvd".to_string()];

        let warnings = settings.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("parallel_workers"));
        assert!(warnings[1].contains("'nvd'"));
    }

    #[test]
    fn test_validate_warns_when_no_supported_database_remains() {
        let mut settings = Settings::default();
        settings.databases = vec!["nvd".to_string()];

        let warnings = settings.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].contains("audits will be skipped"));
    }

    #[test]
    fn test_validate_clean_settings() {
        assert!(Settings::default().validate().is_empty());
    }

    #[test]
    fn test_scan_settings_projection() {
        let settings = Settings::default();
        let scan_settings = settings.scan_settings();
        assert_eq!(scan_settings.tool_timeout, Duration::from_secs(300));
        assert_eq!(scan_settings.max_depth, 5);
        assert_eq!(scan_settings.ignore_patterns, settings.ignore_patterns);
    }
}
