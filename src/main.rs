mod adapters;
mod application;
mod cli;
mod config;
mod inventory;
mod ports;
mod scanners;
mod shared;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use adapters::outbound::console::StderrScanObserver;
use adapters::outbound::filesystem::ReportSink;
use adapters::outbound::git::GitCloner;
use adapters::outbound::network::{GithubClient, OsvClient};
use application::dto::{OrganizationScanRequest, RepositoryScanRequest};
use application::factories::FormatterFactory;
use application::use_cases::{ScanOrganizationUseCase, ScanRepositoryUseCase};
use cli::Args;
use config::Settings;
use inventory::domain::{OrganizationSummary, ScanResult};
use ports::outbound::{RepoFilters, ScanObserver};
use scanners::ScannerRegistry;
use shared::{ExitCode, Result, ScanError};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            for cause in e.chain().skip(1) {
                eprintln!("\nCaused by: {}", cause);
            }

            eprintln!();
            ExitCode::ApplicationError
        }
    };
    process::exit(exit_code.as_i32());
}

async fn run() -> Result<ExitCode> {
    // Step 1: Parse arguments and resolve the layered settings
    let args = Args::parse_args();
    let config_file = match &args.config {
        Some(path) => Some(config::load_config_from_path(path)?),
        None => config::discover_config(Path::new("."))?,
    };
    let (mut settings, mut warnings) = Settings::resolve(config_file);
    args.apply_to(&mut settings);
    warnings.extend(settings.validate());

    // Step 2: Build the observer and surface configuration warnings
    let observer: Arc<dyn ScanObserver> = Arc::new(StderrScanObserver::new(settings.verbose));
    for warning in &warnings {
        observer.warn(warning);
    }

    // Step 3: Arrange cooperative cancellation on Ctrl-C
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        let observer = Arc::clone(&observer);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
                observer
                    .warn("Cancellation requested; repositories already in flight will finish");
            }
        });
    }

    // Step 4: Dispatch on the selected target
    match (&args.repo, &args.org) {
        (Some(path), _) => run_repository_scan(path.clone(), &args, &settings, observer).await,
        (None, Some(organization)) => {
            run_organization_scan(organization.clone(), &args, &settings, observer, cancel).await
        }
        (None, None) => Err(ScanError::Validation {
            message: "Either --repo or --org must be given".to_string(),
        }
        .into()),
    }
}

/// Scans a single local repository and writes the configured reports.
async fn run_repository_scan(
    path: PathBuf,
    args: &Args,
    settings: &Settings,
    observer: Arc<dyn ScanObserver>,
) -> Result<ExitCode> {
    let registry = Arc::new(ScannerRegistry::new());
    let vulnerability_source = build_vulnerability_source(args, settings)?;
    let use_case = ScanRepositoryUseCase::new(
        registry,
        vulnerability_source,
        Arc::clone(&observer),
        settings.scan_settings(),
    );

    // Name reports after the real directory even when invoked as `--repo .`
    let repository_name = path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));
    let request = RepositoryScanRequest::new(path, repository_name, settings.include_dev, args.audit);
    let result = use_case.execute(request).await?;

    write_repository_reports(&result, settings, &args.output, observer.as_ref())?;

    Ok(repository_exit_code(&result, settings))
}

/// Scans every selected repository of a GitHub organization.
async fn run_organization_scan(
    organization: String,
    args: &Args,
    settings: &Settings,
    observer: Arc<dyn ScanObserver>,
    cancel: Arc<AtomicBool>,
) -> Result<ExitCode> {
    let host = GithubClient::new(settings.github_token.clone())?;
    let cloner = GitCloner::new(settings.tool_timeout);
    let registry = Arc::new(ScannerRegistry::new());
    let vulnerability_source = build_vulnerability_source(args, settings)?;
    let repository_scanner = ScanRepositoryUseCase::new(
        registry,
        vulnerability_source,
        Arc::clone(&observer),
        settings.scan_settings(),
    );
    let use_case = ScanOrganizationUseCase::new(
        host,
        cloner,
        repository_scanner,
        Arc::clone(&observer),
        cancel,
    );

    let request = OrganizationScanRequest::new(
        organization,
        settings.include_dev,
        args.audit,
        args.visibility(),
        RepoFilters::default(),
        args.use_ssh,
        settings.parallel_workers,
    );
    let summary = use_case.execute(request).await?;

    write_organization_reports(&summary, settings, &args.output, observer.as_ref())?;

    // Exit status reflects per-repository failures so CI can react
    Ok(if summary.has_failures() {
        ExitCode::ScanIssues
    } else {
        ExitCode::Success
    })
}

/// The OSV client is only constructed when an audit was requested and the
/// configured database list still names the supported backend.
fn build_vulnerability_source(args: &Args, settings: &Settings) -> Result<Option<OsvClient>> {
    if !args.audit {
        return Ok(None);
    }
    if settings.databases.iter().any(|d| d == "osv") {
        Ok(Some(OsvClient::new()?))
    } else {
        Ok(None)
    }
}

fn write_repository_reports(
    result: &ScanResult,
    settings: &Settings,
    output_dir: &Path,
    observer: &dyn ScanObserver,
) -> Result<()> {
    let sink = ReportSink::new(output_dir.to_path_buf());
    let base_name = safe_file_name(result.metadata.repository());

    for format in &settings.formats {
        observer.info(FormatterFactory::progress_message(*format));
        let formatter = FormatterFactory::create(*format);
        let content = formatter.format_repository(result)?;
        let file_name = format!("{}.{}", base_name, format.file_extension());
        let path = sink.write(&file_name, &content)?;
        observer.info(&format!("Report written to {}", path.display()));
    }

    observer.completion(&format!(
        "✅ {} report(s) written to {}",
        settings.formats.len(),
        sink.output_dir().display()
    ));
    Ok(())
}

fn write_organization_reports(
    summary: &OrganizationSummary,
    settings: &Settings,
    output_dir: &Path,
    observer: &dyn ScanObserver,
) -> Result<()> {
    let sink = ReportSink::new(output_dir.to_path_buf());
    let base_name = safe_file_name(&summary.organization);
    let mut written = 0;

    for format in &settings.formats {
        let formatter = FormatterFactory::create(*format);
        if !formatter.supports_organization() {
            observer.warn(&format!(
                "{} reports describe a single repository; skipping for the organization scan",
                format
            ));
            continue;
        }
        observer.info(FormatterFactory::progress_message(*format));
        let content = formatter.format_organization(summary)?;
        let file_name = format!("{}.{}", base_name, format.file_extension());
        let path = sink.write(&file_name, &content)?;
        observer.info(&format!("Report written to {}", path.display()));
        written += 1;
    }

    observer.completion(&format!(
        "✅ {} report(s) written to {}",
        written,
        sink.output_dir().display()
    ));
    Ok(())
}

/// Keeps report file names portable; repository labels can contain path
/// separators when derived from an unusual path.
fn safe_file_name(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| matches!(c, '.' | '-')) {
        "repository".to_string()
    } else {
        cleaned
    }
}

fn repository_exit_code(result: &ScanResult, settings: &Settings) -> ExitCode {
    let Some(findings) = &result.vulnerabilities else {
        return ExitCode::Success;
    };
    let above_threshold = findings
        .iter()
        .any(|finding| finding.severity >= settings.severity_threshold);
    if settings.fail_on_critical && above_threshold {
        ExitCode::ScanIssues
    } else {
        ExitCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory::domain::{Finding, ScanMetadata, Severity};

    fn result_with_findings(findings: Option<Vec<Finding>>) -> ScanResult {
        let metadata = ScanMetadata::new("demo".to_string(), vec!["python".to_string()]);
        ScanResult::new(metadata, Vec::new(), findings)
    }

    fn finding(severity: Severity) -> Finding {
        Finding {
            component: "requests@2.28.1".to_string(),
            id: "GHSA-test".to_string(),
            severity,
            description: None,
        }
    }

    #[test]
    fn test_safe_file_name_passthrough() {
        assert_eq!(safe_file_name("widget-api"), "widget-api");
        assert_eq!(safe_file_name("demo_repo.v2"), "demo_repo.v2");
    }

    #[test]
    fn test_safe_file_name_replaces_separators() {
        assert_eq!(safe_file_name("acme/widget api"), "acme-widget-api");
    }

    #[test]
    fn test_safe_file_name_rejects_dot_only_labels() {
        assert_eq!(safe_file_name("."), "repository");
        assert_eq!(safe_file_name(".."), "repository");
        assert_eq!(safe_file_name(""), "repository");
    }

    #[test]
    fn test_exit_code_without_audit_is_success() {
        let settings = Settings::default();
        let result = result_with_findings(None);
        assert_eq!(repository_exit_code(&result, &settings), ExitCode::Success);
    }

    #[test]
    fn test_exit_code_below_threshold_is_success() {
        let settings = Settings::default();
        let result = result_with_findings(Some(vec![finding(Severity::Low)]));
        assert_eq!(repository_exit_code(&result, &settings), ExitCode::Success);
    }

    #[test]
    fn test_exit_code_at_threshold_signals_issues() {
        let settings = Settings::default();
        let result = result_with_findings(Some(vec![finding(Severity::Medium)]));
        assert_eq!(
            repository_exit_code(&result, &settings),
            ExitCode::ScanIssues
        );
    }

    #[test]
    fn test_exit_code_honors_fail_on_critical_off() {
        let mut settings = Settings::default();
        settings.fail_on_critical = false;
        let result = result_with_findings(Some(vec![finding(Severity::Critical)]));
        assert_eq!(repository_exit_code(&result, &settings), ExitCode::Success);
    }
}
