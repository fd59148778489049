use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - every repository scanned, no findings above threshold
    Success = 0,
    /// Scan completed but with issues: vulnerabilities above the
    /// configured threshold, or failed repositories in an organization scan
    ScanIssues = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (API error, network error, file I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::ScanIssues => write!(f, "Scan Issues (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for repository scanning.
///
/// Uses thiserror to derive Display and Error traits automatically,
/// reducing boilerplate while maintaining user-friendly error messages.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Repository path not found: {path}\nReason: {reason}\n\n💡 Hint: Please specify an existing, readable project directory")]
    PathNotFound { path: PathBuf, reason: String },

    #[error("Failed to parse configuration file: {path}\nDetails: {details}\n\n💡 Hint: Ensure the file contains valid YAML syntax")]
    ConfigParseError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Hosting platform request failed: {reason}\n\n💡 Hint: {hint}")]
    HostingApiError { reason: String, hint: String },

    #[error("Failed to clone repository '{repository}': {details}")]
    CloneError { repository: String, details: String },

    /// Validation error for request construction
    #[error("Validation error: {message}")]
    Validation { message: String },
}
