use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::application::dto::OutputFormat;
use crate::config::Settings;
use crate::ports::outbound::RepoVisibility;

/// Generate dependency inventories and SBOMs for polyglot repositories
#[derive(Parser, Debug)]
#[command(name = "repo-sbom")]
#[command(version = "1.0.0")]
#[command(about = "Generate dependency inventories and SBOMs for polyglot repositories", long_about = None)]
#[command(group = ArgGroup::new("target").required(true).args(["repo", "org"]))]
pub struct Args {
    /// Path to a local repository to scan
    #[arg(long, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// GitHub organization whose repositories should be scanned
    #[arg(long, value_name = "NAME")]
    pub org: Option<String>,

    /// Directory reports are written into
    #[arg(short, long, value_name = "DIR", default_value = "sbom-reports")]
    pub output: PathBuf,

    /// Report format: cyclonedx-json, spdx-json, markdown, text or html.
    /// Can be specified multiple times: -f cyclonedx-json -f html
    #[arg(short, long = "format", value_name = "FORMAT")]
    pub format: Vec<OutputFormat>,

    /// Cross-reference components against known-vulnerability data
    #[arg(long)]
    pub audit: bool,

    /// Include development dependencies in the inventory
    #[arg(long)]
    pub include_dev: bool,

    /// Number of repositories scanned concurrently during an organization scan
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Path to a configuration file (skips auto-discovery)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// GitHub API token (falls back to the GITHUB_TOKEN environment variable)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Include private repositories in an organization scan
    #[arg(long)]
    pub include_private: bool,

    /// Include forked repositories in an organization scan
    #[arg(long)]
    pub include_forks: bool,

    /// Include archived repositories in an organization scan
    #[arg(long)]
    pub include_archived: bool,

    /// Clone repositories over SSH instead of HTTPS
    #[arg(long)]
    pub use_ssh: bool,

    /// Print step-by-step progress
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Applies the command-line overrides on top of resolved settings.
    /// Flags win over environment variables and the config file.
    pub fn apply_to(&self, settings: &mut Settings) {
        if self.include_dev {
            settings.include_dev = true;
        }
        if let Some(parallel) = self.parallel {
            settings.parallel_workers = parallel;
        }
        if !self.format.is_empty() {
            let mut formats = Vec::new();
            for format in &self.format {
                if !formats.contains(format) {
                    formats.push(*format);
                }
            }
            settings.formats = formats;
        }
        if let Some(token) = &self.token {
            settings.github_token = Some(token.clone());
        }
        if self.verbose {
            settings.verbose = true;
        }
    }

    /// Visibility filter for organization scans.
    pub fn visibility(&self) -> RepoVisibility {
        RepoVisibility {
            include_private: self.include_private,
            include_forks: self.include_forks,
            include_archived: self.include_archived,
        }
    }
}
