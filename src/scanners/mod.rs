//! Ecosystem scanners
//!
//! One scanner per supported package ecosystem. Every scanner follows
//! the same two-tier strategy: ask the ecosystem's native tool for a
//! resolved dependency listing when the tool is installed, and fall
//! back to reading the static manifest when it is not. Tool output
//! yields the full resolved graph; manifest parsing yields declared
//! direct dependencies only.

pub mod flutter;
pub mod go;
pub mod manifest_walk;
pub mod maven;
pub mod node;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod toolchain;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::inventory::domain::Component;
use crate::ports::outbound::ScanObserver;
use crate::shared::Result;

use manifest_walk::IgnoreMatcher;

/// Shared settings and collaborators handed to every scanner run.
pub struct ScanContext {
    include_dev: bool,
    timeout: Duration,
    max_depth: usize,
    ignore: IgnoreMatcher,
    observer: Arc<dyn ScanObserver>,
}

impl ScanContext {
    pub fn new(
        include_dev: bool,
        timeout: Duration,
        max_depth: usize,
        ignore_patterns: &[String],
        observer: Arc<dyn ScanObserver>,
    ) -> Self {
        Self {
            include_dev,
            timeout,
            max_depth,
            ignore: IgnoreMatcher::new(ignore_patterns),
            observer,
        }
    }

    pub fn include_dev(&self) -> bool {
        self.include_dev
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn ignore(&self) -> &IgnoreMatcher {
        &self.ignore
    }

    pub fn observer(&self) -> &dyn ScanObserver {
        self.observer.as_ref()
    }

    /// Locates manifests named `manifest_name` under `root`, bounded by
    /// the configured depth and ignore patterns.
    pub fn find_manifests(&self, root: &Path, manifest_name: &str) -> Vec<std::path::PathBuf> {
        manifest_walk::find_manifests(root, manifest_name, self.max_depth, &self.ignore)
    }
}

/// EcosystemScanner port - detection and extraction for one ecosystem
#[async_trait]
pub trait EcosystemScanner: Send + Sync {
    /// Short identifier used in logs and technology tallies, e.g. "maven".
    fn id(&self) -> &'static str;

    /// Returns true when the directory carries this ecosystem's marker
    /// files. Detection never errors; an unreadable directory is simply
    /// not a match.
    fn detect(&self, path: &Path) -> bool;

    /// Extracts components from the project at `path`.
    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>>;
}

/// ScannerRegistry - the fixed set of supported ecosystem scanners
pub struct ScannerRegistry {
    scanners: Vec<Box<dyn EcosystemScanner>>,
}

impl ScannerRegistry {
    /// Creates a registry holding every supported scanner.
    pub fn new() -> Self {
        Self {
            scanners: vec![
                Box::new(maven::MavenScanner::new()),
                Box::new(python::PythonScanner::new()),
                Box::new(node::NodeScanner::new()),
                Box::new(go::GoScanner::new()),
                Box::new(ruby::RubyScanner::new()),
                Box::new(rust::RustScanner::new()),
                Box::new(flutter::FlutterScanner::new()),
            ],
        }
    }

    /// Runs detection across all scanners and returns every match.
    ///
    /// A polyglot repository legitimately matches several scanners at
    /// once; their results are concatenated and merged downstream.
    pub fn applicable_scanners(&self, path: &Path) -> Vec<&dyn EcosystemScanner> {
        self.scanners
            .iter()
            .filter(|scanner| scanner.detect(path))
            .map(|scanner| scanner.as_ref())
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn EcosystemScanner> {
        self.scanners.iter().map(|scanner| scanner.as_ref())
    }
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// No-op observer for scanner unit tests.
#[cfg(test)]
pub(crate) struct NullObserver;

#[cfg(test)]
impl ScanObserver for NullObserver {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}
    fn completion(&self, _message: &str) {}
}

#[cfg(test)]
pub(crate) fn test_context(include_dev: bool) -> ScanContext {
    ScanContext::new(
        include_dev,
        Duration::from_secs(30),
        5,
        &[],
        Arc::new(NullObserver),
    )
}
