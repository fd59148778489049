use crate::ports::outbound::ScanObserver;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::Mutex;

/// StderrScanObserver adapter for reporting scan progress to stderr
///
/// This adapter implements the ScanObserver port, writing progress
/// information to stderr so it doesn't interfere with report output on
/// stdout. Uses indicatif for rich progress bar display during
/// organization scans. The progress bar lives behind a mutex because
/// one observer instance is shared across concurrent workers.
pub struct StderrScanObserver {
    verbose: bool,
    progress_bar: Mutex<Option<ProgressBar>>,
}

impl StderrScanObserver {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress_bar: Mutex::new(None),
        }
    }

    fn get_or_create_progress_bar(&self, total: usize) -> ProgressBar {
        let mut guard = match self.progress_bar.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(pb) = guard.as_ref() {
            // A new phase with a different total replaces the old bar.
            if pb.length() == Some(total as u64) && !pb.is_finished() {
                return pb.clone();
            }
            pb.finish_and_clear();
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) - {msg}",
                )
                .expect("Failed to set progress bar template")
                .progress_chars("=>-"),
        );
        *guard = Some(pb.clone());
        pb
    }

    fn finish_progress_bar(&self) {
        let guard = match self.progress_bar.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(pb) = guard.as_ref() {
            pb.finish_and_clear();
        }
    }

    /// Prints above an active progress bar so the bar is not clobbered.
    fn print_line(&self, line: String) {
        let guard = match self.progress_bar.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref() {
            Some(pb) if !pb.is_finished() => pb.println(line),
            _ => eprintln!("{}", line),
        }
    }
}

impl Default for StderrScanObserver {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ScanObserver for StderrScanObserver {
    fn info(&self, message: &str) {
        if self.verbose {
            self.print_line(message.to_string());
        }
    }

    fn warn(&self, message: &str) {
        self.print_line(format!(
            "{}  {}: {}",
            "⚠️",
            "Warning".yellow().bold(),
            message
        ));
    }

    fn progress(&self, current: usize, total: usize, message: Option<&str>) {
        let pb = self.get_or_create_progress_bar(total);
        pb.set_position(current as u64);
        if let Some(msg) = message {
            pb.set_message(msg.to_string());
        }
    }

    fn completion(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!();
        eprintln!("{}", message.green());
    }
}

/// SilentScanObserver adapter that discards all output
///
/// Used when reports are printed to stdout, so no progress noise mixes
/// into machine-readable output, and by tests.
pub struct SilentScanObserver;

impl SilentScanObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SilentScanObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanObserver for SilentScanObserver {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}
    fn completion(&self, _message: &str) {}
}
