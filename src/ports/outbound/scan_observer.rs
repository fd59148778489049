/// ScanObserver port for reporting progress and recoverable problems
///
/// This port abstracts user-facing feedback (e.g. stderr) so that the
/// scanners and orchestrators never write to the console directly.
/// Recoverable failures are reported through `warn` and never raised,
/// keeping them observable without aborting the scan.
///
/// Implementations must be `Send + Sync`: one observer instance is
/// shared across concurrent repository scans.
pub trait ScanObserver: Send + Sync {
    /// Reports a progress message
    fn info(&self, message: &str);

    /// Reports a recoverable problem (tool fallback, skipped manifest, ...)
    fn warn(&self, message: &str);

    /// Reports progress through a long phase
    ///
    /// # Arguments
    /// * `current` - Current progress value
    /// * `total` - Total expected value
    /// * `message` - Optional message to include
    fn progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports completion of an operation
    fn completion(&self, message: &str);
}
