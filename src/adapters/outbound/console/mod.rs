/// Console adapters for progress reporting and warnings
mod stderr_observer;

pub use stderr_observer::{SilentScanObserver, StderrScanObserver};
