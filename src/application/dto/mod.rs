pub mod output_format;
pub mod scan_request;

pub use output_format::OutputFormat;
pub use scan_request::{OrganizationScanRequest, RepositoryScanRequest, ScanSettings};
