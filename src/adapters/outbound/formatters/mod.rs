/// Formatter adapters for the supported report formats
mod cyclonedx_formatter;
mod html_formatter;
mod markdown_formatter;
mod spdx_formatter;
mod text_formatter;

pub use cyclonedx_formatter::CycloneDxFormatter;
pub use html_formatter::HtmlFormatter;
pub use markdown_formatter::MarkdownFormatter;
pub use spdx_formatter::SpdxFormatter;
pub use text_formatter::TextFormatter;
