use crate::adapters::outbound::formatters::{
    CycloneDxFormatter, HtmlFormatter, MarkdownFormatter, SpdxFormatter, TextFormatter,
};
use crate::application::dto::OutputFormat;
use crate::ports::outbound::ReportFormatter;

/// Factory for creating report formatters
///
/// This factory encapsulates the creation logic for the formatter
/// implementations, following the Factory Pattern. It belongs in the
/// application layer as it selects infrastructure adapters based on
/// application needs.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter instance for the specified output format
    ///
    /// # Arguments
    /// * `format` - The output format to create a formatter for
    ///
    /// # Returns
    /// A boxed ReportFormatter trait object for the specified format
    pub fn create(format: OutputFormat) -> Box<dyn ReportFormatter> {
        match format {
            OutputFormat::CycloneDxJson => Box::new(CycloneDxFormatter::new()),
            OutputFormat::SpdxJson => Box::new(SpdxFormatter::new()),
            OutputFormat::Markdown => Box::new(MarkdownFormatter::new()),
            OutputFormat::Text => Box::new(TextFormatter::new()),
            OutputFormat::Html => Box::new(HtmlFormatter::new()),
        }
    }

    /// Returns the progress message for the specified output format
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::CycloneDxJson => "📝 Generating CycloneDX JSON report...",
            OutputFormat::SpdxJson => "📝 Generating SPDX JSON report...",
            OutputFormat::Markdown => "📝 Generating Markdown report...",
            OutputFormat::Text => "📝 Generating text report...",
            OutputFormat::Html => "📝 Generating HTML report...",
        }
    }
}
