/// Output format enumeration for scan reports
///
/// Represents the supported report formats. It belongs in the
/// application layer as both the CLI (inbound adapter) and the
/// formatters (outbound adapters) need to understand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// CycloneDX 1.6 JSON (default)
    CycloneDxJson,
    /// SPDX 2.3 JSON
    SpdxJson,
    /// Human-readable Markdown
    Markdown,
    /// Plain text table
    Text,
    /// Self-contained HTML page
    Html,
}

impl OutputFormat {
    /// File extension used when writing this format to disk.
    ///
    /// The two JSON formats keep their standard's name in the extension
    /// so requesting both never overwrites one with the other.
    pub fn file_extension(&self) -> &'static str {
        match self {
            OutputFormat::CycloneDxJson => "cyclonedx.json",
            OutputFormat::SpdxJson => "spdx.json",
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
            OutputFormat::Html => "html",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cyclonedx-json" | "cyclonedx" | "json" => Ok(OutputFormat::CycloneDxJson),
            "spdx-json" | "spdx" => Ok(OutputFormat::SpdxJson),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "text" | "txt" | "plain" => Ok(OutputFormat::Text),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!(
                "Invalid format: {}. Please specify one of 'cyclonedx-json', 'spdx-json', 'markdown', 'text', 'html'",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::CycloneDxJson => write!(f, "cyclonedx-json"),
            OutputFormat::SpdxJson => write!(f, "spdx-json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_str_canonical_names() {
        assert_eq!(
            OutputFormat::from_str("cyclonedx-json").unwrap(),
            OutputFormat::CycloneDxJson
        );
        assert_eq!(
            OutputFormat::from_str("spdx-json").unwrap(),
            OutputFormat::SpdxJson
        );
        assert_eq!(
            OutputFormat::from_str("markdown").unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("html").unwrap(), OutputFormat::Html);
    }

    #[test]
    fn test_from_str_aliases_and_case() {
        assert_eq!(
            OutputFormat::from_str("CycloneDX").unwrap(),
            OutputFormat::CycloneDxJson
        );
        assert_eq!(
            OutputFormat::from_str("json").unwrap(),
            OutputFormat::CycloneDxJson
        );
        assert_eq!(OutputFormat::from_str("SPDX").unwrap(), OutputFormat::SpdxJson);
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_str("TXT").unwrap(), OutputFormat::Text);
    }

    #[test]
    fn test_from_str_invalid() {
        let error = OutputFormat::from_str("xml").unwrap_err();
        assert!(error.contains("Invalid format: xml"));
    }

    #[test]
    fn test_display_round_trip() {
        for format in [
            OutputFormat::CycloneDxJson,
            OutputFormat::SpdxJson,
            OutputFormat::Markdown,
            OutputFormat::Text,
            OutputFormat::Html,
        ] {
            let parsed = OutputFormat::from_str(&format.to_string()).unwrap();
            assert_eq!(parsed, format);
        }
    }

    #[test]
    fn test_json_extensions_do_not_collide() {
        assert_ne!(
            OutputFormat::CycloneDxJson.file_extension(),
            OutputFormat::SpdxJson.file_extension()
        );
    }
}
