use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::{Result, ScanError};

/// ReportSink adapter for writing rendered reports to disk
///
/// Creates the output directory on demand. Multiple formats of the
/// same scan land as sibling files in one directory.
pub struct ReportSink {
    output_dir: PathBuf,
}

impl ReportSink {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes one report file and returns its full path.
    ///
    /// # Errors
    /// Returns `FileWriteError` when the directory cannot be created or
    /// the file cannot be written.
    pub fn write(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|error| ScanError::FileWriteError {
            path: self.output_dir.clone(),
            details: error.to_string(),
        })?;

        let path = self.output_dir.join(file_name);
        self.reject_symlink(&path)?;
        fs::write(&path, content).map_err(|error| ScanError::FileWriteError {
            path: path.clone(),
            details: error.to_string(),
        })?;
        Ok(path)
    }

    /// Security: refuse to write through a symbolic link.
    fn reject_symlink(&self, path: &Path) -> Result<()> {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_symlink() => Err(ScanError::FileWriteError {
                path: path.to_path_buf(),
                details:
                    "Security: Output path is a symbolic link. For security reasons, writing to symbolic links is not allowed."
                        .to_string(),
            }
            .into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = ReportSink::new(temp_dir.path().join("reports"));

        let path = sink.write("widget.cyclonedx.json", "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(path.ends_with("reports/widget.cyclonedx.json"));
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = ReportSink::new(temp_dir.path().to_path_buf());

        sink.write("report.txt", "first").unwrap();
        let path = sink.write("report.txt", "second").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_refuses_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.txt");
        fs::write(&target, "x").unwrap();
        let link = temp_dir.path().join("report.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let sink = ReportSink::new(temp_dir.path().to_path_buf());
        let result = sink.write("report.txt", "content");
        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("symbolic link"));
    }
}
