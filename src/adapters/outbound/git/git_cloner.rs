use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::outbound::RepositoryCloner;
use crate::scanners::toolchain::run_tool;
use crate::shared::Result;

/// GitCloner adapter that shells out to `git clone`
///
/// Clones are shallow (`--depth 1`); the scan only needs the checked
/// out tree, never history. The subprocess runs under the same timeout
/// and kill-on-drop discipline as the ecosystem tools, so a hung clone
/// cannot stall an organization scan past its deadline.
pub struct GitCloner {
    timeout: Duration,
}

impl GitCloner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RepositoryCloner for GitCloner {
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<()> {
        let destination_arg = destination.to_string_lossy().into_owned();
        let args = ["clone", "--depth", "1", "--quiet", url, &destination_arg];

        let output = run_tool("git", &args, None, self.timeout)
            .await
            .map_err(|failure| anyhow::anyhow!(redact_credentials(&failure.to_string(), url)))?;
        if !output.success {
            let details = output
                .stderr
                .lines()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("git exited with an error")
                .trim();
            anyhow::bail!("{}", redact_credentials(details, url));
        }
        Ok(())
    }
}

/// Strips embedded credentials from clone diagnostics. Git echoes the
/// full remote URL in its error messages, which would otherwise leak an
/// injected access token into logs and reports.
fn redact_credentials(message: &str, url: &str) -> String {
    let Some(rest) = url.strip_prefix("https://") else {
        return message.to_string();
    };
    let Some((userinfo, _)) = rest.split_once('@') else {
        return message.to_string();
    };
    message.replace(userinfo, "***")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_redact_credentials() {
        let url = "https://ghp_secret@github.com/acme/widget.git";
        let message = "fatal: repository 'https://ghp_secret@github.com/acme/widget.git/' not found";
        let redacted = redact_credentials(message, url);
        assert!(!redacted.contains("ghp_secret"));
        assert!(redacted.contains("https://***@github.com/acme/widget.git"));
    }

    #[test]
    fn test_redact_without_credentials_is_identity() {
        let url = "https://github.com/acme/widget.git";
        let message = "fatal: could not read from remote repository";
        assert_eq!(redact_credentials(message, url), message);
    }

    #[tokio::test]
    async fn test_clone_local_repository() {
        // Build a tiny source repository, then clone it by path.
        let source = TempDir::new().unwrap();
        let ready = run_tool(
            "sh",
            &[
                "-c",
                "git init -q . && git -c user.email=a@b -c user.name=t commit -q --allow-empty -m init",
            ],
            Some(source.path()),
            Duration::from_secs(30),
        )
        .await
        .unwrap();
        assert!(ready.success, "fixture setup failed: {}", ready.stderr);

        let workspace = TempDir::new().unwrap();
        let destination = workspace.path().join("clone");
        let cloner = GitCloner::new(Duration::from_secs(30));
        cloner
            .clone_repository(&source.path().to_string_lossy(), &destination)
            .await
            .unwrap();
        assert!(destination.join(".git").is_dir());
    }

    #[tokio::test]
    async fn test_clone_missing_remote_fails() {
        let workspace = TempDir::new().unwrap();
        let destination = workspace.path().join("clone");
        let cloner = GitCloner::new(Duration::from_secs(30));

        let result = cloner
            .clone_repository(
                &workspace.path().join("no-such-repo").to_string_lossy(),
                &destination,
            )
            .await;
        assert!(result.is_err());
    }
}
