use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::domain::{Component, DependencyScope};
use crate::shared::Result;

use super::toolchain::{run_tool, tool_available};
use super::{EcosystemScanner, ScanContext};

/// Flutter/Dart scanner for pub-based projects.
///
/// Tier 1 runs `flutter pub deps --json` (or `dart pub deps --json`
/// for pure Dart projects), whose package entries already carry a
/// direct/dev/transitive kind. Tier 2 reads the dependency maps from
/// pubspec.yaml. SDK-provided packages are not third-party components
/// and are skipped in both tiers.
pub struct FlutterScanner;

impl FlutterScanner {
    pub fn new() -> Self {
        Self
    }

    async fn scan_with_pub(
        &self,
        tool: &str,
        context: &ScanContext,
        path: &Path,
    ) -> Result<Vec<Component>> {
        use anyhow::Context;

        let output = run_tool(
            tool,
            &["pub", "deps", "--json"],
            Some(path),
            context.timeout(),
        )
        .await?;
        if !output.success {
            anyhow::bail!(
                "{} pub deps exited with an error: {}",
                tool,
                output.stderr.lines().next().unwrap_or("").trim()
            );
        }

        let deps: PubDeps = serde_json::from_str(&output.stdout)
            .context("pub deps produced unparsable JSON")?;
        Ok(collect_pub_packages(&deps, context.include_dev()))
    }

    fn parse_pubspecs(&self, context: &ScanContext, root: &Path) -> Vec<Component> {
        let mut components = Vec::new();
        for pubspec_path in context.find_manifests(root, "pubspec.yaml") {
            let content = match fs::read_to_string(&pubspec_path) {
                Ok(content) => content,
                Err(error) => {
                    context.observer().warn(&format!(
                        "Skipping unreadable {}: {}",
                        pubspec_path.display(),
                        error
                    ));
                    continue;
                }
            };
            match parse_pubspec(&content, context.include_dev()) {
                Ok(mut declared) => components.append(&mut declared),
                Err(error) => context.observer().warn(&format!(
                    "Skipping unparsable manifest {}: {}",
                    pubspec_path.display(),
                    error
                )),
            }
        }
        components
    }
}

impl Default for FlutterScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EcosystemScanner for FlutterScanner {
    fn id(&self) -> &'static str {
        "flutter"
    }

    fn detect(&self, path: &Path) -> bool {
        path.join("pubspec.yaml").is_file()
    }

    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        for tool in ["flutter", "dart"] {
            if !tool_available(tool, &["--version"]).await {
                continue;
            }
            match self.scan_with_pub(tool, context, path).await {
                Ok(components) if !components.is_empty() => return Ok(components),
                Ok(_) => context.observer().warn(&format!(
                    "{} listed no packages, reading pubspec.yaml declarations instead",
                    tool
                )),
                Err(error) => context.observer().warn(&format!(
                    "{} scan failed ({}), reading pubspec.yaml declarations instead",
                    tool, error
                )),
            }
            break;
        }

        Ok(self.parse_pubspecs(context, path))
    }
}

#[derive(Debug, Deserialize)]
struct PubDeps {
    #[serde(default)]
    packages: Vec<PubPackage>,
}

#[derive(Debug, Deserialize)]
struct PubPackage {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    source: String,
}

fn collect_pub_packages(deps: &PubDeps, include_dev: bool) -> Vec<Component> {
    let mut components = Vec::new();
    for package in &deps.packages {
        if package.kind == "root" || package.source == "sdk" {
            continue;
        }
        let scope = match package.kind.as_str() {
            "direct" => DependencyScope::Direct,
            "dev" => DependencyScope::Dev,
            _ => DependencyScope::Transitive,
        };
        if scope == DependencyScope::Dev && !include_dev {
            continue;
        }
        let Ok(component) = Component::new(&package.name, &package.version, scope) else {
            continue;
        };
        components.push(component.with_purl("pub"));
    }
    components
}

#[derive(Debug, Deserialize)]
struct Pubspec {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_yaml_ng::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_yaml_ng::Value>,
}

fn parse_pubspec(content: &str, include_dev: bool) -> Result<Vec<Component>> {
    use anyhow::Context;

    let pubspec: Pubspec = serde_yaml_ng::from_str(content).context("invalid YAML")?;
    let mut components = Vec::new();

    for (name, spec) in &pubspec.dependencies {
        push_pubspec_entry(name, spec, DependencyScope::Direct, &mut components);
    }
    if include_dev {
        for (name, spec) in &pubspec.dev_dependencies {
            push_pubspec_entry(name, spec, DependencyScope::Dev, &mut components);
        }
    }
    Ok(components)
}

fn push_pubspec_entry(
    name: &str,
    spec: &serde_yaml_ng::Value,
    scope: DependencyScope,
    components: &mut Vec<Component>,
) {
    let Some(version) = pubspec_version(spec) else {
        return;
    };
    let Ok(component) = Component::new(name, version, scope) else {
        return;
    };
    components.push(component.with_purl("pub"));
}

/// Extracts the declared base version from a pubspec dependency value.
/// Returns None for SDK dependencies, which are not components.
fn pubspec_version(spec: &serde_yaml_ng::Value) -> Option<String> {
    match spec {
        serde_yaml_ng::Value::String(requirement) => Some(declared_version(requirement)),
        serde_yaml_ng::Value::Mapping(_) => {
            if spec.get("sdk").is_some() {
                return None;
            }
            let version = spec
                .get("version")
                .and_then(|v| v.as_str())
                .map(declared_version)
                .unwrap_or_default();
            Some(version)
        }
        _ => Some(String::new()),
    }
}

fn declared_version(requirement: &str) -> String {
    let stripped = requirement.trim().trim_start_matches(['^', '~', '=', ' ']);
    let concrete = stripped
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
        && !stripped.contains(' ');
    if concrete {
        stripped.to_string()
    } else {
        String::new()
    }
}
