use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::domain::{Component, DependencyScope};
use crate::shared::Result;

use super::toolchain::{run_tool, tool_available};
use super::{EcosystemScanner, ScanContext};

/// Node.js scanner for npm-based projects.
///
/// Tier 1 runs `npm ls --all --json` against an installed node_modules
/// tree and classifies packages by depth. Tier 2 reads the declared
/// dependency maps from package.json.
pub struct NodeScanner;

impl NodeScanner {
    pub fn new() -> Self {
        Self
    }

    async fn scan_with_npm(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        let mut args = vec!["ls", "--all", "--json"];
        if !context.include_dev() {
            args.push("--omit=dev");
        }

        // npm ls exits non-zero for peer-dependency problems while
        // still printing a usable tree, so the output decides.
        let output = run_tool("npm", &args, Some(path), context.timeout()).await?;
        let tree: NpmTreeNode = match serde_json::from_str(&output.stdout) {
            Ok(tree) => tree,
            Err(_) if !output.success => {
                anyhow::bail!("npm ls exited with an error and produced no tree")
            }
            Err(error) => anyhow::bail!("npm ls produced unparsable JSON: {}", error),
        };

        let mut components = Vec::new();
        for (name, node) in &tree.dependencies {
            collect_npm_node(name, node, 1, context.include_dev(), &mut components);
        }
        Ok(components)
    }

    fn parse_package_manifests(&self, context: &ScanContext, root: &Path) -> Vec<Component> {
        let mut components = Vec::new();
        for manifest_path in context.find_manifests(root, "package.json") {
            match parse_package_manifest(&manifest_path, context.include_dev()) {
                Ok(mut declared) => components.append(&mut declared),
                Err(error) => context.observer().warn(&format!(
                    "Skipping unparsable manifest {}: {}",
                    manifest_path.display(),
                    error
                )),
            }
        }
        components
    }
}

impl Default for NodeScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EcosystemScanner for NodeScanner {
    fn id(&self) -> &'static str {
        "node"
    }

    fn detect(&self, path: &Path) -> bool {
        path.join("package.json").is_file()
    }

    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        let has_installed_tree = path.join("node_modules").is_dir();
        if has_installed_tree && tool_available("npm", &["--version"]).await {
            match self.scan_with_npm(context, path).await {
                Ok(components) if !components.is_empty() => return Ok(components),
                Ok(_) => context
                    .observer()
                    .warn("npm listed no packages, reading package.json declarations instead"),
                Err(error) => context.observer().warn(&format!(
                    "npm scan failed ({}), reading package.json declarations instead",
                    error
                )),
            }
        }

        Ok(self.parse_package_manifests(context, path))
    }
}

#[derive(Debug, Deserialize)]
struct NpmTreeNode {
    #[serde(default)]
    version: String,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    dependencies: BTreeMap<String, NpmTreeNode>,
}

fn collect_npm_node(
    name: &str,
    node: &NpmTreeNode,
    depth: usize,
    include_dev: bool,
    components: &mut Vec<Component>,
) {
    let scope = if node.dev {
        if !include_dev {
            return;
        }
        DependencyScope::Dev
    } else if depth == 1 {
        DependencyScope::Direct
    } else {
        DependencyScope::Transitive
    };

    if let Some(component) = build_component(name, &node.version, scope) {
        components.push(component);
    }
    for (child_name, child) in &node.dependencies {
        collect_npm_node(child_name, child, depth + 1, include_dev, components);
    }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "optionalDependencies")]
    optional_dependencies: BTreeMap<String, String>,
}

fn parse_package_manifest(manifest_path: &Path, include_dev: bool) -> Result<Vec<Component>> {
    use anyhow::Context;

    let content = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let manifest: PackageManifest =
        serde_json::from_str(&content).context("invalid package.json")?;

    let mut components = Vec::new();
    for (name, spec) in manifest
        .dependencies
        .iter()
        .chain(manifest.optional_dependencies.iter())
    {
        if let Some(component) = build_component(name, &declared_version(spec), DependencyScope::Direct)
        {
            components.push(component);
        }
    }
    if include_dev {
        for (name, spec) in &manifest.dev_dependencies {
            if let Some(component) =
                build_component(name, &declared_version(spec), DependencyScope::Dev)
            {
                components.push(component);
            }
        }
    }
    Ok(components)
}

/// Splits a scoped package name into its scope and bare name.
fn split_scoped_name(full: &str) -> (Option<&str>, &str) {
    if full.starts_with('@') {
        if let Some((package_scope, bare)) = full.split_once('/') {
            if !bare.is_empty() {
                return (Some(package_scope), bare);
            }
        }
    }
    (None, full)
}

fn build_component(full_name: &str, version: &str, scope: DependencyScope) -> Option<Component> {
    let (package_scope, bare_name) = split_scoped_name(full_name);
    let component = Component::new(bare_name, version, scope).ok()?;
    let component = match package_scope {
        Some(value) => component.with_group(value),
        None => component,
    };
    Some(component.with_purl("npm"))
}

/// Reduces a declared range to its base version: caret and tilde specs
/// carry a concrete base, everything else (inequalities, tags, URLs,
/// workspace references) does not.
fn declared_version(spec: &str) -> String {
    let stripped = spec.trim().trim_start_matches(['^', '~', '=', 'v']);
    let concrete = stripped
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
        && !stripped.contains(' ')
        && !stripped.contains("||");
    if concrete {
        stripped.to_string()
    } else {
        String::new()
    }
}
