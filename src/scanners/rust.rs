use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::domain::{Component, DependencyScope};
use crate::shared::Result;

use super::toolchain::{run_tool, tool_available};
use super::{EcosystemScanner, ScanContext};

/// Rust scanner for Cargo projects and workspaces.
///
/// Tier 1 runs `cargo metadata` and walks the resolve graph from the
/// workspace members: first-hop normal dependencies are direct, deeper
/// ones transitive, and packages reachable only through dev or build
/// edges are dev. Tier 2 reads the dependency tables of every
/// Cargo.toml found in the walk.
pub struct RustScanner;

impl RustScanner {
    pub fn new() -> Self {
        Self
    }

    async fn scan_with_cargo(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        use anyhow::Context;

        let output = run_tool(
            "cargo",
            &["metadata", "--format-version", "1"],
            Some(path),
            context.timeout(),
        )
        .await?;
        if !output.success {
            anyhow::bail!(
                "cargo metadata exited with an error: {}",
                output.stderr.lines().next().unwrap_or("").trim()
            );
        }

        let metadata: CargoMetadata = serde_json::from_str(&output.stdout)
            .context("cargo metadata produced unparsable JSON")?;
        Ok(classify_metadata(&metadata, context.include_dev()))
    }

    fn parse_cargo_manifests(&self, context: &ScanContext, root: &Path) -> Vec<Component> {
        let mut components = Vec::new();
        for manifest_path in context.find_manifests(root, "Cargo.toml") {
            let content = match fs::read_to_string(&manifest_path) {
                Ok(content) => content,
                Err(error) => {
                    context.observer().warn(&format!(
                        "Skipping unreadable {}: {}",
                        manifest_path.display(),
                        error
                    ));
                    continue;
                }
            };
            match parse_cargo_manifest(&content, context.include_dev()) {
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

impl Default for RustScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EcosystemScanner for RustScanner {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn detect(&self, path: &Path) -> bool {
        path.join("Cargo.toml").is_file()
    }

    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        if tool_available("cargo", &["--version"]).await {
            match self.scan_with_cargo(context, path).await {
                Ok(components) if !components.is_empty() => return Ok(components),
                Ok(_) => context
                    .observer()
                    .warn("cargo reported no dependencies, reading Cargo.toml declarations instead"),
                Err(error) => context.observer().warn(&format!(
                    "cargo scan failed ({}), reading Cargo.toml declarations instead",
                    error
                )),
            }
        }

        Ok(self.parse_cargo_manifests(context, path))
    }
}

#[derive(Debug, Deserialize)]
struct CargoMetadata {
    packages: Vec<MetadataPackage>,
    #[serde(default)]
    workspace_members: Vec<String>,
    resolve: Option<MetadataResolve>,
}

#[derive(Debug, Deserialize)]
struct MetadataPackage {
    id: String,
    name: String,
    version: String,
    #[serde(default)]
    license: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataResolve {
    nodes: Vec<MetadataNode>,
}

#[derive(Debug, Deserialize)]
struct MetadataNode {
    id: String,
    #[serde(default)]
    deps: Vec<MetadataNodeDep>,
}

#[derive(Debug, Deserialize)]
struct MetadataNodeDep {
    pkg: String,
    #[serde(default)]
    dep_kinds: Vec<MetadataDepKind>,
}

#[derive(Debug, Deserialize)]
struct MetadataDepKind {
    #[serde(default)]
    kind: Option<String>,
}

fn is_normal_edge(dep: &MetadataNodeDep) -> bool {
    // Older cargo omits dep_kinds entirely; treat that as normal.
    dep.dep_kinds.is_empty() || dep.dep_kinds.iter().any(|k| k.kind.is_none())
}

fn classify_metadata(metadata: &CargoMetadata, include_dev: bool) -> Vec<Component> {
    let Some(resolve) = &metadata.resolve else {
        return Vec::new();
    };
    let nodes: HashMap<&str, &MetadataNode> = resolve
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();
    let members: HashSet<&str> = metadata
        .workspace_members
        .iter()
        .map(String::as_str)
        .collect();

    // Normal-edge closure from the workspace members. The first hop is
    // the direct set.
    let mut direct: HashSet<&str> = HashSet::new();
    let mut normal_reach: HashSet<&str> = members.clone();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for member in &members {
        if let Some(node) = nodes.get(member) {
            for dep in node.deps.iter().filter(|d| is_normal_edge(d)) {
                direct.insert(dep.pkg.as_str());
                if normal_reach.insert(dep.pkg.as_str()) {
                    queue.push_back(dep.pkg.as_str());
                }
            }
        }
    }
    while let Some(id) = queue.pop_front() {
        if let Some(node) = nodes.get(id) {
            for dep in node.deps.iter().filter(|d| is_normal_edge(d)) {
                if normal_reach.insert(dep.pkg.as_str()) {
                    queue.push_back(dep.pkg.as_str());
                }
            }
        }
    }

    // Dev and build dependencies only apply to workspace members; their
    // own subtrees resolve through normal edges.
    let mut dev_reach: HashSet<&str> = HashSet::new();
    if include_dev {
        let mut dev_queue: VecDeque<&str> = VecDeque::new();
        for member in &members {
            if let Some(node) = nodes.get(member) {
                for dep in node.deps.iter().filter(|d| !is_normal_edge(d)) {
                    if !normal_reach.contains(dep.pkg.as_str())
                        && dev_reach.insert(dep.pkg.as_str())
                    {
                        dev_queue.push_back(dep.pkg.as_str());
                    }
                }
            }
        }
        while let Some(id) = dev_queue.pop_front() {
            if let Some(node) = nodes.get(id) {
                for dep in node.deps.iter().filter(|d| is_normal_edge(d)) {
                    if !normal_reach.contains(dep.pkg.as_str())
                        && dev_reach.insert(dep.pkg.as_str())
                    {
                        dev_queue.push_back(dep.pkg.as_str());
                    }
                }
            }
        }
    }

    let mut components = Vec::new();
    for package in &metadata.packages {
        let id = package.id.as_str();
        if members.contains(id) {
            continue;
        }
        let scope = if direct.contains(id) {
            DependencyScope::Direct
        } else if normal_reach.contains(id) {
            DependencyScope::Transitive
        } else if dev_reach.contains(id) {
            DependencyScope::Dev
        } else {
            continue;
        };
        let Ok(component) = Component::new(&package.name, &package.version, scope) else {
            continue;
        };
        let component = match package.license.as_deref() {
            Some(license) if !license.is_empty() => component.with_license(license),
            _ => component,
        };
        components.push(component.with_purl("cargo"));
    }
    components
}

/// Parses the dependency tables of one Cargo.toml. Dev and build
/// dependencies both classify as dev; entries inheriting from the
/// workspace (`workspace = true`) are skipped since the workspace root
/// manifest carries the versioned declaration.
fn parse_cargo_manifest(content: &str, include_dev: bool) -> Result<Vec<Component>> {
    use anyhow::Context;

    let document: toml::Value = toml::from_str(content).context("invalid TOML")?;
    let mut components = Vec::new();

    push_dependency_table(
        document.get("dependencies"),
        DependencyScope::Direct,
        include_dev,
        &mut components,
    );
    push_dependency_table(
        document.get("dev-dependencies"),
        DependencyScope::Dev,
        include_dev,
        &mut components,
    );
    push_dependency_table(
        document.get("build-dependencies"),
        DependencyScope::Dev,
        include_dev,
        &mut components,
    );
    push_dependency_table(
        document
            .get("workspace")
            .and_then(|workspace| workspace.get("dependencies")),
        DependencyScope::Direct,
        include_dev,
        &mut components,
    );

    if let Some(targets) = document.get("target").and_then(|v| v.as_table()) {
        for target_body in targets.values() {
            push_dependency_table(
                target_body.get("dependencies"),
                DependencyScope::Direct,
                include_dev,
                &mut components,
            );
            push_dependency_table(
                target_body.get("dev-dependencies"),
                DependencyScope::Dev,
                include_dev,
                &mut components,
            );
            push_dependency_table(
                target_body.get("build-dependencies"),
                DependencyScope::Dev,
                include_dev,
                &mut components,
            );
        }
    }

    Ok(components)
}

fn push_dependency_table(
    table: Option<&toml::Value>,
    scope: DependencyScope,
    include_dev: bool,
    components: &mut Vec<Component>,
) {
    if scope == DependencyScope::Dev && !include_dev {
        return;
    }
    let Some(entries) = table.and_then(|v| v.as_table()) else {
        return;
    };
    for (declared_name, spec) in entries {
        let Some((name, version)) = cargo_spec(declared_name, spec) else {
            continue;
        };
        let Ok(component) = Component::new(name, version, scope) else {
            continue;
        };
        components.push(component.with_purl("cargo"));
    }
}

/// Extracts the crate name and base version from a dependency spec,
/// honoring `package = "..."` renames.
fn cargo_spec(declared_name: &str, spec: &toml::Value) -> Option<(String, String)> {
    match spec {
        toml::Value::String(requirement) => {
            Some((declared_name.to_string(), requirement_base(requirement)))
        }
        toml::Value::Table(table) => {
            if table
                .get("workspace")
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
            {
                return None;
            }
            let name = table
                .get("package")
                .and_then(|v| v.as_str())
                .unwrap_or(declared_name);
            let version = table
                .get("version")
                .and_then(|v| v.as_str())
                .map(requirement_base)
                .unwrap_or_default();
            Some((name.to_string(), version))
        }
        _ => None,
    }
}

fn requirement_base(requirement: &str) -> String {
    let stripped = requirement.trim().trim_start_matches(['^', '~', '=', ' ']);
    let base = stripped.split(',').next().unwrap_or("").trim();
    if base == "*" {
        String::new()
    } else {
        base.to_string()
    }
}
