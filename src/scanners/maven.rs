use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::inventory::domain::{Component, DependencyScope};
use crate::shared::Result;

use super::toolchain::{run_tool, tool_available};
use super::{EcosystemScanner, ScanContext};

/// Maven scanner for Java projects, including multi-module builds.
///
/// Tier 1 runs `mvn dependency:tree` with JSON output and classifies
/// each artifact by its depth in the tree. Tier 2 reads every pom.xml
/// found in the manifest walk and reports the declared dependencies,
/// resolving `${...}` version references against `<properties>` where
/// possible.
pub struct MavenScanner;

impl MavenScanner {
    pub fn new() -> Self {
        Self
    }

    async fn scan_with_maven(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        let tree_file = tempfile::NamedTempFile::new()?;
        let output_arg = format!("-DoutputFile={}", tree_file.path().display());
        let mut args = vec!["-B", "dependency:tree", "-DoutputType=json", output_arg.as_str()];
        if !context.include_dev() {
            args.push("-Dscope=compile,runtime");
        }

        let output = run_tool("mvn", &args, Some(path), context.timeout()).await?;
        if !output.success {
            anyhow::bail!(
                "mvn dependency:tree exited with an error: {}",
                first_line(&output.stderr)
            );
        }

        let tree_json = fs::read_to_string(tree_file.path()).unwrap_or_default();
        let components = parse_tree_json(&tree_json, context.include_dev());
        if !components.is_empty() {
            return Ok(components);
        }

        // Older plugin versions ignore -DoutputType; fall back to the
        // human-readable tree on stdout.
        let text_args: Vec<&str> = args
            .iter()
            .filter(|a| !a.starts_with("-Doutput"))
            .copied()
            .collect();
        let output = run_tool("mvn", &text_args, Some(path), context.timeout()).await?;
        if !output.success {
            anyhow::bail!(
                "mvn dependency:tree exited with an error: {}",
                first_line(&output.stderr)
            );
        }
        Ok(parse_text_tree(&output.stdout, context.include_dev()))
    }

    fn parse_pom_files(&self, context: &ScanContext, root: &Path) -> Vec<Component> {
        let mut components = Vec::new();
        for pom_path in context.find_manifests(root, "pom.xml") {
            match parse_single_pom(&pom_path, context.include_dev()) {
                Ok(mut declared) => components.append(&mut declared),
                Err(error) => context.observer().warn(&format!(
                    "Skipping unparsable manifest {}: {}",
                    pom_path.display(),
                    error
                )),
            }
        }
        components
    }
}

impl Default for MavenScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EcosystemScanner for MavenScanner {
    fn id(&self) -> &'static str {
        "maven"
    }

    fn detect(&self, path: &Path) -> bool {
        path.join("pom.xml").is_file()
    }

    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        if !tool_available("mvn", &["--version"]).await {
            context
                .observer()
                .warn("Maven not found, reading pom.xml declarations instead");
            return Ok(self.parse_pom_files(context, path));
        }

        match self.scan_with_maven(context, path).await {
            Ok(components) if !components.is_empty() => Ok(components),
            Ok(_) => {
                context
                    .observer()
                    .warn("Maven produced no dependency tree, reading pom.xml declarations instead");
                Ok(self.parse_pom_files(context, path))
            }
            Err(error) => {
                context.observer().warn(&format!(
                    "Maven scan failed ({}), reading pom.xml declarations instead",
                    error
                ));
                Ok(self.parse_pom_files(context, path))
            }
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// Maven scopes that classify a dependency as development-only.
fn is_dev_scope(maven_scope: &str) -> bool {
    matches!(maven_scope, "test" | "provided")
}

#[derive(Debug, Deserialize)]
struct MavenTreeNode {
    #[serde(rename = "groupId", default)]
    group_id: String,
    #[serde(rename = "artifactId", default)]
    artifact_id: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    children: Vec<MavenTreeNode>,
}

/// Parses the JSON emitted by `mvn dependency:tree -DoutputType=json`.
///
/// The tree root is the scanned project itself and is not a dependency;
/// its immediate children are direct, everything deeper is transitive.
fn parse_tree_json(tree_json: &str, include_dev: bool) -> Vec<Component> {
    let mut components = Vec::new();
    let Ok(value) = serde_json::from_str::<serde_json::Value>(tree_json) else {
        return components;
    };

    let roots: Vec<MavenTreeNode> = match value {
        serde_json::Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect(),
        other => serde_json::from_value(other).map(|root| vec![root]).unwrap_or_default(),
    };

    for root in &roots {
        for child in &root.children {
            collect_tree_node(child, 1, include_dev, &mut components);
        }
    }
    components
}

fn collect_tree_node(
    node: &MavenTreeNode,
    depth: usize,
    include_dev: bool,
    components: &mut Vec<Component>,
) {
    let scope = if is_dev_scope(&node.scope) {
        if !include_dev {
            // Test/provided subtrees inherit the scope, skip them whole.
            return;
        }
        DependencyScope::Dev
    } else if depth == 1 {
        DependencyScope::Direct
    } else {
        DependencyScope::Transitive
    };

    if !node.artifact_id.is_empty() {
        if let Ok(component) = Component::new(&node.artifact_id, &node.version, scope) {
            components.push(component.with_group(&node.group_id).with_purl("maven"));
        }
    }

    for child in &node.children {
        collect_tree_node(child, depth + 1, include_dev, components);
    }
}

/// Parses the human-readable `mvn dependency:tree` output.
///
/// Direct-vs-transitive classification comes from the tree-drawing
/// prefix: an artifact drawn at the first level (`+-` flush with the
/// log margin) is direct, anything indented below it is transitive.
/// This is a best-effort heuristic since the text format is not a
/// stable contract.
fn parse_text_tree(output: &str, include_dev: bool) -> Vec<Component> {
    let mut components = Vec::new();

    for raw_line in output.lines() {
        let line = raw_line
            .strip_prefix("[INFO]")
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            .unwrap_or(raw_line);

        let Some(marker) = line.find("+- ").or_else(|| line.find("\\- ")) else {
            continue;
        };
        let direct = marker == 0;

        let Some(coordinate) = line[marker + 3..].split_whitespace().next() else {
            continue;
        };
        let parts: Vec<&str> = coordinate.split(':').collect();
        // group:artifact:packaging:version:scope, with an optional
        // classifier segment before the version.
        if !(5..=6).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            continue;
        }

        let group_id = parts[0];
        let artifact_id = parts[1];
        let version = parts[parts.len() - 2];
        let maven_scope = parts[parts.len() - 1];

        let scope = if is_dev_scope(maven_scope) {
            if !include_dev {
                continue;
            }
            DependencyScope::Dev
        } else if direct {
            DependencyScope::Direct
        } else {
            DependencyScope::Transitive
        };

        let Ok(component) = Component::new(artifact_id, version, scope) else {
            continue;
        };
        components.push(component.with_group(group_id).with_purl("maven"));
    }

    components
}

#[derive(Debug, Default)]
struct PomDeclaration {
    group_id: String,
    artifact_id: String,
    version: String,
    scope: String,
}

/// Parses one pom.xml into components for every declared dependency.
///
/// Dependencies under `<dependencyManagement>` or `<plugin>` are version
/// pins and build tooling, not dependencies of the project, and are
/// ignored. A version left to a parent POM yields a component with an
/// empty version.
fn parse_single_pom(pom_path: &Path, include_dev: bool) -> Result<Vec<Component>> {
    use anyhow::Context;

    let content = fs::read_to_string(pom_path)
        .with_context(|| format!("Failed to read {}", pom_path.display()))?;
    let (properties, declarations) = parse_pom(&content)?;

    let mut components = Vec::new();
    for declaration in declarations {
        let maven_scope = if declaration.scope.is_empty() {
            "compile"
        } else {
            declaration.scope.as_str()
        };
        let scope = if is_dev_scope(maven_scope) {
            if !include_dev {
                continue;
            }
            DependencyScope::Dev
        } else {
            DependencyScope::Direct
        };

        let Some(version) = resolve_version(&declaration.version, &properties) else {
            continue;
        };
        if declaration.artifact_id.is_empty() {
            continue;
        }
        let Ok(component) = Component::new(&declaration.artifact_id, version, scope) else {
            continue;
        };
        components.push(component.with_group(&declaration.group_id).with_purl("maven"));
    }
    Ok(components)
}

/// Extracts `<properties>` and `<dependencies>` from POM XML, tracking
/// the element stack so namespaced and namespace-free POMs parse alike.
fn parse_pom(content: &str) -> Result<(HashMap<String, String>, Vec<PomDeclaration>)> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut properties = HashMap::new();
    let mut declarations = Vec::new();
    let mut current = PomDeclaration::default();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                stack.push(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                if in_dependency(&stack) {
                    if !current.artifact_id.is_empty() {
                        declarations.push(std::mem::take(&mut current));
                    } else {
                        current = PomDeclaration::default();
                    }
                }
                stack.pop();
            }
            Event::Text(text) => {
                let value = text.unescape()?.trim().to_string();
                route_text(&stack, value, &mut properties, &mut current);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((properties, declarations))
}

fn route_text(
    stack: &[String],
    value: String,
    properties: &mut HashMap<String, String>,
    current: &mut PomDeclaration,
) {
    if stack.len() >= 2 && stack[stack.len() - 2] == "properties" {
        if let Some(key) = stack.last() {
            properties.insert(key.clone(), value);
        }
        return;
    }

    let Some(field) = dependency_field(stack) else {
        return;
    };
    match field {
        "groupId" => current.group_id = value,
        "artifactId" => current.artifact_id = value,
        "version" => current.version = value,
        "scope" => current.scope = value,
        _ => {}
    }
}

/// True when the stack top is a `<dependency>` directly under
/// `<dependencies>`, outside managed or plugin sections.
fn in_dependency(stack: &[String]) -> bool {
    stack.len() >= 2
        && stack[stack.len() - 1] == "dependency"
        && stack[stack.len() - 2] == "dependencies"
        && !in_excluded_section(stack)
}

fn dependency_field<'a>(stack: &'a [String]) -> Option<&'a str> {
    if stack.len() < 3 {
        return None;
    }
    if stack[stack.len() - 2] != "dependency" || stack[stack.len() - 3] != "dependencies" {
        return None;
    }
    if in_excluded_section(stack) {
        return None;
    }
    stack.last().map(String::as_str)
}

fn in_excluded_section(stack: &[String]) -> bool {
    stack
        .iter()
        .any(|element| element == "dependencyManagement" || element == "plugin")
}

/// Resolves a `${property}` reference against the collected properties.
/// Returns None when the reference cannot be resolved, in which case
/// the dependency is skipped.
fn resolve_version(version: &str, properties: &HashMap<String, String>) -> Option<String> {
    if !version.contains("${") {
        return Some(version.to_string());
    }
    let key = version.strip_prefix("${")?.strip_suffix('}')?;
    match properties.get(key) {
        Some(resolved) if !resolved.contains("${") => Some(resolved.clone()),
        _ => None,
    }
}
