use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::domain::{Component, DependencyScope};
use crate::shared::Result;

use super::toolchain::{run_tool, tool_available};
use super::{EcosystemScanner, ScanContext};

/// Marker files that identify a Python project.
const MARKER_FILES: &[&str] = &["requirements.txt", "pyproject.toml", "Pipfile", "setup.py"];

/// Packages every environment carries regardless of the project.
const ENVIRONMENT_PACKAGES: &[&str] = &["pip", "setuptools", "wheel", "pkg-resources"];

/// Python scanner covering requirements files, pyproject.toml (PEP 621
/// and Poetry) and Pipfile.
///
/// Tier 1 asks the project's own virtual environment (`.venv` or
/// `venv`) for its installed packages, classifying manifest-declared
/// names as direct and the rest as transitive. Without a project
/// environment there is no resolver to ask, so the declared
/// dependencies are reported as-is.
pub struct PythonScanner;

impl PythonScanner {
    pub fn new() -> Self {
        Self
    }

    async fn scan_with_pip(
        &self,
        pip: &str,
        context: &ScanContext,
        path: &Path,
        declared: &[Component],
    ) -> Result<Vec<Component>> {
        use anyhow::Context;

        let output = run_tool(pip, &["list", "--format=json"], Some(path), context.timeout())
            .await?;
        if !output.success {
            anyhow::bail!("pip list exited with an error");
        }

        let entries: Vec<PipListEntry> = serde_json::from_str(&output.stdout)
            .context("pip list produced unparsable JSON")?;

        let declared_scopes: HashMap<String, DependencyScope> = declared
            .iter()
            .map(|component| (component.name().to_string(), component.scope()))
            .collect();

        let mut components = Vec::new();
        for entry in entries {
            let name = normalize_name(&entry.name);
            if ENVIRONMENT_PACKAGES.contains(&name.as_str()) {
                continue;
            }
            let scope = declared_scopes
                .get(&name)
                .copied()
                .unwrap_or(DependencyScope::Transitive);
            if scope == DependencyScope::Dev && !context.include_dev() {
                continue;
            }
            let Ok(component) = Component::new(name, entry.version, scope) else {
                continue;
            };
            components.push(component.with_purl("pypi"));
        }
        Ok(components)
    }

    fn collect_declarations(&self, context: &ScanContext, root: &Path) -> Vec<Component> {
        let mut components = Vec::new();

        for requirements in context.find_manifests(root, "requirements.txt") {
            if let Some(mut parsed) = read_manifest(context, &requirements, |content| {
                parse_requirements(content, DependencyScope::Direct)
            }) {
                components.append(&mut parsed);
            }
        }
        for requirements in context.find_manifests(root, "requirements-dev.txt") {
            if let Some(mut parsed) = read_manifest(context, &requirements, |content| {
                parse_requirements(content, DependencyScope::Dev)
            }) {
                components.append(&mut parsed);
            }
        }
        for pyproject in context.find_manifests(root, "pyproject.toml") {
            if let Some(mut parsed) = read_manifest(context, &pyproject, parse_pyproject) {
                components.append(&mut parsed);
            }
        }
        for pipfile in context.find_manifests(root, "Pipfile") {
            if let Some(mut parsed) = read_manifest(context, &pipfile, parse_pipfile) {
                components.append(&mut parsed);
            }
        }

        components
    }
}

impl Default for PythonScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EcosystemScanner for PythonScanner {
    fn id(&self) -> &'static str {
        "python"
    }

    fn detect(&self, path: &Path) -> bool {
        MARKER_FILES
            .iter()
            .any(|marker| path.join(marker).is_file())
    }

    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        let declared = self.collect_declarations(context, path);

        if let Some(pip) = project_pip(path) {
            if tool_available(&pip, &["--version"]).await {
                match self.scan_with_pip(&pip, context, path, &declared).await {
                    Ok(components) if !components.is_empty() => return Ok(components),
                    Ok(_) => context
                        .observer()
                        .warn("Project environment lists no packages, using manifest declarations"),
                    Err(error) => context.observer().warn(&format!(
                        "pip listing failed ({}), using manifest declarations",
                        error
                    )),
                }
            }
        }

        Ok(declared
            .into_iter()
            .filter(|component| {
                context.include_dev() || component.scope() != DependencyScope::Dev
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct PipListEntry {
    name: String,
    version: String,
}

/// Locates the pip executable of the project's own virtual environment.
fn project_pip(path: &Path) -> Option<String> {
    for candidate in [".venv/bin/pip", "venv/bin/pip"] {
        let pip = path.join(candidate);
        if pip.is_file() {
            return Some(pip.to_string_lossy().into_owned());
        }
    }
    None
}

fn read_manifest<F>(context: &ScanContext, path: &Path, parse: F) -> Option<Vec<Component>>
where
    F: FnOnce(&str) -> Result<Vec<Component>>,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            context
                .observer()
                .warn(&format!("Skipping unreadable {}: {}", path.display(), error));
            return None;
        }
    };
    match parse(&content) {
        Ok(components) => Some(components),
        Err(error) => {
            context.observer().warn(&format!(
                "Skipping unparsable manifest {}: {}",
                path.display(),
                error
            ));
            None
        }
    }
}

/// Normalizes a distribution name per the packaging rules: lowercased,
/// with runs of `-`, `_` and `.` collapsed to a single hyphen.
fn normalize_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut previous_was_separator = false;
    for character in raw.chars() {
        if matches!(character, '-' | '_' | '.') {
            if !previous_was_separator {
                normalized.push('-');
            }
            previous_was_separator = true;
        } else {
            normalized.extend(character.to_lowercase());
            previous_was_separator = false;
        }
    }
    normalized
}

fn parse_requirements(content: &str, scope: DependencyScope) -> Result<Vec<Component>> {
    let mut components = Vec::new();
    for line in content.lines() {
        if let Some((name, version)) = parse_requirement_line(line) {
            let Ok(component) = Component::new(name, version, scope) else {
                continue;
            };
            components.push(component.with_purl("pypi"));
        }
    }
    Ok(components)
}

/// Parses one requirement specifier into a name and, for exact pins,
/// a version. Option lines (`-r`, `--hash`, `-e`) and comments yield
/// nothing; range specifiers yield an empty version.
fn parse_requirement_line(line: &str) -> Option<(String, String)> {
    let mut requirement = line.trim();
    if requirement.is_empty() || requirement.starts_with('#') || requirement.starts_with('-') {
        return None;
    }
    if let Some(comment) = requirement.find(" #") {
        requirement = requirement[..comment].trim_end();
    }
    if let Some(marker) = requirement.find(';') {
        requirement = requirement[..marker].trim_end();
    }

    let operator = ["===", "==", "~=", "!=", ">=", "<=", ">", "<", "@"]
        .iter()
        .filter_map(|op| requirement.find(op).map(|at| (at, *op)))
        .min_by_key(|(at, _)| *at);

    let (name_part, version) = match operator {
        Some((at, op)) if op == "==" || op == "===" => {
            let rest = requirement[at + op.len()..].trim();
            let exact = rest.split(',').next().unwrap_or("").trim();
            (&requirement[..at], exact.to_string())
        }
        Some((at, _)) => (&requirement[..at], String::new()),
        None => (requirement, String::new()),
    };

    let name = name_part.split('[').next().unwrap_or("").trim();
    if name.is_empty() {
        return None;
    }
    Some((normalize_name(name), version))
}

/// True for optional-dependency group names that mean development use.
fn is_dev_group(group: &str) -> bool {
    matches!(
        group.to_lowercase().as_str(),
        "dev" | "develop" | "development" | "test" | "tests" | "testing"
    )
}

fn parse_pyproject(content: &str) -> Result<Vec<Component>> {
    use anyhow::Context;

    let document: toml::Value = toml::from_str(content).context("invalid TOML")?;
    let mut components = Vec::new();

    if let Some(project) = document.get("project") {
        push_requirement_array(
            project.get("dependencies"),
            DependencyScope::Direct,
            &mut components,
        );
        if let Some(groups) = project
            .get("optional-dependencies")
            .and_then(|v| v.as_table())
        {
            for (group, requirements) in groups {
                let scope = if is_dev_group(group) {
                    DependencyScope::Dev
                } else {
                    DependencyScope::Direct
                };
                push_requirement_array(Some(requirements), scope, &mut components);
            }
        }
    }

    if let Some(groups) = document.get("dependency-groups").and_then(|v| v.as_table()) {
        for (group, requirements) in groups {
            let scope = if is_dev_group(group) {
                DependencyScope::Dev
            } else {
                DependencyScope::Direct
            };
            push_requirement_array(Some(requirements), scope, &mut components);
        }
    }

    if let Some(poetry) = document.get("tool").and_then(|t| t.get("poetry")) {
        push_poetry_table(
            poetry.get("dependencies"),
            DependencyScope::Direct,
            &mut components,
        );
        push_poetry_table(
            poetry.get("dev-dependencies"),
            DependencyScope::Dev,
            &mut components,
        );
        if let Some(groups) = poetry.get("group").and_then(|v| v.as_table()) {
            for (group, body) in groups {
                let scope = if is_dev_group(group) {
                    DependencyScope::Dev
                } else {
                    DependencyScope::Direct
                };
                push_poetry_table(body.get("dependencies"), scope, &mut components);
            }
        }
    }

    Ok(components)
}

fn push_requirement_array(
    requirements: Option<&toml::Value>,
    scope: DependencyScope,
    components: &mut Vec<Component>,
) {
    let Some(entries) = requirements.and_then(|v| v.as_array()) else {
        return;
    };
    for entry in entries.iter().filter_map(|v| v.as_str()) {
        if let Some((name, version)) = parse_requirement_line(entry) {
            let Ok(component) = Component::new(name, version, scope) else {
                continue;
            };
            components.push(component.with_purl("pypi"));
        }
    }
}

fn push_poetry_table(
    table: Option<&toml::Value>,
    scope: DependencyScope,
    components: &mut Vec<Component>,
) {
    let Some(entries) = table.and_then(|v| v.as_table()) else {
        return;
    };
    for (name, spec) in entries {
        if name == "python" {
            continue;
        }
        let version = poetry_spec_version(spec);
        let Ok(component) = Component::new(normalize_name(name), version, scope) else {
            continue;
        };
        components.push(component.with_purl("pypi"));
    }
}

/// Extracts the base version from a Poetry version spec, dropping the
/// range sigil. Path/git specs without a version yield an empty one.
fn poetry_spec_version(spec: &toml::Value) -> String {
    let raw = match spec {
        toml::Value::String(version) => version.as_str(),
        toml::Value::Table(table) => table
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or(""),
        _ => "",
    };
    let trimmed = raw.trim_start_matches(['^', '~', '=', '>', '<', ' ']);
    let base = trimmed.split(',').next().unwrap_or("").trim();
    if base == "*" {
        String::new()
    } else {
        base.to_string()
    }
}

fn parse_pipfile(content: &str) -> Result<Vec<Component>> {
    use anyhow::Context;

    let document: toml::Value = toml::from_str(content).context("invalid TOML")?;
    let mut components = Vec::new();
    for (section, scope) in [
        ("packages", DependencyScope::Direct),
        ("dev-packages", DependencyScope::Dev),
    ] {
        let Some(entries) = document.get(section).and_then(|v| v.as_table()) else {
            continue;
        };
        for (name, spec) in entries {
            let version = pipfile_spec_version(spec);
            let Ok(component) = Component::new(normalize_name(name), version, scope) else {
                continue;
            };
            components.push(component.with_purl("pypi"));
        }
    }
    Ok(components)
}

fn pipfile_spec_version(spec: &toml::Value) -> String {
    let raw = match spec {
        toml::Value::String(version) => version.as_str(),
        toml::Value::Table(table) => table
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or(""),
        _ => "",
    };
    match raw.strip_prefix("==") {
        Some(exact) => exact.trim().to_string(),
        None => String::new(),
    }
}
