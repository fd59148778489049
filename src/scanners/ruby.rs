use std::collections::HashSet;
use std::fs;
use std::path::Path;

use async_trait::async_trait;

use crate::inventory::domain::{Component, DependencyScope};
use crate::shared::Result;

use super::toolchain::{run_tool, tool_available};
use super::{EcosystemScanner, ScanContext};

/// Gemfile groups that classify a gem as development-only.
const DEV_GROUPS: &[&str] = &[":development", ":test"];

/// Ruby scanner for Bundler projects.
///
/// Tier 1 runs `bundle list` against an installed bundle. Tier 2 reads
/// Gemfile.lock when present (resolved versions, `DEPENDENCIES` section
/// separating direct from transitive) and falls back to the Gemfile
/// declarations alone. Group membership in the Gemfile decides the dev
/// classification in every tier.
pub struct RubyScanner;

impl RubyScanner {
    pub fn new() -> Self {
        Self
    }

    async fn scan_with_bundler(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        let gemfile = read_gemfile(&path.join("Gemfile"))?;
        let direct_names = direct_names_for(path, &gemfile);

        let output = run_tool("bundle", &["list"], Some(path), context.timeout()).await?;
        if !output.success {
            anyhow::bail!(
                "bundle list exited with an error: {}",
                output.stderr.lines().next().unwrap_or("").trim()
            );
        }

        let mut components = Vec::new();
        for line in output.stdout.lines() {
            let Some(entry) = line.trim().strip_prefix("* ") else {
                continue;
            };
            let Some((name, version)) = parse_gem_and_version(entry) else {
                continue;
            };
            if name == "bundler" {
                continue;
            }
            let scope = classify(&name, &gemfile.dev_names, &direct_names);
            if scope == DependencyScope::Dev && !context.include_dev() {
                continue;
            }
            let Ok(component) = Component::new(name, version, scope) else {
                continue;
            };
            components.push(component.with_purl("gem"));
        }
        Ok(components)
    }

    fn parse_manifests(&self, context: &ScanContext, root: &Path) -> Vec<Component> {
        let mut components = Vec::new();
        for gemfile_path in context.find_manifests(root, "Gemfile") {
            let gemfile = match read_gemfile(&gemfile_path) {
                Ok(gemfile) => gemfile,
                Err(error) => {
                    context.observer().warn(&format!(
                        "Skipping unreadable {}: {}",
                        gemfile_path.display(),
                        error
                    ));
                    continue;
                }
            };

            let lock_path = gemfile_path.with_file_name("Gemfile.lock");
            match fs::read_to_string(&lock_path) {
                Ok(lock_content) => {
                    let lock = parse_gemfile_lock(&lock_content);
                    for (name, version) in &lock.resolved {
                        let scope = classify(name, &gemfile.dev_names, &lock.direct);
                        if scope == DependencyScope::Dev && !context.include_dev() {
                            continue;
                        }
                        let Ok(component) = Component::new(name, version, scope) else {
                            continue;
                        };
                        components.push(component.with_purl("gem"));
                    }
                }
                Err(_) => {
                    for declaration in &gemfile.declared {
                        let scope = if declaration.dev {
                            DependencyScope::Dev
                        } else {
                            DependencyScope::Direct
                        };
                        if scope == DependencyScope::Dev && !context.include_dev() {
                            continue;
                        }
                        let Ok(component) =
                            Component::new(&declaration.name, &declaration.version, scope)
                        else {
                            continue;
                        };
                        components.push(component.with_purl("gem"));
                    }
                }
            }
        }
        components
    }
}

impl Default for RubyScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EcosystemScanner for RubyScanner {
    fn id(&self) -> &'static str {
        "ruby"
    }

    fn detect(&self, path: &Path) -> bool {
        path.join("Gemfile").is_file() || path.join("Gemfile.lock").is_file()
    }

    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        if path.join("Gemfile").is_file() && tool_available("bundle", &["--version"]).await {
            match self.scan_with_bundler(context, path).await {
                Ok(components) if !components.is_empty() => return Ok(components),
                Ok(_) => context
                    .observer()
                    .warn("bundle listed no gems, reading Gemfile declarations instead"),
                Err(error) => context.observer().warn(&format!(
                    "bundler scan failed ({}), reading Gemfile declarations instead",
                    error
                )),
            }
        }

        Ok(self.parse_manifests(context, path))
    }
}

#[derive(Debug)]
struct GemDeclaration {
    name: String,
    version: String,
    dev: bool,
}

#[derive(Debug, Default)]
struct GemfileInfo {
    declared: Vec<GemDeclaration>,
    dev_names: HashSet<String>,
}

fn read_gemfile(path: &Path) -> Result<GemfileInfo> {
    use anyhow::Context;

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_gemfile(&content))
}

/// Parses gem declarations from a Gemfile, tracking `group ... do`
/// blocks and inline `group:` options. This is a line-oriented
/// approximation of the Ruby DSL, not an evaluation of it.
fn parse_gemfile(content: &str) -> GemfileInfo {
    let mut info = GemfileInfo::default();
    let mut group_stack: Vec<bool> = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Every `do` block joins the stack so a nested platforms or
        // install_if block keeps group tracking balanced.
        if line.ends_with(" do") {
            let inherited = group_stack.iter().any(|&in_dev| in_dev);
            let dev = inherited || (line.starts_with("group") && mentions_dev_group(line));
            group_stack.push(dev);
            continue;
        }
        if line == "end" {
            group_stack.pop();
            continue;
        }

        let Some(rest) = line.strip_prefix("gem ") else {
            continue;
        };
        let quoted = extract_quoted(rest);
        let Some(name) = quoted.first() else {
            continue;
        };
        let version = quoted
            .get(1)
            .map(|requirement| constraint_base(requirement))
            .unwrap_or_default();
        let dev = group_stack.iter().any(|&in_dev| in_dev)
            || (rest.contains("group") && mentions_dev_group(rest));

        if dev {
            info.dev_names.insert(name.clone());
        }
        info.declared.push(GemDeclaration {
            name: name.clone(),
            version,
            dev,
        });
    }
    info
}

fn mentions_dev_group(text: &str) -> bool {
    DEV_GROUPS.iter().any(|group| text.contains(group))
}

fn extract_quoted(text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut chars = text.chars();
    while let Some(character) = chars.next() {
        if character == '\'' || character == '"' {
            let quote = character;
            let mut value = String::new();
            for inner in chars.by_ref() {
                if inner == quote {
                    break;
                }
                value.push(inner);
            }
            values.push(value);
        }
    }
    values
}

/// Reduces a version constraint to its base version: `"~> 7.1.2"`
/// yields `7.1.2`, a pure inequality or URL yields nothing.
fn constraint_base(requirement: &str) -> String {
    let stripped = requirement.trim().trim_start_matches(['~', '>', '<', '=', ' ']);
    let base = stripped.split(',').next().unwrap_or("").trim();
    if base
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
    {
        base.to_string()
    } else {
        String::new()
    }
}

#[derive(Debug, Default)]
struct LockData {
    /// Resolved gems at the top level of the specs sections.
    resolved: Vec<(String, String)>,
    /// Names listed under DEPENDENCIES, i.e. declared in the Gemfile.
    direct: HashSet<String>,
}

/// Parses Gemfile.lock. Gems indented four spaces under a `specs:`
/// heading are the resolved set; deeper indentation is a constraint
/// line, not a resolution.
fn parse_gemfile_lock(content: &str) -> LockData {
    let mut lock = LockData::default();
    let mut in_specs = false;
    let mut in_dependencies = false;

    for line in content.lines() {
        if !line.starts_with(' ') {
            in_specs = false;
            in_dependencies = line.trim() == "DEPENDENCIES";
            continue;
        }
        let trimmed = line.trim_end();
        if trimmed.trim() == "specs:" {
            in_specs = true;
            continue;
        }

        if in_dependencies {
            if let Some(name) = trimmed.trim().split_whitespace().next() {
                lock.direct.insert(name.trim_end_matches('!').to_string());
            }
            continue;
        }

        if in_specs {
            let indent = trimmed.len() - trimmed.trim_start().len();
            if indent != 4 {
                continue;
            }
            if let Some((name, version)) = parse_gem_and_version(trimmed.trim()) {
                lock.resolved.push((name, version));
            }
        }
    }
    lock
}

/// Parses `name (version)`, dropping any platform suffix from the
/// version.
fn parse_gem_and_version(entry: &str) -> Option<(String, String)> {
    let (name, rest) = entry.split_once(" (")?;
    let version = rest.strip_suffix(')')?;
    let version = version.split('-').next().unwrap_or(version);
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

fn classify(
    name: &str,
    dev_names: &HashSet<String>,
    direct_names: &HashSet<String>,
) -> DependencyScope {
    if dev_names.contains(name) {
        DependencyScope::Dev
    } else if direct_names.contains(name) {
        DependencyScope::Direct
    } else {
        DependencyScope::Transitive
    }
}

fn direct_names_for(path: &Path, gemfile: &GemfileInfo) -> HashSet<String> {
    match fs::read_to_string(path.join("Gemfile.lock")) {
        Ok(lock_content) => parse_gemfile_lock(&lock_content).direct,
        Err(_) => gemfile
            .declared
            .iter()
            .map(|declaration| declaration.name.clone())
            .collect(),
    }
}
