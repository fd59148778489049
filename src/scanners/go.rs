use std::collections::HashSet;
use std::fs;
use std::path::Path;

use async_trait::async_trait;

use crate::inventory::domain::{Component, DependencyScope};
use crate::shared::Result;

use super::toolchain::{run_tool, tool_available};
use super::{EcosystemScanner, ScanContext};

/// Go modules scanner.
///
/// Tier 1 runs `go list -m all` for the resolved module graph and marks
/// modules required directly by go.mod as direct. Tier 2 reads go.mod
/// itself, where `// indirect` markers already separate direct from
/// transitive requirements. Go has no development scope.
pub struct GoScanner;

impl GoScanner {
    pub fn new() -> Self {
        Self
    }

    async fn scan_with_go(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        let requirements = read_root_requirements(path)?;
        let direct_paths: HashSet<&str> = requirements
            .iter()
            .filter(|requirement| !requirement.indirect)
            .map(|requirement| requirement.module_path.as_str())
            .collect();

        let output = run_tool("go", &["list", "-m", "all"], Some(path), context.timeout()).await?;
        if !output.success {
            anyhow::bail!(
                "go list -m all exited with an error: {}",
                output.stderr.lines().next().unwrap_or("").trim()
            );
        }

        Ok(parse_module_list(&output.stdout, &direct_paths))
    }

    fn parse_go_mod_files(&self, context: &ScanContext, root: &Path) -> Vec<Component> {
        let mut components = Vec::new();
        for go_mod in context.find_manifests(root, "go.mod") {
            match fs::read_to_string(&go_mod) {
                Ok(content) => {
                    for requirement in parse_go_mod(&content) {
                        let scope = if requirement.indirect {
                            DependencyScope::Transitive
                        } else {
                            DependencyScope::Direct
                        };
                        let Ok(component) =
                            Component::new(&requirement.module_path, &requirement.version, scope)
                        else {
                            continue;
                        };
                        components.push(component.with_purl("golang"));
                    }
                }
                Err(error) => context.observer().warn(&format!(
                    "Skipping unreadable {}: {}",
                    go_mod.display(),
                    error
                )),
            }
        }
        components
    }
}

impl Default for GoScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EcosystemScanner for GoScanner {
    fn id(&self) -> &'static str {
        "go"
    }

    fn detect(&self, path: &Path) -> bool {
        path.join("go.mod").is_file()
    }

    async fn scan(&self, context: &ScanContext, path: &Path) -> Result<Vec<Component>> {
        if tool_available("go", &["version"]).await {
            match self.scan_with_go(context, path).await {
                Ok(components) if !components.is_empty() => return Ok(components),
                Ok(_) => context
                    .observer()
                    .warn("go listed no modules, reading go.mod declarations instead"),
                Err(error) => context.observer().warn(&format!(
                    "go module listing failed ({}), reading go.mod declarations instead",
                    error
                )),
            }
        }

        Ok(self.parse_go_mod_files(context, path))
    }
}

#[derive(Debug)]
struct GoRequirement {
    module_path: String,
    version: String,
    indirect: bool,
}

fn read_root_requirements(path: &Path) -> Result<Vec<GoRequirement>> {
    use anyhow::Context;

    let content = fs::read_to_string(path.join("go.mod"))
        .with_context(|| format!("Failed to read {}", path.join("go.mod").display()))?;
    Ok(parse_go_mod(&content))
}

/// Parses the `require` directives out of a go.mod file, both the
/// block form and single-line form. Other blocks (replace, exclude,
/// retract) are skipped.
fn parse_go_mod(content: &str) -> Vec<GoRequirement> {
    #[derive(PartialEq)]
    enum Block {
        None,
        Require,
        Other,
    }

    let mut requirements = Vec::new();
    let mut block = Block::None;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        match block {
            Block::None => {
                if line == "require (" {
                    block = Block::Require;
                } else if line.ends_with('(') {
                    block = Block::Other;
                } else if let Some(rest) = line.strip_prefix("require ") {
                    if let Some(requirement) = parse_requirement_tokens(rest) {
                        requirements.push(requirement);
                    }
                }
            }
            Block::Require => {
                if line == ")" {
                    block = Block::None;
                } else if let Some(requirement) = parse_requirement_tokens(line) {
                    requirements.push(requirement);
                }
            }
            Block::Other => {
                if line == ")" {
                    block = Block::None;
                }
            }
        }
    }
    requirements
}

fn parse_requirement_tokens(line: &str) -> Option<GoRequirement> {
    let indirect = line.contains("// indirect");
    let mut tokens = line.split_whitespace();
    let module_path = tokens.next()?;
    let version = tokens.next()?;
    if !version.starts_with('v') {
        return None;
    }
    Some(GoRequirement {
        module_path: module_path.to_string(),
        version: version.to_string(),
        indirect,
    })
}

/// Parses `go list -m all` output. The first line names the main module
/// with no version and is skipped. Replace directives (`old => new`)
/// record the effective replacement when it carries a version.
fn parse_module_list(output: &str, direct_paths: &HashSet<&str>) -> Vec<Component> {
    let mut components = Vec::new();

    for raw_line in output.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let effective = match line.split_once(" => ") {
            Some((_, replacement)) if replacement.split_whitespace().count() >= 2 => replacement,
            Some((original, _)) => original,
            None => line,
        };

        let mut fields = effective.split_whitespace();
        let Some(module_path) = fields.next() else {
            continue;
        };
        let Some(version) = fields.next() else {
            continue;
        };

        let scope = if direct_paths.contains(module_path) {
            DependencyScope::Direct
        } else {
            DependencyScope::Transitive
        };
        let Ok(component) = Component::new(module_path, version, scope) else {
            continue;
        };
        components.push(component.with_purl("golang"));
    }
    components
}
