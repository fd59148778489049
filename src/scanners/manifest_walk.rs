use std::fs;
use std::path::{Path, PathBuf};

/// IgnoreMatcher - compiled ignore patterns for manifest file walks
///
/// Supports `*` wildcards matching zero or more characters. Patterns
/// ending in `/` apply to directory names only (e.g. `node_modules/`),
/// all others apply to file names (e.g. `*.test.*`).
#[derive(Debug)]
pub struct IgnoreMatcher {
    directory_patterns: Vec<CompiledPattern>,
    file_patterns: Vec<CompiledPattern>,
}

impl IgnoreMatcher {
    pub fn new(patterns: &[String]) -> Self {
        let mut directory_patterns = Vec::new();
        let mut file_patterns = Vec::new();
        for pattern in patterns {
            if pattern.is_empty() || pattern.chars().all(|c| c == '*') {
                continue;
            }
            match pattern.strip_suffix('/') {
                Some(stripped) => directory_patterns.push(CompiledPattern::new(stripped)),
                None => file_patterns.push(CompiledPattern::new(pattern)),
            }
        }
        Self {
            directory_patterns,
            file_patterns,
        }
    }

    pub fn skips_directory(&self, name: &str) -> bool {
        self.directory_patterns.iter().any(|p| p.matches(name))
    }

    pub fn skips_file(&self, name: &str) -> bool {
        self.file_patterns.iter().any(|p| p.matches(name))
    }
}

/// A single compiled wildcard pattern, specialized for the common shapes.
#[derive(Debug)]
enum CompiledPattern {
    /// Exact match: "node_modules"
    Exact(String),
    /// Leading wildcard: "*.lock" -> ends_with check
    Suffix(String),
    /// Trailing wildcard: "target*" -> starts_with check
    Prefix(String),
    /// Anything else: ordered anchored segments
    Segments(Vec<String>),
}

impl CompiledPattern {
    fn new(pattern: &str) -> Self {
        let wildcard_count = pattern.matches('*').count();
        match wildcard_count {
            0 => CompiledPattern::Exact(pattern.to_string()),
            1 if pattern.starts_with('*') => CompiledPattern::Suffix(pattern[1..].to_string()),
            1 if pattern.ends_with('*') => {
                CompiledPattern::Prefix(pattern[..pattern.len() - 1].to_string())
            }
            _ => CompiledPattern::Segments(pattern.split('*').map(String::from).collect()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            CompiledPattern::Exact(pattern) => name == pattern,
            CompiledPattern::Suffix(suffix) => name.ends_with(suffix),
            CompiledPattern::Prefix(prefix) => name.starts_with(prefix),
            CompiledPattern::Segments(segments) => Self::segments_match(name, segments),
        }
    }

    /// Ordered segment match with anchored first and last segments.
    fn segments_match(name: &str, segments: &[String]) -> bool {
        let first = &segments[0];
        if !name.starts_with(first.as_str()) {
            return false;
        }
        let mut position = first.len();
        let last_index = segments.len() - 1;
        for segment in &segments[1..last_index] {
            if segment.is_empty() {
                continue;
            }
            match name[position..].find(segment.as_str()) {
                Some(found) => position = found + position + segment.len(),
                None => return false,
            }
        }
        let last = &segments[last_index];
        if last.is_empty() {
            return true;
        }
        name.len() >= position + last.len() && name[position..].ends_with(last.as_str())
    }
}

/// Matches one name against one `*` wildcard pattern. Unlike the
/// ignore matcher, a bare `*` here matches everything.
pub fn wildcard_match(name: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if pattern.chars().all(|c| c == '*') {
        return true;
    }
    CompiledPattern::new(pattern).matches(name)
}

/// Finds every file named `manifest_name` under `root`, walking at most
/// `max_depth` directory levels below the root.
///
/// Results come back in deterministic pre-order with the root's own
/// manifest first, so a multi-module project contributes its top-level
/// declarations before any nested module's. Symlinks are never
/// followed, and directories or files matched by the ignore patterns
/// are skipped entirely.
pub fn find_manifests(
    root: &Path,
    manifest_name: &str,
    max_depth: usize,
    ignore: &IgnoreMatcher,
) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, manifest_name, 0, max_depth, ignore, &mut found);
    found
}

fn walk(
    dir: &Path,
    manifest_name: &str,
    depth: usize,
    max_depth: usize,
    ignore: &IgnoreMatcher,
    found: &mut Vec<PathBuf>,
) {
    let manifest_path = dir.join(manifest_name);
    if is_regular_file(&manifest_path) && !ignore.skips_file(manifest_name) {
        found.push(manifest_path);
    }

    if depth >= max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut subdirectories: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_walkable_directory(path, ignore))
        .collect();
    subdirectories.sort();

    for subdirectory in subdirectories {
        walk(
            &subdirectory,
            manifest_name,
            depth + 1,
            max_depth,
            ignore,
            found,
        );
    }
}

fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

fn is_walkable_directory(path: &Path, ignore: &IgnoreMatcher) -> bool {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return false;
    };
    if !metadata.is_dir() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    !ignore.skips_directory(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn matcher(patterns: &[&str]) -> IgnoreMatcher {
        let owned: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        IgnoreMatcher::new(&owned)
    }

    #[test]
    fn test_exact_directory_pattern() {
        let ignore = matcher(&["node_modules/"]);
        assert!(ignore.skips_directory("node_modules"));
        assert!(!ignore.skips_directory("src"));
        assert!(!ignore.skips_file("node_modules"));
    }

    #[test]
    fn test_wildcard_file_pattern() {
        let ignore = matcher(&["*.test.*"]);
        assert!(ignore.skips_file("widget.test.js"));
        assert!(ignore.skips_file("a.test.py"));
        assert!(!ignore.skips_file("widget.js"));
    }

    #[test]
    fn test_prefix_and_suffix_patterns() {
        let ignore = matcher(&["target*", "*.bak"]);
        assert!(ignore.skips_file("target-classes"));
        assert!(ignore.skips_file("old.bak"));
        assert!(!ignore.skips_file("retarget"));
    }

    #[test]
    fn test_segment_pattern_is_anchored() {
        let ignore = matcher(&["pre*suf"]);
        assert!(ignore.skips_file("pre-middle-suf"));
        assert!(ignore.skips_file("presuf"));
        assert!(!ignore.skips_file("xpre-suf"));
        assert!(!ignore.skips_file("pre-sufx"));
    }

    #[test]
    fn test_only_wildcards_pattern_ignored() {
        let ignore = matcher(&["***"]);
        assert!(!ignore.skips_file("anything"));
        assert!(!ignore.skips_directory("anything"));
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("service-api", "service-*"));
        assert!(wildcard_match("legacy-api", "*-api"));
        assert!(wildcard_match("anything", "*"));
        assert!(!wildcard_match("frontend", "service-*"));
        assert!(!wildcard_match("anything", ""));
    }

    #[test]
    fn test_find_manifests_root_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        fs::create_dir_all(dir.path().join("module-a")).unwrap();
        fs::write(dir.path().join("module-a/pom.xml"), "<project/>").unwrap();
        fs::create_dir_all(dir.path().join("module-b")).unwrap();
        fs::write(dir.path().join("module-b/pom.xml"), "<project/>").unwrap();

        let found = find_manifests(dir.path(), "pom.xml", 5, &matcher(&[]));
        assert_eq!(found.len(), 3);
        assert_eq!(found[0], dir.path().join("pom.xml"));
        assert_eq!(found[1], dir.path().join("module-a/pom.xml"));
        assert_eq!(found[2], dir.path().join("module-b/pom.xml"));
    }

    #[test]
    fn test_find_manifests_respects_max_depth() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/requirements.txt"), "").unwrap();
        fs::write(dir.path().join("a/b/c/requirements.txt"), "").unwrap();

        let shallow = find_manifests(dir.path(), "requirements.txt", 1, &matcher(&[]));
        assert_eq!(shallow.len(), 1);

        let deep = find_manifests(dir.path(), "requirements.txt", 5, &matcher(&[]));
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_find_manifests_skips_ignored_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/lodash")).unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::write(dir.path().join("node_modules/lodash/package.json"), "{}").unwrap();

        let found = find_manifests(dir.path(), "package.json", 5, &matcher(&["node_modules/"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], dir.path().join("package.json"));
    }

    #[test]
    fn test_find_manifests_skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git/hooks")).unwrap();
        fs::write(dir.path().join(".git/hooks/pom.xml"), "<project/>").unwrap();

        let found = find_manifests(dir.path(), "pom.xml", 5, &matcher(&[]));
        assert!(found.is_empty());
    }

    #[test]
    fn test_find_manifests_missing_root() {
        let found = find_manifests(
            Path::new("/nonexistent/path"),
            "pom.xml",
            5,
            &matcher(&[]),
        );
        assert!(found.is_empty());
    }
}
