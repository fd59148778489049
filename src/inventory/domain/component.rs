use crate::shared::Result;

/// Maximum length for component names (security limit)
const MAX_NAME_LENGTH: usize = 255;

/// Maximum length for component versions (security limit)
const MAX_VERSION_LENGTH: usize = 100;

/// Classification of a component within the scanned project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentType {
    #[default]
    Library,
    Application,
    Framework,
    Tool,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Library => "library",
            ComponentType::Application => "application",
            ComponentType::Framework => "framework",
            ComponentType::Tool => "tool",
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a dependency entered the project: declared directly, pulled in
/// transitively, or declared for development/test only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyScope {
    Direct,
    Transitive,
    Dev,
}

impl DependencyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyScope::Direct => "direct",
            DependencyScope::Transitive => "transitive",
            DependencyScope::Dev => "dev",
        }
    }
}

impl std::fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity key used for deduplication across scan paths.
///
/// Two components with the same key are the same dependency even when
/// discovered through different manifests of a multi-module project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    pub name: String,
    pub version: String,
    pub group: Option<String>,
}

/// Component value object - one resolved dependency.
///
/// Created by an ecosystem scanner during a single scan pass and
/// immutable afterwards. `package_url` is derived once from
/// `(ecosystem, group, name, version)` and is only present when the
/// version is known, so every emitted purl ends in `@<version>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    version: String,
    component_type: ComponentType,
    scope: DependencyScope,
    license: Option<String>,
    group: Option<String>,
    package_url: Option<String>,
}

impl Component {
    /// Creates a component, validating the name invariant.
    ///
    /// # Errors
    /// Returns an error if the name is empty, or if the name or version
    /// exceeds the security length limits.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        scope: DependencyScope,
    ) -> Result<Self> {
        let name = name.into();
        let version = version.into();

        if name.trim().is_empty() {
            anyhow::bail!("Component name cannot be empty");
        }
        if name.len() > MAX_NAME_LENGTH {
            anyhow::bail!(
                "Component name is too long ({} bytes). Maximum allowed: {} bytes",
                name.len(),
                MAX_NAME_LENGTH
            );
        }
        if version.len() > MAX_VERSION_LENGTH {
            anyhow::bail!(
                "Component version is too long ({} bytes). Maximum allowed: {} bytes",
                version.len(),
                MAX_VERSION_LENGTH
            );
        }

        Ok(Self {
            name,
            version,
            component_type: ComponentType::default(),
            scope,
            license: None,
            group: None,
            package_url: None,
        })
    }

    /// Sets the ecosystem-specific grouping (e.g. Maven groupId, npm scope).
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    pub fn with_type(mut self, component_type: ComponentType) -> Self {
        self.component_type = component_type;
        self
    }

    /// Derives the canonical package URL for the given purl type.
    ///
    /// The namespace segment is percent-encoded and omitted entirely when
    /// the component has no group, so a group-less purl never contains a
    /// double slash. Components without a version keep `package_url`
    /// unset.
    pub fn with_purl(mut self, purl_type: &str) -> Self {
        if self.version.is_empty() {
            return self;
        }
        self.package_url = Some(match &self.group {
            Some(group) => format!(
                "pkg:{}/{}/{}@{}",
                purl_type,
                urlencoding::encode(group),
                self.name,
                self.version
            ),
            None => format!("pkg:{}/{}@{}", purl_type, self.name, self.version),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn scope(&self) -> DependencyScope {
        self.scope
    }

    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn package_url(&self) -> Option<&str> {
        self.package_url.as_deref()
    }

    /// Returns the deduplication identity of this component.
    pub fn key(&self) -> ComponentKey {
        ComponentKey {
            name: self.name.clone(),
            version: self.version.clone(),
            group: self.group.clone(),
        }
    }

    /// Replaces the scope. Used only by the merge step when resolving a
    /// scope collision between duplicate discoveries.
    pub(crate) fn reclassify(&mut self, scope: DependencyScope) {
        self.scope = scope;
    }
}
