use std::fmt;
use std::path::PathBuf;

/// Stable handle for one installed tool-chain: logical name plus install
/// path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolchainKind {
    Jdk,
    Jre,
    /// Aggregates other tool-chains; never checked directly.
    Composite,
    /// Derives its version from another install; never checked directly.
    Dependent,
}

impl ToolchainKind {
    pub fn updatable(self) -> bool {
        matches!(self, ToolchainKind::Jdk | ToolchainKind::Jre)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainInstance {
    pub name: String,
    pub install_path: PathBuf,
    pub installed_version: String,
    pub kind: ToolchainKind,
}

impl ToolchainInstance {
    pub fn id(&self) -> InstanceId {
        InstanceId(format!("{}@{}", self.name, self.install_path.display()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedEntry {
    pub suggested_name: String,
    pub version: String,
}

/// The feed join key plus the version actually on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledRelease {
    pub suggested_name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub name: String,
    pub version: String,
}

/// The consumer a scheduler belongs to. Template/default scopes exist for
/// configuration inheritance only and must never trigger checks.
#[derive(Clone, Debug)]
pub struct ScopeContext {
    name: String,
    template: bool,
}

impl ScopeContext {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: false,
        }
    }

    pub fn template(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_template(&self) -> bool {
        self.template
    }
}
