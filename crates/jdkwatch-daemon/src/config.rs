use std::{fs, io, path::PathBuf};

use jdkwatch_core::{InstanceContributor, ScopeContext, ToolchainInstance, ToolchainKind};
use serde::Deserialize;
use tracing::warn;

pub(crate) const CONFIG_ENV: &str = "JDKWATCH_CONFIG";

#[derive(Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) scope: String,
    /// Catalog path or http(s) URL; `JDKWATCH_FEED` is the fallback.
    pub(crate) feed: String,
    pub(crate) interval_secs: Option<u64>,
    pub(crate) toolchains: Vec<ConfigToolchain>,
    pub(crate) denied: Vec<DeniedUpgrade>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scope: "default".to_string(),
            feed: String::new(),
            interval_secs: None,
            toolchains: Vec::new(),
            denied: Vec::new(),
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ConfigToolchain {
    pub(crate) name: String,
    pub(crate) install_path: String,
    pub(crate) version: String,
    pub(crate) kind: String,
}

/// A specific upgrade the user has refused. Empty version blocks every
/// candidate for that tool-chain.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct DeniedUpgrade {
    pub(crate) suggested_name: String,
    pub(crate) version: String,
}

impl ConfigToolchain {
    pub(crate) fn to_instance(&self) -> ToolchainInstance {
        ToolchainInstance {
            name: self.name.clone(),
            install_path: jdkwatch_util::expand_user(&self.install_path),
            installed_version: self.version.clone(),
            kind: parse_kind(&self.kind),
        }
    }
}

pub(crate) fn load_config() -> AppConfig {
    let path = match std::env::var(CONFIG_ENV) {
        Ok(value) => PathBuf::from(value),
        Err(_) => jdkwatch_util::state_file_path("daemon.json"),
    };
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return AppConfig::default(),
        Err(e) => {
            warn!("Failed to read config {}: {}", path.display(), e);
            return AppConfig::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

pub(crate) fn parse_kind(kind: &str) -> ToolchainKind {
    match kind.to_lowercase().as_str() {
        "jre" => ToolchainKind::Jre,
        "composite" => ToolchainKind::Composite,
        "dependent" => ToolchainKind::Dependent,
        _ => ToolchainKind::Jdk,
    }
}

/// Static instance list from the config file; the simplest contributor.
pub(crate) struct ConfigContributor {
    instances: Vec<ToolchainInstance>,
}

impl ConfigContributor {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            instances: config
                .toolchains
                .iter()
                .filter(|item| !item.name.trim().is_empty() && !item.install_path.trim().is_empty())
                .map(ConfigToolchain::to_instance)
                .collect(),
        }
    }
}

impl InstanceContributor for ConfigContributor {
    fn contribute(&self, _scope: &ScopeContext) -> Vec<ToolchainInstance> {
        self.instances.clone()
    }
}
