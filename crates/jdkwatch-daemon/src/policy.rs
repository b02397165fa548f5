use jdkwatch_core::{FeedEntry, PermissionPolicy, ToolchainInstance};

use crate::config::{AppConfig, DeniedUpgrade};

/// Deny-list policy from the config file. An entry with an empty version
/// blocks every candidate for that tool-chain.
pub(crate) struct ConfigPolicy {
    denied: Vec<DeniedUpgrade>,
}

impl ConfigPolicy {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            denied: config.denied.clone(),
        }
    }
}

impl PermissionPolicy for ConfigPolicy {
    fn allows(&self, _instance: &ToolchainInstance, candidate: &FeedEntry) -> bool {
        !self.denied.iter().any(|denied| {
            denied.suggested_name == candidate.suggested_name
                && (denied.version.is_empty() || denied.version == candidate.version)
        })
    }
}
