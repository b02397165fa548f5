use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use jdkwatch_core::{InstalledRelease, InstalledResolver};
use tracing::debug;

use crate::config::AppConfig;

/// Resolves an install path by re-reading the `release` file JDK
/// distributions ship at their root. Reading live on every cycle is what
/// notices upgrades applied outside this tool.
pub(crate) struct ReleaseFileResolver {
    suggested: HashMap<PathBuf, String>,
}

impl ReleaseFileResolver {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            suggested: config
                .toolchains
                .iter()
                .filter(|item| !item.name.trim().is_empty())
                .map(|item| {
                    (
                        jdkwatch_util::expand_user(&item.install_path),
                        item.name.clone(),
                    )
                })
                .collect(),
        }
    }
}

impl InstalledResolver for ReleaseFileResolver {
    fn resolve(&self, install_path: &Path) -> Option<InstalledRelease> {
        let suggested = self.suggested.get(install_path)?;
        let version = read_release_version(install_path)?;
        Some(InstalledRelease {
            suggested_name: suggested.clone(),
            version,
        })
    }
}

fn read_release_version(install_path: &Path) -> Option<String> {
    let path = install_path.join("release");
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("No release file at {}: {}", path.display(), e);
            return None;
        }
    };
    parse_release_version(&raw)
}

/// Pulls `JAVA_VERSION="17.0.2"` out of a release file.
fn parse_release_version(raw: &str) -> Option<String> {
    raw.lines().find_map(|line| {
        let value = line.trim().strip_prefix("JAVA_VERSION=")?;
        let value = value.trim().trim_matches('"').trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}
