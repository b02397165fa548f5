use std::path::Path;

use async_trait::async_trait;

use crate::error::FeedError;
use crate::notify::UpdateNotification;
use crate::types::{FeedEntry, InstalledRelease, InstanceId, ScopeContext, ToolchainInstance};

/// Invoked at most once per check cycle, and only when at least one
/// candidate needs evaluating.
#[async_trait]
pub trait VersionFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FeedEntry>, FeedError>;
}

/// `None` means "not ours to update" and the instance is skipped.
pub trait InstalledResolver: Send + Sync {
    fn resolve(&self, install_path: &Path) -> Option<InstalledRelease>;
}

pub trait PermissionPolicy: Send + Sync {
    fn allows(&self, instance: &ToolchainInstance, candidate: &FeedEntry) -> bool;
}

pub trait InstanceContributor: Send + Sync {
    fn contribute(&self, scope: &ScopeContext) -> Vec<ToolchainInstance>;
}

/// Callbacks run outside the store lock; `on_show` for an instance that
/// already renders a notification replaces it in place.
pub trait NotificationSink: Send + Sync {
    fn on_show(&self, notification: &UpdateNotification);
    fn on_hide(&self, instance: &InstanceId);
}
