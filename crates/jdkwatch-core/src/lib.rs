pub mod collab;
pub mod error;
pub mod evaluate;
pub mod gate;
pub mod notify;
pub mod schedule;
pub mod types;
pub mod version;

pub use collab::{
    InstalledResolver, InstanceContributor, NotificationSink, PermissionPolicy, VersionFeed,
};
pub use error::{CheckError, FeedError};
pub use evaluate::{CycleReport, UpdateEvaluator};
pub use gate::{EnvGate, UpdateCheckGate};
pub use notify::{NotificationStore, UpdateNotification};
pub use schedule::{CheckScheduler, DEFAULT_CHECK_INTERVAL};
pub use types::{
    FeedEntry, InstalledRelease, InstanceId, ScopeContext, ToolchainInstance, ToolchainKind,
    VersionDescriptor,
};
pub use version::{compare_versions, is_strictly_newer};
