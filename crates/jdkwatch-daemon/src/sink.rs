use jdkwatch_core::{InstanceId, NotificationSink, UpdateNotification};
use jdkwatch_telemetry as telemetry;
use tracing::info;

/// Renders the notification lifecycle as log lines.
pub(crate) struct LogSink;

impl NotificationSink for LogSink {
    fn on_show(&self, notification: &UpdateNotification) {
        info!(
            instance = %notification.instance_id(),
            installed = %notification.installed().version,
            available = %notification.candidate().version,
            "update available"
        );
        telemetry::event(
            "notification.shown",
            &[
                ("name", notification.candidate().name.as_str()),
                ("from", notification.installed().version.as_str()),
                ("to", notification.candidate().version.as_str()),
            ],
        );
    }

    fn on_hide(&self, instance: &InstanceId) {
        info!(instance = %instance, "update offer withdrawn");
        telemetry::event("notification.hidden", &[("instance", instance.as_str())]);
    }
}
