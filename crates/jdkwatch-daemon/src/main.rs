mod config;
mod policy;
mod resolver;
mod sink;

use std::sync::Arc;
use std::time::Duration;

use jdkwatch_core::schedule::INTERVAL_ENV;
use jdkwatch_core::{
    CheckScheduler, EnvGate, InstanceContributor, NotificationStore, ScopeContext,
    UpdateEvaluator, DEFAULT_CHECK_INTERVAL,
};
use jdkwatch_feed::{CatalogFeed, FeedSource};
use tracing::info;

use crate::config::{load_config, ConfigContributor};
use crate::policy::ConfigPolicy;
use crate::resolver::ReleaseFileResolver;
use crate::sink::LogSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    jdkwatch_util::init_tracing()?;
    jdkwatch_telemetry::init_with_env("jdkwatch", env!("CARGO_PKG_VERSION"));
    jdkwatch_telemetry::event("daemon.start", &[]);

    let config = load_config();
    let source = if config.feed.trim().is_empty() {
        FeedSource::from_env()
    } else {
        Some(FeedSource::parse(&config.feed))
    };
    let Some(source) = source else {
        return Err("no version feed configured; set JDKWATCH_FEED or the config feed field".into());
    };

    let scope = ScopeContext::named(config.scope.clone());
    let gate: Arc<EnvGate> = Arc::new(EnvGate);
    let store = Arc::new(NotificationStore::new(
        scope.clone(),
        gate.clone(),
        Arc::new(LogSink),
    ));
    let evaluator = UpdateEvaluator::new(
        Arc::new(CatalogFeed::new(source)),
        Arc::new(ReleaseFileResolver::from_config(&config)),
        Arc::new(ConfigPolicy::from_config(&config)),
        Arc::clone(&store),
    );
    let contributors: Vec<Arc<dyn InstanceContributor>> =
        vec![Arc::new(ConfigContributor::from_config(&config))];
    let scheduler = CheckScheduler::new(scope, gate, contributors, evaluator);

    let period = config
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| jdkwatch_util::env_duration_secs(INTERVAL_ENV, DEFAULT_CHECK_INTERVAL));
    scheduler.start_with_interval(period);
    scheduler.request_check();
    info!(
        scope = %config.scope,
        interval_secs = period.as_secs(),
        "jdkwatch daemon running"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    scheduler.dispose();
    store.dispose();
    Ok(())
}
