use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::collab::{InstalledResolver, PermissionPolicy, VersionFeed};
use crate::error::CheckError;
use crate::notify::NotificationStore;
use crate::schedule::cancel_requested;
use crate::types::{FeedEntry, InstanceId, ToolchainInstance, VersionDescriptor};
use crate::version::is_strictly_newer;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub examined: usize,
    /// Candidates with no offer already pending when the cycle started.
    pub fresh: usize,
    pub shown: usize,
    pub hidden: usize,
}

pub struct UpdateEvaluator {
    feed: Arc<dyn VersionFeed>,
    resolver: Arc<dyn InstalledResolver>,
    policy: Arc<dyn PermissionPolicy>,
    store: Arc<NotificationStore>,
}

impl UpdateEvaluator {
    pub fn new(
        feed: Arc<dyn VersionFeed>,
        resolver: Arc<dyn InstalledResolver>,
        policy: Arc<dyn PermissionPolicy>,
        store: Arc<NotificationStore>,
    ) -> Self {
        Self {
            feed,
            resolver,
            policy,
            store,
        }
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Two-phase sweep: every candidate starts in the "no-update" set and is
    /// exempted only when a strictly-newer, policy-allowed version shows up;
    /// whatever remains gets its notification retracted. Pending offers are
    /// re-examined too, relying on the store to suppress identical re-shows.
    pub async fn run_cycle(
        &self,
        snapshot: Vec<ToolchainInstance>,
        cancel: &watch::Receiver<bool>,
    ) -> Result<CycleReport, CheckError> {
        let candidates = normalize_snapshot(snapshot);
        let fresh = self.store.filter_not_pending(&candidates);
        let mut report = CycleReport {
            examined: candidates.len(),
            fresh: fresh.len(),
            ..CycleReport::default()
        };
        if candidates.is_empty() {
            return Ok(report);
        }
        debug!(
            examined = report.examined,
            pending = report.examined - report.fresh,
            "evaluating update candidates"
        );

        // Feed snapshot is fetched at most once per cycle, and only when the
        // first candidate actually resolves.
        let mut feed_index: Option<HashMap<String, FeedEntry>> = None;
        let mut no_update: BTreeMap<InstanceId, ToolchainInstance> = candidates
            .iter()
            .map(|instance| (instance.id(), instance.clone()))
            .collect();

        for instance in &candidates {
            if cancel_requested(cancel) {
                return Err(CheckError::Cancelled);
            }
            let Some(installed) = self.resolver.resolve(&instance.install_path) else {
                debug!(instance = %instance.name, "installed release unresolved; skipping");
                continue;
            };
            self.ensure_feed(&mut feed_index).await?;
            let Some(entry) = feed_index
                .as_ref()
                .and_then(|index| index.get(&installed.suggested_name))
            else {
                debug!(
                    instance = %instance.name,
                    suggested = %installed.suggested_name,
                    "no feed entry; skipping"
                );
                continue;
            };
            if !self.policy.allows(instance, entry) {
                debug!(
                    instance = %instance.name,
                    candidate = %entry.version,
                    "upgrade not permitted; skipping"
                );
                continue;
            }
            if !is_strictly_newer(&entry.version, &installed.version) {
                // Up to date: left in the sweep so a stale offer is retracted.
                continue;
            }
            if self.store.show(
                instance,
                VersionDescriptor {
                    name: installed.suggested_name.clone(),
                    version: installed.version.clone(),
                },
                VersionDescriptor {
                    name: entry.suggested_name.clone(),
                    version: entry.version.clone(),
                },
            ) {
                report.shown += 1;
            }
            no_update.remove(&instance.id());
        }

        if cancel_requested(cancel) {
            return Err(CheckError::Cancelled);
        }
        for id in no_update.into_keys() {
            if self.store.hide(&id) {
                report.hidden += 1;
            }
        }
        Ok(report)
    }

    async fn ensure_feed(
        &self,
        cache: &mut Option<HashMap<String, FeedEntry>>,
    ) -> Result<(), CheckError> {
        if cache.is_some() {
            return Ok(());
        }
        match self.feed.fetch().await {
            Ok(entries) => {
                let mut index = HashMap::with_capacity(entries.len());
                for entry in entries {
                    index.insert(entry.suggested_name.clone(), entry);
                }
                *cache = Some(index);
                Ok(())
            }
            Err(err) => {
                // Transient outage: abandoning here also skips the no-update
                // sweep, so existing offers survive until the feed is back.
                warn!("version feed unavailable: {err}");
                Err(CheckError::Feed(err))
            }
        }
    }
}

// Dedup by identity, drop non-Java-like kinds, sort for deterministic order.
fn normalize_snapshot(snapshot: Vec<ToolchainInstance>) -> Vec<ToolchainInstance> {
    let mut seen = HashSet::new();
    let mut out: Vec<ToolchainInstance> = snapshot
        .into_iter()
        .filter(|instance| instance.kind.updatable())
        .filter(|instance| seen.insert(instance.id()))
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id().cmp(&b.id())));
    out
}


#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use tokio::sync::watch;

    use super::test_support::{AllowAll, DenyAll, MapResolver, StaticFeed};
    use super::*;
    use crate::notify::test_support::{store_with, RecordingSink, SinkEvent};
    use crate::types::{InstalledRelease, ToolchainKind};

    fn jdk(name: &str, path: &str) -> ToolchainInstance {
        ToolchainInstance {
            name: name.into(),
            install_path: PathBuf::from(path),
            installed_version: "11.0.2".into(),
            kind: ToolchainKind::Jdk,
        }
    }

    fn feed_entry(name: &str, version: &str) -> FeedEntry {
        FeedEntry {
            suggested_name: name.into(),
            version: version.into(),
        }
    }

    fn release(name: &str, version: &str) -> InstalledRelease {
        InstalledRelease {
            suggested_name: name.into(),
            version: version.into(),
        }
    }

    struct Fixture {
        sink: Arc<RecordingSink>,
        resolver: Arc<MapResolver>,
        evaluator: UpdateEvaluator,
        cancel: watch::Receiver<bool>,
        _cancel_tx: watch::Sender<bool>,
    }

    fn fixture(feed: StaticFeed, policy: Arc<dyn PermissionPolicy>) -> Fixture {
        let sink = Arc::new(RecordingSink::default());
        let resolver = Arc::new(MapResolver::default());
        let store = Arc::new(store_with(sink.clone()));
        let evaluator = UpdateEvaluator::new(Arc::new(feed), resolver.clone(), policy, store);
        let (cancel_tx, cancel) = watch::channel(false);
        Fixture {
            sink,
            resolver,
            evaluator,
            cancel,
            _cancel_tx: cancel_tx,
        }
    }

    #[tokio::test]
    async fn newer_allowed_version_shows_once() {
        let fx = fixture(
            StaticFeed::new(vec![feed_entry("temurin-11", "11.0.9")]),
            Arc::new(AllowAll),
        );
        fx.resolver
            .insert("/opt/temurin-11", release("temurin-11", "11.0.2"));
        let snapshot = vec![jdk("temurin-11", "/opt/temurin-11")];

        let report = fx
            .evaluator
            .run_cycle(snapshot.clone(), &fx.cancel)
            .await
            .expect("cycle");
        assert_eq!(report.shown, 1);
        assert_eq!(report.hidden, 0);
        let pending = fx
            .evaluator
            .store()
            .pending(&snapshot[0].id())
            .expect("pending");
        assert_eq!(pending.installed().version, "11.0.2");
        assert_eq!(pending.candidate().version, "11.0.9");

        // Same feed, same install: the pending offer is left alone.
        let report = fx
            .evaluator
            .run_cycle(snapshot, &fx.cancel)
            .await
            .expect("cycle");
        assert_eq!(report.shown, 0);
        assert_eq!(report.hidden, 0);
        assert_eq!(fx.sink.shown_count(), 1);
    }

    #[tokio::test]
    async fn external_upgrade_retracts_stale_offer() {
        let fx = fixture(
            StaticFeed::new(vec![feed_entry("temurin-11", "11.0.9")]),
            Arc::new(AllowAll),
        );
        fx.resolver
            .insert("/opt/temurin-11", release("temurin-11", "11.0.2"));
        let snapshot = vec![jdk("temurin-11", "/opt/temurin-11")];

        fx.evaluator
            .run_cycle(snapshot.clone(), &fx.cancel)
            .await
            .expect("cycle");
        assert_eq!(fx.evaluator.store().pending_count(), 1);

        // The user upgraded outside this tool; the resolver now reports the
        // feed version as installed.
        fx.resolver
            .insert("/opt/temurin-11", release("temurin-11", "11.0.9"));
        let report = fx
            .evaluator
            .run_cycle(snapshot.clone(), &fx.cancel)
            .await
            .expect("cycle");
        assert_eq!(report.shown, 0);
        assert_eq!(report.hidden, 1);
        assert_eq!(fx.evaluator.store().pending_count(), 0);
        assert_eq!(
            fx.sink.events().last(),
            Some(&SinkEvent::Hidden(snapshot[0].id()))
        );
    }

    #[tokio::test]
    async fn denied_upgrade_never_shows() {
        let fx = fixture(
            StaticFeed::new(vec![feed_entry("temurin-11", "11.0.9")]),
            Arc::new(DenyAll),
        );
        fx.resolver
            .insert("/opt/temurin-11", release("temurin-11", "11.0.2"));

        let report = fx
            .evaluator
            .run_cycle(vec![jdk("temurin-11", "/opt/temurin-11")], &fx.cancel)
            .await
            .expect("cycle");
        assert_eq!(report.shown, 0);
        assert_eq!(fx.sink.shown_count(), 0);
    }

    #[tokio::test]
    async fn feed_is_lazy_and_fetched_at_most_once() {
        let feed = Arc::new(StaticFeed::new(vec![
            feed_entry("temurin-11", "11.0.9"),
            feed_entry("zulu-17", "17.0.2"),
        ]));
        let sink = Arc::new(RecordingSink::default());
        let resolver = Arc::new(MapResolver::default());
        let store = Arc::new(store_with(sink));
        let evaluator =
            UpdateEvaluator::new(feed.clone(), resolver.clone(), Arc::new(AllowAll), store);
        let (_cancel_tx, cancel) = watch::channel(false);

        // Nothing resolves: the feed must not be touched at all.
        evaluator
            .run_cycle(vec![jdk("unknown", "/opt/unknown")], &cancel)
            .await
            .expect("cycle");
        assert_eq!(feed.fetch_count(), 0);

        resolver.insert("/opt/temurin-11", release("temurin-11", "11.0.2"));
        resolver.insert("/opt/zulu-17", release("zulu-17", "17.0.1"));
        evaluator
            .run_cycle(
                vec![
                    jdk("temurin-11", "/opt/temurin-11"),
                    jdk("zulu-17", "/opt/zulu-17"),
                ],
                &cancel,
            )
            .await
            .expect("cycle");
        assert_eq!(feed.fetch_count(), 1);
    }

    #[tokio::test]
    async fn feed_outage_keeps_existing_offers() {
        let fx = fixture(
            StaticFeed::new(vec![feed_entry("temurin-11", "11.0.9")]),
            Arc::new(AllowAll),
        );
        fx.resolver
            .insert("/opt/temurin-11", release("temurin-11", "11.0.2"));
        let snapshot = vec![jdk("temurin-11", "/opt/temurin-11")];
        fx.evaluator
            .run_cycle(snapshot.clone(), &fx.cancel)
            .await
            .expect("cycle");
        assert_eq!(fx.evaluator.store().pending_count(), 1);

        let outage = fixture_with_store(StaticFeed::failing(), fx);
        let err = outage
            .evaluator
            .run_cycle(snapshot, &outage.cancel)
            .await
            .expect_err("outage");
        assert!(matches!(err, CheckError::Feed(_)));
        // The sweep never ran: the stale offer survives the outage.
        assert_eq!(outage.evaluator.store().pending_count(), 1);
    }

    // Rebuilds an evaluator around the previous fixture's store and resolver
    // with a different feed.
    fn fixture_with_store(feed: StaticFeed, previous: Fixture) -> Fixture {
        let store = Arc::clone(previous.evaluator.store());
        let evaluator = UpdateEvaluator::new(
            Arc::new(feed),
            previous.resolver.clone(),
            Arc::new(AllowAll),
            store,
        );
        Fixture {
            sink: previous.sink,
            resolver: previous.resolver,
            evaluator,
            cancel: previous.cancel,
            _cancel_tx: previous._cancel_tx,
        }
    }

    #[tokio::test]
    async fn cancellation_aborts_without_retraction() {
        let fx = fixture(
            StaticFeed::new(vec![feed_entry("temurin-11", "11.0.9")]),
            Arc::new(AllowAll),
        );
        fx.resolver
            .insert("/opt/temurin-11", release("temurin-11", "11.0.2"));
        let snapshot = vec![jdk("temurin-11", "/opt/temurin-11")];
        fx.evaluator
            .run_cycle(snapshot.clone(), &fx.cancel)
            .await
            .expect("cycle");

        let (tx, cancelled) = watch::channel(true);
        let err = fx
            .evaluator
            .run_cycle(snapshot, &cancelled)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, CheckError::Cancelled));
        assert_eq!(fx.evaluator.store().pending_count(), 1);
        drop(tx);
    }

    #[tokio::test]
    async fn composite_and_dependent_kinds_are_excluded() {
        let fx = fixture(
            StaticFeed::new(vec![feed_entry("temurin-11", "11.0.9")]),
            Arc::new(AllowAll),
        );
        fx.resolver
            .insert("/opt/suite", release("temurin-11", "11.0.2"));
        let mut composite = jdk("suite", "/opt/suite");
        composite.kind = ToolchainKind::Composite;

        let report = fx
            .evaluator
            .run_cycle(vec![composite], &fx.cancel)
            .await
            .expect("cycle");
        assert_eq!(report.examined, 0);
        assert_eq!(fx.sink.shown_count(), 0);
    }
}
