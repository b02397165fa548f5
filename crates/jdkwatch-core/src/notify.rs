use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use crate::collab::NotificationSink;
use crate::gate::UpdateCheckGate;
use crate::types::{InstanceId, ScopeContext, ToolchainInstance, VersionDescriptor};

/// One pending "update available" offer. The token identifies this
/// particular offer so a completion arriving after the offer was superseded
/// cannot remove its replacement.
#[derive(Clone, Debug)]
pub struct UpdateNotification {
    instance: ToolchainInstance,
    installed: VersionDescriptor,
    candidate: VersionDescriptor,
    token: Uuid,
}

impl UpdateNotification {
    pub fn instance(&self) -> &ToolchainInstance {
        &self.instance
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance.id()
    }

    pub fn installed(&self) -> &VersionDescriptor {
        &self.installed
    }

    pub fn candidate(&self) -> &VersionDescriptor {
        &self.candidate
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    fn same_offer(&self, installed: &VersionDescriptor, candidate: &VersionDescriptor) -> bool {
        self.installed == *installed && self.candidate == *candidate
    }
}

/// Registry of at most one active notification per tool-chain instance.
///
/// The mutex guards map bookkeeping only; sink callbacks always run after
/// the lock is dropped, so a completion handler that re-enters the store
/// cannot deadlock against it. The gate is consulted on every mutation.
pub struct NotificationStore {
    scope: ScopeContext,
    gate: Arc<dyn UpdateCheckGate>,
    sink: Arc<dyn NotificationSink>,
    tracked: Mutex<HashMap<InstanceId, Arc<UpdateNotification>>>,
}

impl NotificationStore {
    pub fn new(
        scope: ScopeContext,
        gate: Arc<dyn UpdateCheckGate>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            scope,
            gate,
            sink,
            tracked: Mutex::new(HashMap::new()),
        }
    }

    pub fn filter_not_pending(&self, instances: &[ToolchainInstance]) -> Vec<ToolchainInstance> {
        let tracked = self.tracked.lock().unwrap();
        instances
            .iter()
            .filter(|instance| !tracked.contains_key(&instance.id()))
            .cloned()
            .collect()
    }

    pub fn pending(&self, instance: &InstanceId) -> Option<Arc<UpdateNotification>> {
        self.tracked.lock().unwrap().get(instance).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.tracked.lock().unwrap().len()
    }

    /// Installs (or replaces) the offer for `instance`. Returns false when
    /// the gate is off or an identical offer is already showing.
    pub fn show(
        &self,
        instance: &ToolchainInstance,
        installed: VersionDescriptor,
        candidate: VersionDescriptor,
    ) -> bool {
        if !self.gate.enabled(&self.scope) {
            debug!(instance = %instance.id(), "update checks disabled; not showing");
            return false;
        }
        let id = instance.id();
        let fresh = Arc::new(UpdateNotification {
            instance: instance.clone(),
            installed,
            candidate,
            token: Uuid::new_v4(),
        });
        {
            let mut tracked = self.tracked.lock().unwrap();
            if let Some(existing) = tracked.get(&id) {
                if existing.same_offer(&fresh.installed, &fresh.candidate) {
                    debug!(instance = %id, "identical offer already pending; suppressed");
                    return false;
                }
                debug!(
                    instance = %id,
                    old = %existing.candidate.version,
                    new = %fresh.candidate.version,
                    "superseding pending offer"
                );
            }
            tracked.insert(id, Arc::clone(&fresh));
        }
        self.sink.on_show(&fresh);
        true
    }

    /// Completion path shared by user dismissal and retraction: removes the
    /// entry only while `token` still names the current offer, then tells
    /// the UI. Compare-and-remove, so completing a superseded offer cannot
    /// take out its replacement.
    pub fn complete(&self, instance: &InstanceId, token: Uuid) -> bool {
        let removed = {
            let mut tracked = self.tracked.lock().unwrap();
            match tracked.get(instance) {
                Some(current) if current.token == token => {
                    tracked.remove(instance);
                    true
                }
                _ => false,
            }
        };
        if removed {
            self.sink.on_hide(instance);
        }
        removed
    }

    pub fn hide(&self, instance: &InstanceId) -> bool {
        if !self.gate.enabled(&self.scope) {
            debug!(instance = %instance, "update checks disabled; not hiding");
            return false;
        }
        let token = {
            let tracked = self.tracked.lock().unwrap();
            tracked.get(instance).map(|current| current.token)
        };
        match token {
            Some(token) => self.complete(instance, token),
            None => false,
        }
    }

    /// Bulk teardown on shutdown: no per-item completion, no sink calls.
    pub fn dispose(&self) {
        self.tracked.lock().unwrap().clear();
    }
}
