//! RestrictionEngine: the single public contract for restriction state
//!
//! Command handlers, event listeners, and HTTP controllers all talk to this
//! facade and nothing else. Every mutating call follows the same shape:
//!
//! 1. perform the store operation (atomic, in-memory)
//! 2. on success, write through to the state journal - *outside* the store
//!    lock, so disk latency never blocks other entities' operations
//! 3. notify the sink and return a typed result
//!
//! Expected business conditions (`AlreadyRestricted`, `NotConfined`, ...)
//! come back as `Err` values for the caller to translate into messaging;
//! nothing here panics on a state conflict.
//!
//! The engine is constructed once and handed by reference to every consumer.
//! There is no global accessor.

use crate::config::WardenConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use warden_core_restrict::journal::{
    confinement_key, freeze_key, jail_site_key, mute_key, warnings_key,
};
use warden_core_restrict::{
    Clock, ConfinementRecord, ContainmentVerdict, EntityId, EscalationAction, EscalationPolicy,
    JailSite, JournalDoc, Location, MuteRecord, MuteRemaining, NotificationSink, RestrictError,
    Restriction, RestrictionEvent, RestrictionKind, RestrictionStore, Result, StateJournal,
};
use warden_sweeper::{Sweeper, SweeperConfig};

/// Result of a `warn` call: the updated count and the action applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarnOutcome {
    pub new_count: u32,
    pub action: EscalationAction,
}

/// Thread-safe facade over the restriction store, escalation policy,
/// journal, and notification sink
pub struct RestrictionEngine {
    store: Arc<RestrictionStore>,
    policy: EscalationPolicy,
    journal: Arc<dyn StateJournal>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    default_jail_radius: f64,
}

fn to_doc<T: Serialize>(key: String, value: &T) -> Result<JournalDoc> {
    let body = serde_json::to_value(value)
        .map_err(|e| RestrictError::journal(format!("serialize {}: {}", key, e)))?;
    Ok(JournalDoc::new(key, body))
}

fn entity_from_key(key: &str) -> Option<EntityId> {
    key.split_once(':')
        .and_then(|(_, id)| id.parse::<EntityId>().ok())
}

impl RestrictionEngine {
    /// Construct the engine and seed it from the journal.
    ///
    /// Records that expired while the process was down are dropped (and
    /// their documents deleted); individually unreadable documents are
    /// skipped with a warning rather than failing startup.
    pub fn new(
        config: &WardenConfig,
        clock: Arc<dyn Clock>,
        journal: Arc<dyn StateJournal>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        if !config.escalation.is_monotonic() {
            warn!(
                "escalation thresholds are not monotonic (expected ban >= temp_ban >= kick >= mute); \
                 lower rungs may be shadowed"
            );
        }

        let engine = Self {
            store: Arc::new(RestrictionStore::new(clock.clone())),
            policy: EscalationPolicy::new(config.escalation.clone()),
            journal,
            sink,
            clock,
            default_jail_radius: config.jail_radius,
        };
        engine.load()?;
        Ok(engine)
    }

    fn load(&self) -> Result<()> {
        let docs = self.journal.load_all()?;
        let now = self.clock.now();

        // Jail sites must land before the confinements that reference them
        let (site_docs, rest): (Vec<JournalDoc>, Vec<JournalDoc>) = docs
            .into_iter()
            .partition(|doc| doc.key.starts_with("jail-site:"));
        let (confinement_docs, other_docs): (Vec<JournalDoc>, Vec<JournalDoc>) = rest
            .into_iter()
            .partition(|doc| doc.key.starts_with("confinement:"));

        let mut loaded = 0usize;
        let mut dropped_expired = 0usize;

        for doc in site_docs {
            match serde_json::from_value::<JailSite>(doc.body) {
                Ok(site) => {
                    self.store.upsert_jail_site(site);
                    loaded += 1;
                }
                Err(e) => warn!(key = %doc.key, "skipping malformed journal document: {}", e),
            }
        }

        for doc in other_docs {
            let Some(entity) = entity_from_key(&doc.key) else {
                warn!(key = %doc.key, "skipping journal document with unparsable entity id");
                continue;
            };

            if doc.key.starts_with("mute:") {
                match serde_json::from_value::<MuteRecord>(doc.body) {
                    Ok(record) if record.is_active(now) => {
                        self.store.load_mute(entity, record);
                        loaded += 1;
                    }
                    Ok(_) => {
                        dropped_expired += 1;
                        self.journal.delete(&doc.key)?;
                    }
                    Err(e) => warn!(key = %doc.key, "skipping malformed journal document: {}", e),
                }
            } else if doc.key.starts_with("freeze:") {
                match serde_json::from_value(doc.body) {
                    Ok(record) => {
                        self.store.load_freeze(entity, record);
                        loaded += 1;
                    }
                    Err(e) => warn!(key = %doc.key, "skipping malformed journal document: {}", e),
                }
            } else if doc.key.starts_with("warnings:") {
                match serde_json::from_value(doc.body) {
                    Ok(ledger) => {
                        self.store.load_warnings(entity, ledger);
                        loaded += 1;
                    }
                    Err(e) => warn!(key = %doc.key, "skipping malformed journal document: {}", e),
                }
            } else {
                warn!(key = %doc.key, "skipping journal document with unknown key prefix");
            }
        }

        for doc in confinement_docs {
            let Some(entity) = entity_from_key(&doc.key) else {
                warn!(key = %doc.key, "skipping journal document with unparsable entity id");
                continue;
            };
            match serde_json::from_value::<ConfinementRecord>(doc.body) {
                Ok(record) if !record.is_active(now) => {
                    dropped_expired += 1;
                    self.journal.delete(&doc.key)?;
                }
                Ok(record) => match self.store.load_confinement(entity, record) {
                    Ok(()) => loaded += 1,
                    Err(RestrictError::JailNotFound(jail)) => {
                        // Same fail-open rule as live containment: never
                        // restore a confinement against a missing anchor.
                        warn!(
                            %entity, %jail,
                            "stored confinement references a missing jail site; dropping"
                        );
                        self.journal.delete(&doc.key)?;
                    }
                    Err(e) => return Err(e),
                },
                Err(e) => warn!(key = %doc.key, "skipping malformed journal document: {}", e),
            }
        }

        info!(loaded, dropped_expired, "restriction journal loaded");
        Ok(())
    }

    /// Shared handle to the underlying store (sweeper wiring, chat gate)
    pub fn store(&self) -> Arc<RestrictionStore> {
        self.store.clone()
    }

    /// Build a sweeper over this engine's store, journal, and sink
    pub fn sweeper(&self, config: SweeperConfig) -> Sweeper {
        Sweeper::new(
            self.store.clone(),
            self.journal.clone(),
            self.sink.clone(),
            config,
        )
    }

    /// Spawn the sweeper as a background tokio task
    pub fn spawn_sweeper(&self, config: SweeperConfig) -> tokio::task::JoinHandle<()> {
        let sweeper = self.sweeper(config);
        tokio::spawn(sweeper.run())
    }

    fn expiry_after(&self, duration: Duration) -> Result<DateTime<Utc>> {
        if duration.is_zero() {
            return Err(RestrictError::invalid_duration("duration must be positive"));
        }
        let delta = chrono::Duration::from_std(duration)
            .map_err(|_| RestrictError::invalid_duration("duration out of range"))?;
        Ok(self.clock.now() + delta)
    }

    fn notify_applied(&self, entity: EntityId, kind: RestrictionKind, reason: &str, expires_at: Option<DateTime<Utc>>) {
        self.sink.notify(
            entity,
            RestrictionEvent::Applied {
                kind,
                reason: reason.to_string(),
                expires_at,
            },
        );
    }

    // ---- mutes ----

    pub fn mute(&self, entity: EntityId, reason: &str, issued_by: &str) -> Result<()> {
        let record = self.store.set_mute(entity, None, reason, issued_by)?;
        self.journal.save(&to_doc(mute_key(entity), &record)?)?;
        self.notify_applied(entity, record.kind(), &record.reason, None);
        Ok(())
    }

    pub fn temp_mute(
        &self,
        entity: EntityId,
        reason: &str,
        duration: Duration,
        issued_by: &str,
    ) -> Result<()> {
        let expires_at = self.expiry_after(duration)?;
        let record = self
            .store
            .set_mute(entity, Some(expires_at), reason, issued_by)?;
        self.journal.save(&to_doc(mute_key(entity), &record)?)?;
        self.notify_applied(entity, record.kind(), &record.reason, record.expires_at);
        Ok(())
    }

    pub fn unmute(&self, entity: EntityId) -> Result<()> {
        let record = self.store.clear_mute(entity)?;
        self.journal.delete(&mute_key(entity))?;
        self.sink
            .notify(entity, RestrictionEvent::Lifted { kind: record.kind() });
        Ok(())
    }

    pub fn is_muted(&self, entity: EntityId) -> bool {
        self.store.is_muted(entity)
    }

    pub fn mute_remaining(&self, entity: EntityId) -> MuteRemaining {
        self.store.mute_remaining(entity)
    }

    // ---- freezes ----

    pub fn freeze(&self, entity: EntityId, reason: &str, issued_by: &str) -> Result<()> {
        let record = self.store.set_freeze(entity, reason, issued_by)?;
        self.journal.save(&to_doc(freeze_key(entity), &record)?)?;
        self.notify_applied(entity, RestrictionKind::Freeze, &record.reason, None);
        Ok(())
    }

    pub fn unfreeze(&self, entity: EntityId) -> Result<()> {
        self.store.clear_freeze(entity)?;
        self.journal.delete(&freeze_key(entity))?;
        self.sink.notify(
            entity,
            RestrictionEvent::Lifted {
                kind: RestrictionKind::Freeze,
            },
        );
        Ok(())
    }

    pub fn is_frozen(&self, entity: EntityId) -> bool {
        self.store.is_frozen(entity)
    }

    // ---- warnings & escalation ----

    /// Record a warning and apply whatever action the policy decides, as one
    /// logical operation from the caller's perspective.
    pub fn warn(&self, entity: EntityId, reason: &str, issued_by: &str) -> Result<WarnOutcome> {
        let ledger = self.store.add_warning(entity, reason);
        self.journal.save(&to_doc(warnings_key(entity), &ledger)?)?;
        self.notify_applied(entity, RestrictionKind::WarningCount, reason, None);

        let action = self.policy.decide(ledger.count);
        if action != EscalationAction::NoAction {
            info!(%entity, count = ledger.count, ?action, "warning threshold crossed");
            self.sink.notify(
                entity,
                RestrictionEvent::Escalated {
                    count: ledger.count,
                    action: action.clone(),
                },
            );

            // The mute rung is enforced here; kick and ban enforcement live
            // with the embedding layer, which observes the Escalated event.
            if let EscalationAction::TempMute { duration } = &action {
                let escalation_reason = format!("warning threshold reached: {}", reason);
                match self.temp_mute(entity, &escalation_reason, *duration, issued_by) {
                    Ok(()) => {}
                    Err(RestrictError::AlreadyRestricted(_)) => {
                        debug!(%entity, "escalation temp mute skipped: permanent mute active");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(WarnOutcome {
            new_count: ledger.count,
            action,
        })
    }

    pub fn clear_warnings(&self, entity: EntityId) -> Result<u32> {
        let previous = self.store.clear_warnings(entity);
        if previous > 0 {
            self.journal.delete(&warnings_key(entity))?;
            self.sink.notify(
                entity,
                RestrictionEvent::Lifted {
                    kind: RestrictionKind::WarningCount,
                },
            );
        }
        Ok(previous)
    }

    pub fn warning_count(&self, entity: EntityId) -> u32 {
        self.store.warning_count(entity)
    }

    // ---- jail ----

    /// Confine an entity to a named jail site. Returns the site so the
    /// caller can relocate the entity to its anchor. `prior` is restored by
    /// `unjail`.
    pub fn jail(
        &self,
        entity: EntityId,
        jail_name: &str,
        reason: &str,
        issued_by: &str,
        prior: Option<Location>,
    ) -> Result<JailSite> {
        self.confine(entity, jail_name, None, prior, reason, issued_by)
    }

    pub fn temp_jail(
        &self,
        entity: EntityId,
        jail_name: &str,
        reason: &str,
        duration: Duration,
        issued_by: &str,
        prior: Option<Location>,
    ) -> Result<JailSite> {
        let expires_at = self.expiry_after(duration)?;
        self.confine(entity, jail_name, Some(expires_at), prior, reason, issued_by)
    }

    fn confine(
        &self,
        entity: EntityId,
        jail_name: &str,
        expires_at: Option<DateTime<Utc>>,
        prior: Option<Location>,
        reason: &str,
        issued_by: &str,
    ) -> Result<JailSite> {
        let (record, site) =
            self.store
                .confine(entity, jail_name, expires_at, prior, reason, issued_by)?;
        self.journal
            .save(&to_doc(confinement_key(entity), &record)?)?;
        self.notify_applied(entity, record.kind(), &record.reason, record.expires_at);
        Ok(site)
    }

    /// Release a confinement, returning the pre-confinement location
    pub fn unjail(&self, entity: EntityId) -> Result<Option<Location>> {
        let record = self.store.release(entity)?;
        self.journal.delete(&confinement_key(entity))?;
        self.sink
            .notify(entity, RestrictionEvent::Lifted { kind: record.kind() });
        Ok(record.prior_location)
    }

    pub fn is_jailed(&self, entity: EntityId) -> bool {
        self.store.is_jailed(entity)
    }

    pub fn current_jail(&self, entity: EntityId) -> Option<String> {
        self.store.current_jail(entity)
    }

    pub fn is_within_confinement(&self, entity: EntityId, location: &Location) -> bool {
        self.store.is_within_confinement(entity, location)
    }

    /// Containment decision for a movement, handling the fail-open release
    /// write-through (journal delete + anomaly notification)
    pub fn enforce_containment(
        &self,
        entity: EntityId,
        attempted: &Location,
    ) -> ContainmentVerdict {
        let verdict = self.store.enforce_containment(entity, attempted);
        if let ContainmentVerdict::Released { jail } = &verdict {
            if let Err(e) = self.journal.delete(&confinement_key(entity)) {
                warn!(%entity, "failed to delete journal document for fail-open release: {}", e);
            }
            self.sink.notify(
                entity,
                RestrictionEvent::ConfinementAnomaly { jail: jail.clone() },
            );
        }
        verdict
    }

    // ---- jail sites ----

    /// Create or replace a jail site. `radius` falls back to the configured
    /// default.
    pub fn create_jail_site(
        &self,
        name: &str,
        anchor: Location,
        radius: Option<f64>,
    ) -> Result<JailSite> {
        let site = JailSite::new(name, anchor, radius.unwrap_or(self.default_jail_radius));
        self.store.upsert_jail_site(site.clone());
        self.journal.save(&to_doc(jail_site_key(name), &site)?)?;
        Ok(site)
    }

    /// Delete a jail site, releasing every occupant. Returns the released
    /// entities.
    pub fn delete_jail_site(&self, name: &str) -> Result<Vec<EntityId>> {
        let (site, released) = self.store.delete_jail_site(name)?;
        self.journal.delete(&jail_site_key(&site.name))?;

        let mut out = Vec::with_capacity(released.len());
        for (entity, record) in released {
            self.journal.delete(&confinement_key(entity))?;
            self.sink
                .notify(entity, RestrictionEvent::Lifted { kind: record.kind() });
            out.push(entity);
        }
        Ok(out)
    }

    pub fn jail_site(&self, name: &str) -> Option<JailSite> {
        self.store.jail_site(name)
    }

    pub fn list_jail_sites(&self) -> Vec<JailSite> {
        self.store.list_jail_sites()
    }

    // ---- reporting ----

    /// Consistent point-in-time view of every active restriction
    pub fn snapshot(&self) -> Vec<Restriction> {
        self.store.snapshot()
    }
}
