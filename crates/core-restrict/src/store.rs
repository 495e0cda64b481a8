//! RestrictionStore: authoritative owner of all restriction state
//!
//! # Concurrency
//!
//! Every map lives behind one coarse `std::sync::RwLock`. Moderation traffic
//! is low-frequency, so a single lock keeps every operation atomic at entity
//! granularity without per-key machinery; the lock is held only for the
//! in-memory mutation and is never held across journal writes or
//! notification dispatch (the engine does both after the store call
//! returns). Queries take the shared read lock and are cheap enough for
//! every movement tick.
//!
//! # Lazy expiry
//!
//! Activeness is always computed against the injected [`Clock`] at query
//! time. An expired-but-unswept record answers as absent everywhere; the
//! sweep exists only to retire such records proactively and emit expiry
//! notifications. Conditional retire operations match on `issued_at` so a
//! manual clear that raced the sweep is never released twice.

use crate::clock::Clock;
use crate::error::{RestrictError, Result};
use crate::record::{
    ConfinementRecord, EntityId, FreezeRecord, JailSite, Location, MuteRecord, MuteRemaining,
    Restriction, RestrictionKind, WarningLedger,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct StoreInner {
    mutes: HashMap<EntityId, MuteRecord>,
    freezes: HashMap<EntityId, FreezeRecord>,
    warnings: HashMap<EntityId, WarningLedger>,
    jail_sites: HashMap<String, JailSite>,
    confinements: HashMap<EntityId, ConfinementRecord>,
}

/// Concurrent map of active restrictions per entity
///
/// The store is the sole writer of restriction records; every other
/// component holds at most a cloned record for the duration of one call.
pub struct RestrictionStore {
    clock: Arc<dyn Clock>,
    inner: RwLock<StoreInner>,
}

impl RestrictionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// The clock this store computes expiry against
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ---- mutes ----

    /// Apply a mute, permanent (`expires_at == None`) or timed.
    ///
    /// A permanent mute replaces whatever mute is active. A timed mute
    /// replaces an existing timed mute (fresh expiry wins) but is rejected
    /// with `AlreadyRestricted` when a permanent mute is active, so an
    /// escalation can never silently downgrade a standing mute.
    pub fn set_mute(
        &self,
        entity: EntityId,
        expires_at: Option<DateTime<Utc>>,
        reason: &str,
        issued_by: &str,
    ) -> Result<MuteRecord> {
        let now = self.clock.now();
        if let Some(expiry) = expires_at {
            if expiry <= now {
                return Err(RestrictError::invalid_duration(format!(
                    "mute expiry {} is not in the future",
                    expiry
                )));
            }
        }

        let mut inner = self.inner.write().unwrap();
        if let Some(existing) = inner.mutes.get(&entity) {
            if existing.is_active(now) && existing.expires_at.is_none() && expires_at.is_some() {
                return Err(RestrictError::AlreadyRestricted(entity));
            }
        }

        let record = MuteRecord {
            expires_at,
            reason: reason.to_string(),
            issued_by: issued_by.to_string(),
            issued_at: now,
        };
        inner.mutes.insert(entity, record.clone());
        Ok(record)
    }

    /// Remove an active mute, returning it.
    ///
    /// A lapsed timed mute counts as absent; the stale entry is dropped on
    /// the way out.
    pub fn clear_mute(&self, entity: EntityId) -> Result<MuteRecord> {
        let now = self.clock.now();
        let mut inner = self.inner.write().unwrap();

        match inner.mutes.remove(&entity) {
            Some(record) if record.is_active(now) => Ok(record),
            _ => Err(RestrictError::NotRestricted(entity)),
        }
    }

    pub fn is_muted(&self, entity: EntityId) -> bool {
        let now = self.clock.now();
        let inner = self.inner.read().unwrap();
        inner
            .mutes
            .get(&entity)
            .map(|record| record.is_active(now))
            .unwrap_or(false)
    }

    /// Remaining mute time, computed lazily against the clock
    pub fn mute_remaining(&self, entity: EntityId) -> MuteRemaining {
        let now = self.clock.now();
        let inner = self.inner.read().unwrap();

        match inner.mutes.get(&entity) {
            None => MuteRemaining::NotMuted,
            Some(record) => match record.expires_at {
                None => MuteRemaining::Permanent,
                Some(expires_at) if now < expires_at => {
                    let left = (expires_at - now).to_std().unwrap_or_default();
                    MuteRemaining::Remaining(left)
                }
                Some(_) => MuteRemaining::NotMuted,
            },
        }
    }

    /// Currently stored mute record, if still active
    pub fn mute(&self, entity: EntityId) -> Option<MuteRecord> {
        let now = self.clock.now();
        let inner = self.inner.read().unwrap();
        inner
            .mutes
            .get(&entity)
            .filter(|record| record.is_active(now))
            .cloned()
    }

    // ---- freezes ----

    pub fn set_freeze(
        &self,
        entity: EntityId,
        reason: &str,
        issued_by: &str,
    ) -> Result<FreezeRecord> {
        let mut inner = self.inner.write().unwrap();
        if inner.freezes.contains_key(&entity) {
            return Err(RestrictError::AlreadyRestricted(entity));
        }

        let record = FreezeRecord {
            reason: reason.to_string(),
            issued_by: issued_by.to_string(),
            issued_at: self.clock.now(),
        };
        inner.freezes.insert(entity, record.clone());
        Ok(record)
    }

    pub fn clear_freeze(&self, entity: EntityId) -> Result<FreezeRecord> {
        let mut inner = self.inner.write().unwrap();
        inner
            .freezes
            .remove(&entity)
            .ok_or(RestrictError::NotRestricted(entity))
    }

    pub fn is_frozen(&self, entity: EntityId) -> bool {
        let inner = self.inner.read().unwrap();
        inner.freezes.contains_key(&entity)
    }

    // ---- warnings ----

    /// Increment the warning ledger, returning the updated ledger.
    ///
    /// The increment happens under the write lock, so concurrent callers on
    /// the same entity can never lose an update.
    pub fn add_warning(&self, entity: EntityId, reason: &str) -> WarningLedger {
        let now = self.clock.now();
        let mut inner = self.inner.write().unwrap();

        let ledger = inner.warnings.entry(entity).or_insert(WarningLedger {
            count: 0,
            last_reason: None,
            updated_at: now,
        });
        ledger.count += 1;
        ledger.last_reason = Some(reason.to_string());
        ledger.updated_at = now;
        ledger.clone()
    }

    pub fn warning_count(&self, entity: EntityId) -> u32 {
        let inner = self.inner.read().unwrap();
        inner
            .warnings
            .get(&entity)
            .map(|ledger| ledger.count)
            .unwrap_or(0)
    }

    /// Reset the ledger, returning the previous count (0 if none existed)
    pub fn clear_warnings(&self, entity: EntityId) -> u32 {
        let mut inner = self.inner.write().unwrap();
        inner
            .warnings
            .remove(&entity)
            .map(|ledger| ledger.count)
            .unwrap_or(0)
    }

    // ---- jail sites ----

    /// Create or replace a jail site; names are keyed lowercase
    pub fn upsert_jail_site(&self, site: JailSite) {
        let mut inner = self.inner.write().unwrap();
        inner.jail_sites.insert(site.name.to_lowercase(), site);
    }

    pub fn jail_site(&self, name: &str) -> Option<JailSite> {
        let inner = self.inner.read().unwrap();
        inner.jail_sites.get(&name.to_lowercase()).cloned()
    }

    /// All jail sites, sorted by name for stable listings
    pub fn list_jail_sites(&self) -> Vec<JailSite> {
        let inner = self.inner.read().unwrap();
        let mut sites: Vec<JailSite> = inner.jail_sites.values().cloned().collect();
        sites.sort_by(|a, b| a.name.cmp(&b.name));
        sites
    }

    /// Delete a jail site, releasing every occupant in the same operation so
    /// no confinement record is ever left dangling.
    ///
    /// Returns the removed site and the released `(entity, record)` pairs.
    pub fn delete_jail_site(
        &self,
        name: &str,
    ) -> Result<(JailSite, Vec<(EntityId, ConfinementRecord)>)> {
        let key = name.to_lowercase();
        let mut inner = self.inner.write().unwrap();

        let site = inner
            .jail_sites
            .remove(&key)
            .ok_or_else(|| RestrictError::JailNotFound(name.to_string()))?;

        let occupants: Vec<EntityId> = inner
            .confinements
            .iter()
            .filter(|(_, record)| record.jail == key)
            .map(|(entity, _)| *entity)
            .collect();

        let released = occupants
            .into_iter()
            .filter_map(|entity| {
                inner
                    .confinements
                    .remove(&entity)
                    .map(|record| (entity, record))
            })
            .collect();

        Ok((site, released))
    }

    // ---- confinement ----

    /// Confine an entity to a named jail site.
    ///
    /// `prior_location` is restored to the caller on release. Fails with
    /// `JailNotFound` for an unknown site and `AlreadyConfined` when an
    /// active confinement exists (a lapsed one is replaced).
    pub fn confine(
        &self,
        entity: EntityId,
        jail_name: &str,
        expires_at: Option<DateTime<Utc>>,
        prior_location: Option<Location>,
        reason: &str,
        issued_by: &str,
    ) -> Result<(ConfinementRecord, JailSite)> {
        let now = self.clock.now();
        if let Some(expiry) = expires_at {
            if expiry <= now {
                return Err(RestrictError::invalid_duration(format!(
                    "confinement expiry {} is not in the future",
                    expiry
                )));
            }
        }

        let key = jail_name.to_lowercase();
        let mut inner = self.inner.write().unwrap();

        let site = inner
            .jail_sites
            .get(&key)
            .cloned()
            .ok_or_else(|| RestrictError::JailNotFound(jail_name.to_string()))?;

        if let Some(existing) = inner.confinements.get(&entity) {
            if existing.is_active(now) {
                return Err(RestrictError::AlreadyConfined(entity));
            }
        }

        let record = ConfinementRecord {
            jail: key,
            prior_location,
            expires_at,
            reason: reason.to_string(),
            issued_by: issued_by.to_string(),
            issued_at: now,
        };
        inner.confinements.insert(entity, record.clone());
        Ok((record, site))
    }

    /// Remove an active confinement, returning it.
    ///
    /// A lapsed record counts as absent (dropped on the way out, same as
    /// [`RestrictionStore::clear_mute`]).
    pub fn release(&self, entity: EntityId) -> Result<ConfinementRecord> {
        let now = self.clock.now();
        let mut inner = self.inner.write().unwrap();

        match inner.confinements.remove(&entity) {
            Some(record) if record.is_active(now) => Ok(record),
            _ => Err(RestrictError::NotConfined(entity)),
        }
    }

    pub fn is_jailed(&self, entity: EntityId) -> bool {
        let now = self.clock.now();
        let inner = self.inner.read().unwrap();
        inner
            .confinements
            .get(&entity)
            .map(|record| record.is_active(now))
            .unwrap_or(false)
    }

    /// Name of the jail the entity is actively confined to
    pub fn current_jail(&self, entity: EntityId) -> Option<String> {
        self.confinement(entity).map(|record| record.jail)
    }

    /// Active confinement record for the entity
    pub fn confinement(&self, entity: EntityId) -> Option<ConfinementRecord> {
        let now = self.clock.now();
        let inner = self.inner.read().unwrap();
        inner
            .confinements
            .get(&entity)
            .filter(|record| record.is_active(now))
            .cloned()
    }

    // ---- snapshot & sweep support ----

    /// Consistent point-in-time view of all active restrictions.
    ///
    /// Built under a single read lock: no record appears twice and none is
    /// observed half-written. Lapsed records are filtered out.
    pub fn snapshot(&self) -> Vec<Restriction> {
        let now = self.clock.now();
        let inner = self.inner.read().unwrap();
        let mut out = Vec::new();

        for (entity, record) in &inner.mutes {
            if record.is_active(now) {
                out.push(Restriction {
                    entity: *entity,
                    kind: record.kind(),
                    expires_at: record.expires_at,
                    reason: record.reason.clone(),
                    issued_by: record.issued_by.clone(),
                    issued_at: record.issued_at,
                });
            }
        }

        for (entity, record) in &inner.freezes {
            out.push(Restriction {
                entity: *entity,
                kind: RestrictionKind::Freeze,
                expires_at: None,
                reason: record.reason.clone(),
                issued_by: record.issued_by.clone(),
                issued_at: record.issued_at,
            });
        }

        for (entity, ledger) in &inner.warnings {
            out.push(Restriction {
                entity: *entity,
                kind: RestrictionKind::WarningCount,
                expires_at: None,
                reason: ledger.summary(),
                issued_by: String::new(),
                issued_at: ledger.updated_at,
            });
        }

        for (entity, record) in &inner.confinements {
            if record.is_active(now) {
                out.push(Restriction {
                    entity: *entity,
                    kind: record.kind(),
                    expires_at: record.expires_at,
                    reason: record.reason.clone(),
                    issued_by: record.issued_by.clone(),
                    issued_at: record.issued_at,
                });
            }
        }

        out
    }

    /// Records whose expiry has passed, as observed right now.
    ///
    /// Unlike [`RestrictionStore::snapshot`] this includes lapsed records -
    /// it is the sweep's work list.
    pub fn expired_records(&self) -> Vec<Restriction> {
        let now = self.clock.now();
        let inner = self.inner.read().unwrap();
        let mut out = Vec::new();

        for (entity, record) in &inner.mutes {
            if let Some(expires_at) = record.expires_at {
                if expires_at <= now {
                    out.push(Restriction {
                        entity: *entity,
                        kind: record.kind(),
                        expires_at: record.expires_at,
                        reason: record.reason.clone(),
                        issued_by: record.issued_by.clone(),
                        issued_at: record.issued_at,
                    });
                }
            }
        }

        for (entity, record) in &inner.confinements {
            if let Some(expires_at) = record.expires_at {
                if expires_at <= now {
                    out.push(Restriction {
                        entity: *entity,
                        kind: record.kind(),
                        expires_at: record.expires_at,
                        reason: record.reason.clone(),
                        issued_by: record.issued_by.clone(),
                        issued_at: record.issued_at,
                    });
                }
            }
        }

        out
    }

    /// Retire a mute iff the observed record is still current and lapsed.
    ///
    /// `observed_issued_at` is the `issued_at` of the snapshot record; a
    /// record replaced or removed since the snapshot no longer matches and
    /// is left alone, guarding against double release.
    pub fn retire_mute_if(
        &self,
        entity: EntityId,
        observed_issued_at: DateTime<Utc>,
    ) -> Option<MuteRecord> {
        let now = self.clock.now();
        let mut inner = self.inner.write().unwrap();

        let lapsed = matches!(
            inner.mutes.get(&entity),
            Some(record) if record.issued_at == observed_issued_at
                && matches!(record.expires_at, Some(expiry) if expiry <= now)
        );
        if lapsed {
            inner.mutes.remove(&entity)
        } else {
            None
        }
    }

    /// Confinement counterpart of [`RestrictionStore::retire_mute_if`]
    pub fn retire_confinement_if(
        &self,
        entity: EntityId,
        observed_issued_at: DateTime<Utc>,
    ) -> Option<ConfinementRecord> {
        let now = self.clock.now();
        let mut inner = self.inner.write().unwrap();

        let lapsed = matches!(
            inner.confinements.get(&entity),
            Some(record) if record.issued_at == observed_issued_at
                && matches!(record.expires_at, Some(expiry) if expiry <= now)
        );
        if lapsed {
            inner.confinements.remove(&entity)
        } else {
            None
        }
    }

    // ---- journal restore ----
    //
    // Used by the engine at startup to seed state from persisted documents.
    // Expiry filtering happens in the engine (it logs what it drops); these
    // insert records as-is, except that a confinement must reference a jail
    // site that has already been restored.

    pub fn load_mute(&self, entity: EntityId, record: MuteRecord) {
        let mut inner = self.inner.write().unwrap();
        inner.mutes.insert(entity, record);
    }

    pub fn load_freeze(&self, entity: EntityId, record: FreezeRecord) {
        let mut inner = self.inner.write().unwrap();
        inner.freezes.insert(entity, record);
    }

    pub fn load_warnings(&self, entity: EntityId, ledger: WarningLedger) {
        let mut inner = self.inner.write().unwrap();
        inner.warnings.insert(entity, ledger);
    }

    pub fn load_confinement(&self, entity: EntityId, record: ConfinementRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if !inner.jail_sites.contains_key(&record.jail) {
            return Err(RestrictError::JailNotFound(record.jail));
        }
        inner.confinements.insert(entity, record);
        Ok(())
    }

    /// Insert a confinement without the jail-site check, to exercise the
    /// fail-open containment path against an orphaned record.
    #[cfg(test)]
    pub(crate) fn inject_confinement_unchecked(&self, entity: EntityId, record: ConfinementRecord) {
        let mut inner = self.inner.write().unwrap();
        inner.confinements.insert(entity, record);
    }

    // ---- containment (see containment.rs for the verdict logic) ----

    pub(crate) fn with_inner_read<T>(&self, f: impl FnOnce(ContainmentView<'_>) -> T) -> T {
        let inner = self.inner.read().unwrap();
        f(ContainmentView { inner: &*inner })
    }

    pub(crate) fn remove_orphaned_confinement(
        &self,
        entity: EntityId,
    ) -> Option<ConfinementRecord> {
        let mut inner = self.inner.write().unwrap();
        // Re-check under the write lock: the site may have been recreated or
        // the record released since the read-locked observation.
        let orphaned = matches!(
            inner.confinements.get(&entity),
            Some(record) if !inner.jail_sites.contains_key(&record.jail)
        );
        if orphaned {
            inner.confinements.remove(&entity)
        } else {
            None
        }
    }
}

/// Read-locked view used by the containment checks
pub(crate) struct ContainmentView<'a> {
    inner: &'a StoreInner,
}

impl ContainmentView<'_> {
    pub(crate) fn confinement(&self, entity: EntityId) -> Option<&ConfinementRecord> {
        self.inner.confinements.get(&entity)
    }

    pub(crate) fn jail_site(&self, key: &str) -> Option<&JailSite> {
        self.inner.jail_sites.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    fn store_with_clock() -> (RestrictionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::from_system());
        let store = RestrictionStore::new(clock.clone());
        (store, clock)
    }

    fn expiry_in(clock: &ManualClock, duration: Duration) -> DateTime<Utc> {
        clock.now() + chrono::Duration::from_std(duration).unwrap()
    }

    #[test]
    fn test_permanent_mute_roundtrip() {
        let (store, _clock) = store_with_clock();
        let entity = EntityId::new_v4();

        store.set_mute(entity, None, "spam", "mod").unwrap();
        assert!(store.is_muted(entity));
        assert_eq!(store.mute_remaining(entity), MuteRemaining::Permanent);

        let record = store.clear_mute(entity).unwrap();
        assert_eq!(record.reason, "spam");
        assert!(!store.is_muted(entity));
        assert!(matches!(
            store.clear_mute(entity),
            Err(RestrictError::NotRestricted(_))
        ));
    }

    #[test]
    fn test_temp_mute_lazy_expiry() {
        let (store, clock) = store_with_clock();
        let entity = EntityId::new_v4();

        let expiry = expiry_in(&clock, Duration::from_secs(60));
        store.set_mute(entity, Some(expiry), "caps", "mod").unwrap();
        assert!(store.is_muted(entity));

        // No sweep ever runs; the next query must see the mute as gone
        clock.advance(Duration::from_secs(61));
        assert!(!store.is_muted(entity));
        assert_eq!(store.mute_remaining(entity), MuteRemaining::NotMuted);
        assert!(matches!(
            store.clear_mute(entity),
            Err(RestrictError::NotRestricted(_))
        ));
    }

    #[test]
    fn test_temp_mute_rejected_over_permanent() {
        let (store, clock) = store_with_clock();
        let entity = EntityId::new_v4();

        store.set_mute(entity, None, "spam", "mod").unwrap();
        let expiry = expiry_in(&clock, Duration::from_secs(60));
        assert!(matches!(
            store.set_mute(entity, Some(expiry), "caps", "mod"),
            Err(RestrictError::AlreadyRestricted(_))
        ));

        // Permanent over permanent replaces (reason updated)
        store.set_mute(entity, None, "worse spam", "admin").unwrap();
        assert_eq!(store.mute(entity).unwrap().reason, "worse spam");
    }

    #[test]
    fn test_timed_mute_replaces_timed_mute() {
        let (store, clock) = store_with_clock();
        let entity = EntityId::new_v4();

        let first = expiry_in(&clock, Duration::from_secs(60));
        store.set_mute(entity, Some(first), "a", "mod").unwrap();

        let second = expiry_in(&clock, Duration::from_secs(600));
        store.set_mute(entity, Some(second), "b", "mod").unwrap();
        assert_eq!(store.mute(entity).unwrap().expires_at, Some(second));
    }

    #[test]
    fn test_mute_expiry_in_past_is_invalid() {
        let (store, clock) = store_with_clock();
        let entity = EntityId::new_v4();

        assert!(matches!(
            store.set_mute(entity, Some(clock.now()), "x", "mod"),
            Err(RestrictError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_freeze_conflicts() {
        let (store, _clock) = store_with_clock();
        let entity = EntityId::new_v4();

        store.set_freeze(entity, "afk check", "mod").unwrap();
        assert!(store.is_frozen(entity));
        assert!(matches!(
            store.set_freeze(entity, "again", "mod"),
            Err(RestrictError::AlreadyRestricted(_))
        ));

        store.clear_freeze(entity).unwrap();
        assert!(!store.is_frozen(entity));
        assert!(matches!(
            store.clear_freeze(entity),
            Err(RestrictError::NotRestricted(_))
        ));
    }

    #[test]
    fn test_warning_accumulation_and_clear() {
        let (store, _clock) = store_with_clock();
        let entity = EntityId::new_v4();

        assert_eq!(store.add_warning(entity, "spam").count, 1);
        assert_eq!(store.add_warning(entity, "caps").count, 2);
        assert_eq!(store.warning_count(entity), 2);

        assert_eq!(store.clear_warnings(entity), 2);
        assert_eq!(store.warning_count(entity), 0);
        assert_eq!(store.clear_warnings(entity), 0);
    }

    #[test]
    fn test_confine_requires_site() {
        let (store, _clock) = store_with_clock();
        let entity = EntityId::new_v4();

        assert!(matches!(
            store.confine(entity, "nowhere", None, None, "x", "mod"),
            Err(RestrictError::JailNotFound(_))
        ));
    }

    #[test]
    fn test_confine_and_release() {
        let (store, _clock) = store_with_clock();
        let entity = EntityId::new_v4();
        let prior = Location::new("overworld", 1.0, 2.0, 3.0);

        store.upsert_jail_site(JailSite::new(
            "Cell-A",
            Location::new("overworld", 0.0, 64.0, 0.0),
            10.0,
        ));

        let (record, site) = store
            .confine(entity, "cell-a", None, Some(prior.clone()), "grief", "mod")
            .unwrap();
        assert_eq!(record.jail, "cell-a");
        assert_eq!(site.name, "Cell-A");
        assert!(store.is_jailed(entity));
        assert_eq!(store.current_jail(entity).as_deref(), Some("cell-a"));

        assert!(matches!(
            store.confine(entity, "cell-a", None, None, "again", "mod"),
            Err(RestrictError::AlreadyConfined(_))
        ));

        let released = store.release(entity).unwrap();
        assert_eq!(released.prior_location, Some(prior));
        assert!(!store.is_jailed(entity));
        assert!(matches!(
            store.release(entity),
            Err(RestrictError::NotConfined(_))
        ));
    }

    #[test]
    fn test_temp_confinement_lazy_expiry() {
        let (store, clock) = store_with_clock();
        let entity = EntityId::new_v4();

        store.upsert_jail_site(JailSite::new(
            "brig",
            Location::new("overworld", 0.0, 0.0, 0.0),
            5.0,
        ));
        let expiry = expiry_in(&clock, Duration::from_secs(1));
        store
            .confine(entity, "brig", Some(expiry), None, "x", "mod")
            .unwrap();
        assert!(store.is_jailed(entity));

        clock.advance(Duration::from_secs(2));
        assert!(!store.is_jailed(entity));
        assert_eq!(store.current_jail(entity), None);
    }

    #[test]
    fn test_delete_jail_site_releases_occupants() {
        let (store, _clock) = store_with_clock();
        let a = EntityId::new_v4();
        let b = EntityId::new_v4();

        store.upsert_jail_site(JailSite::new(
            "brig",
            Location::new("overworld", 0.0, 0.0, 0.0),
            5.0,
        ));
        store.confine(a, "brig", None, None, "x", "mod").unwrap();
        store.confine(b, "BRIG", None, None, "y", "mod").unwrap();

        let (_site, released) = store.delete_jail_site("Brig").unwrap();
        assert_eq!(released.len(), 2);
        assert!(!store.is_jailed(a));
        assert!(!store.is_jailed(b));
        // No dangling record: re-confining now reports the missing site
        assert!(matches!(
            store.confine(a, "brig", None, None, "z", "mod"),
            Err(RestrictError::JailNotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_consistency() {
        let (store, clock) = store_with_clock();
        let muted = EntityId::new_v4();
        let frozen = EntityId::new_v4();
        let warned = EntityId::new_v4();

        store.set_mute(muted, None, "spam", "mod").unwrap();
        store.set_freeze(frozen, "afk", "mod").unwrap();
        store.add_warning(warned, "caps");

        let expired = EntityId::new_v4();
        let expiry = expiry_in(&clock, Duration::from_secs(1));
        store.set_mute(expired, Some(expiry), "x", "mod").unwrap();
        clock.advance(Duration::from_secs(2));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.iter().any(|r| r.entity == expired));

        let kinds: Vec<RestrictionKind> = snapshot.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&RestrictionKind::Mute));
        assert!(kinds.contains(&RestrictionKind::Freeze));
        assert!(kinds.contains(&RestrictionKind::WarningCount));
    }

    #[test]
    fn test_retire_mute_if_guards_against_replacement() {
        let (store, clock) = store_with_clock();
        let entity = EntityId::new_v4();

        let expiry = expiry_in(&clock, Duration::from_secs(1));
        let observed = store.set_mute(entity, Some(expiry), "x", "mod").unwrap();
        clock.advance(Duration::from_secs(2));

        // A fresh mute was applied after the snapshot was taken: the
        // conditional retire must leave it alone.
        clock.advance(Duration::from_secs(1));
        store.set_mute(entity, None, "fresh", "mod").unwrap();
        assert!(store.retire_mute_if(entity, observed.issued_at).is_none());
        assert!(store.is_muted(entity));
    }

    #[test]
    fn test_retire_mute_if_removes_lapsed() {
        let (store, clock) = store_with_clock();
        let entity = EntityId::new_v4();

        let expiry = expiry_in(&clock, Duration::from_secs(1));
        let observed = store.set_mute(entity, Some(expiry), "x", "mod").unwrap();

        // Not yet lapsed: no-op
        assert!(store.retire_mute_if(entity, observed.issued_at).is_none());

        clock.advance(Duration::from_secs(2));
        let retired = store.retire_mute_if(entity, observed.issued_at).unwrap();
        assert_eq!(retired.reason, "x");
        // Second attempt is a no-op, not an error
        assert!(store.retire_mute_if(entity, observed.issued_at).is_none());
    }

    #[test]
    fn test_expired_records_lists_only_lapsed() {
        let (store, clock) = store_with_clock();
        let lapsed = EntityId::new_v4();
        let live = EntityId::new_v4();

        store
            .set_mute(lapsed, Some(expiry_in(&clock, Duration::from_secs(1))), "a", "mod")
            .unwrap();
        store
            .set_mute(live, Some(expiry_in(&clock, Duration::from_secs(600))), "b", "mod")
            .unwrap();

        clock.advance(Duration::from_secs(2));
        let expired = store.expired_records();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].entity, lapsed);
    }
}
