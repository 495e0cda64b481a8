//! Jail containment checks
//!
//! Consulted by the movement/teleport listener on every relevant event, so
//! both operations stay on the shared read lock for the common paths. The
//! one exception is the fail-open release of a confinement whose jail site
//! has been deleted out from under it: that path takes a short write lock,
//! re-checks, and drops the orphaned record rather than trapping the entity
//! against an anchor that no longer exists.

use crate::record::{EntityId, Location};
use crate::store::RestrictionStore;
use tracing::warn;

/// Outcome of a containment enforcement check
#[derive(Debug, Clone, PartialEq)]
pub enum ContainmentVerdict {
    /// Not confined, or the attempted location is inside the geofence
    Allow,
    /// Outside the geofence: cancel the movement and relocate to `correction`
    Deny { correction: Location },
    /// The referenced jail site no longer exists; the confinement was lifted
    /// fail-open and the anomaly logged. Movement proceeds unconfined.
    Released { jail: String },
}

impl RestrictionStore {
    /// True iff the entity has an active confinement whose jail site is in
    /// the same world as `location` and within the site radius.
    pub fn is_within_confinement(&self, entity: EntityId, location: &Location) -> bool {
        let now = self.clock().now();
        self.with_inner_read(|view| {
            let Some(record) = view.confinement(entity) else {
                return false;
            };
            if !record.is_active(now) {
                return false;
            }
            match view.jail_site(&record.jail) {
                Some(site) => site.contains(location),
                None => false,
            }
        })
    }

    /// Decide whether a movement to `attempted` is allowed for the entity.
    pub fn enforce_containment(
        &self,
        entity: EntityId,
        attempted: &Location,
    ) -> ContainmentVerdict {
        let now = self.clock().now();

        enum Observed {
            Free,
            Within,
            Outside(Location),
            SiteMissing(String),
        }

        let observed = self.with_inner_read(|view| {
            let Some(record) = view.confinement(entity) else {
                return Observed::Free;
            };
            if !record.is_active(now) {
                return Observed::Free;
            }
            match view.jail_site(&record.jail) {
                Some(site) if site.contains(attempted) => Observed::Within,
                Some(site) => Observed::Outside(site.anchor.clone()),
                None => Observed::SiteMissing(record.jail.clone()),
            }
        });

        match observed {
            Observed::Free | Observed::Within => ContainmentVerdict::Allow,
            Observed::Outside(correction) => ContainmentVerdict::Deny { correction },
            Observed::SiteMissing(jail) => match self.remove_orphaned_confinement(entity) {
                Some(_) => {
                    warn!(
                        %entity, %jail,
                        "confinement referenced a deleted jail site; lifting fail-open"
                    );
                    ContainmentVerdict::Released { jail }
                }
                // Raced with a release or a site re-creation; re-run
                None => self.enforce_containment(entity, attempted),
            },
        }
    }
}
