//! Restriction data model
//!
//! The typed records owned by the store: mutes, freezes, warning ledgers,
//! jail sites, and confinement records, plus the flattened [`Restriction`]
//! view returned by snapshots. Records are plain data; all activeness
//! decisions take an explicit `now` so the store stays the single place that
//! consults the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Stable unique identifier for a restricted entity (player, bot, ...)
pub type EntityId = Uuid;

/// A position in a named world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// World the coordinates belong to
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Euclidean distance to another location, or `None` across worlds
    pub fn distance_to(&self, other: &Location) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }
}

/// Kind of an active restriction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestrictionKind {
    Mute,
    TempMute,
    Freeze,
    WarningCount,
    Jail,
    TempJail,
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestrictionKind::Mute => "mute",
            RestrictionKind::TempMute => "temp-mute",
            RestrictionKind::Freeze => "freeze",
            RestrictionKind::WarningCount => "warning-count",
            RestrictionKind::Jail => "jail",
            RestrictionKind::TempJail => "temp-jail",
        };
        write!(f, "{}", name)
    }
}

/// An active mute, permanent or timed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuteRecord {
    /// Expiry instant; `None` means permanent
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
}

impl MuteRecord {
    pub fn kind(&self) -> RestrictionKind {
        if self.expires_at.is_some() {
            RestrictionKind::TempMute
        } else {
            RestrictionKind::Mute
        }
    }

    /// True if the record has not lapsed at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => now < expires_at,
        }
    }
}

/// An active freeze (boolean, no expiry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeRecord {
    pub reason: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
}

/// Per-entity warning accumulator
///
/// `count` only ever grows under `add_warning`; it is reset exclusively by an
/// explicit clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningLedger {
    pub count: u32,
    pub last_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl WarningLedger {
    /// Human-readable summary for listings
    pub fn summary(&self) -> String {
        match &self.last_reason {
            Some(reason) => format!("{} warnings (last: {})", self.count, reason),
            None => format!("{} warnings", self.count),
        }
    }
}

/// A named confinement anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JailSite {
    /// Unique name, matched case-insensitively
    pub name: String,
    /// Anchor position entities are corrected back to
    pub anchor: Location,
    /// Geofence radius around the anchor
    pub radius: f64,
}

impl JailSite {
    pub fn new(name: impl Into<String>, anchor: Location, radius: f64) -> Self {
        Self {
            name: name.into(),
            anchor,
            radius,
        }
    }

    /// True iff `location` is in the anchor's world and within the radius
    pub fn contains(&self, location: &Location) -> bool {
        match self.anchor.distance_to(location) {
            Some(distance) => distance <= self.radius,
            None => false,
        }
    }
}

/// Links a confined entity to a jail site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfinementRecord {
    /// Lowercased jail site name
    pub jail: String,
    /// Where the entity was before confinement, for restoration on release
    pub prior_location: Option<Location>,
    /// Expiry instant; `None` means until released
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
}

impl ConfinementRecord {
    pub fn kind(&self) -> RestrictionKind {
        if self.expires_at.is_some() {
            RestrictionKind::TempJail
        } else {
            RestrictionKind::Jail
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => now < expires_at,
        }
    }
}

/// Flattened view of one active restriction, as returned by `snapshot()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restriction {
    pub entity: EntityId,
    pub kind: RestrictionKind,
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
}

impl Restriction {
    /// True if the record's expiry has passed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }
}

/// Remaining mute time for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteRemaining {
    /// Muted with no expiry
    Permanent,
    /// Muted; this much time remains
    Remaining(Duration),
    /// No active mute
    NotMuted,
}

impl fmt::Display for MuteRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuteRemaining::Permanent => write!(f, "Permanent"),
            MuteRemaining::Remaining(duration) => write!(f, "{}s", duration.as_secs()),
            MuteRemaining::NotMuted => write!(f, "Not muted"),
        }
    }
}
