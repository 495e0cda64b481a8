//! Restriction lifecycle notifications
//!
//! The engine and the sweeper report state changes through a
//! [`NotificationSink`]; consumers (chat layer, mod-log, web API) subscribe
//! however they like. Sinks must be cheap and non-blocking: they are invoked
//! after store mutations, on the caller's thread.

use crate::policy::EscalationAction;
use crate::record::{EntityId, RestrictionKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A restriction lifecycle event for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "event")]
pub enum RestrictionEvent {
    /// A restriction was applied
    Applied {
        kind: RestrictionKind,
        reason: String,
        expires_at: Option<DateTime<Utc>>,
    },
    /// A restriction was lifted manually
    Lifted { kind: RestrictionKind },
    /// A timed restriction lapsed and was retired by the sweep
    Expired { kind: RestrictionKind },
    /// A warning count crossed a threshold
    Escalated { count: u32, action: EscalationAction },
    /// A confinement referenced a jail site that no longer exists and was
    /// lifted fail-open
    ConfinementAnomaly { jail: String },
}

/// Consumer of restriction lifecycle events
pub trait NotificationSink: Send + Sync {
    fn notify(&self, entity: EntityId, event: RestrictionEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = RestrictionEvent::Lifted {
            kind: RestrictionKind::Mute,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "lifted");
        assert_eq!(json["kind"], "mute");
    }

    #[test]
    fn test_escalated_event_carries_action() {
        let event = RestrictionEvent::Escalated {
            count: 10,
            action: EscalationAction::PermanentBan,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["count"], 10);
        assert_eq!(json["action"]["action"], "permanent-ban");
    }
}
