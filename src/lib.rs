/*!
 * Warden - player restriction engine
 *
 * Enforces player restrictions inside a live, multi-threaded server process:
 * - Permanent and timed mutes with read-time lazy expiry
 * - Freezes and shadow mutes
 * - Warning ledgers with threshold-driven escalation
 * - Jail confinement with geofenced containment checks
 * - A background sweep that retires lapsed restrictions and notifies
 *
 * The engine is safe to call concurrently from a simulation tick thread,
 * async message handlers, and an HTTP handler pool; see
 * `warden_core_restrict::store` for the locking discipline. Persistence and
 * notifications are traits - bring your own or use the bundled
 * JSON-file journal and channel sink.
 */

pub mod chat;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod notify;
pub mod persist;
pub mod timefmt;

// Re-export commonly used types
pub use chat::{ChatGate, ChatVerdict};
pub use config::{LogLevel, WardenConfig};
pub use engine::{RestrictionEngine, WarnOutcome};
pub use error::{Result, WardenError};
pub use notify::{ChannelSink, LogSink, NullSink};
pub use persist::{JsonFileJournal, MemoryJournal};

// Core restriction surface
pub use warden_core_restrict::{
    Clock, ConfinementRecord, ContainmentVerdict, EntityId, EscalationAction, EscalationPolicy,
    EscalationThresholds, JailSite, JournalDoc, Location, ManualClock, MuteRecord, MuteRemaining,
    NotificationSink, RestrictError, Restriction, RestrictionEvent, RestrictionKind,
    RestrictionStore, StateJournal, SystemClock, WarningLedger,
};

// Sweep daemon
pub use warden_sweeper::{SweepStats, Sweeper, SweeperConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
