//! Warning escalation policy
//!
//! Converts a cumulative warning count into a punitive action using an
//! ordered threshold table. Evaluation runs from most severe to least severe,
//! so a count that crosses several thresholds at once (e.g. a bulk warning
//! import) always yields the most severe applicable action.
//!
//! The policy is a pure function of `(count, thresholds)`: it never touches
//! the store. The engine applies whatever action comes back.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Warning-count thresholds and escalation durations
///
/// Thresholds are expected to satisfy `ban >= temp_ban >= kick >= mute`. A
/// non-monotonic table is not rejected: evaluation still runs top-down, which
/// means a lower-severity rung shadowed by a more severe one with a smaller
/// threshold simply never fires. Use [`EscalationThresholds::is_monotonic`]
/// to detect that configuration at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationThresholds {
    /// Warnings before a temporary mute
    #[serde(default = "default_mute_threshold")]
    pub mute: u32,

    /// Warnings before a kick
    #[serde(default = "default_kick_threshold")]
    pub kick: u32,

    /// Warnings before a temporary ban
    #[serde(default = "default_temp_ban_threshold")]
    pub temp_ban: u32,

    /// Warnings before a permanent ban
    #[serde(default = "default_ban_threshold")]
    pub ban: u32,

    /// Duration of the escalation temp mute, in seconds
    #[serde(default = "default_mute_duration_secs")]
    pub mute_duration_secs: u64,

    /// Duration of the escalation temp ban, in seconds
    #[serde(default = "default_temp_ban_duration_secs")]
    pub temp_ban_duration_secs: u64,
}

fn default_mute_threshold() -> u32 {
    3
}

fn default_kick_threshold() -> u32 {
    5
}

fn default_temp_ban_threshold() -> u32 {
    7
}

fn default_ban_threshold() -> u32 {
    10
}

fn default_mute_duration_secs() -> u64 {
    3600 // 1 hour
}

fn default_temp_ban_duration_secs() -> u64 {
    86_400 // 1 day
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            mute: default_mute_threshold(),
            kick: default_kick_threshold(),
            temp_ban: default_temp_ban_threshold(),
            ban: default_ban_threshold(),
            mute_duration_secs: default_mute_duration_secs(),
            temp_ban_duration_secs: default_temp_ban_duration_secs(),
        }
    }
}

impl EscalationThresholds {
    /// True if severity ordering holds: `ban >= temp_ban >= kick >= mute`
    pub fn is_monotonic(&self) -> bool {
        self.ban >= self.temp_ban && self.temp_ban >= self.kick && self.kick >= self.mute
    }
}

/// Punitive action decided from a warning count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "action")]
pub enum EscalationAction {
    /// Count is below every threshold
    NoAction,
    /// Apply a timed mute
    TempMute { duration: Duration },
    /// Disconnect the entity (enforced by the embedding layer)
    Kick,
    /// Apply a timed ban (enforced by the embedding layer)
    TempBan { duration: Duration },
    /// Apply a permanent ban (enforced by the embedding layer)
    PermanentBan,
}

impl EscalationAction {
    /// Ordering rank; higher is more severe
    pub fn severity(&self) -> u8 {
        match self {
            EscalationAction::NoAction => 0,
            EscalationAction::TempMute { .. } => 1,
            EscalationAction::Kick => 2,
            EscalationAction::TempBan { .. } => 3,
            EscalationAction::PermanentBan => 4,
        }
    }
}

/// Stateless escalation decision function
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    thresholds: EscalationThresholds,
}

impl EscalationPolicy {
    pub fn new(thresholds: EscalationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &EscalationThresholds {
        &self.thresholds
    }

    /// Decide the action for a warning count, most severe rung first
    pub fn decide(&self, count: u32) -> EscalationAction {
        let t = &self.thresholds;

        if count >= t.ban {
            EscalationAction::PermanentBan
        } else if count >= t.temp_ban {
            EscalationAction::TempBan {
                duration: Duration::from_secs(t.temp_ban_duration_secs),
            }
        } else if count >= t.kick {
            EscalationAction::Kick
        } else if count >= t.mute {
            EscalationAction::TempMute {
                duration: Duration::from_secs(t.mute_duration_secs),
            }
        } else {
            EscalationAction::NoAction
        }
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(EscalationThresholds::default())
    }
}
