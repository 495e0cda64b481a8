//! Chat gate: message-level restrictions
//!
//! Sits in front of the chat pipeline and answers one question per incoming
//! message: may this entity speak right now? It combines the store's mute
//! state with three chat-wide controls:
//!
//! - a global chat lock (staff silence the whole channel)
//! - slow mode (minimum seconds between messages per entity)
//! - shadow mutes (the message is silently dropped; the sender sees nothing)
//!
//! Shadow mutes and slow-mode timestamps are deliberately in-memory only -
//! they do not survive a restart. Content filtering (word lists, caps) is
//! not this layer's job.
//!
//! Called concurrently from the chat-processing threads, so every piece of
//! shared state is synchronized: flags are atomics, the per-entity
//! last-message map sits behind a mutex held only for the map operation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use warden_core_restrict::{Clock, EntityId, MuteRemaining, RestrictionStore};

use chrono::{DateTime, Utc};

/// Outcome of a chat admission check
#[derive(Debug, Clone, PartialEq)]
pub enum ChatVerdict {
    /// Deliver the message
    Allowed,
    /// Chat is globally locked
    ChatLocked,
    /// The sender is shadow muted: drop silently, tell them nothing
    ShadowDropped,
    /// The sender is muted; remaining time attached for messaging
    Muted(MuteRemaining),
    /// Slow mode: the sender must wait this long before speaking again
    SlowMode { wait: Duration },
}

/// Message-level restriction checks for the chat pipeline
pub struct ChatGate {
    store: Arc<RestrictionStore>,
    clock: Arc<dyn Clock>,
    locked: AtomicBool,
    slow_mode_secs: AtomicU64,
    last_message: Mutex<HashMap<EntityId, DateTime<Utc>>>,
    shadow_muted: RwLock<HashSet<EntityId>>,
}

impl ChatGate {
    pub fn new(store: Arc<RestrictionStore>, slow_mode_secs: u64) -> Self {
        let clock = store.clock().clone();
        Self {
            store,
            clock,
            locked: AtomicBool::new(false),
            slow_mode_secs: AtomicU64::new(slow_mode_secs),
            last_message: Mutex::new(HashMap::new()),
            shadow_muted: RwLock::new(HashSet::new()),
        }
    }

    /// Decide whether a message from `entity` may be delivered now.
    ///
    /// On `Allowed` the sender's slow-mode clock is stamped; every other
    /// verdict leaves it untouched so a blocked message does not extend the
    /// wait.
    pub fn check_message(&self, entity: EntityId) -> ChatVerdict {
        if self.locked.load(Ordering::Relaxed) {
            return ChatVerdict::ChatLocked;
        }

        if self.is_shadow_muted(entity) {
            return ChatVerdict::ShadowDropped;
        }

        match self.store.mute_remaining(entity) {
            MuteRemaining::NotMuted => {}
            remaining => return ChatVerdict::Muted(remaining),
        }

        let slow_secs = self.slow_mode_secs.load(Ordering::Relaxed);
        if slow_secs > 0 {
            let now = self.clock.now();
            let mut last_message = self.last_message.lock().unwrap();

            if let Some(last) = last_message.get(&entity) {
                let elapsed = (now - *last).to_std().unwrap_or_default();
                let window = Duration::from_secs(slow_secs);
                if elapsed < window {
                    return ChatVerdict::SlowMode {
                        wait: window - elapsed,
                    };
                }
            }
            last_message.insert(entity, now);
        }

        ChatVerdict::Allowed
    }

    // ---- global chat lock ----

    pub fn lock_chat(&self) {
        self.locked.store(true, Ordering::Relaxed);
    }

    pub fn unlock_chat(&self) {
        self.locked.store(false, Ordering::Relaxed);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    // ---- slow mode ----

    /// Set the slow-mode window; 0 disables and clears all stamps
    pub fn set_slow_mode(&self, seconds: u64) {
        self.slow_mode_secs.store(seconds, Ordering::Relaxed);
        if seconds == 0 {
            self.last_message.lock().unwrap().clear();
        }
    }

    pub fn slow_mode_secs(&self) -> u64 {
        self.slow_mode_secs.load(Ordering::Relaxed)
    }

    // ---- shadow mutes ----

    pub fn shadow_mute(&self, entity: EntityId) {
        self.shadow_muted.write().unwrap().insert(entity);
    }

    pub fn clear_shadow_mute(&self, entity: EntityId) {
        self.shadow_muted.write().unwrap().remove(&entity);
    }

    pub fn is_shadow_muted(&self, entity: EntityId) -> bool {
        self.shadow_muted.read().unwrap().contains(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core_restrict::ManualClock;

    fn gate_with_clock(slow_mode_secs: u64) -> (ChatGate, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::from_system());
        let store = Arc::new(RestrictionStore::new(clock.clone()));
        (ChatGate::new(store, slow_mode_secs), clock)
    }

    #[test]
    fn test_unrestricted_entity_is_allowed() {
        let (gate, _clock) = gate_with_clock(0);
        assert_eq!(gate.check_message(EntityId::new_v4()), ChatVerdict::Allowed);
    }

    #[test]
    fn test_chat_lock_blocks_everyone() {
        let (gate, _clock) = gate_with_clock(0);
        gate.lock_chat();
        assert!(gate.is_locked());
        assert_eq!(
            gate.check_message(EntityId::new_v4()),
            ChatVerdict::ChatLocked
        );

        gate.unlock_chat();
        assert_eq!(gate.check_message(EntityId::new_v4()), ChatVerdict::Allowed);
    }

    #[test]
    fn test_shadow_mute_drops_silently() {
        let (gate, _clock) = gate_with_clock(0);
        let entity = EntityId::new_v4();

        gate.shadow_mute(entity);
        assert_eq!(gate.check_message(entity), ChatVerdict::ShadowDropped);

        gate.clear_shadow_mute(entity);
        assert_eq!(gate.check_message(entity), ChatVerdict::Allowed);
    }

    #[test]
    fn test_muted_entity_gets_remaining_time() {
        let clock = Arc::new(ManualClock::from_system());
        let store = Arc::new(RestrictionStore::new(clock.clone()));
        let gate = ChatGate::new(store.clone(), 0);
        let entity = EntityId::new_v4();

        store.set_mute(entity, None, "spam", "mod").unwrap();
        assert_eq!(
            gate.check_message(entity),
            ChatVerdict::Muted(MuteRemaining::Permanent)
        );

        store.clear_mute(entity).unwrap();
        assert_eq!(gate.check_message(entity), ChatVerdict::Allowed);
    }

    #[test]
    fn test_slow_mode_window() {
        let (gate, clock) = gate_with_clock(10);
        let entity = EntityId::new_v4();

        assert_eq!(gate.check_message(entity), ChatVerdict::Allowed);

        // Second message inside the window is held
        clock.advance(Duration::from_secs(4));
        match gate.check_message(entity) {
            ChatVerdict::SlowMode { wait } => assert_eq!(wait, Duration::from_secs(6)),
            verdict => panic!("expected SlowMode, got {:?}", verdict),
        }

        // A blocked message must not extend the wait
        clock.advance(Duration::from_secs(6));
        assert_eq!(gate.check_message(entity), ChatVerdict::Allowed);
    }

    #[test]
    fn test_slow_mode_disable_clears_stamps() {
        let (gate, _clock) = gate_with_clock(60);
        let entity = EntityId::new_v4();

        assert_eq!(gate.check_message(entity), ChatVerdict::Allowed);
        assert!(matches!(
            gate.check_message(entity),
            ChatVerdict::SlowMode { .. }
        ));

        gate.set_slow_mode(0);
        assert_eq!(gate.slow_mode_secs(), 0);
        assert_eq!(gate.check_message(entity), ChatVerdict::Allowed);
    }
}
