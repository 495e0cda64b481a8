//! Notification sink implementations
//!
//! The engine and the sweeper emit [`RestrictionEvent`]s through a
//! [`NotificationSink`]. These are the stock sinks: a channel for in-process
//! consumers (chat layer, mod-log writer, web push), a tracing forwarder,
//! and a no-op for tests and headless embeddings.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::info;
use warden_core_restrict::{EntityId, NotificationSink, RestrictionEvent};

/// Sink that forwards events into a crossbeam channel
///
/// Sending never blocks; if every receiver is gone the event is dropped
/// silently, so a consumer shutting down cannot wedge the engine.
pub struct ChannelSink {
    tx: Sender<(EntityId, RestrictionEvent)>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its events
    pub fn unbounded() -> (Self, Receiver<(EntityId, RestrictionEvent)>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, entity: EntityId, event: RestrictionEvent) {
        let _ = self.tx.send((entity, event));
    }
}

/// Sink that logs every event via `tracing`
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, entity: EntityId, event: RestrictionEvent) {
        info!(%entity, ?event, "restriction event");
    }
}

/// Sink that discards every event
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _entity: EntityId, _event: RestrictionEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core_restrict::RestrictionKind;

    #[test]
    fn test_channel_sink_delivers() {
        let (sink, rx) = ChannelSink::unbounded();
        let entity = EntityId::new_v4();

        sink.notify(
            entity,
            RestrictionEvent::Lifted {
                kind: RestrictionKind::Freeze,
            },
        );

        let (got_entity, got_event) = rx.try_recv().unwrap();
        assert_eq!(got_entity, entity);
        assert_eq!(
            got_event,
            RestrictionEvent::Lifted {
                kind: RestrictionKind::Freeze
            }
        );
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::unbounded();
        drop(rx);

        // Must not panic or block
        sink.notify(
            EntityId::new_v4(),
            RestrictionEvent::Lifted {
                kind: RestrictionKind::Mute,
            },
        );
    }
}
