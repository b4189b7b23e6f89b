use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::sse::ServerEvent;

/// Registry of per-session broadcast channels backing the SSE fan-out.
///
/// All events for one session flow through a single channel, so subscribers
/// observe writes to the same record in publish order. Delivery is best
/// effort: a subscriber that lags past the channel capacity skips the missed
/// events and is expected to reconcile via the snapshot endpoint.
pub struct SessionHubs {
    capacity: usize,
    channels: DashMap<Uuid, broadcast::Sender<ServerEvent>>,
}

impl SessionHubs {
    /// Build the registry with a per-channel buffer capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    /// Register a subscriber for one session, creating its channel on first use.
    pub fn subscribe(&self, quiz_id: Uuid) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(quiz_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to all current subscribers of one session.
    ///
    /// A session nobody subscribed to yet has no channel; the event is
    /// dropped, which is fine because late subscribers re-fetch state anyway.
    pub fn broadcast(&self, quiz_id: Uuid, event: ServerEvent) {
        if let Some(sender) = self.channels.get(&quiz_id) {
            let _ = sender.send(event);
        }
    }

    /// Drop a session's channel, disconnecting any remaining subscribers.
    pub fn remove(&self, quiz_id: Uuid) {
        self.channels.remove(&quiz_id);
    }
}
