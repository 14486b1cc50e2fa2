use axum::response::sse::Event;
use dashmap::DashMap;
use events::ClientHandle;
use log::*;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;

pub type EventSender = UnboundedSender<Result<Event, Infallible>>;

/// Live SSE senders keyed by the client handle minted for each connection.
pub struct ConnectionRegistry {
    connections: DashMap<ClientHandle, EventSender>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a new connection - O(1)
    pub fn register(&self, sender: EventSender) -> ClientHandle {
        let client = ClientHandle::new();
        self.connections.insert(client, sender);
        client
    }

    /// Unregister a connection - O(1). Unknown handles are ignored.
    pub fn unregister(&self, client: &ClientHandle) -> bool {
        self.connections.remove(client).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send message to a single connection
    pub fn send_to_client(&self, client: &ClientHandle, event: Event) {
        if let Some(sender) = self.connections.get(client) {
            if let Err(e) = sender.send(Ok(event)) {
                warn!("Failed to send event to connection {client}: {e}");
            }
        }
    }

    /// Broadcast message to all connections - O(n)
    pub fn broadcast(&self, event: Event) -> usize {
        let mut delivered = 0;
        for entry in self.connections.iter() {
            match entry.value().send(Ok(event.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    "Failed to send broadcast to connection {}: {}",
                    entry.key(),
                    e
                ),
            }
        }
        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn broadcast_reaches_only_registered_connections() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.register(tx_a);
        let _b = registry.register(tx_b);

        assert!(registry.unregister(&a));
        assert_eq!(registry.broadcast(Event::default().data("ping")), 1);

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn closed_receivers_do_not_break_broadcast() {
        let registry = ConnectionRegistry::new();
        let (tx_gone, rx_gone) = mpsc::unbounded_channel();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        registry.register(tx_gone);
        registry.register(tx_live);
        drop(rx_gone);

        assert_eq!(registry.broadcast(Event::default().data("ping")), 1);
        assert!(rx_live.try_recv().is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unregister_twice_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = registry.register(tx);
        assert!(registry.unregister(&client));
        assert!(!registry.unregister(&client));
        assert!(registry.is_empty());
    }
}
