use crate::connection::{ConnectionRegistry, EventSender};
use crate::message::{EventType, Message as SseMessage, MessageScope};
use axum::response::sse::Event;
use events::ClientHandle;
use log::*;
use std::sync::Arc;

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new connection and return its client handle
    pub fn register_connection(&self, sender: EventSender) -> ClientHandle {
        let client = self.registry.register(sender);
        info!("Registered new SSE connection {client}");
        client
    }

    /// Unregister a connection by handle
    pub fn unregister_connection(&self, client: &ClientHandle) {
        if self.registry.unregister(client) {
            info!("Unregistered SSE connection {client}");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Send a message based on its scope
    pub fn send_message(&self, message: SseMessage) {
        let event_type = message.event.event_type();

        let event_data = match serde_json::to_string(&message.event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize SSE event: {e}");
                return;
            }
        };

        let event = Event::default().event(event_type).data(event_data);

        match message.scope {
            MessageScope::Client { client } => {
                self.registry.send_to_client(&client, event);
            }
            MessageScope::Broadcast => {
                let delivered = self.registry.broadcast(event);
                debug!("Broadcast {event_type} to {delivered} connection(s)");
            }
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
