//! Event system infrastructure for the live alert server.
//!
//! This crate provides the event system that decouples the alert core
//! (corroboration, cooldown, fan-out) from the transport that delivers
//! messages to connected clients.
//!
//! # Architecture
//!
//! - **ClientHandle**: opaque identifier for one live client connection
//! - **NotificationPayload**: the `{title, body, icon}` value sent on every fire
//! - **DomainEvent**: Enum representing the outbound session events
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates, so both the `sse`
//! transport and the `domain` core can depend on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque identifier for one live connection. Minted on connect by the
/// transport layer, discarded on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientHandle(Uuid);

impl ClientHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientHandle {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// The notification shown to users when an alert fires. Built once per fire
/// and reused for the in-session broadcast and every push delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
}

/// Outbound session events. The core decides *what* happened; handlers
/// decide how to get it to the connected clients.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// The number of connected clients changed. Emitted after the debounce
    /// window closes, carrying the count at that moment.
    UserCountChanged { count: usize },
    /// Enough distinct clients corroborated the live signal and the cooldown
    /// had elapsed. Every connected client should show the notification.
    AlertFired { notification: NotificationPayload },
}

/// Trait for handling domain events.
/// Implementations perform side effects like pushing SSE messages or logging.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
