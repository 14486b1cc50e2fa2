use crate::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Turns outbound session events from the alert core into SSE broadcasts.
///
/// Both events go to every connected client; delivery is fire-and-forget and
/// no acknowledgment is collected.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }

    fn broadcast(&self, sse_event: SseEvent) {
        self.sse_manager.send_message(SseMessage {
            event: sse_event,
            scope: MessageScope::Broadcast,
        });
    }
}

/// The SSE event each domain event is announced as.
fn sse_event_for(event: &DomainEvent) -> SseEvent {
    match event {
        DomainEvent::UserCountChanged { count } => SseEvent::UserCount { count: *count },
        DomainEvent::AlertFired { notification } => SseEvent::ShowNotification {
            title: notification.title.clone(),
            body: notification.body.clone(),
            icon: notification.icon.clone(),
        },
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::UserCountChanged { count } => {
                debug!("Broadcasting connected user count {count}");
            }
            DomainEvent::AlertFired { .. } => {
                info!(
                    "Broadcasting alert to {} connection(s)",
                    self.sse_manager.connection_count()
                );
            }
        }
        self.broadcast(sse_event_for(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::EventType;
    use events::NotificationPayload;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn notification() -> NotificationPayload {
        NotificationPayload {
            title: "Live".to_string(),
            body: "Now".to_string(),
            icon: "/icon.png".to_string(),
        }
    }

    #[test]
    fn alert_fired_maps_to_show_notification_with_payload() {
        let event = sse_event_for(&DomainEvent::AlertFired {
            notification: notification(),
        });

        assert_eq!(event.event_type(), "show-notification");
        assert_eq!(
            serde_json::to_value(&event).unwrap()["data"],
            json!({"title": "Live", "body": "Now", "icon": "/icon.png"})
        );
    }

    #[test]
    fn user_count_changed_maps_to_update_user_count() {
        let event = sse_event_for(&DomainEvent::UserCountChanged { count: 2 });

        assert_eq!(event, SseEvent::UserCount { count: 2 });
        assert_eq!(event.event_type(), "update-user-count");
        assert_eq!(
            serde_json::to_value(&event).unwrap()["data"],
            json!({"count": 2})
        );
    }

    #[tokio::test]
    async fn alert_fired_is_broadcast_as_show_notification() {
        let manager = Arc::new(Manager::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection(tx);
        let handler = SseDomainEventHandler::new(manager.clone());

        handler
            .handle(&DomainEvent::AlertFired {
                notification: notification(),
            })
            .await;

        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn user_count_changed_reaches_every_connection() {
        let manager = Arc::new(Manager::new());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        manager.register_connection(tx_a);
        manager.register_connection(tx_b);
        let handler = SseDomainEventHandler::new(manager);

        handler
            .handle(&DomainEvent::UserCountChanged { count: 2 })
            .await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }
}
