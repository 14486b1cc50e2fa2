use serde::Serialize;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// First event on every stream; tells the client which handle to use
    /// when it signals.
    #[serde(rename = "connected")]
    Connected { client_id: String },

    #[serde(rename = "update-user-count")]
    UserCount { count: usize },

    #[serde(rename = "show-notification")]
    ShowNotification {
        title: String,
        body: String,
        icon: String,
    },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::UserCount { .. } => "update-user-count",
            Event::ShowNotification { .. } => "show-notification",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to one connection
    Client { client: events::ClientHandle },
    /// Send to all connections
    Broadcast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_count_serializes_with_event_name_tag() {
        let value = serde_json::to_value(Event::UserCount { count: 7 }).unwrap();
        assert_eq!(
            value,
            json!({"type": "update-user-count", "data": {"count": 7}})
        );
    }

    #[test]
    fn event_type_matches_serde_tag() {
        let events = [
            Event::Connected {
                client_id: "abc".to_string(),
            },
            Event::UserCount { count: 1 },
            Event::ShowNotification {
                title: "t".to_string(),
                body: "b".to_string(),
                icon: "i".to_string(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }
}
