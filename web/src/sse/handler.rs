use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use domain::coordinator::Coordinator;
use events::ClientHandle;
use futures::Stream;
use log::*;
use ::sse::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use ::sse::Manager;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Ends a client session when its stream is dropped, which is how axum
/// reports that the browser went away.
struct SessionGuard {
    client: ClientHandle,
    sse_manager: Arc<Manager>,
    coordinator: Arc<Coordinator>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        debug!("SSE connection closed for client {}, cleaning up", self.client);
        self.sse_manager.unregister_connection(&self.client);
        self.coordinator.disconnected(&self.client);
    }
}

/// SSE handler that establishes a long-lived connection for real-time updates.
/// Each stream is one client: it receives its handle in a `connected` event,
/// then count updates and alerts until it disconnects.
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let client = app_state.sse_manager.register_connection(tx);
    app_state.sse_manager.send_message(SseMessage {
        event: SseEvent::Connected {
            client_id: client.to_string(),
        },
        scope: MessageScope::Client { client },
    });
    app_state.coordinator.connected(client);

    let guard = SessionGuard {
        client,
        sse_manager: Arc::clone(&app_state.sse_manager),
        coordinator: Arc::clone(&app_state.coordinator),
    };

    let stream = stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
