//! HTTP surface of the live alert server.
//!
//! `AppState` wires the alert core to its collaborators: the SSE transport
//! for connected clients, the Web Push gateway for subscribed browsers, and
//! the nickname registry that gates subscriptions.

use ::sse::domain_event_handler::SseDomainEventHandler;
use ::sse::Manager as SseManager;
use domain::coordinator::{AlertSettings, Coordinator};
use domain::error::Error as DomainError;
use domain::fanout::{DisabledPushDelivery, FanoutDispatcher, PushDelivery};
use domain::gateway::web_push::WebPushClient;
use domain::nickname_registry::NicknameRegistry;
use domain::subscription_store::SubscriptionStore;
use events::EventPublisher;
use log::*;
use service::config::Config;
use std::sync::Arc;

mod controller;
mod error;
mod params;
pub mod router;
mod sse;

pub use error::{Error, Result};

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub coordinator: Arc<Coordinator>,
    pub sse_manager: Arc<SseManager>,
    pub subscriptions: Arc<SubscriptionStore>,
    pub nicknames: Arc<NicknameRegistry>,
}

impl AppState {
    /// Builds the process-wide state. Must run inside the tokio runtime.
    /// Fails when the alert configuration is invalid.
    pub async fn new(config: Config) -> core::result::Result<Self, DomainError> {
        let sse_manager = Arc::new(SseManager::new());
        let publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(Arc::clone(&sse_manager))));

        let delivery: Arc<dyn PushDelivery> = match WebPushClient::new(&config) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!("Push delivery disabled, alerts reach connected clients only: {e}");
                Arc::new(DisabledPushDelivery)
            }
        };

        let subscriptions = Arc::new(SubscriptionStore::new());
        let dispatcher = FanoutDispatcher::new(
            Arc::clone(&subscriptions),
            delivery,
            publisher.clone(),
            config.push_timeout(),
        )
        .with_eviction(config.evict_expired_subscriptions);

        let coordinator = Coordinator::new(
            AlertSettings::from_config(&config),
            Arc::new(dispatcher),
            publisher,
        )?;

        let nicknames = NicknameRegistry::load(config.nicknames_file()).await;

        Ok(Self {
            config,
            coordinator: Arc::new(coordinator),
            sse_manager,
            subscriptions,
            nicknames: Arc::new(nicknames),
        })
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let address = format!("{interface}:{}", app_state.config.port);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server running at http://{address}");

    axum::serve(listener, router::define_routes(app_state)).await
}
