//! Alert fan-out: one in-session broadcast plus one isolated push delivery
//! per stored subscription.

use crate::error::Error;
use crate::subscription_store::{Subscription, SubscriptionStore};
use async_trait::async_trait;
use events::{DomainEvent, EventPublisher, NotificationPayload};
use futures::future::join_all;
use log::*;
use std::sync::Arc;
use std::time::Duration;

/// How a push service answered a delivery that reached it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// The endpoint no longer exists (404/410); the browser unsubscribed.
    Expired,
    /// Throttled by the push service. The endpoint itself is fine.
    RateLimited,
    /// Push delivery is disabled in this process.
    Skipped,
}

/// Capability to send one notification to one push endpoint.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<DeliveryStatus, Error>;
}

/// Stand-in used when no VAPID key is configured. Alerts still reach
/// connected clients through the broadcast.
pub struct DisabledPushDelivery;

#[async_trait]
impl PushDelivery for DisabledPushDelivery {
    async fn deliver(
        &self,
        subscription: &Subscription,
        _payload: &NotificationPayload,
    ) -> Result<DeliveryStatus, Error> {
        debug!(
            "Push delivery disabled, skipping {}",
            subscription.endpoint
        );
        Ok(DeliveryStatus::Skipped)
    }
}

/// Final outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Status(DeliveryStatus),
    Failed(String),
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub endpoint: String,
    pub outcome: DeliveryOutcome,
}

/// One entry per subscription in the snapshot taken at fire time.
#[derive(Debug, Clone, Default)]
pub struct FanoutReport {
    pub results: Vec<DeliveryResult>,
}

impl FanoutReport {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn delivered(&self) -> usize {
        self.count(|o| *o == DeliveryOutcome::Status(DeliveryStatus::Delivered))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Failed(_) | DeliveryOutcome::TimedOut))
    }

    pub fn expired(&self) -> usize {
        self.count(|o| *o == DeliveryOutcome::Status(DeliveryStatus::Expired))
    }

    fn count(&self, predicate: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

pub struct FanoutDispatcher {
    subscriptions: Arc<SubscriptionStore>,
    delivery: Arc<dyn PushDelivery>,
    publisher: EventPublisher,
    delivery_timeout: Duration,
    evict_expired: bool,
}

impl FanoutDispatcher {
    pub fn new(
        subscriptions: Arc<SubscriptionStore>,
        delivery: Arc<dyn PushDelivery>,
        publisher: EventPublisher,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            subscriptions,
            delivery,
            publisher,
            delivery_timeout,
            evict_expired: false,
        }
    }

    /// Remove subscriptions whose push service reports them gone.
    pub fn with_eviction(mut self, evict_expired: bool) -> Self {
        self.evict_expired = evict_expired;
        self
    }

    /// Broadcasts the alert to connected clients, then attempts exactly one
    /// push delivery per subscription, concurrently. Completes once every
    /// attempt has finished or timed out; never fails.
    pub async fn fire(&self, payload: NotificationPayload) -> FanoutReport {
        self.publisher
            .publish(DomainEvent::AlertFired {
                notification: payload.clone(),
            })
            .await;

        let snapshot = self.subscriptions.all();
        info!("Delivering push notification to {} subscription(s)", snapshot.len());

        let attempts = snapshot
            .iter()
            .map(|subscription| self.attempt(subscription, &payload));
        let report = FanoutReport {
            results: join_all(attempts).await,
        };

        if self.evict_expired {
            for result in &report.results {
                if result.outcome == DeliveryOutcome::Status(DeliveryStatus::Expired)
                    && self.subscriptions.remove(&result.endpoint)
                {
                    info!("Evicted expired subscription {}", result.endpoint);
                }
            }
        }

        info!(
            "Push fan-out finished: {} attempted, {} delivered, {} expired, {} failed",
            report.attempted(),
            report.delivered(),
            report.expired(),
            report.failed()
        );
        report
    }

    async fn attempt(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> DeliveryResult {
        let delivery = self.delivery.deliver(subscription, payload);
        let outcome = match tokio::time::timeout(self.delivery_timeout, delivery).await {
            Ok(Ok(status)) => DeliveryOutcome::Status(status),
            Ok(Err(err)) => {
                warn!("Push delivery to {} failed: {err}", subscription.endpoint);
                DeliveryOutcome::Failed(err.to_string())
            }
            Err(_) => {
                warn!(
                    "Push delivery to {} timed out after {:?}",
                    subscription.endpoint, self.delivery_timeout
                );
                DeliveryOutcome::TimedOut
            }
        };
        DeliveryResult {
            endpoint: subscription.endpoint.clone(),
            outcome,
        }
    }
}
