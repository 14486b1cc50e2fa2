//! Glue between session events, the press aggregator and the fan-out.
//!
//! Session membership and pending corroborations live behind one mutex so
//! connect, signal and disconnect are applied one at a time. Two concurrent
//! signals can therefore never both see `threshold - 1` and both fire. The
//! lock is never held across an await: fan-out runs on its own task.

use crate::count_broadcast::CountBroadcaster;
use crate::error::Error;
use crate::fanout::{FanoutDispatcher, FanoutReport};
use crate::press_aggregator::{PressAggregator, PressDecision};
use crate::session_registry::SessionRegistry;
use events::{ClientHandle, EventPublisher, NotificationPayload};
use log::*;
use service::config::Config;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Alert policy knobs, usually read from [`Config`].
#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub threshold: u32,
    pub cooldown: Duration,
    pub count_debounce: Duration,
    pub notification: NotificationPayload,
}

impl AlertSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.alert_threshold,
            cooldown: config.alert_cooldown(),
            count_debounce: config.count_debounce(),
            notification: NotificationPayload {
                title: config.notification_title().to_string(),
                body: config.notification_body().to_string(),
                icon: config.notification_icon().to_string(),
            },
        }
    }
}

/// What happened to a client's live signal.
#[derive(Debug)]
pub enum SignalOutcome {
    /// The handle is not (or no longer) connected; the signal was dropped.
    UnknownClient,
    Held {
        corroborators: usize,
        cooling_down: bool,
    },
    /// The alert fired. The handle resolves once every push attempt is done.
    Fired(JoinHandle<FanoutReport>),
}

#[derive(Debug)]
struct LiveState {
    sessions: SessionRegistry,
    aggregator: PressAggregator,
}

pub struct Coordinator {
    state: Arc<Mutex<LiveState>>,
    dispatcher: Arc<FanoutDispatcher>,
    counts: CountBroadcaster,
    notification: NotificationPayload,
}

impl Coordinator {
    /// Must be called from within a tokio runtime; spawns the count
    /// broadcaster. Fails when the threshold is zero.
    pub fn new(
        settings: AlertSettings,
        dispatcher: Arc<FanoutDispatcher>,
        publisher: EventPublisher,
    ) -> Result<Self, Error> {
        let state = Arc::new(Mutex::new(LiveState {
            sessions: SessionRegistry::new(),
            aggregator: PressAggregator::new(settings.threshold, settings.cooldown)?,
        }));

        let count_state = Arc::clone(&state);
        let counts = CountBroadcaster::spawn(settings.count_debounce, publisher, move || {
            lock(&count_state).sessions.count()
        });

        info!(
            "Alert coordinator ready: threshold={}, cooldown={:?}, count debounce={:?}",
            settings.threshold, settings.cooldown, settings.count_debounce
        );

        Ok(Self {
            state,
            dispatcher,
            counts,
            notification: settings.notification,
        })
    }

    pub fn connected(&self, client: ClientHandle) -> usize {
        let count = lock(&self.state).sessions.admit(client);
        info!("Client {client} connected ({count} connected)");
        self.counts.registry_changed();
        count
    }

    pub fn disconnected(&self, client: &ClientHandle) -> usize {
        let count = {
            let mut state = lock(&self.state);
            state.aggregator.drop_client(client);
            state.sessions.remove(client)
        };
        info!("Client {client} disconnected ({count} connected)");
        self.counts.registry_changed();
        count
    }

    /// Records a live signal from `client`. On fire the fan-out is started on
    /// a separate task after the lock is released.
    pub fn signal(&self, client: ClientHandle) -> SignalOutcome {
        let decision = {
            let mut state = lock(&self.state);
            if !state.sessions.contains(&client) {
                debug!("Ignoring live signal from unknown client {client}");
                return SignalOutcome::UnknownClient;
            }
            state.aggregator.signal(client, Instant::now())
        };

        match decision {
            PressDecision::Fire => {
                info!("Alert threshold reached, sending notifications");
                let dispatcher = Arc::clone(&self.dispatcher);
                let payload = self.notification.clone();
                SignalOutcome::Fired(tokio::spawn(async move { dispatcher.fire(payload).await }))
            }
            PressDecision::Hold {
                corroborators,
                cooling_down,
            } => {
                if cooling_down {
                    info!("{corroborators} unique client(s) pressed, alert cooling down");
                } else {
                    info!("{corroborators} unique client(s) pressed");
                }
                SignalOutcome::Held {
                    corroborators,
                    cooling_down,
                }
            }
        }
    }

    pub fn connected_count(&self) -> usize {
        lock(&self.state).sessions.count()
    }

    pub fn pending_corroborators(&self) -> usize {
        lock(&self.state).aggregator.corroborators()
    }
}

fn lock(state: &Mutex<LiveState>) -> MutexGuard<'_, LiveState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::tests::{payload, EventRecorder, ScriptedDelivery};
    use crate::fanout::DeliveryOutcome;
    use crate::subscription_store::{test_subscription, SubscriptionStore};
    use events::DomainEvent;

    struct Harness {
        coordinator: Arc<Coordinator>,
        recorder: Arc<EventRecorder>,
        delivery: Arc<ScriptedDelivery>,
    }

    fn harness(threshold: u32, cooldown: Duration) -> Harness {
        harness_with(threshold, cooldown, ScriptedDelivery::default())
    }

    fn harness_with(threshold: u32, cooldown: Duration, delivery: ScriptedDelivery) -> Harness {
        let recorder = Arc::new(EventRecorder::default());
        let publisher = EventPublisher::new().with_handler(recorder.clone());
        let store = Arc::new(SubscriptionStore::new());
        store.add(test_subscription("https://p/1"));
        store.add(test_subscription("https://p/2"));
        let delivery = Arc::new(delivery);
        let dispatcher = Arc::new(FanoutDispatcher::new(
            store,
            delivery.clone(),
            publisher.clone(),
            Duration::from_secs(5),
        ));
        let settings = AlertSettings {
            threshold,
            cooldown,
            count_debounce: Duration::from_millis(100),
            notification: payload(),
        };
        Harness {
            coordinator: Arc::new(Coordinator::new(settings, dispatcher, publisher).unwrap()),
            recorder,
            delivery,
        }
    }

    fn alerts(recorder: &EventRecorder) -> usize {
        recorder
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, DomainEvent::AlertFired { .. }))
            .count()
    }

    #[tokio::test]
    async fn zero_threshold_fails_construction() {
        let publisher = EventPublisher::new();
        let dispatcher = Arc::new(FanoutDispatcher::new(
            Arc::new(SubscriptionStore::new()),
            Arc::new(ScriptedDelivery::default()),
            publisher.clone(),
            Duration::from_secs(1),
        ));
        let settings = AlertSettings {
            threshold: 0,
            cooldown: Duration::ZERO,
            count_debounce: Duration::ZERO,
            notification: payload(),
        };
        assert!(Coordinator::new(settings, dispatcher, publisher).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn threshold_signals_fire_broadcast_and_push() {
        let h = harness(2, Duration::from_secs(60));
        let a = ClientHandle::new();
        let b = ClientHandle::new();
        h.coordinator.connected(a);
        h.coordinator.connected(b);

        assert!(matches!(
            h.coordinator.signal(a),
            SignalOutcome::Held {
                corroborators: 1,
                cooling_down: false
            }
        ));
        let SignalOutcome::Fired(fanout) = h.coordinator.signal(b) else {
            panic!("second distinct signal should fire");
        };
        let report = fanout.await.unwrap();

        assert_eq!(report.delivered(), 2);
        assert_eq!(alerts(&h.recorder), 1);
        assert_eq!(h.coordinator.pending_corroborators(), 0);
        assert_eq!(h.delivery.attempts.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn signal_after_disconnect_contributes_nothing() {
        let h = harness(2, Duration::from_secs(60));
        let a = ClientHandle::new();
        let b = ClientHandle::new();
        h.coordinator.connected(a);
        h.coordinator.connected(b);

        h.coordinator.signal(a);
        h.coordinator.disconnected(&a);
        assert_eq!(h.coordinator.pending_corroborators(), 0);
        assert!(matches!(
            h.coordinator.signal(a),
            SignalOutcome::UnknownClient
        ));
        assert!(matches!(
            h.coordinator.signal(b),
            SignalOutcome::Held {
                corroborators: 1,
                ..
            }
        ));
        assert_eq!(alerts(&h.recorder), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_holds_until_it_elapses() {
        let h = harness(1, Duration::from_secs(60));
        let a = ClientHandle::new();
        h.coordinator.connected(a);

        let SignalOutcome::Fired(first) = h.coordinator.signal(a) else {
            panic!("threshold of one should fire immediately");
        };
        first.await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(matches!(
            h.coordinator.signal(a),
            SignalOutcome::Held {
                cooling_down: true,
                ..
            }
        ));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(matches!(h.coordinator.signal(a), SignalOutcome::Fired(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_signals_fire_exactly_once() {
        let h = harness(5, Duration::from_secs(60));
        let clients: Vec<_> = (0..20).map(|_| ClientHandle::new()).collect();
        for client in &clients {
            h.coordinator.connected(*client);
        }

        let tasks: Vec<_> = clients
            .iter()
            .map(|client| {
                let coordinator = Arc::clone(&h.coordinator);
                let client = *client;
                tokio::spawn(async move { coordinator.signal(client) })
            })
            .collect();

        let mut fired = 0;
        for task in tasks {
            if let SignalOutcome::Fired(fanout) = task.await.unwrap() {
                fanout.await.unwrap();
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_is_processed_while_fanout_is_in_flight() {
        let delivery = ScriptedDelivery {
            hanging: vec!["https://p/2".to_string()],
            ..Default::default()
        };
        let h = harness_with(1, Duration::from_secs(60), delivery);
        let a = ClientHandle::new();
        let b = ClientHandle::new();
        h.coordinator.connected(a);
        h.coordinator.connected(b);

        let SignalOutcome::Fired(fanout) = h.coordinator.signal(a) else {
            panic!("threshold of one should fire on the first signal");
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.delivery.attempts.lock().unwrap().len(), 2);
        assert!(!fanout.is_finished());

        assert_eq!(h.coordinator.disconnected(&a), 1);
        assert_eq!(h.coordinator.disconnected(&b), 0);
        assert!(!fanout.is_finished());

        let report = fanout.await.unwrap();
        assert_eq!(report.delivered(), 1);
        let slow = report
            .results
            .iter()
            .find(|r| r.endpoint == "https://p/2")
            .unwrap();
        assert_eq!(slow.outcome, DeliveryOutcome::TimedOut);
        assert_eq!(h.coordinator.connected_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_then_disconnect_inside_window_broadcasts_prior_count() {
        let h = harness(3, Duration::from_secs(60));
        let resident = ClientHandle::new();
        h.coordinator.connected(resident);
        tokio::time::sleep(Duration::from_millis(200)).await;

        let refreshing = ClientHandle::new();
        h.coordinator.connected(refreshing);
        h.coordinator.disconnected(&refreshing);
        tokio::time::sleep(Duration::from_millis(200)).await;

        let counts: Vec<_> = h
            .recorder
            .events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DomainEvent::UserCountChanged { count } => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![1, 1]);
    }
}
