//! Debounced broadcast of the connected-user count.
//!
//! A page refresh is a disconnect immediately followed by a connect. Sending
//! a count for each would briefly advertise one user too few, so changes are
//! coalesced: the first change opens a window, later changes inside it are
//! absorbed, and a single count is published when the window closes.

use events::{DomainEvent, EventPublisher};
use log::*;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct CountBroadcaster {
    changes: mpsc::UnboundedSender<()>,
}

impl CountBroadcaster {
    /// Spawns the debounce task on the current tokio runtime. `current_count`
    /// is read once per window, after it closes. The task exits when the
    /// broadcaster is dropped.
    pub fn spawn<F>(window: Duration, publisher: EventPublisher, current_count: F) -> Self
    where
        F: Fn() -> usize + Send + Sync + 'static,
    {
        let (changes, mut rx) = mpsc::unbounded_channel::<()>();

        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(window).await;

                let mut coalesced = 1;
                while rx.try_recv().is_ok() {
                    coalesced += 1;
                }

                let count = current_count();
                debug!("Publishing connected user count {count} ({coalesced} change(s) coalesced)");
                publisher
                    .publish(DomainEvent::UserCountChanged { count })
                    .await;
            }
            debug!("Count broadcaster stopped");
        });

        Self { changes }
    }

    /// Marks the session registry as changed.
    pub fn registry_changed(&self) {
        if self.changes.send(()).is_err() {
            warn!("Count broadcaster is not running, dropping count update");
        }
    }
}
