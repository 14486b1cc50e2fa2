//! Threshold and cooldown gating of the "live" signal.
//!
//! A fire needs `threshold` distinct clients to have signaled since the last
//! fire, and more than `cooldown` to have passed since that fire. The set of
//! corroborators is cleared on every fire so the next one starts from zero.

use crate::error::Error;
use events::ClientHandle;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of recording one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressDecision {
    /// Threshold met and cooldown elapsed; the corroboration set was cleared.
    Fire,
    /// Not firing. `cooling_down` is true when the threshold was met but the
    /// previous fire is too recent.
    Hold {
        corroborators: usize,
        cooling_down: bool,
    },
}

impl PressDecision {
    pub fn fired(&self) -> bool {
        matches!(self, PressDecision::Fire)
    }
}

/// Threshold, cooldown and the monotonic time of the last fire.
#[derive(Debug)]
pub struct AlertGate {
    threshold: usize,
    cooldown: Duration,
    last_fired_at: Option<Instant>,
}

impl AlertGate {
    pub fn new(threshold: u32, cooldown: Duration) -> Result<Self, Error> {
        if threshold == 0 {
            return Err(Error::config("alert threshold must be at least 1"));
        }
        Ok(Self {
            threshold: threshold as usize,
            cooldown,
            last_fired_at: None,
        })
    }

    pub fn last_fired_at(&self) -> Option<Instant> {
        self.last_fired_at
    }

    fn cooled_down(&self, now: Instant) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        }
    }
}

/// Counts distinct corroborating clients against an [`AlertGate`].
#[derive(Debug)]
pub struct PressAggregator {
    gate: AlertGate,
    corroborators: HashSet<ClientHandle>,
}

impl PressAggregator {
    /// Fails with a config error when `threshold` is zero.
    pub fn new(threshold: u32, cooldown: Duration) -> Result<Self, Error> {
        Ok(Self {
            gate: AlertGate::new(threshold, cooldown)?,
            corroborators: HashSet::new(),
        })
    }

    /// Records that `client` signaled at `now` and decides whether to fire.
    /// Repeated signals from the same client before a fire count once.
    pub fn signal(&mut self, client: ClientHandle, now: Instant) -> PressDecision {
        self.corroborators.insert(client);
        let corroborators = self.corroborators.len();

        if corroborators < self.gate.threshold {
            return PressDecision::Hold {
                corroborators,
                cooling_down: false,
            };
        }

        if !self.gate.cooled_down(now) {
            return PressDecision::Hold {
                corroborators,
                cooling_down: true,
            };
        }

        self.gate.last_fired_at = Some(now);
        self.corroborators.clear();
        PressDecision::Fire
    }

    /// Forgets a pending corroboration, e.g. when the client disconnects.
    /// Never touches the cooldown.
    pub fn drop_client(&mut self, client: &ClientHandle) -> bool {
        self.corroborators.remove(client)
    }

    pub fn corroborators(&self) -> usize {
        self.corroborators.len()
    }

    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }
}
