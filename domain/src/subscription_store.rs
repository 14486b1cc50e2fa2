//! Push endpoints that opted in to alert delivery.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Browser-issued push credentials for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Client P-256 ECDH public key, base64url.
    pub p256dh: String,
    /// Client auth secret, base64url.
    pub auth: String,
}

/// A push subscription as produced by the browser's `PushManager.subscribe()`.
/// Two subscriptions are the same endpoint when their `endpoint` URLs match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// Immutable view of the store at one instant. Iterating it any number of
/// times yields the same subscriptions; later `add`s are not visible.
#[derive(Debug, Clone)]
pub struct SubscriptionSnapshot(Arc<Vec<Subscription>>);

impl SubscriptionSnapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, Subscription> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a SubscriptionSnapshot {
    type Item = &'a Subscription;
    type IntoIter = std::slice::Iter<'a, Subscription>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-memory, process-wide set of subscriptions, at most one per endpoint.
///
/// Writers copy the list only while a snapshot of it is still alive, so a
/// fan-out pass never observes a concurrent `add`.
#[derive(Debug, Default)]
pub struct SubscriptionStore {
    subscriptions: RwLock<Arc<Vec<Subscription>>>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `subscription` unless its endpoint is already stored.
    /// Returns whether it was newly added.
    pub fn add(&self, subscription: Subscription) -> bool {
        let mut guard = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if guard
            .iter()
            .any(|existing| existing.endpoint == subscription.endpoint)
        {
            return false;
        }
        Arc::make_mut(&mut *guard).push(subscription);
        true
    }

    /// Removes the subscription for `endpoint`. Only used by the optional
    /// eviction policy of the fan-out; the store never prunes itself.
    pub fn remove(&self, endpoint: &str) -> bool {
        let mut guard = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(index) = guard.iter().position(|s| s.endpoint == endpoint) else {
            return false;
        };
        Arc::make_mut(&mut *guard).remove(index);
        true
    }

    pub fn all(&self) -> SubscriptionSnapshot {
        let guard = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        SubscriptionSnapshot(Arc::clone(&*guard))
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) fn test_subscription(endpoint: &str) -> Subscription {
    Subscription {
        endpoint: endpoint.to_string(),
        keys: SubscriptionKeys {
            p256dh: "p256dh".to_string(),
            auth: "auth".to_string(),
        },
    }
}
