use domain::subscription_store::{Subscription, SubscriptionKeys};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SubscriptionKeysParams {
    pub(crate) p256dh: String,
    pub(crate) auth: String,
}

/// Body of `POST /subscribe`: the browser's `PushSubscription` JSON plus the
/// nickname registered beforehand.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct SubscribeParams {
    pub(crate) nickname: String,
    pub(crate) endpoint: String,
    pub(crate) keys: SubscriptionKeysParams,
}

impl From<SubscribeParams> for Subscription {
    fn from(params: SubscribeParams) -> Self {
        Subscription {
            endpoint: params.endpoint,
            keys: SubscriptionKeys {
                p256dh: params.keys.p256dh,
                auth: params.keys.auth,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VapidPublicKeyResponse {
    pub(crate) public_key: String,
}
