use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::fanout::{DeliveryStatus, PushDelivery};
use crate::subscription_store::Subscription;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use events::NotificationPayload;
use log::*;
use service::config::Config;
use web_push::{ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder};

/// Web Push (RFC 8030) client: payloads are encrypted with `aes128gcm`
/// (RFC 8291) and signed with VAPID (RFC 8292) by the `web-push` crate, and
/// sent through a shared reqwest client for connection pooling.
pub struct WebPushClient {
    client: reqwest::Client,
    vapid_private_key: String,
    vapid_subject: String,
    ttl: u32,
}

impl WebPushClient {
    /// Fails with a config error when no VAPID private key is configured.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let vapid_private_key = config.vapid_private_key().ok_or_else(|| {
            warn!("Failed to get VAPID private key from config");
            Error::config("VAPID private key is not configured")
        })?;
        validate_private_key(&vapid_private_key)?;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.push_timeout())
            .build()?;

        Ok(Self {
            client,
            vapid_private_key,
            vapid_subject: config.vapid_subject().to_string(),
            ttl: config.push_ttl_secs,
        })
    }

    fn build_message(
        &self,
        subscription: &Subscription,
        payload: &[u8],
    ) -> Result<web_push::WebPushMessage, Error> {
        let sub_info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        );

        let mut sig_builder = VapidSignatureBuilder::from_base64(&self.vapid_private_key, &sub_info)?;
        sig_builder.add_claim("sub", self.vapid_subject.as_str());
        let signature = sig_builder.build()?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(self.ttl);

        Ok(builder.build()?)
    }
}

#[async_trait]
impl PushDelivery for WebPushClient {
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<DeliveryStatus, Error> {
        let body = serde_json::to_vec(payload)?;
        let message = self.build_message(subscription, &body)?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Failed to send push request to {}: {e:?}", subscription.endpoint);
            Error::from(e)
        })?;

        let status = response.status().as_u16();
        match classify_status(status) {
            Some(DeliveryStatus::Expired) => {
                info!("Push subscription {} expired ({status})", subscription.endpoint);
                Ok(DeliveryStatus::Expired)
            }
            Some(DeliveryStatus::RateLimited) => {
                warn!("Push service rate limited {} (429)", subscription.endpoint);
                Ok(DeliveryStatus::RateLimited)
            }
            Some(delivery_status) => {
                debug!("Push delivered to {}", subscription.endpoint);
                Ok(delivery_status)
            }
            None => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Error {
                    source: None,
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(format!(
                        "Push service answered HTTP {status}: {error_text}"
                    ))),
                })
            }
        }
    }
}

/// The `web-push` signer expects the raw 32-byte P-256 scalar, base64url
/// encoded, and panics on anything else.
fn validate_private_key(key: &str) -> Result<(), Error> {
    match URL_SAFE_NO_PAD.decode(key.trim_end_matches('=')) {
        Ok(bytes) if bytes.len() == 32 => Ok(()),
        Ok(bytes) => Err(Error::config(format!(
            "VAPID private key must be 32 bytes, got {}",
            bytes.len()
        ))),
        Err(e) => Err(Error::config(format!(
            "VAPID private key is not base64url: {e}"
        ))),
    }
}

/// Maps a push service HTTP status to a delivery status; `None` is a failure.
fn classify_status(status: u16) -> Option<DeliveryStatus> {
    match status {
        200..=299 => Some(DeliveryStatus::Delivered),
        404 | 410 => Some(DeliveryStatus::Expired),
        429 => Some(DeliveryStatus::RateLimited),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InternalErrorKind;
    use crate::subscription_store::SubscriptionKeys;
    use clap::Parser;
    use mockito::{Matcher, Server};

    const VAPID_PRIVATE_KEY: &str = "mG2vBFYSUwbdhG3BdmsvZeV7T-pO1rdBKZ6DAoEyYUI";
    const CLIENT_P256DH: &str =
        "BJKAK5hJXM94HTPvYTAb9VCQaqJRCh4DIzjt8l9liP-eAuB3iyQ-0VMCN8zSaE71nPSvzY-34QSJG99t2VHNQqg";
    const CLIENT_AUTH: &str = "ClpHpLt_ERjlxmOjA6JvjA";

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["live_alert"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    fn client() -> WebPushClient {
        WebPushClient::new(&config(&["--vapid-private-key", VAPID_PRIVATE_KEY])).unwrap()
    }

    fn subscription(endpoint: String) -> Subscription {
        Subscription {
            endpoint,
            keys: SubscriptionKeys {
                p256dh: CLIENT_P256DH.to_string(),
                auth: CLIENT_AUTH.to_string(),
            },
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            title: "Live now!".to_string(),
            body: "Someone just went live!".to_string(),
            icon: "/icon.png".to_string(),
        }
    }

    #[test]
    fn test_client_creation_fails_without_private_key() {
        let result = WebPushClient::new(&config(&[]));
        assert_eq!(
            result.err().map(|e| e.error_kind),
            Some(DomainErrorKind::Internal(InternalErrorKind::Config))
        );
    }

    #[test]
    fn test_client_creation_fails_with_malformed_private_key() {
        for key in ["not base64!", "AAAA"] {
            let result = WebPushClient::new(&config(&["--vapid-private-key", key]));
            assert!(result.is_err(), "{key} should be rejected");
        }
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(201), Some(DeliveryStatus::Delivered));
        assert_eq!(classify_status(410), Some(DeliveryStatus::Expired));
        assert_eq!(classify_status(404), Some(DeliveryStatus::Expired));
        assert_eq!(classify_status(429), Some(DeliveryStatus::RateLimited));
        assert_eq!(classify_status(400), None);
        assert_eq!(classify_status(503), None);
    }

    #[tokio::test]
    async fn test_deliver_sends_encrypted_vapid_signed_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/push/abc")
            .match_header("content-encoding", "aes128gcm")
            .match_header("ttl", "86400")
            .match_header("content-type", "application/octet-stream")
            .match_body(Matcher::Any)
            .with_status(201)
            .create_async()
            .await;

        let status = client()
            .deliver(&subscription(format!("{}/push/abc", server.url())), &payload())
            .await
            .unwrap();

        assert_eq!(status, DeliveryStatus::Delivered);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_reports_gone_endpoint_as_expired() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/push/gone")
            .with_status(410)
            .create_async()
            .await;

        let status = client()
            .deliver(&subscription(format!("{}/push/gone", server.url())), &payload())
            .await
            .unwrap();

        assert_eq!(status, DeliveryStatus::Expired);
    }

    #[tokio::test]
    async fn test_deliver_server_error_is_an_external_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/push/broken")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client()
            .deliver(&subscription(format!("{}/push/broken", server.url())), &payload())
            .await
            .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Other(_))
        ));
    }
}
