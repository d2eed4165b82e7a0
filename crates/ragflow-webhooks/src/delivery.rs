//! Outbound delivery (spec §4.11), grounded in
//! `original_source/app/services/webhook_service.py`'s `_perform_delivery`:
//! fixed per-phase timeouts, no redirects, truncated error messages, and a
//! signed body built from the same timestamp used in the headers.

use crate::signing::sign;
use async_trait::async_trait;
use ragflow_core::{CoreError, Delivery, DeliveryOutcome, Webhook, WebhookSink};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const POOL_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_ERROR_MESSAGE_LEN: usize = 200;

fn truncate(message: &str) -> String {
    if message.len() <= MAX_ERROR_MESSAGE_LEN {
        message.to_string()
    } else {
        let mut truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        truncated.push('…');
        truncated
    }
}

/// Delivers signed webhook requests over HTTP, honoring spec §4.11's
/// connect/write/read/pool timeout budget and disabling redirects (an
/// attacker-controlled `Location` header must never retarget a delivery).
pub struct HttpWebhookSink {
    client: reqwest::Client,
}

impl HttpWebhookSink {
    /// Build the sink's `reqwest::Client`, failing only if the TLS backend
    /// cannot initialize.
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT + WRITE_TIMEOUT)
            .pool_idle_timeout(POOL_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

impl Default for HttpWebhookSink {
    fn default() -> Self {
        // `reqwest::Client::builder().build()` only fails if the platform's
        // TLS backend cannot initialize, which would make the process
        // unusable for any HTTP client regardless.
        Self::new().expect("failed to build the webhook HTTP client")
    }
}

#[async_trait]
impl WebhookSink for HttpWebhookSink {
    async fn deliver(
        &self,
        webhook: &Webhook,
        event_id: &str,
        event_type: &str,
        payload: serde_json::Value,
        attempt: u32,
    ) -> Result<Delivery, CoreError> {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let body = serde_json::to_string(&payload).map_err(CoreError::Serialization)?;
        let signature = sign(&webhook.secret, &timestamp, &body);
        let started = std::time::Instant::now();

        let response = self
            .client
            .post(&webhook.url)
            .header("Content-Type", "application/json")
            .header("X-Webhook-ID", &webhook.id)
            .header("X-Webhook-Event", event_type)
            .header("X-Webhook-Timestamp", &timestamp)
            .header("X-Webhook-Signature", &signature)
            .body(body)
            .send()
            .await;

        let response_time_ms = Some(started.elapsed().as_millis() as u64);
        let attempted_at = chrono::Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        let delivery = match response {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    Delivery {
                        id,
                        webhook_id: webhook.id.clone(),
                        event_id: event_id.to_string(),
                        event_type: event_type.to_string(),
                        attempt,
                        outcome: DeliveryOutcome::Success,
                        status_code: Some(status.as_u16()),
                        response_time_ms,
                        error_message: None,
                        attempted_at,
                    }
                } else {
                    let text = resp.text().await.unwrap_or_default();
                    Delivery {
                        id,
                        webhook_id: webhook.id.clone(),
                        event_id: event_id.to_string(),
                        event_type: event_type.to_string(),
                        attempt,
                        outcome: DeliveryOutcome::HttpError,
                        status_code: Some(status.as_u16()),
                        response_time_ms,
                        error_message: Some(truncate(&format!("HTTP {}: {text}", status.as_u16()))),
                        attempted_at,
                    }
                }
            }
            Err(err) => Delivery {
                id,
                webhook_id: webhook.id.clone(),
                event_id: event_id.to_string(),
                event_type: event_type.to_string(),
                attempt,
                outcome: DeliveryOutcome::TransportError,
                status_code: None,
                response_time_ms,
                error_message: Some(truncate(&err.to_string())),
                attempted_at,
            },
        };

        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_messages_untouched() {
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn truncate_caps_long_messages() {
        let long = "x".repeat(500);
        let truncated = truncate(&long);
        assert!(truncated.chars().count() <= MAX_ERROR_MESSAGE_LEN + 1);
    }
}
