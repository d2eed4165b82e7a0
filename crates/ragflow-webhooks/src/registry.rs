//! Webhook registration, outbound event fan-out, and delivery retry (spec
//! §4.11/§6), grounded in
//! `original_source/app/services/webhook_service.py`'s `register_webhook`,
//! `trigger_outgoing_event`, and `retry_delivery`.

use crate::error::{Result, WebhookError};
use crate::ssrf::{validate_webhook_url, SsrfPolicy};
use ragflow_core::{Delivery, Webhook, WebhookEvent, WebhookSink, WebhookStore};
use std::sync::Arc;

/// Fields accepted when registering a new webhook. The secret is generated
/// by the caller (or provided) and returned to them exactly once, mirroring
/// the original's "shown only once on registration" contract.
pub struct WebhookRegistration {
    pub url: String,
    pub secret: String,
    pub events: Vec<WebhookEvent>,
    pub active: bool,
}

/// Registers webhooks, fans outbound events out to every active subscriber,
/// and replays failed deliveries.
pub struct WebhookRegistry {
    store: Arc<dyn WebhookStore>,
    sink: Arc<dyn WebhookSink>,
    ssrf_policy: SsrfPolicy,
}

impl WebhookRegistry {
    pub fn new(store: Arc<dyn WebhookStore>, sink: Arc<dyn WebhookSink>, ssrf_policy: SsrfPolicy) -> Self {
        Self { store, sink, ssrf_policy }
    }

    /// Validate the destination URL and persist a new webhook registration.
    pub async fn register(&self, registration: WebhookRegistration) -> Result<Webhook> {
        validate_webhook_url(&registration.url, &self.ssrf_policy).await?;

        let webhook = Webhook {
            id: uuid::Uuid::new_v4().to_string(),
            url: registration.url,
            secret: registration.secret,
            events: registration.events,
            active: registration.active,
            created_at: chrono::Utc::now(),
        };
        self.store.put(webhook.clone()).await.map_err(WebhookError::Core)?;
        Ok(webhook)
    }

    pub async fn list(&self) -> Result<Vec<Webhook>> {
        self.store.list().await.map_err(WebhookError::Core)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Webhook>> {
        self.store.get(id).await.map_err(WebhookError::Core)
    }

    /// Re-validate a changed URL (if any) and overwrite the registration.
    pub async fn update(&self, webhook: Webhook) -> Result<Webhook> {
        validate_webhook_url(&webhook.url, &self.ssrf_policy).await?;
        self.store.put(webhook.clone()).await.map_err(WebhookError::Core)?;
        Ok(webhook)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await.map_err(WebhookError::Core)
    }

    pub async fn deliveries(&self, webhook_id: &str) -> Result<Vec<Delivery>> {
        self.store.list_deliveries(webhook_id).await.map_err(WebhookError::Core)
    }

    /// Dispatch `event` to every active subscriber, delivering each as its
    /// own first attempt under a fresh `event_id`.
    #[tracing::instrument(skip(self, payload), fields(event = event.as_str()))]
    pub async fn trigger(&self, event: WebhookEvent, payload: serde_json::Value) -> Result<Vec<Delivery>> {
        let targets = self.store.active_subscribers(event).await.map_err(WebhookError::Core)?;
        let event_id = uuid::Uuid::new_v4().to_string();

        let mut deliveries = Vec::with_capacity(targets.len());
        for webhook in &targets {
            // Re-check the destination at delivery time: a registration can
            // outlive a DNS record that now resolves somewhere blocked.
            if validate_webhook_url(&webhook.url, &self.ssrf_policy).await.is_err() {
                tracing::warn!(webhook_id = %webhook.id, "skipping delivery to a now-blocked url");
                continue;
            }

            let delivery = self.sink.deliver(webhook, &event_id, event.as_str(), payload.clone(), 1).await;
            match delivery {
                Ok(delivery) => {
                    self.store.save_delivery(&delivery).await.map_err(WebhookError::Core)?;
                    deliveries.push(delivery);
                }
                Err(err) => {
                    tracing::error!(webhook_id = %webhook.id, error = %err, "webhook delivery failed");
                }
            }
        }
        Ok(deliveries)
    }

    /// Replay a past delivery attempt as a brand new [`Delivery`] row,
    /// preserving `event_id` and incrementing `attempt`.
    pub async fn retry(&self, delivery_id: &str) -> Result<Delivery> {
        let original = self
            .store
            .get_delivery(delivery_id)
            .await
            .map_err(WebhookError::Core)?
            .ok_or_else(|| WebhookError::Transport(format!("delivery `{delivery_id}` not found")))?;

        let webhook = self
            .store
            .get(&original.webhook_id)
            .await
            .map_err(WebhookError::Core)?
            .ok_or_else(|| WebhookError::Transport(format!("webhook `{}` not found", original.webhook_id)))?;

        validate_webhook_url(&webhook.url, &self.ssrf_policy).await?;

        let retried = self
            .sink
            .deliver(&webhook, &original.event_id, &original.event_type, serde_json::Value::Null, original.attempt + 1)
            .await
            .map_err(WebhookError::Core)?;
        self.store.save_delivery(&retried).await.map_err(WebhookError::Core)?;
        Ok(retried)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragflow_core::{CoreError, DeliveryOutcome};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        webhooks: Mutex<Vec<Webhook>>,
        deliveries: Mutex<Vec<Delivery>>,
    }

    #[async_trait]
    impl WebhookStore for FakeStore {
        async fn put(&self, webhook: Webhook) -> std::result::Result<(), CoreError> {
            let mut webhooks = self.webhooks.lock().unwrap();
            webhooks.retain(|w| w.id != webhook.id);
            webhooks.push(webhook);
            Ok(())
        }
        async fn get(&self, id: &str) -> std::result::Result<Option<Webhook>, CoreError> {
            Ok(self.webhooks.lock().unwrap().iter().find(|w| w.id == id).cloned())
        }
        async fn delete(&self, id: &str) -> std::result::Result<(), CoreError> {
            self.webhooks.lock().unwrap().retain(|w| w.id != id);
            Ok(())
        }
        async fn list(&self) -> std::result::Result<Vec<Webhook>, CoreError> {
            Ok(self.webhooks.lock().unwrap().clone())
        }
        async fn active_subscribers(&self, event: WebhookEvent) -> std::result::Result<Vec<Webhook>, CoreError> {
            Ok(self
                .webhooks
                .lock()
                .unwrap()
                .iter()
                .filter(|w| w.active && w.events.contains(&event))
                .cloned()
                .collect())
        }
        async fn save_delivery(&self, delivery: &Delivery) -> std::result::Result<(), CoreError> {
            self.deliveries.lock().unwrap().push(delivery.clone());
            Ok(())
        }
        async fn get_delivery(&self, id: &str) -> std::result::Result<Option<Delivery>, CoreError> {
            Ok(self.deliveries.lock().unwrap().iter().find(|d| d.id == id).cloned())
        }
        async fn list_deliveries(&self, webhook_id: &str) -> std::result::Result<Vec<Delivery>, CoreError> {
            Ok(self.deliveries.lock().unwrap().iter().filter(|d| d.webhook_id == webhook_id).cloned().collect())
        }
    }

    struct FakeSink;

    #[async_trait]
    impl WebhookSink for FakeSink {
        async fn deliver(
            &self,
            webhook: &Webhook,
            event_id: &str,
            event_type: &str,
            _payload: serde_json::Value,
            attempt: u32,
        ) -> std::result::Result<Delivery, CoreError> {
            Ok(Delivery {
                id: format!("delivery-{attempt}"),
                webhook_id: webhook.id.clone(),
                event_id: event_id.to_string(),
                event_type: event_type.to_string(),
                attempt,
                outcome: DeliveryOutcome::Success,
                status_code: Some(200),
                response_time_ms: Some(5),
                error_message: None,
                attempted_at: chrono::Utc::now(),
            })
        }
    }

    fn registry() -> WebhookRegistry {
        WebhookRegistry::new(Arc::new(FakeStore::default()), Arc::new(FakeSink), SsrfPolicy::default())
    }

    #[tokio::test]
    async fn register_rejects_blocked_url() {
        let registry = registry();
        let err = registry
            .register(WebhookRegistration {
                url: "http://localhost/hook".to_string(),
                secret: "shh".to_string(),
                events: vec![WebhookEvent::ChatEscalated],
                active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::UrlRejected(_)));
    }

    #[tokio::test]
    async fn register_then_trigger_delivers_to_subscriber() {
        let registry = registry();
        let webhook = registry
            .register(WebhookRegistration {
                url: "http://example.com/hook".to_string(),
                secret: "shh".to_string(),
                events: vec![WebhookEvent::ChatEscalated],
                active: true,
            })
            .await
            .unwrap();

        let deliveries = registry.trigger(WebhookEvent::ChatEscalated, serde_json::json!({"a": 1})).await.unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].webhook_id, webhook.id);
        assert_eq!(deliveries[0].attempt, 1);
    }

    #[tokio::test]
    async fn trigger_skips_subscribers_to_other_events() {
        let registry = registry();
        registry
            .register(WebhookRegistration {
                url: "http://example.com/hook".to_string(),
                secret: "shh".to_string(),
                events: vec![WebhookEvent::KnowledgeDocumentIndexed],
                active: true,
            })
            .await
            .unwrap();

        let deliveries = registry.trigger(WebhookEvent::ChatEscalated, serde_json::json!({})).await.unwrap();
        assert!(deliveries.is_empty());
    }

    #[tokio::test]
    async fn retry_increments_attempt_and_keeps_event_id() {
        let registry = registry();
        registry
            .register(WebhookRegistration {
                url: "http://example.com/hook".to_string(),
                secret: "shh".to_string(),
                events: vec![WebhookEvent::ChatEscalated],
                active: true,
            })
            .await
            .unwrap();
        let first = registry.trigger(WebhookEvent::ChatEscalated, serde_json::json!({})).await.unwrap();
        let original = &first[0];

        let retried = registry.retry(&original.id).await.unwrap();
        assert_eq!(retried.event_id, original.event_id);
        assert_eq!(retried.attempt, original.attempt + 1);
    }

    #[tokio::test]
    async fn retry_unknown_delivery_errors() {
        let registry = registry();
        let err = registry.retry("missing").await.unwrap_err();
        assert!(matches!(err, WebhookError::Transport(_)));
    }
}
