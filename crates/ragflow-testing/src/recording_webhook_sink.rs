//! A [`WebhookSink`] that records every delivery attempt instead of making
//! an HTTP request, so outbound fan-out can be asserted on directly.

use async_trait::async_trait;
use parking_lot::RwLock;
use ragflow_core::{CoreError, Delivery, DeliveryOutcome, Webhook, WebhookSink};

/// One captured call to [`WebhookSink::deliver`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub webhook_id: String,
    pub event_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub attempt: u32,
}

/// Records deliveries and, by default, reports every one as succeeding.
/// Call [`RecordingWebhookSink::fail_next`] to make the next `deliver` call
/// return a transport failure instead.
#[derive(Default)]
pub struct RecordingWebhookSink {
    calls: RwLock<Vec<RecordedCall>>,
    fail_next: RwLock<bool>,
}

impl RecordingWebhookSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }

    pub fn fail_next(&self) {
        *self.fail_next.write() = true;
    }
}

#[async_trait]
impl WebhookSink for RecordingWebhookSink {
    async fn deliver(
        &self,
        webhook: &Webhook,
        event_id: &str,
        event_type: &str,
        payload: serde_json::Value,
        attempt: u32,
    ) -> Result<Delivery, CoreError> {
        self.calls.write().push(RecordedCall {
            webhook_id: webhook.id.clone(),
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            payload: payload.clone(),
            attempt,
        });

        let should_fail = {
            let mut fail_next = self.fail_next.write();
            std::mem::replace(&mut *fail_next, false)
        };

        let outcome = if should_fail { DeliveryOutcome::TransportError } else { DeliveryOutcome::Success };

        Ok(Delivery {
            id: uuid::Uuid::new_v4().to_string(),
            webhook_id: webhook.id.clone(),
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            attempt,
            outcome,
            status_code: (!should_fail).then_some(200),
            response_time_ms: Some(0),
            error_message: should_fail.then(|| "simulated transport failure".to_string()),
            attempted_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragflow_core::WebhookEvent;

    fn webhook() -> Webhook {
        Webhook {
            id: "w1".into(),
            url: "http://example.com".into(),
            secret: "shh".into(),
            events: vec![WebhookEvent::ChatEscalated],
            active: true,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn records_every_call() {
        let sink = RecordingWebhookSink::new();
        sink.deliver(&webhook(), "evt-1", "chat.escalated", serde_json::json!({"a": 1}), 1).await.unwrap();
        assert_eq!(sink.call_count(), 1);
        assert_eq!(sink.calls()[0].event_id, "evt-1");
    }

    #[tokio::test]
    async fn fail_next_affects_only_the_next_call() {
        let sink = RecordingWebhookSink::new();
        sink.fail_next();

        let first = sink.deliver(&webhook(), "evt-1", "chat.escalated", serde_json::json!({}), 1).await.unwrap();
        assert_eq!(first.outcome, DeliveryOutcome::TransportError);

        let second = sink.deliver(&webhook(), "evt-2", "chat.escalated", serde_json::json!({}), 1).await.unwrap();
        assert_eq!(second.outcome, DeliveryOutcome::Success);
    }
}
