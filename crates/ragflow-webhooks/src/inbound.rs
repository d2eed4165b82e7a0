//! Inbound webhook verification (spec §4.11's "Inbound" paragraph):
//! signature-checked acceptance of externally-originated events, grounded
//! in `original_source/app/services/webhook_service.py`'s
//! `verify_signature` and `process_incoming_webhook`.

use crate::error::{Result, WebhookError};
use crate::signing::verify;
use ragflow_core::WebhookStore;
use std::sync::Arc;

/// An accepted inbound event, returned once its signature has checked out.
#[derive(Debug, Clone)]
pub struct AcceptedEvent {
    pub webhook_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Verifies inbound requests against a registered webhook's secret before
/// accepting their payload for asynchronous processing.
pub struct InboundVerifier {
    store: Arc<dyn WebhookStore>,
}

impl InboundVerifier {
    pub fn new(store: Arc<dyn WebhookStore>) -> Self {
        Self { store }
    }

    /// Look up `webhook_id`, verify `signature_header` over `timestamp` and
    /// the raw `body`, and parse the body as JSON. Returns
    /// [`WebhookError::InvalidSignature`] if the webhook is unknown or the
    /// signature does not match — the two cases are deliberately
    /// indistinguishable to a caller, so an attacker cannot use this
    /// endpoint to enumerate registered webhook ids.
    pub async fn accept(
        &self,
        webhook_id: &str,
        event_type: &str,
        timestamp: &str,
        body: &str,
        signature_header: &str,
    ) -> Result<AcceptedEvent> {
        let webhook = self.store.get(webhook_id).await.map_err(WebhookError::Core)?;
        let Some(webhook) = webhook else {
            return Err(WebhookError::InvalidSignature);
        };

        if !verify(&webhook.secret, timestamp, body, signature_header) {
            return Err(WebhookError::InvalidSignature);
        }

        let payload: serde_json::Value = serde_json::from_str(body).map_err(|_| WebhookError::InvalidSignature)?;

        Ok(AcceptedEvent { webhook_id: webhook.id, event_type: event_type.to_string(), payload })
    }
}
