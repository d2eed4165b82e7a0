//! Webhook registration and delivery-history types.
//!
//! Signing, verification, and SSRF validation logic live in
//! `ragflow-webhooks`; this module only defines the data shapes, grounded in
//! `original_source/app/services/webhook_service.py`'s `Webhook` and
//! `WebhookDelivery` records.

use serde::{Deserialize, Serialize};

/// Events a registered webhook can subscribe to (spec §4.11's named
/// outbound events).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    /// A pipeline run produced an answer.
    #[serde(rename = "chat.response.generated")]
    ChatResponseGenerated,
    /// A turn was escalated to a human operator.
    #[serde(rename = "chat.escalated")]
    ChatEscalated,
    /// A staged draft was committed to the knowledge base.
    #[serde(rename = "knowledge.document.indexed")]
    KnowledgeDocumentIndexed,
    /// A staged draft failed to commit.
    #[serde(rename = "knowledge.document.failed")]
    KnowledgeDocumentFailed,
}

impl WebhookEvent {
    /// The wire event-type string used in the `X-Webhook-Event` header and
    /// the `webhook_deliveries.event_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookEvent::ChatResponseGenerated => "chat.response.generated",
            WebhookEvent::ChatEscalated => "chat.escalated",
            WebhookEvent::KnowledgeDocumentIndexed => "knowledge.document.indexed",
            WebhookEvent::KnowledgeDocumentFailed => "knowledge.document.failed",
        }
    }
}

/// A registered outbound webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Registration identifier.
    pub id: String,
    /// Destination URL; validated against the SSRF blocklist at registration
    /// and again immediately before each delivery.
    pub url: String,
    /// Shared secret used to sign outbound payloads.
    pub secret: String,
    /// Events this endpoint receives.
    pub events: Vec<WebhookEvent>,
    /// Whether delivery is currently enabled for this endpoint.
    pub active: bool,
    /// When this endpoint was registered.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The receiving endpoint returned a 2xx response.
    Success,
    /// The receiving endpoint returned a non-2xx response.
    HttpError,
    /// The request could not be sent (DNS failure, connection refused,
    /// timeout, or a post-registration SSRF re-check failure).
    TransportError,
}

/// One append-only entry in a webhook's delivery history. Once an attempt
/// reaches a terminal outcome its record is immutable; a retry creates a
/// brand new `Delivery` with an incremented `attempt`, preserving
/// `event_id` across the series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    /// This delivery attempt's own identifier.
    pub id: String,
    /// Identifier of the webhook this delivery targeted.
    pub webhook_id: String,
    /// Identifier shared by every attempt of the same logical event,
    /// unchanged across retries.
    pub event_id: String,
    /// The event type delivered (`chat.response.generated`,
    /// `chat.escalated`, `knowledge.document.indexed`, ...).
    pub event_type: String,
    /// 1-based attempt number for this event occurrence; increments on
    /// every retry of the same logical event.
    pub attempt: u32,
    /// What happened.
    pub outcome: DeliveryOutcome,
    /// Receiving endpoint's HTTP status code, if a response was received.
    pub status_code: Option<u16>,
    /// Wall-clock duration of the attempt, in milliseconds.
    pub response_time_ms: Option<u64>,
    /// Truncated failure description, if the attempt did not succeed.
    pub error_message: Option<String>,
    /// When the attempt was made.
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_events_round_trip_through_json() {
        for event in [
            WebhookEvent::ChatResponseGenerated,
            WebhookEvent::ChatEscalated,
            WebhookEvent::KnowledgeDocumentIndexed,
            WebhookEvent::KnowledgeDocumentFailed,
        ] {
            let json = serde_json::to_string(&event).unwrap();
            let back: WebhookEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
            assert_eq!(json.trim_matches('"'), event.as_str());
        }
    }
}
