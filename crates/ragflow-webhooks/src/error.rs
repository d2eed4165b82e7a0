//! Webhook subsystem error taxonomy.

use ragflow_core::CoreError;
use thiserror::Error;

/// Errors specific to webhook registration, signing, and delivery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WebhookError {
    /// The underlying store/model call failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A webhook URL failed SSRF validation at registration or pre-delivery
    /// time.
    #[error("webhook url rejected: {0}")]
    UrlRejected(String),

    /// The outbound HTTP request itself could not be completed.
    #[error("webhook delivery transport error: {0}")]
    Transport(String),

    /// An inbound request's signature did not match.
    #[error("inbound webhook signature verification failed")]
    InvalidSignature,
}

impl From<WebhookError> for CoreError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Core(inner) => inner,
            WebhookError::UrlRejected(message) => {
                CoreError::UpstreamUnavailable { stage: "webhook_registration".to_string(), message }
            }
            WebhookError::Transport(message) => {
                CoreError::UpstreamUnavailable { stage: "webhook_delivery".to_string(), message }
            }
            WebhookError::InvalidSignature => CoreError::UpstreamUnavailable {
                stage: "webhook_inbound".to_string(),
                message: "signature verification failed".to_string(),
            },
        }
    }
}

/// Convenience alias for webhook results.
pub type Result<T> = std::result::Result<T, WebhookError>;
