//! Signed outbound webhook delivery, inbound signature verification, and
//! SSRF defense for registered endpoint URLs.
//!
//! [`delivery::HttpWebhookSink`] performs one delivery attempt;
//! [`registry::WebhookRegistry`] owns registration, fan-out to active
//! subscribers, and retry bookkeeping on top of a
//! [`ragflow_core::WebhookStore`]; [`inbound::InboundVerifier`] checks
//! externally-originated requests before they are handed to the rest of
//! the pipeline.

pub mod delivery;
pub mod error;
pub mod inbound;
pub mod registry;
pub mod signing;
pub mod ssrf;

pub use delivery::HttpWebhookSink;
pub use error::{Result, WebhookError};
pub use inbound::{AcceptedEvent, InboundVerifier};
pub use registry::{WebhookRegistration, WebhookRegistry};
pub use ssrf::SsrfPolicy;
