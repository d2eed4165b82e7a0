//! SSRF defense for webhook URLs (spec §4.11), grounded in
//! `original_source/app/utils/url_security.py`'s `validate_webhook_url_async`:
//! scheme allowlist, a configurable host/IP blocklist, DNS resolution of
//! every candidate address, and numeric-literal hostnames treated as IPs
//! directly.

use crate::error::{Result, WebhookError};
use std::net::IpAddr;
use std::str::FromStr;
use tokio::net::lookup_host;

/// Blocklist policy applied to a webhook URL's resolved addresses.
#[derive(Debug, Clone)]
pub struct SsrfPolicy {
    /// Literal hostnames rejected outright (default: localhost variants).
    pub blocked_hosts: Vec<String>,
    /// Whether private (RFC 1918 etc.) IP ranges are permitted. Internal
    /// deployments default this to `true`; public-facing ones should flip
    /// it off.
    pub allow_private_ips: bool,
}

impl Default for SsrfPolicy {
    fn default() -> Self {
        Self {
            blocked_hosts: vec!["localhost".to_string(), "0.0.0.0".to_string()],
            allow_private_ips: true,
        }
    }
}

fn is_metadata_or_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

fn is_blocked_ip(ip: IpAddr, policy: &SsrfPolicy) -> bool {
    if is_metadata_or_loopback(ip) {
        return true;
    }
    if !policy.allow_private_ips {
        return match ip {
            IpAddr::V4(v4) => v4.is_private(),
            IpAddr::V6(_) => false,
        };
    }
    false
}

/// Validate a webhook URL's scheme, host, and every DNS-resolved address
/// against `policy`. Returns `Ok(())` if the URL may be used, or a
/// [`WebhookError::UrlRejected`] describing why not.
pub async fn validate_webhook_url(url: &str, policy: &SsrfPolicy) -> Result<()> {
    if url.contains('@') || url.contains("..") {
        return Err(WebhookError::UrlRejected("url contains a suspicious pattern".to_string()));
    }

    let parsed = url::Url::parse(url).map_err(|e| WebhookError::UrlRejected(format!("invalid url: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(WebhookError::UrlRejected(format!("protocol `{}` not allowed", parsed.scheme())));
    }

    let Some(host) = parsed.host_str() else {
        return Err(WebhookError::UrlRejected("url must contain a hostname".to_string()));
    };

    if policy.blocked_hosts.iter().any(|blocked| blocked.eq_ignore_ascii_case(host)) {
        return Err(WebhookError::UrlRejected(format!("host `{host}` is blocked")));
    }

    // A numeric-literal hostname is checked directly, bypassing DNS.
    if let Ok(ip) = IpAddr::from_str(host) {
        if is_blocked_ip(ip, policy) {
            return Err(WebhookError::UrlRejected(format!("url resolves to a blocked address: {ip}")));
        }
        return Ok(());
    }

    let port = parsed.port_or_known_default().unwrap_or(443);
    let resolved = lookup_host((host, port))
        .await
        .map_err(|e| WebhookError::UrlRejected(format!("failed to resolve hostname: {e}")))?;

    let mut saw_any = false;
    for addr in resolved {
        saw_any = true;
        if is_blocked_ip(addr.ip(), policy) {
            return Err(WebhookError::UrlRejected(format!("url resolves to a blocked address: {}", addr.ip())));
        }
    }
    if !saw_any {
        return Err(WebhookError::UrlRejected("hostname resolved to no addresses".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unsupported_schemes() {
        let err = validate_webhook_url("ftp://example.com/hook", &SsrfPolicy::default()).await.unwrap_err();
        assert!(matches!(err, WebhookError::UrlRejected(_)));
    }

    #[tokio::test]
    async fn rejects_loopback_literal_ip() {
        let err = validate_webhook_url("http://127.0.0.1:8080/hook", &SsrfPolicy::default()).await.unwrap_err();
        assert!(matches!(err, WebhookError::UrlRejected(_)));
    }

    #[tokio::test]
    async fn rejects_metadata_literal_ip() {
        let err = validate_webhook_url("http://169.254.169.254/latest/meta-data", &SsrfPolicy::default()).await.unwrap_err();
        assert!(matches!(err, WebhookError::UrlRejected(_)));
    }

    #[tokio::test]
    async fn rejects_blocked_host_name() {
        let err = validate_webhook_url("http://localhost/hook", &SsrfPolicy::default()).await.unwrap_err();
        assert!(matches!(err, WebhookError::UrlRejected(_)));
    }

    #[tokio::test]
    async fn rejects_userinfo_in_url() {
        let err = validate_webhook_url("http://attacker@example.com/hook", &SsrfPolicy::default()).await.unwrap_err();
        assert!(matches!(err, WebhookError::UrlRejected(_)));
    }

    #[tokio::test]
    async fn rejects_directory_traversal_pattern() {
        let err = validate_webhook_url("http://example.com/../hook", &SsrfPolicy::default()).await.unwrap_err();
        assert!(matches!(err, WebhookError::UrlRejected(_)));
    }
}
