//! Shared HTTP plumbing for the vendor adapters

use reqwest::{Client, Response};

use super::AdapterError;
use crate::config::{NetworkSettings, TlsVerify};

/// Proxy handling for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyPolicy {
    /// Route through `network.proxy` when configured.
    Configured,
    /// Never use the configured proxy address.
    Ignore,
}

/// Build a client from per-provider network settings. System proxies are only honoured
/// when `trust_env` is set.
pub fn build_client(
    provider: &str,
    network: &NetworkSettings,
    default_timeout_secs: u64,
    proxy: ProxyPolicy,
) -> Result<Client, AdapterError> {
    let mut builder = Client::builder().timeout(network.timeout_or(default_timeout_secs));

    if !network.trust_env {
        builder = builder.no_proxy();
    }

    match (&network.proxy, proxy) {
        (Some(address), ProxyPolicy::Configured) => {
            let proxy = reqwest::Proxy::all(address.as_str()).map_err(|e| {
                AdapterError::Config(format!("invalid proxy for {}: {}", provider, e))
            })?;
            builder = builder.proxy(proxy);
        }
        (Some(_), ProxyPolicy::Ignore) => {
            tracing::warn!("{} does not support a proxy; ignoring configured address", provider);
        }
        (None, _) => {}
    }

    match &network.verify {
        TlsVerify::Enabled(true) => {}
        TlsVerify::Enabled(false) => {
            tracing::warn!("TLS verification disabled for {}", provider);
            builder = builder.danger_accept_invalid_certs(true);
        }
        TlsVerify::TrustRoot(path) => {
            let pem = std::fs::read(path).map_err(|e| {
                AdapterError::Config(format!(
                    "cannot read trust root {} for {}: {}",
                    path.display(),
                    provider,
                    e
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                AdapterError::Config(format!(
                    "invalid trust root {} for {}: {}",
                    path.display(),
                    provider,
                    e
                ))
            })?;
            builder = builder.add_root_certificate(cert);
        }
    }

    builder
        .build()
        .map_err(|e| AdapterError::Config(format!("failed to build {} client: {}", provider, e)))
}

/// `Retry-After` in milliseconds; only the delay-seconds form is understood.
fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}

/// Return the response if it succeeded, otherwise a classified error with a truncated body.
pub async fn check_status(response: Response) -> Result<Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_ms = retry_after_ms(response.headers());
    let body = response.text().await.unwrap_or_default();

    Err(AdapterError::from_status(
        status.as_u16(),
        &body,
        retry_after_ms,
    ))
}

/// Read a JSON body, classifying decode problems as parse errors.
pub async fn read_json(response: Response) -> Result<serde_json::Value, AdapterError> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        AdapterError::Parse(format!("invalid JSON body ({}): {}", e, super::truncate_body(&text)))
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::providers::FailureKind;

    #[test]
    fn test_default_settings_build() {
        let client = build_client(
            "openai",
            &NetworkSettings::default(),
            60,
            ProxyPolicy::Configured,
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_proxy_is_applied_or_ignored() {
        let network = NetworkSettings {
            proxy: Some("http://127.0.0.1:7890".into()),
            ..Default::default()
        };
        assert!(build_client("openai", &network, 60, ProxyPolicy::Configured).is_ok());
        assert!(build_client("doubao", &network, 60, ProxyPolicy::Ignore).is_ok());
    }

    #[test]
    fn test_missing_trust_root_is_misconfigured() {
        let network = NetworkSettings {
            verify: TlsVerify::TrustRoot(PathBuf::from("/definitely/missing/ca.pem")),
            ..Default::default()
        };
        let err = build_client("doubao", &network, 60, ProxyPolicy::Ignore).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Misconfigured);
    }

    #[test]
    fn test_oversized_retry_after_saturates() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::RETRY_AFTER,
            reqwest::header::HeaderValue::from_static("18446744073709551615"),
        );
        assert_eq!(retry_after_ms(&headers), Some(u64::MAX));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            reqwest::header::HeaderValue::from_static(" 3 "),
        );
        assert_eq!(retry_after_ms(&headers), Some(3000));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            reqwest::header::HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_ms(&headers), None);
    }
}
