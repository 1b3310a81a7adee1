//! Shared HTTP plumbing for provider adapters

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use shuka_core::error::{AgentError, Result};

/// Client with the per-call timeout applied at the transport
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))
}

/// Map a non-2xx provider response to the turn-level taxonomy.
/// The body is surfaced in the message.
pub fn classify_status(provider: &str, status: u16, body: &str) -> AgentError {
    let detail = format!("{provider} returned HTTP {status}: {}", body.trim());
    match status {
        401 | 403 => AgentError::Auth(detail),
        429 => AgentError::RateLimited(detail),
        500..=599 => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

fn transport_error(provider: &str, err: &reqwest::Error) -> AgentError {
    if err.is_timeout() || err.is_connect() {
        AgentError::ProviderUnavailable(format!("{provider}: {err}"))
    } else {
        AgentError::Provider(format!("{provider}: {err}"))
    }
}

/// POST a JSON body and decode a JSON response
pub async fn post_json<B, R>(provider: &str, request: reqwest::RequestBuilder, body: &B) -> Result<R>
where
    B: Serialize + Sync,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider, status = status.as_u16(), "provider request failed");
        return Err(classify_status(provider, status.as_u16(), &body));
    }

    let raw = response.text().await.map_err(|e| transport_error(provider, &e))?;
    serde_json::from_str(&raw).map_err(|e| AgentError::Parse(format!("{provider} response: {e}")))
}
