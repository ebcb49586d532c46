//! JSON request loop shared by the GitHub and Discord REST clients.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

use crate::transport_helpers::{
    is_retryable_status, is_retryable_transport_error, parse_retry_after, retry_delay,
    truncate_for_error,
};

const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay_ms.max(1),
        }
    }
}

/// Whether a request may be sent again after its outcome became unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Reads and edits; repeating them converges on the same state.
    Idempotent,
    /// Creates something server side. Only retried when the server provably
    /// did not act: a rate limit or a connection that never opened.
    CreatesResource,
}

impl Replay {
    fn allows_status(self, status: u16) -> bool {
        match self {
            Self::Idempotent => is_retryable_status(status),
            Self::CreatesResource => status == 429,
        }
    }

    fn allows_transport_error(self, error: &reqwest::Error) -> bool {
        match self {
            Self::Idempotent => is_retryable_transport_error(error),
            Self::CreatesResource => error.is_connect(),
        }
    }
}

/// Sends the request built by `request_builder` until it succeeds, fails
/// with a non-retryable error, or `policy` runs out of attempts. `service`
/// prefixes error messages (`"discord api create message failed ..."`).
pub async fn request_json<T, F>(
    service: &str,
    operation: &str,
    policy: RetryPolicy,
    replay: Replay,
    mut request_builder: F,
) -> Result<T>
where
    T: DeserializeOwned,
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut attempt = 0_usize;
    loop {
        attempt = attempt.saturating_add(1);
        let response = request_builder()
            .header(
                "x-threadline-retry-attempt",
                attempt.saturating_sub(1).to_string(),
            )
            .send()
            .await;
        match response {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    let parsed = response
                        .json::<T>()
                        .await
                        .with_context(|| format!("failed to decode {service} {operation}"))?;
                    return Ok(parsed);
                }

                let retry_after = parse_retry_after(response.headers());
                let body = response.text().await.unwrap_or_default();
                if attempt < policy.max_attempts && replay.allows_status(status.as_u16()) {
                    let delay = retry_delay(policy.base_delay_ms, attempt, retry_after);
                    tracing::debug!(
                        service,
                        operation,
                        status = status.as_u16(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying rest request"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                bail!(
                    "{service} {operation} failed with status {}: {}",
                    status.as_u16(),
                    truncate_for_error(&body, ERROR_BODY_MAX_CHARS)
                );
            }
            Err(error) => {
                if attempt < policy.max_attempts && replay.allows_transport_error(&error) {
                    tracing::debug!(service, operation, attempt, error = %error, "retrying rest request");
                    tokio::time::sleep(retry_delay(policy.base_delay_ms, attempt, None)).await;
                    continue;
                }
                return Err(error).with_context(|| format!("{service} {operation} request failed"));
            }
        }
    }
}
