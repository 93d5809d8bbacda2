//! Provider invocation: one [`ProviderClient`] per upstream, thinly
//! wrapping `reqwest` with the retry/backoff math from
//! `gateway-resilience::retry` and a normalized error taxonomy.

pub mod sse;

use crate::outbound::OutboundRequest;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use gateway_core::GatewayError;
use gateway_resilience::timeout::TimeoutManager;
use gateway_resilience::{RetryConfig, RetryPolicy};
use reqwest::Method;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// The non-default retry shape this client uses: base 200ms, factor 2,
/// jitter ±25%, cap 5s, 3 attempts total (1 initial + 2 retries) —
/// tighter than [`RetryConfig::default`]'s base 100ms/3 retries (4
/// attempts), since upstream model-inference calls are expensive and a
/// caller waiting on a live request shouldn't pay for a deep retry chain.
#[must_use]
pub fn provider_retry_config() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        base_delay: Duration::from_millis(200),
        max_delay: Duration::from_secs(5),
        multiplier: 2.0,
        jitter: 0.25,
        retry_on_status: vec![429, 500, 502, 503, 504],
    }
}

/// Thinly wraps a `reqwest::Client`, applying retry and the §5 non-streaming
/// request deadline to every call.
pub struct ProviderClient {
    http: reqwest::Client,
    retry: RetryPolicy,
    timeout: TimeoutManager,
}

impl ProviderClient {
    /// Build a client with [`provider_retry_config`]'s retry shape and the
    /// 120s non-streaming request timeout.
    ///
    /// # Errors
    /// Returns [`GatewayError::Internal`] if the underlying `reqwest::Client`
    /// fails to build (TLS backend initialization failure).
    pub fn new() -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            retry: RetryPolicy::new(provider_retry_config()),
            timeout: TimeoutManager::new(gateway_resilience::TimeoutConfig::non_streaming_request()),
        })
    }

    /// Send a non-streaming request, retrying per the configured policy,
    /// and parse the body as JSON.
    ///
    /// # Errors
    /// Returns [`GatewayError::UpstreamError`] for a non-2xx response,
    /// [`GatewayError::RateLimited`] for a 429 carrying `Retry-After`, or
    /// [`GatewayError::Timeout`] if the 120s deadline elapses.
    pub async fn invoke(&self, request: &OutboundRequest) -> Result<serde_json::Value, GatewayError> {
        self.retry
            .execute(|| async { self.timeout.run(self.send_once(request)).await? })
            .await
    }

    /// Send a streaming request and return its byte stream, unretried:
    /// streaming responses are not restarted after the first byte reaches
    /// the caller. Each chunk must arrive within the §5 60s per-frame idle
    /// limit or the stream ends with a [`GatewayError::Timeout`] item.
    ///
    /// # Errors
    /// Returns [`GatewayError::UpstreamError`] if the initial connection or
    /// status check fails.
    pub async fn invoke_stream(
        &self,
        request: &OutboundRequest,
    ) -> Result<impl Stream<Item = Result<Bytes, GatewayError>>, GatewayError> {
        let response = self.dispatch(request).await?;
        let response = Self::check_status(response).await?;
        let raw = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| GatewayError::upstream(format!("stream read error: {e}"), None, None)));
        Ok(sse::with_idle_timeout(
            Box::pin(raw),
            gateway_resilience::TimeoutConfig::stream_frame_idle().duration,
        ))
    }

    /// Send a non-streaming request and return the upstream response
    /// verbatim — status, headers, and body bytes unmodified — for
    /// transparent-mode passthrough. Retries the same
    /// way as [`Self::invoke`]; transparent mode is not exempt from
    /// retry, only from body translation.
    ///
    /// # Errors
    /// Returns [`GatewayError::Timeout`] if the deadline elapses. Non-2xx
    /// upstream responses are NOT an error here — transparent mode
    /// forwards the upstream's status and body verbatim, including error
    /// bodies, rather than mapping them through the canonical taxonomy.
    pub async fn invoke_passthrough(
        &self,
        request: &OutboundRequest,
    ) -> Result<(u16, Vec<(String, String)>, Bytes), GatewayError> {
        self.retry
            .execute(|| async { self.timeout.run(self.send_passthrough_once(request)).await? })
            .await
    }

    async fn send_passthrough_once(
        &self,
        request: &OutboundRequest,
    ) -> Result<(u16, Vec<(String, String)>, Bytes), GatewayError> {
        let response = self.dispatch(request).await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::upstream(format!("failed to read response body: {e}"), Some(status), None))?;
        Ok((status, headers, body))
    }

    async fn send_once(&self, request: &OutboundRequest) -> Result<serde_json::Value, GatewayError> {
        let response = self.dispatch(request).await?;
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::upstream(format!("invalid JSON response body: {e}"), None, None))
    }

    async fn dispatch(&self, request: &OutboundRequest) -> Result<reqwest::Response, GatewayError> {
        let method = Method::from_str(&request.method)
            .map_err(|e| GatewayError::Internal(format!("invalid HTTP method '{}': {e}", request.method)))?;

        let mut builder = self.http.request(method, &request.url).body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(Duration::from_secs(0))
            } else {
                GatewayError::upstream(format!("request failed: {e}"), None, None)
            }
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(GatewayError::RateLimited { retry_after });
        }

        let status_code = status.as_u16();
        let detail = response.text().await.ok();
        warn!(status = status_code, "upstream returned a non-success status");
        Err(GatewayError::upstream(
            format!("upstream returned {status_code}"),
            Some(status_code),
            detail,
        ))
    }
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new().expect("reqwest client with default TLS backend always builds")
    }
}
