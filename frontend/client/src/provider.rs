//! Chain access capability and its JSON-RPC-over-HTTP implementation.
//!
//! Nothing in this crate reaches for a global provider object: every
//! component takes a [`Provider`], so tests substitute a scripted double and
//! an embedder can route requests through whatever transport its wallet
//! environment injects.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or
//!   rate-limit response, up to [`MAX_READ_ATTEMPTS`] attempts.
//! * Transient network errors (connection reset, timeout) are retried
//!   silently within the same attempt limit.
//! * Only read calls travel through this transport (transactions are signed
//!   and broadcast by the wallet), so a retry never re-sends a
//!   state-mutating submission.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{ClientError, Result};

const MAX_READ_ATTEMPTS: u32 = 4;
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 8_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Injected chain-access capability.
pub trait Provider {
    /// Perform one JSON-RPC request and return its `result` payload.
    fn request(&self, method: &str, params: Value) -> impl Future<Output = Result<Value>> + Send;
}

impl<P: Provider> Provider for &P {
    fn request(&self, method: &str, params: Value) -> impl Future<Output = Result<Value>> + Send {
        (**self).request(method, params)
    }
}

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    /// Execution reverts are terminal and must not be retried; everything
    /// else coming back as a JSON-RPC error is treated as transient.
    fn is_revert(&self) -> bool {
        self.code == 3 || self.message.to_ascii_lowercase().contains("revert")
    }
}

// ─────────────────────────────────────────────────────────
// HTTP provider
// ─────────────────────────────────────────────────────────

/// JSON-RPC over HTTP against an EVM node.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    url: String,
}

impl HttpProvider {
    /// Build a provider with its own HTTP client and request timeout.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(client, url))
    }

    /// Build a provider over a shared [`reqwest::Client`].
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        HttpProvider {
            client,
            url: url.into(),
        }
    }
}

impl Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut backoff = INITIAL_BACKOFF_MS;
        for attempt in 1..=MAX_READ_ATTEMPTS {
            let response = self.client.post(&self.url).json(&payload).send().await;

            match response {
                Err(e) if attempt < MAX_READ_ATTEMPTS => {
                    warn!("RPC request failed (will retry in {backoff}ms): {e}");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_MS);
                }
                Err(e) if e.is_timeout() => {
                    return Err(ClientError::NetworkTimeout(format!("{method} response")))
                }
                Err(e) => return Err(ClientError::ContractUnreachable(e.to_string())),
                Ok(resp) => {
                    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
                        && attempt < MAX_READ_ATTEMPTS
                    {
                        warn!("Rate-limited by RPC (will retry in {backoff}ms)");
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF_MS);
                        continue;
                    }

                    let body: RpcResponse = resp.json().await.map_err(|e| {
                        ClientError::ContractUnreachable(format!("malformed RPC response: {e}"))
                    })?;

                    if let Some(err) = body.error {
                        if err.is_revert() {
                            return Err(ClientError::ContractCallReverted(err.message));
                        }
                        if attempt < MAX_READ_ATTEMPTS {
                            warn!(
                                "RPC soft error (will retry in {backoff}ms): {} {}",
                                err.code, err.message
                            );
                            tokio::time::sleep(Duration::from_millis(backoff)).await;
                            backoff = (backoff * 2).min(MAX_BACKOFF_MS);
                            continue;
                        }
                        return Err(ClientError::ContractUnreachable(format!(
                            "RPC error {}: {}",
                            err.code, err.message
                        )));
                    }

                    let result = body.result.ok_or_else(|| {
                        ClientError::ContractUnreachable(format!("empty result for {method}"))
                    })?;
                    debug!("{method} completed on attempt {attempt}");
                    return Ok(result);
                }
            }
        }

        Err(ClientError::NetworkTimeout(format!(
            "{method} after {MAX_READ_ATTEMPTS} attempts"
        )))
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_classification() {
        let revert = RpcError {
            code: 3,
            message: "execution reverted".to_string(),
        };
        assert!(revert.is_revert());

        let revert_by_message = RpcError {
            code: -32000,
            message: "Execution Reverted: minimum not reached".to_string(),
        };
        assert!(revert_by_message.is_revert());

        let transient = RpcError {
            code: -32005,
            message: "request limit exceeded".to_string(),
        };
        assert!(!transient.is_revert());
    }

    #[test]
    fn response_shape_parses() {
        let body: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x01"}"#).unwrap();
        assert_eq!(body.result, Some(json!("0x01")));
        assert!(body.error.is_none());

        let body: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted"}}"#,
        )
        .unwrap();
        assert!(body.result.is_none());
        assert_eq!(body.error.unwrap().code, 3);
    }
}
