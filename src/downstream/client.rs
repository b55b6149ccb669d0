//! Generic downstream HTTP call.
//!
//! # Responsibilities
//! - Issue one HTTP verb against one URL with query parameters or a JSON body
//! - Run the call on its own task and hand back a single result
//! - Classify failures: HTTP status vs transport error
//! - Record per-service call metrics

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::config::TimeoutConfig;
use crate::downstream::{DownstreamError, DownstreamResult};
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;

/// Identifies a downstream service in logs, errors and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Product,
    Order,
    Payment,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Product => "product",
            Service::Order => "order",
            Service::Payment => "payment",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform outcome of one downstream call.
///
/// `transport_error` is set only when no complete HTTP response arrived;
/// in that case `status` is `None` and `body` is empty.
#[derive(Debug, Clone)]
pub struct CallResult {
    pub status: Option<StatusCode>,
    pub body: Bytes,
    pub transport_error: Option<String>,
}

impl CallResult {
    pub fn response(status: StatusCode, body: Bytes) -> Self {
        Self {
            status: Some(status),
            body,
            transport_error: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: Bytes::new(),
            transport_error: Some(message.into()),
        }
    }

    /// Convert into the body if `expected` arrived, or the matching error.
    pub fn expect_status(self, service: Service, expected: StatusCode) -> DownstreamResult<Bytes> {
        if let Some(message) = self.transport_error {
            return Err(DownstreamError::Transport { service, message });
        }
        match self.status {
            Some(status) if status == expected => Ok(self.body),
            Some(status) => Err(DownstreamError::Rejected {
                service,
                status,
                body: self.body,
            }),
            None => Err(DownstreamError::Transport {
                service,
                message: "no status received".to_string(),
            }),
        }
    }
}

/// Placeholder body for calls that send none.
pub const NO_BODY: Option<&()> = None;

/// Decode a JSON body, mapping failures to [`DownstreamError::Decode`].
pub fn decode<T: DeserializeOwned>(service: Service, body: &[u8]) -> DownstreamResult<T> {
    serde_json::from_slice(body).map_err(|e| DownstreamError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Build the pooled HTTP client shared by all downstream services.
pub fn build_http_client(timeouts: &TimeoutConfig) -> DownstreamResult<Client> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.downstream_secs))
        .build()?;
    Ok(client)
}

/// HTTP client bound to one downstream service's base URL.
#[derive(Clone)]
pub struct DownstreamClient {
    http: Client,
    service: Service,
    base_url: Arc<str>,
    request_id: Option<Arc<str>>,
}

impl DownstreamClient {
    pub fn new(http: Client, service: Service, base_url: &str) -> Self {
        Self {
            http,
            service,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            request_id: None,
        }
    }

    /// A copy that forwards `request_id` as `x-request-id`.
    pub fn with_request_id(&self, request_id: &str) -> Self {
        Self {
            request_id: Some(Arc::from(request_id)),
            ..self.clone()
        }
    }

    pub fn service(&self) -> Service {
        self.service
    }

    /// Absolute URL for a service-relative path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Perform one call. Never fails: every outcome is folded into
    /// [`CallResult`].
    pub async fn call<B>(
        &self,
        method: Method,
        url: String,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> CallResult
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(id) = self.request_id.as_deref() {
            builder = builder.header(X_REQUEST_ID, id);
        }

        let service = self.service;
        let start = Instant::now();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.bytes().await {
                        Ok(body) => CallResult::response(status, body),
                        Err(e) => CallResult::transport(format!("failed to read response body: {e}")),
                    }
                }
                Err(e) if e.is_timeout() => CallResult::transport(format!("request timed out: {e}")),
                Err(e) => CallResult::transport(e.to_string()),
            };
            let _ = tx.send(result);
        });

        let result = rx
            .await
            .unwrap_or_else(|_| CallResult::transport("call task ended without a result"));

        let status_label = match &result.status {
            Some(status) => status.as_str().to_string(),
            None => "transport_error".to_string(),
        };
        metrics::record_downstream_call(service.as_str(), &status_label, start);

        match &result.transport_error {
            Some(error) => tracing::warn!(
                service = %service,
                method = %method,
                url = %url,
                error = %error,
                "Downstream call failed"
            ),
            None => tracing::debug!(
                service = %service,
                method = %method,
                url = %url,
                status = %status_label,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Downstream call completed"
            ),
        }

        result
    }
}
