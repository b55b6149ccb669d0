//! Response translation.
//!
//! # Responsibilities
//! - Wrap every reply in the `{message, data}` envelope
//! - Map checkout and downstream failures to an HTTP status
//! - Tag failed checkouts with the stage that aborted them
//!
//! # Design Decisions
//! - Downstream 4xx/5xx are forwarded with the downstream body as `message`
//! - A downstream success code other than the one required becomes 502, so
//!   it is never mistaken for success
//! - Transport and decode failures are 500

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::checkout::{CheckoutError, PricingError};
use crate::downstream::DownstreamError;

/// Header naming the checkout stage that failed.
pub const X_CHECKOUT_STAGE: &str = "x-checkout-stage";

pub const SUCCESS_MESSAGE: &str = "Success";

/// JSON body of every gateway reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message: Value,
    pub data: Value,
}

/// Build an enveloped JSON response.
pub fn respond(status: StatusCode, message: impl Into<Value>, data: Option<Value>) -> Response {
    let envelope = Envelope {
        message: message.into(),
        data: data.unwrap_or(Value::Null),
    };
    (status, Json(envelope)).into_response()
}

/// Interpret a downstream body: JSON if it parses, else text, null if empty.
pub fn body_value(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// Status, message and data for a failed downstream call.
fn downstream_parts(error: &DownstreamError) -> (StatusCode, Value, Option<Value>) {
    match error {
        DownstreamError::Rejected { status, body, .. }
            if status.is_client_error() || status.is_server_error() =>
        {
            (*status, body_value(body), None)
        }
        DownstreamError::Rejected { service, status, body } => (
            StatusCode::BAD_GATEWAY,
            Value::String(format!("unexpected {status} from {service} service")),
            Some(body_value(body)),
        ),
        DownstreamError::Transport { .. }
        | DownstreamError::Decode { .. }
        | DownstreamError::Client(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Value::String(error.to_string()), None)
        }
    }
}

impl IntoResponse for DownstreamError {
    fn into_response(self) -> Response {
        let (status, message, data) = downstream_parts(&self);
        respond(status, message, data)
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let stage = self.stage();
        let mut response = match &self {
            CheckoutError::InvalidRequest(reason) => {
                respond(StatusCode::BAD_REQUEST, reason.as_str(), None)
            }
            CheckoutError::Pricing(PricingError::OutOfStock { product_id }) => respond(
                StatusCode::BAD_REQUEST,
                "Product out of stock",
                Some(json!({ "product_id": product_id })),
            ),
            CheckoutError::Pricing(PricingError::UnknownProduct { product_id }) => respond(
                StatusCode::BAD_REQUEST,
                "Product not found",
                Some(json!({ "product_id": product_id })),
            ),
            CheckoutError::Downstream { source, .. } => {
                let (status, message, data) = downstream_parts(source);
                respond(status, message, data)
            }
        };
        response
            .headers_mut()
            .insert(X_CHECKOUT_STAGE, HeaderValue::from_static(stage.as_str()));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::Stage;
    use crate::downstream::Service;
    use axum::body::{to_bytes, Bytes};

    async fn envelope(response: Response) -> Envelope {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn downstream(stage: Stage, source: DownstreamError) -> CheckoutError {
        CheckoutError::Downstream {
            stage,
            source,
            compensation: None,
        }
    }

    #[test]
    fn test_body_value() {
        assert_eq!(body_value(b""), Value::Null);
        assert_eq!(body_value(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(body_value(b"plain text"), json!("plain text"));
    }

    #[tokio::test]
    async fn test_out_of_stock_translation() {
        let response = CheckoutError::from(PricingError::OutOfStock {
            product_id: "p1".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[X_CHECKOUT_STAGE], "pricing");
        let body = envelope(response).await;
        assert_eq!(body.message, "Product out of stock");
        assert_eq!(body.data["product_id"], "p1");
    }

    #[tokio::test]
    async fn test_rejection_is_forwarded() {
        let response = downstream(
            Stage::CreateOrder,
            DownstreamError::Rejected {
                service: Service::Order,
                status: StatusCode::CONFLICT,
                body: Bytes::from_static(br#"{"error":"duplicate order number"}"#),
            },
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.headers()[X_CHECKOUT_STAGE], "create_order");
        let body = envelope(response).await;
        assert_eq!(body.message, json!({"error": "duplicate order number"}));
        assert_eq!(body.data, Value::Null);
    }

    #[tokio::test]
    async fn test_unexpected_success_is_bad_gateway() {
        let response = downstream(
            Stage::InitiatePayment,
            DownstreamError::Rejected {
                service: Service::Payment,
                status: StatusCode::OK,
                body: Bytes::from_static(b"{}"),
            },
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = envelope(response).await;
        assert_eq!(body.message, "unexpected 200 OK from payment service");
    }

    #[tokio::test]
    async fn test_transport_error_is_500() {
        let response = downstream(
            Stage::FetchProducts,
            DownstreamError::Transport {
                service: Service::Product,
                message: "connection refused".into(),
            },
        )
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[X_CHECKOUT_STAGE], "fetch_products");
    }
}
