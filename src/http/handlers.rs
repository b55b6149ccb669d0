//! Route handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::checkout::{CheckoutBody, CheckoutRequest};
use crate::downstream::order::PaymentCallback;
use crate::http::identity::CallerIdentity;
use crate::http::request::request_id;
use crate::http::response::{body_value, respond, SUCCESS_MESSAGE};
use crate::http::server::AppState;

/// Status written to orders confirmed by the payment provider.
const PAID_STATUS: &str = "Payment";

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    pub limit: Option<u32>,
}

/// Payment provider notification.
#[derive(Debug, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub transaction_status: Option<String>,
}

/// `POST /order/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    headers: HeaderMap,
    query: Result<Query<CheckoutQuery>, QueryRejection>,
    body: Result<Json<CheckoutBody>, JsonRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return respond(StatusCode::BAD_REQUEST, rejection.body_text(), None);
        }
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return respond(StatusCode::BAD_REQUEST, rejection.body_text(), None);
        }
    };

    let request = CheckoutRequest::new(user_id, body, query.limit);
    let request_id = request_id(&headers).map(str::to_owned);
    let orchestrator = state.orchestrator.clone();

    // The attempt runs on its own task so a dropped connection or request
    // timeout cannot stop it between a committed step and its compensation.
    let attempt = tokio::spawn(async move {
        orchestrator
            .checkout(request, request_id.as_deref())
            .await
    });

    match attempt.await {
        Ok(Ok(receipt)) => respond(
            receipt.payment.status,
            SUCCESS_MESSAGE,
            Some(body_value(&receipt.payment.body)),
        ),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Checkout task failed");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "checkout task failed", None)
        }
    }
}

/// Replace the empty body of a request timeout with the standard envelope.
/// The checkout itself keeps running on its own task.
pub async fn envelope_timeout(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        respond(StatusCode::REQUEST_TIMEOUT, "Request timed out", None)
    } else {
        response
    }
}

/// `GET /order/status/{order_id}`
pub async fn order_status(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response {
    let clients = state.clients.with_request_id(request_id(&headers));
    match clients.order.order_status(user_id, &order_id).await {
        Ok(order) => respond(StatusCode::OK, SUCCESS_MESSAGE, Some(order)),
        Err(e) => {
            tracing::warn!(order_id = %order_id, error = %e, "Order status lookup failed");
            e.into_response()
        }
    }
}

/// `POST /order/callback`
pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<PaymentNotification>, JsonRejection>,
) -> Response {
    let Json(notification) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return respond(StatusCode::BAD_REQUEST, rejection.body_text(), None);
        }
    };

    if notification.status_message.contains("notification") {
        return respond(StatusCode::NOT_FOUND, "not a notification path", None);
    }

    tracing::info!(
        order_id = %notification.order_id,
        transaction_status = notification.transaction_status.as_deref().unwrap_or("-"),
        "Payment notification received"
    );

    let callback = PaymentCallback {
        order_id: notification.order_id,
        status: PAID_STATUS.to_string(),
        is_paid: true,
        updated_at: Utc::now(),
    };
    let clients = state.clients.with_request_id(request_id(&headers));
    match clients.order.payment_callback(&callback).await {
        Ok(reply) => respond(StatusCode::OK, SUCCESS_MESSAGE, Some(reply.into())),
        Err(e) => {
            tracing::warn!(order_id = %callback.order_id, error = %e, "Payment callback failed");
            e.into_response()
        }
    }
}

/// `GET /healthz`
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
