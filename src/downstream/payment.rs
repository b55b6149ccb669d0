//! Payment service client.

use axum::body::Bytes;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkout::types::{BankTransfer, PricedLineItem};
use crate::downstream::client::DownstreamClient;
use crate::downstream::DownstreamResult;

pub const PAYMENTS_PATH: &str = "/payments";

/// `Authorization` value for the payment provider: the server key as the
/// basic-auth user with an empty password.
pub fn basic_auth_header(server_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{server_key}:")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: f64,
}

/// Body of `POST /payments`.
///
/// Only constructible once the order id is known.
#[derive(Debug, Serialize)]
pub struct PaymentIntent<'a> {
    pub basic_auth_header: String,
    pub payment_type: &'a str,
    pub transaction_details: TransactionDetails,
    pub bank_transfer: BankTransfer,
    pub user_id: Uuid,
    pub total_price: f64,
    pub product_order: &'a [PricedLineItem],
}

/// Virtual account issued for a bank transfer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaNumber {
    #[serde(default)]
    pub bank: String,
    #[serde(default)]
    pub va_number: String,
}

/// Payment confirmation fields the gateway logs. The caller receives the
/// raw body, not this projection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentConfirmation {
    pub status_code: String,
    pub status_message: String,
    pub transaction_id: String,
    pub order_id: String,
    pub transaction_status: String,
    pub va_numbers: Vec<VaNumber>,
}

/// Successful payment call: status and raw body as received.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub status: StatusCode,
    pub body: Bytes,
}

impl PaymentReceipt {
    /// Lenient projection for logging; `None` if the body is not an object.
    pub fn confirmation(&self) -> Option<PaymentConfirmation> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Clone)]
pub struct PaymentClient {
    inner: DownstreamClient,
}

impl PaymentClient {
    pub fn new(inner: DownstreamClient) -> Self {
        Self { inner }
    }

    pub fn with_request_id(&self, request_id: &str) -> Self {
        Self {
            inner: self.inner.with_request_id(request_id),
        }
    }

    /// Initiate a payment; the service answers 201 on success.
    pub async fn create_payment(&self, intent: &PaymentIntent<'_>) -> DownstreamResult<PaymentReceipt> {
        let body = self
            .inner
            .call(Method::POST, self.inner.url(PAYMENTS_PATH), &[], Some(intent))
            .await
            .expect_status(self.inner.service(), StatusCode::CREATED)?;
        Ok(PaymentReceipt {
            status: StatusCode::CREATED,
            body,
        })
    }
}
