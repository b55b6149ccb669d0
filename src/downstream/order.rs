//! Order service client.

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkout::types::PricedLineItem;
use crate::downstream::client::{decode, DownstreamClient, NO_BODY};
use crate::downstream::DownstreamResult;

pub const CREATE_ORDER_PATH: &str = "/order/create";
pub const ORDER_CALLBACK_PATH: &str = "/order/callback";
pub const ORDER_STATUS_PATH: &str = "/order/status";
pub const ORDER_STATUS_UPDATE_PATH: &str = "/order/status/update";

/// Status written when a checkout unwinds a created order.
pub const CANCELLED_STATUS: &str = "Cancelled";

/// Body of `POST /order/create`.
#[derive(Debug, Serialize)]
pub struct CreateOrderPayload<'a> {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<&'a str>,
    pub total_price: f64,
    pub product_order: &'a [PricedLineItem],
    pub status: &'a str,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_code: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Body of `PUT /order/status/update`.
#[derive(Debug, Serialize)]
struct StatusUpdate<'a> {
    user_id: Uuid,
    order_id: &'a str,
    status: &'a str,
}

/// Body of `POST /order/callback`, sent when the payment provider confirms
/// a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub order_id: String,
    pub status: String,
    pub is_paid: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OrderClient {
    inner: DownstreamClient,
}

impl OrderClient {
    pub fn new(inner: DownstreamClient) -> Self {
        Self { inner }
    }

    pub fn with_request_id(&self, request_id: &str) -> Self {
        Self {
            inner: self.inner.with_request_id(request_id),
        }
    }

    /// Create an order; the service answers 201 with the bare order id.
    pub async fn create_order(&self, payload: &CreateOrderPayload<'_>) -> DownstreamResult<String> {
        let body = self
            .inner
            .call(Method::POST, self.inner.url(CREATE_ORDER_PATH), &[], Some(payload))
            .await
            .expect_status(self.inner.service(), StatusCode::CREATED)?;
        decode(self.inner.service(), &body)
    }

    /// Mark an order cancelled.
    pub async fn cancel_order(&self, user_id: Uuid, order_id: &str) -> DownstreamResult<()> {
        let update = StatusUpdate {
            user_id,
            order_id,
            status: CANCELLED_STATUS,
        };
        self.inner
            .call(
                Method::PUT,
                self.inner.url(ORDER_STATUS_UPDATE_PATH),
                &[],
                Some(&update),
            )
            .await
            .expect_status(self.inner.service(), StatusCode::OK)?;
        Ok(())
    }

    /// Relay a payment confirmation; the service answers with a bare string.
    pub async fn payment_callback(&self, callback: &PaymentCallback) -> DownstreamResult<String> {
        let body = self
            .inner
            .call(Method::POST, self.inner.url(ORDER_CALLBACK_PATH), &[], Some(callback))
            .await
            .expect_status(self.inner.service(), StatusCode::OK)?;
        decode(self.inner.service(), &body)
    }

    /// Fetch an order (and its payment state) owned by `user_id`.
    pub async fn order_status(
        &self,
        user_id: Uuid,
        order_id: &str,
    ) -> DownstreamResult<serde_json::Value> {
        let url = self.inner.url(&format!("{}/{}", ORDER_STATUS_PATH, user_id));
        let body = self
            .inner
            .call(Method::GET, url, &[("order_id", order_id.to_string())], NO_BODY)
            .await
            .expect_status(self.inner.service(), StatusCode::OK)?;
        decode(self.inner.service(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_payload_shape() {
        let items = [PricedLineItem {
            product_id: "p1".into(),
            name: Some("Kopi".into()),
            unit_price: 10.0,
            quantity: 2,
            subtotal: 20.0,
            available_stock: 5,
        }];
        let user_id = Uuid::new_v4();
        let payload = CreateOrderPayload {
            user_id,
            payment_type_id: None,
            order_number: Some("INV-1"),
            total_price: 20.0,
            product_order: &items,
            status: "Pending",
            is_paid: false,
            ref_code: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["user_id"], user_id.to_string());
        assert_eq!(json["total_price"], 20.0);
        assert_eq!(json["order_number"], "INV-1");
        assert_eq!(json["product_order"][0]["product_name"], "Kopi");
        assert_eq!(json["product_order"][0]["subtotal_price"], 20.0);
        assert!(json.get("payment_type_id").is_none());
        assert!(json["product_order"][0].get("available_stock").is_none());
    }
}
