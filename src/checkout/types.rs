//! Checkout data model.
//!
//! Every value here lives for exactly one checkout attempt.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkout::CheckoutError;

/// One requested line item as sent by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LineItemRequest {
    pub product_id: String,
    #[serde(rename = "qty", alias = "quantity")]
    pub quantity: u32,
}

/// Bank selection for bank-transfer payments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BankTransfer {
    pub bank: String,
}

/// Checkout body accepted from the caller.
///
/// Unknown fields (including any caller-side prices) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutBody {
    #[serde(rename = "product_order", alias = "items", default)]
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub payment_type_id: Option<Uuid>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub ref_code: Option<String>,
    #[serde(default)]
    pub bank_transfer: Option<BankTransfer>,
}

/// A checkout attempt for an authenticated caller.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub items: Vec<LineItemRequest>,
    /// Page size hint for the product lookup.
    pub limit: Option<u32>,
    pub payment_type_id: Option<Uuid>,
    pub order_number: Option<String>,
    pub ref_code: Option<String>,
    pub bank_transfer: Option<BankTransfer>,
}

impl CheckoutRequest {
    pub fn new(user_id: Uuid, body: CheckoutBody, limit: Option<u32>) -> Self {
        Self {
            user_id,
            items: body.items,
            limit,
            payment_type_id: body.payment_type_id,
            order_number: body.order_number,
            ref_code: body.ref_code,
            bank_transfer: body.bank_transfer,
        }
    }

    /// Reject requests the workflow must never be entered for.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "product_order must contain at least one item".into(),
            ));
        }
        if self.limit == Some(0) {
            return Err(CheckoutError::InvalidRequest("limit must be positive".into()));
        }

        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.product_id.trim().is_empty() {
                return Err(CheckoutError::InvalidRequest("product_id must not be empty".into()));
            }
            if item.quantity == 0 {
                return Err(CheckoutError::InvalidRequest(format!(
                    "qty for product {} must be positive",
                    item.product_id
                )));
            }
            if !seen.insert(item.product_id.as_str()) {
                return Err(CheckoutError::InvalidRequest(format!(
                    "product {} appears more than once",
                    item.product_id
                )));
            }
        }
        Ok(())
    }

    /// Requested product ids in request order.
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.product_id.clone()).collect()
    }

    /// Effective product page size. Never smaller than the cart, so a low
    /// caller hint cannot truncate the lookup into a false "not found".
    pub fn effective_limit(&self) -> u32 {
        let needed = self.items.len() as u32;
        self.limit.map_or(needed, |limit| limit.max(needed))
    }
}

/// Authoritative price and availability for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub name: Option<String>,
    pub unit_price: f64,
    pub available_stock: i64,
}

/// A line item priced from its snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLineItem {
    pub product_id: String,
    #[serde(rename = "product_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "price")]
    pub unit_price: f64,
    #[serde(rename = "qty")]
    pub quantity: u32,
    #[serde(rename = "subtotal_price")]
    pub subtotal: f64,
    #[serde(skip)]
    pub available_stock: i64,
}

/// Priced cart: line items plus order total.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub items: Vec<PricedLineItem>,
    pub total: f64,
}

impl PricedCart {
    /// One stock decrement per priced line item.
    pub fn stock_adjustments(&self) -> Vec<StockAdjustment> {
        self.items
            .iter()
            .map(|item| StockAdjustment {
                product_id: item.product_id.clone(),
                new_stock: item.available_stock - i64::from(item.quantity),
            })
            .collect()
    }
}

/// Absolute stock value written back to the product service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: String,
    #[serde(rename = "stock")]
    pub new_stock: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<(&str, u32)>) -> CheckoutRequest {
        CheckoutRequest {
            user_id: Uuid::new_v4(),
            items: items
                .into_iter()
                .map(|(id, qty)| LineItemRequest {
                    product_id: id.to_string(),
                    quantity: qty,
                })
                .collect(),
            limit: None,
            payment_type_id: None,
            order_number: None,
            ref_code: None,
            bank_transfer: None,
        }
    }

    #[test]
    fn test_body_accepts_primary_and_alias_field_names() {
        let primary: CheckoutBody =
            serde_json::from_str(r#"{"product_order":[{"product_id":"p1","qty":2,"price":0.01}]}"#)
                .unwrap();
        let aliased: CheckoutBody =
            serde_json::from_str(r#"{"items":[{"product_id":"p1","quantity":2}]}"#).unwrap();

        assert_eq!(primary.items, aliased.items);
        assert_eq!(primary.items[0].quantity, 2);
    }

    #[test]
    fn test_validation_rejects_bad_carts() {
        assert!(request(vec![]).validate().is_err());
        assert!(request(vec![("p1", 0)]).validate().is_err());
        assert!(request(vec![("p1", 1), ("p1", 2)]).validate().is_err());
        assert!(request(vec![(" ", 1)]).validate().is_err());
        assert!(request(vec![("p1", 1), ("p2", 3)]).validate().is_ok());
    }

    #[test]
    fn test_effective_limit_defaults_to_cart_size() {
        let mut req = request(vec![("p1", 1), ("p2", 1), ("p3", 1)]);
        assert_eq!(req.effective_limit(), 3);
        req.limit = Some(50);
        assert_eq!(req.effective_limit(), 50);
    }

    #[test]
    fn test_effective_limit_never_truncates_cart() {
        let mut req = request(vec![("p1", 1), ("p2", 1), ("p3", 1)]);
        req.limit = Some(1);
        assert_eq!(req.effective_limit(), 3);
        req.limit = Some(3);
        assert_eq!(req.effective_limit(), 3);
    }

    #[test]
    fn test_priced_item_wire_shape() {
        let item = PricedLineItem {
            product_id: "p1".into(),
            name: None,
            unit_price: 10.0,
            quantity: 2,
            subtotal: 20.0,
            available_stock: 5,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"product_id":"p1","price":10.0,"qty":2,"subtotal_price":20.0})
        );
    }
}
