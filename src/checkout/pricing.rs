//! Pricing calculator.
//!
//! Joins requested line items against product snapshots. Prices come only
//! from the snapshots; whatever the caller claimed a product costs is never
//! read. Cart sizes are small, so the join is a plain nested scan and the
//! first snapshot with a matching id wins.

use thiserror::Error;

use crate::checkout::types::{LineItemRequest, PricedCart, PricedLineItem, ProductSnapshot};

/// Reasons a cart cannot be priced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("product {product_id} is out of stock")]
    OutOfStock { product_id: String },

    #[error("product {product_id} was not returned by the product service")]
    UnknownProduct { product_id: String },
}

/// Price `items` against `snapshots`.
///
/// Fails on the first item without a snapshot or with insufficient stock;
/// no partial cart is ever returned.
pub fn price(
    items: &[LineItemRequest],
    snapshots: &[ProductSnapshot],
) -> Result<PricedCart, PricingError> {
    let mut priced = Vec::with_capacity(items.len());

    for item in items {
        let snapshot = snapshots
            .iter()
            .find(|s| s.product_id == item.product_id)
            .ok_or_else(|| PricingError::UnknownProduct {
                product_id: item.product_id.clone(),
            })?;

        if snapshot.available_stock < i64::from(item.quantity) {
            return Err(PricingError::OutOfStock {
                product_id: item.product_id.clone(),
            });
        }

        priced.push(PricedLineItem {
            product_id: item.product_id.clone(),
            name: snapshot.name.clone(),
            unit_price: snapshot.unit_price,
            quantity: item.quantity,
            subtotal: snapshot.unit_price * f64::from(item.quantity),
            available_stock: snapshot.available_stock,
        });
    }

    let total = priced.iter().map(|item| item.subtotal).sum();
    Ok(PricedCart {
        items: priced,
        total,
    })
}
