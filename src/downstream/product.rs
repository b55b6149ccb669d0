//! Product service client.

use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::checkout::types::{ProductSnapshot, StockAdjustment};
use crate::downstream::client::{decode, DownstreamClient, NO_BODY};
use crate::downstream::DownstreamResult;

pub const PRODUCTS_PATH: &str = "/products";
pub const PRODUCT_STOCKS_PATH: &str = "/product-stocks";

/// `GET /products` response envelope.
#[derive(Debug, Deserialize)]
pub struct ProductListResponse {
    pub data: ProductPage,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductPage {
    /// The product service encodes an empty page as `null`.
    #[serde(default)]
    pub items: Option<Vec<ProductRecord>>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    pub stock: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub total_data: u64,
    pub total_page: u64,
    pub page: u64,
    pub limit: u64,
}

impl From<ProductRecord> for ProductSnapshot {
    fn from(record: ProductRecord) -> Self {
        Self {
            product_id: record.id,
            name: record.name,
            unit_price: record.price,
            available_stock: record.stock,
        }
    }
}

#[derive(Clone)]
pub struct ProductClient {
    inner: DownstreamClient,
}

impl ProductClient {
    pub fn new(inner: DownstreamClient) -> Self {
        Self { inner }
    }

    pub fn with_request_id(&self, request_id: &str) -> Self {
        Self {
            inner: self.inner.with_request_id(request_id),
        }
    }

    /// Read price and stock for `product_ids` in one request.
    pub async fn fetch_products(
        &self,
        product_ids: &[String],
        limit: u32,
    ) -> DownstreamResult<Vec<ProductSnapshot>> {
        let query = [
            ("product_ids", product_ids.join(",")),
            ("limit", limit.to_string()),
        ];
        let body = self
            .inner
            .call(Method::GET, self.inner.url(PRODUCTS_PATH), &query, NO_BODY)
            .await
            .expect_status(self.inner.service(), StatusCode::OK)?;

        let response: ProductListResponse = decode(self.inner.service(), &body)?;
        Ok(response
            .data
            .items
            .unwrap_or_default()
            .into_iter()
            .map(ProductSnapshot::from)
            .collect())
    }

    /// Write absolute stock values for a batch of products.
    pub async fn update_stocks(&self, adjustments: &[StockAdjustment]) -> DownstreamResult<()> {
        self.inner
            .call(
                Method::PATCH,
                self.inner.url(PRODUCT_STOCKS_PATH),
                &[],
                Some(adjustments),
            )
            .await
            .expect_status(self.inner.service(), StatusCode::OK)?;
        Ok(())
    }
}
