//! Shared utilities for integration testing.
//!
//! One axum server plays the Product, Order and Payment services, with
//! shared stock, a call log and switches for injecting failures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use checkout_gateway::config::GatewayConfig;
use checkout_gateway::{HttpServer, Shutdown};

/// Closed port used to simulate an unreachable service.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

#[derive(Debug, Clone)]
pub struct MockProduct {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

/// Status overrides per downstream operation. `None` means behave normally.
#[derive(Debug, Default, Clone)]
pub struct Failures {
    pub fetch_products: Option<u16>,
    pub update_stocks: Option<u16>,
    pub create_order: Option<u16>,
    pub create_payment: Option<u16>,
    pub cancel_order: Option<u16>,
}

#[derive(Default)]
pub struct MockState {
    pub products: Mutex<HashMap<String, MockProduct>>,
    pub orders: Mutex<HashMap<String, Value>>,
    pub calls: Mutex<Vec<String>>,
    pub payments: Mutex<Vec<Value>>,
    pub request_ids: Mutex<Vec<String>>,
    /// `limit` query values received by the product lookup.
    pub limits: Mutex<Vec<String>>,
    pub failures: Mutex<Failures>,
    /// Artificial latency for product reads, in milliseconds.
    pub product_delay_ms: AtomicUsize,
    inflight_reads: AtomicUsize,
    pub max_inflight_reads: AtomicUsize,
    next_order: AtomicUsize,
}

impl MockState {
    pub fn add_product(&self, id: &str, price: f64, stock: i64) {
        self.products.lock().unwrap().insert(
            id.to_string(),
            MockProduct {
                name: format!("Product {id}"),
                price,
                stock,
            },
        );
    }

    pub fn stock(&self, id: &str) -> i64 {
        self.products.lock().unwrap()[id].stock
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn limits(&self) -> Vec<String> {
        self.limits.lock().unwrap().clone()
    }

    pub fn order(&self, id: &str) -> Option<Value> {
        self.orders.lock().unwrap().get(id).cloned()
    }

    pub fn set_failures(&self, failures: Failures) {
        *self.failures.lock().unwrap() = failures;
    }

    fn failure(&self, pick: impl Fn(&Failures) -> Option<u16>) -> Option<StatusCode> {
        pick(&self.failures.lock().unwrap()).and_then(|code| StatusCode::from_u16(code).ok())
    }

    fn log(&self, call: &str, headers: &HeaderMap) {
        self.calls.lock().unwrap().push(call.to_string());
        if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
            self.request_ids.lock().unwrap().push(id.to_string());
        }
    }
}

type Shared = Arc<MockState>;

fn failure_response(status: StatusCode) -> Response {
    (status, Json(json!({ "message": "injected failure" }))).into_response()
}

async fn get_products(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.log("GET /products", &headers);

    let now = state.inflight_reads.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_inflight_reads.fetch_max(now, Ordering::SeqCst);
    let delay = state.product_delay_ms.load(Ordering::SeqCst) as u64;
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    state.inflight_reads.fetch_sub(1, Ordering::SeqCst);

    if let Some(status) = state.failure(|f| f.fetch_products) {
        return failure_response(status);
    }

    let ids = query.get("product_ids").cloned().unwrap_or_default();
    let limit = query.get("limit").cloned().unwrap_or_default();
    state.limits.lock().unwrap().push(limit.clone());
    let page_size = limit.parse::<usize>().unwrap_or(usize::MAX);

    let products = state.products.lock().unwrap();
    let items: Vec<Value> = ids
        .split(',')
        .take(page_size)
        .filter_map(|id| {
            products.get(id).map(|p| {
                json!({
                    "id": id,
                    "name": p.name,
                    "price": p.price,
                    "stock": p.stock,
                    "category_id": "c1",
                    "shop_id": "s1"
                })
            })
        })
        .collect();
    let total = items.len();

    Json(json!({
        "data": {
            "items": if items.is_empty() { Value::Null } else { Value::Array(items) },
            "meta": { "total_data": total, "total_page": 1, "page": 1, "limit": total }
        },
        "message": "Success"
    }))
    .into_response()
}

async fn update_stocks(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Vec<Value>>,
) -> Response {
    state.log("PATCH /product-stocks", &headers);
    if let Some(status) = state.failure(|f| f.update_stocks) {
        return failure_response(status);
    }

    let mut products = state.products.lock().unwrap();
    for entry in body {
        let id = entry["product_id"].as_str().unwrap_or_default();
        if let (Some(product), Some(stock)) = (products.get_mut(id), entry["stock"].as_i64()) {
            product.stock = stock;
        }
    }
    (StatusCode::OK, Json(json!({ "message": "Success" }))).into_response()
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.log("POST /order/create", &headers);
    if let Some(status) = state.failure(|f| f.create_order) {
        return failure_response(status);
    }

    let id = format!("order-{}", state.next_order.fetch_add(1, Ordering::SeqCst) + 1);
    body["id"] = json!(id);
    state.orders.lock().unwrap().insert(id.clone(), body);
    (StatusCode::CREATED, Json(json!(id))).into_response()
}

async fn update_order_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.log("PUT /order/status/update", &headers);
    if let Some(status) = state.failure(|f| f.cancel_order) {
        return failure_response(status);
    }

    let id = body["order_id"].as_str().unwrap_or_default().to_string();
    match state.orders.lock().unwrap().get_mut(&id) {
        Some(order) => {
            order["status"] = body["status"].clone();
            (StatusCode::OK, Json(json!(id))).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "order not found" }))).into_response(),
    }
}

async fn order_callback(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.log("POST /order/callback", &headers);

    let id = body["order_id"].as_str().unwrap_or_default().to_string();
    match state.orders.lock().unwrap().get_mut(&id) {
        Some(order) => {
            order["status"] = body["status"].clone();
            order["is_paid"] = body["is_paid"].clone();
            (StatusCode::OK, Json(json!("callback accepted"))).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "order not found" }))).into_response(),
    }
}

async fn order_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.log("GET /order/status", &headers);

    let id = query.get("order_id").cloned().unwrap_or_default();
    match state.orders.lock().unwrap().get(&id) {
        Some(order) if order["user_id"] == json!(user_id) => (StatusCode::OK, Json(order.clone())).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "order not found" }))).into_response(),
    }
}

async fn create_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.log("POST /payments", &headers);
    state.payments.lock().unwrap().push(body.clone());
    if let Some(status) = state.failure(|f| f.create_payment) {
        return failure_response(status);
    }

    let order_id = body["transaction_details"]["order_id"].clone();
    (
        StatusCode::CREATED,
        Json(json!({
            "status_code": "201",
            "status_message": "Success, Bank Transfer transaction is created",
            "transaction_id": format!("tx-{}", order_id.as_str().unwrap_or_default()),
            "order_id": order_id,
            "gross_amount": body["transaction_details"]["gross_amount"],
            "transaction_status": "pending",
            "va_numbers": [{ "bank": body["bank_transfer"]["bank"], "va_number": "8808123456" }]
        })),
    )
        .into_response()
}

/// Start the mock commerce backend on an ephemeral port.
pub async fn start_commerce_mock() -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(MockState::default());
    let app = Router::new()
        .route("/api/products", get(get_products))
        .route("/api/product-stocks", patch(update_stocks))
        .route("/api/payments", post(create_payment))
        .route("/order/create", post(create_order))
        .route("/order/status/update", put(update_order_status))
        .route("/order/status/{user_id}", get(order_status))
        .route("/order/callback", post(order_callback))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

/// Gateway config pointing every service at the mock.
pub fn gateway_config(mock: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.services.product_url = format!("http://{mock}/api");
    config.services.order_url = format!("http://{mock}");
    config.services.payment_url = format!("http://{mock}/api");
    config.payment.server_key = "SB-Mid-server-test".to_string();
    config.timeouts.connect_secs = 1;
    config.timeouts.downstream_secs = 5;
    config.timeouts.request_secs = 10;
    config.observability.metrics_enabled = false;
    config
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });
    (format!("http://{addr}"), shutdown)
}

/// Mock backend plus a gateway wired to it.
pub async fn start_stack(
    configure: impl FnOnce(&mut GatewayConfig),
) -> (String, Shared, Shutdown) {
    let (mock, state) = start_commerce_mock().await;
    let mut config = gateway_config(mock);
    configure(&mut config);
    let (gateway, shutdown) = start_gateway(config).await;
    (gateway, state, shutdown)
}

/// POST a checkout for `user_id` with `items` as `(product_id, qty)`.
pub async fn checkout(
    client: &reqwest::Client,
    gateway: &str,
    user_id: &str,
    items: &[(&str, u32)],
) -> reqwest::Response {
    let product_order: Vec<Value> = items
        .iter()
        .map(|(id, qty)| json!({ "product_id": id, "qty": qty }))
        .collect();
    client
        .post(format!("{gateway}/order/checkout"))
        .header("x-user-id", user_id)
        .json(&json!({ "product_order": product_order }))
        .send()
        .await
        .unwrap()
}
