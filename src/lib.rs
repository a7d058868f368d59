//! Tram Han Payments API Library
//!
//! Payment gateway integration service for the Tram Han storefront: VNPay
//! payment URLs, return/IPN verification, querydr/refund passthrough, plus
//! MoMo and ZaloPay callback verification.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod crypto;
pub mod errors;
pub mod gateways;
pub mod handlers;
pub mod openapi;
pub mod services;
pub mod vnpay;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use services::orders::{InMemoryOrderStore, OrderStore};
use services::payments::PaymentService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub orders: Arc<dyn OrderStore>,
    pub payments: Arc<PaymentService>,
}

impl AppState {
    /// Wire up the default state: in-memory order store plus a payment
    /// service bound to the configured VNPay terminal.
    pub fn new(config: config::AppConfig) -> Result<Self, errors::ServiceError> {
        let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
        let payments = Arc::new(PaymentService::new(config.vnpay.clone(), orders.clone())?);
        Ok(Self {
            config: Arc::new(config),
            orders,
            payments,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    let vnpay = Router::new()
        .route("/", post(handlers::vnpay::create_payment))
        .route("/return", get(handlers::vnpay::payment_return))
        .route("/ipn", get(handlers::vnpay::payment_ipn))
        .route("/query", post(handlers::vnpay::query_transaction))
        .route("/refund", post(handlers::vnpay::refund_transaction));

    let momo = Router::new().route("/ipn", post(handlers::momo::payment_ipn));

    let zalopay = Router::new().route("/callback", post(handlers::zalopay::payment_callback));

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Gateway APIs
        .nest("/payments/vnpay", vnpay)
        .nest("/payments/momo", momo)
        .nest("/payments/zalopay", zalopay)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "tramhan-payments-api",
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    // The order store is in-process, so the only degradable pieces are the
    // optional gateway configurations.
    let health_data = json!({
        "status": "healthy",
        "checks": {
            "vnpay": "configured",
            "momo": if state.config.momo.is_some() { "configured" } else { "disabled" },
            "zalopay": if state.config.zalopay.is_some() { "configured" } else { "disabled" },
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

// Request logging middleware
pub async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    tracing::info!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        elapsed_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
