//! MoMo wallet IPN endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::gateways::momo::{verify_ipn, MomoIpn};
use crate::AppState;

// POST /api/v1/payments/momo/ipn
#[utoipa::path(
    post,
    path = "/api/v1/payments/momo/ipn",
    request_body = MomoIpn,
    responses(
        (status = 200, description = "Callback verified"),
        (status = 400, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 500, description = "Gateway not configured", body = crate::errors::ErrorResponse)
    ),
    tag = "MoMo"
)]
pub async fn payment_ipn(
    State(state): State<AppState>,
    Json(ipn): Json<MomoIpn>,
) -> Result<impl IntoResponse, ServiceError> {
    let cfg = state
        .config
        .momo
        .as_ref()
        .ok_or_else(|| ServiceError::ConfigurationError("MoMo gateway not configured".into()))?;

    if !verify_ipn(cfg, &ipn) {
        warn!(order_id = %ipn.order_id, "MoMo IPN signature verification failed");
        return Err(ServiceError::BadRequest("invalid signature".into()));
    }

    if ipn.result_code == 0 {
        info!(order_id = %ipn.order_id, trans_id = ipn.trans_id, "MoMo payment succeeded");
        Ok((StatusCode::OK, Json(json!({ "message": "OK" }))))
    } else {
        info!(
            order_id = %ipn.order_id,
            result_code = ipn.result_code,
            "MoMo payment failed"
        );
        Ok((StatusCode::OK, Json(json!({ "message": "Payment failed" }))))
    }
}
