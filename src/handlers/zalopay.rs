//! ZaloPay callback endpoint.
//!
//! ZaloPay keeps retrying on `return_code` 0 and stops on 1 or any negative
//! value, so like the VNPay IPN the transport status is always 200.

use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

use crate::gateways::zalopay::{verify_callback, ZalopayAck, ZalopayCallback};
use crate::AppState;

// POST /api/v1/payments/zalopay/callback
#[utoipa::path(
    post,
    path = "/api/v1/payments/zalopay/callback",
    request_body = ZalopayCallback,
    responses(
        (status = 200, description = "Acknowledgment", body = ZalopayAck)
    ),
    tag = "ZaloPay"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(cb): Json<ZalopayCallback>,
) -> (StatusCode, Json<ZalopayAck>) {
    let Some(cfg) = state.config.zalopay.as_ref() else {
        warn!("ZaloPay callback received but gateway is not configured");
        return (
            StatusCode::OK,
            Json(ZalopayAck::failure("gateway not configured")),
        );
    };

    if !verify_callback(cfg, &cb) {
        warn!(app_trans_id = %cb.app_trans_id, "ZaloPay callback mac verification failed");
        return (StatusCode::OK, Json(ZalopayAck::failure("mac not equal")));
    }

    info!(
        app_trans_id = %cb.app_trans_id,
        amount = cb.amount,
        status = cb.status,
        "ZaloPay callback verified"
    );
    (StatusCode::OK, Json(ZalopayAck::success()))
}
