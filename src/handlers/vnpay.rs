//! VNPay endpoints: payment creation, browser return, IPN, and the
//! merchant API passthroughs.

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Json,
};
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::services::payments::{CreatePaymentCommand, CreatedPayment};
use crate::vnpay::canonical::parse_query;
use crate::vnpay::client::{GatewayApiResponse, QueryRequest, RefundRequest};
use crate::vnpay::codes::{IpnAck, IpnCode};
use crate::AppState;

// POST /api/v1/payments/vnpay
#[utoipa::path(
    post,
    path = "/api/v1/payments/vnpay",
    request_body = CreatePaymentCommand,
    responses(
        (status = 201, description = "Payment URL created", body = CreatedPayment),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already registered with a different amount", body = crate::errors::ErrorResponse)
    ),
    tag = "VNPay"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(cmd): Json<CreatePaymentCommand>,
) -> Result<impl IntoResponse, ServiceError> {
    let ip = super::client_ip(&headers);
    let created = state.payments.create_payment(cmd, &ip).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/v1/payments/vnpay/return
//
// The browser lands here after the hosted payment page. Verification is
// display-only; the customer is sent on to the storefront result page with
// the verified outcome in the query string.
#[utoipa::path(
    get,
    path = "/api/v1/payments/vnpay/return",
    responses(
        (status = 303, description = "Redirect to the storefront result page")
    ),
    tag = "VNPay"
)]
pub async fn payment_return(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Redirect {
    let params = parse_query(query.as_deref().unwrap_or(""));
    let verdict = state.payments.verify_return(&params);
    info!(
        txn_ref = %verdict.txn_ref,
        response_code = %verdict.response_code,
        "payment return processed"
    );

    let target = match url::Url::parse(&state.payments.config().result_url) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("vnp_ResponseCode", &verdict.response_code)
                .append_pair("vnp_TxnRef", &verdict.txn_ref)
                .append_pair("vnp_Amount", &verdict.amount)
                .append_pair("vnp_TransactionNo", &verdict.transaction_no)
                .append_pair("vnp_BankCode", &verdict.bank_code);
            url.to_string()
        }
        Err(e) => {
            // result_url is validated at startup; reaching this means the
            // config was edited at runtime
            warn!("result_url is not a valid URL: {}", e);
            format!(
                "{}?vnp_ResponseCode=99",
                state.payments.config().result_url
            )
        }
    };

    Redirect::to(&target)
}

// GET /api/v1/payments/vnpay/ipn
//
// Server-to-server notification. The transport answer is always HTTP 200;
// RspCode in the body tells the gateway whether to stop retrying.
#[utoipa::path(
    get,
    path = "/api/v1/payments/vnpay/ipn",
    responses(
        (status = 200, description = "Acknowledgment", body = IpnAck)
    ),
    tag = "VNPay"
)]
pub async fn payment_ipn(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<IpnAck>) {
    let params = parse_query(query.as_deref().unwrap_or(""));
    let code = state.payments.process_ipn(&params).await;
    if code != IpnCode::Success {
        info!(rsp_code = code.as_str(), "IPN rejected");
    }
    (StatusCode::OK, Json(IpnAck::from(code)))
}

// POST /api/v1/payments/vnpay/query
#[utoipa::path(
    post,
    path = "/api/v1/payments/vnpay/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Gateway querydr response", body = GatewayApiResponse),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "VNPay"
)]
pub async fn query_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<QueryRequest>,
) -> Result<Json<GatewayApiResponse>, ServiceError> {
    if req.order_id.is_empty() || req.trans_date.is_empty() {
        return Err(ServiceError::BadRequest(
            "order_id and trans_date are required".into(),
        ));
    }
    let ip = super::client_ip(&headers);
    let response = state.payments.query_transaction(&req, &ip).await?;
    Ok(Json(response))
}

// POST /api/v1/payments/vnpay/refund
#[utoipa::path(
    post,
    path = "/api/v1/payments/vnpay/refund",
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Gateway refund response", body = GatewayApiResponse),
        (status = 400, description = "Invalid refund request", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "VNPay"
)]
pub async fn refund_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RefundRequest>,
) -> Result<Json<GatewayApiResponse>, ServiceError> {
    if req.order_id.is_empty() || req.trans_date.is_empty() || req.user.is_empty() {
        return Err(ServiceError::BadRequest(
            "order_id, trans_date and user are required".into(),
        ));
    }
    let ip = super::client_ip(&headers);
    let response = state.payments.refund_transaction(&req, &ip).await?;
    Ok(Json(response))
}
