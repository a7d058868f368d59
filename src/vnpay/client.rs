//! Merchant API client for the `querydr` and `refund` commands.
//!
//! These are server-to-server JSON calls signed with the `|`-joined field
//! digest, not the canonical query form. Downstream failures surface as
//! transient `ExternalServiceError`s; the caller decides whether to retry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::VnpayConfig;
use crate::errors::ServiceError;

use super::request::{format_gateway_date, offset_from_minutes, wire_amount};
use super::signature::sign_fields;
use super::{CMD_QUERY, CMD_REFUND, VERSION};

/// Transaction status query.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct QueryRequest {
    /// Transaction reference of the original payment
    pub order_id: String,
    /// Original transaction date, `YYYYMMDDHHmmss`
    pub trans_date: String,
}

/// Refund instruction. `trans_type` is `02` for a full refund, `03` partial.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RefundRequest {
    pub order_id: String,
    pub trans_date: String,
    /// Refund amount in VND
    pub amount: i64,
    pub trans_type: String,
    /// Operator who initiated the refund
    pub user: String,
    /// Gateway transaction number, defaults to "0" when unknown
    pub transaction_no: Option<String>,
}

/// Response envelope shared by querydr and refund.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GatewayApiResponse {
    #[serde(rename = "vnp_ResponseId", skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(rename = "vnp_Command", skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(rename = "vnp_ResponseCode", skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    #[serde(rename = "vnp_Message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "vnp_TmnCode", skip_serializing_if = "Option::is_none")]
    pub tmn_code: Option<String>,
    #[serde(rename = "vnp_TxnRef", skip_serializing_if = "Option::is_none")]
    pub txn_ref: Option<String>,
    #[serde(rename = "vnp_Amount", skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(rename = "vnp_OrderInfo", skip_serializing_if = "Option::is_none")]
    pub order_info: Option<String>,
    #[serde(rename = "vnp_BankCode", skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(rename = "vnp_PayDate", skip_serializing_if = "Option::is_none")]
    pub pay_date: Option<String>,
    #[serde(rename = "vnp_TransactionNo", skip_serializing_if = "Option::is_none")]
    pub transaction_no: Option<String>,
    #[serde(rename = "vnp_TransactionType", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(rename = "vnp_TransactionStatus", skip_serializing_if = "Option::is_none")]
    pub transaction_status: Option<String>,
    #[serde(rename = "vnp_PromotionCode", skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
    #[serde(rename = "vnp_PromotionAmount", skip_serializing_if = "Option::is_none")]
    pub promotion_amount: Option<String>,
}

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    cfg: VnpayConfig,
}

impl GatewayClient {
    pub fn new(cfg: VnpayConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;
        Ok(Self { http, cfg })
    }

    /// Query a transaction's status at the gateway.
    #[instrument(skip(self), fields(order_id = %req.order_id))]
    pub async fn query_transaction(
        &self,
        req: &QueryRequest,
        ip_addr: &str,
        now: DateTime<Utc>,
    ) -> Result<GatewayApiResponse, ServiceError> {
        let offset = offset_from_minutes(self.cfg.tz_offset_minutes);
        let create_date = format_gateway_date(now, offset);
        // HHmmss suffix of the create date, like the reference merchant code
        let request_id = create_date[8..].to_string();
        let order_info = format!("Truy van GD ma:{}", req.order_id);

        // Digest field order for querydr:
        // requestId|version|command|tmnCode|txnRef|transactionDate|createDate|ipAddr|orderInfo
        let secure_hash = sign_fields(
            &[
                &request_id,
                VERSION,
                CMD_QUERY,
                &self.cfg.tmn_code,
                &req.order_id,
                &req.trans_date,
                &create_date,
                ip_addr,
                &order_info,
            ],
            &self.cfg.hash_secret,
        );

        let body = serde_json::json!({
            "vnp_RequestId": request_id,
            "vnp_Version": VERSION,
            "vnp_Command": CMD_QUERY,
            "vnp_TmnCode": self.cfg.tmn_code,
            "vnp_TxnRef": req.order_id,
            "vnp_OrderInfo": order_info,
            "vnp_TransactionDate": req.trans_date,
            "vnp_CreateDate": create_date,
            "vnp_IpAddr": ip_addr,
            "vnp_SecureHash": secure_hash,
        });

        self.post(&body).await
    }

    /// Submit a refund for a settled transaction.
    #[instrument(skip(self), fields(order_id = %req.order_id, amount = req.amount))]
    pub async fn refund_transaction(
        &self,
        req: &RefundRequest,
        ip_addr: &str,
        now: DateTime<Utc>,
    ) -> Result<GatewayApiResponse, ServiceError> {
        let offset = offset_from_minutes(self.cfg.tz_offset_minutes);
        let create_date = format_gateway_date(now, offset);
        let request_id = create_date[8..].to_string();
        let order_info = format!("Hoan tien GD ma:{}", req.order_id);
        let amount = wire_amount(req.amount)?;
        let transaction_no = req.transaction_no.clone().unwrap_or_else(|| "0".into());

        // Digest field order for refund:
        // requestId|version|command|tmnCode|transactionType|txnRef|amount|
        // transactionNo|transactionDate|createBy|createDate|ipAddr|orderInfo
        let amount_str = amount.to_string();
        let secure_hash = sign_fields(
            &[
                &request_id,
                VERSION,
                CMD_REFUND,
                &self.cfg.tmn_code,
                &req.trans_type,
                &req.order_id,
                &amount_str,
                &transaction_no,
                &req.trans_date,
                &req.user,
                &create_date,
                ip_addr,
                &order_info,
            ],
            &self.cfg.hash_secret,
        );

        let body = serde_json::json!({
            "vnp_RequestId": request_id,
            "vnp_Version": VERSION,
            "vnp_Command": CMD_REFUND,
            "vnp_TmnCode": self.cfg.tmn_code,
            "vnp_TransactionType": req.trans_type,
            "vnp_TxnRef": req.order_id,
            "vnp_Amount": amount,
            "vnp_TransactionNo": transaction_no,
            "vnp_CreateBy": req.user,
            "vnp_OrderInfo": order_info,
            "vnp_TransactionDate": req.trans_date,
            "vnp_CreateDate": create_date,
            "vnp_IpAddr": ip_addr,
            "vnp_SecureHash": secure_hash,
        });

        self.post(&body).await
    }

    async fn post(&self, body: &serde_json::Value) -> Result<GatewayApiResponse, ServiceError> {
        let response = self
            .http
            .post(&self.cfg.api_url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("gateway API request failed: {}", e);
                ServiceError::ExternalServiceError(format!("gateway unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("gateway API returned status {}", status);
            return Err(ServiceError::ExternalServiceError(format!(
                "gateway returned status {}",
                status
            )));
        }

        let parsed: GatewayApiResponse = response.json().await.map_err(|e| {
            warn!("gateway API response was not valid JSON: {}", e);
            ServiceError::ExternalServiceError(format!("malformed gateway response: {}", e))
        })?;

        info!(
            response_code = parsed.response_code.as_deref().unwrap_or("-"),
            transaction_status = parsed.transaction_status.as_deref().unwrap_or("-"),
            "gateway API call completed"
        );
        Ok(parsed)
    }
}
