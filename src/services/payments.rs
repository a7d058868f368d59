//! Payment orchestration: URL creation, return verification, IPN settlement,
//! and the merchant API passthroughs.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::config::VnpayConfig;
use crate::errors::ServiceError;
use crate::vnpay::canonical::ParamMap;
use crate::vnpay::client::{GatewayApiResponse, GatewayClient, QueryRequest, RefundRequest};
use crate::vnpay::codes::IpnCode;
use crate::vnpay::request::{
    build_payment_url, format_gateway_date, offset_from_minutes, wire_amount, PaymentRequest,
};
use crate::vnpay::signature::verify_params;
use crate::vnpay::{P_AMOUNT, P_BANK_CODE, P_PAY_DATE, P_RESPONSE_CODE, P_SECURE_HASH, P_TRANSACTION_NO, P_TXN_REF};

use super::orders::{ApplyOutcome, OrderStore, PaymentState, PaymentUpdate};

/// Checkout request from the storefront.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentCommand {
    /// Order amount in VND
    #[validate(range(min = 1))]
    pub amount: i64,
    /// Optional explicit order id; generated from the clock when absent
    pub order_id: Option<String>,
    /// Optional description override
    pub order_info: Option<String>,
    /// Preselected bank code
    pub bank_code: Option<String>,
    /// "vn" or "en"
    pub language: Option<String>,
}

/// Created payment: the storefront redirects the customer to `payment_url`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedPayment {
    pub order_id: String,
    pub payment_url: String,
}

/// Verified browser-return parameters, flattened for the result redirect.
#[derive(Debug, Clone)]
pub struct ReturnVerdict {
    /// Gateway response code, or "97" when the signature did not verify
    pub response_code: String,
    pub txn_ref: String,
    pub amount: String,
    pub transaction_no: String,
    pub bank_code: String,
}

/// One storefront's payment surface, bound to a single gateway terminal.
#[derive(Clone)]
pub struct PaymentService {
    cfg: VnpayConfig,
    store: Arc<dyn OrderStore>,
    client: GatewayClient,
}

impl PaymentService {
    pub fn new(cfg: VnpayConfig, store: Arc<dyn OrderStore>) -> Result<Self, ServiceError> {
        let client = GatewayClient::new(cfg.clone())?;
        Ok(Self { cfg, store, client })
    }

    pub fn config(&self) -> &VnpayConfig {
        &self.cfg
    }

    /// Register a pending order and build its signed payment URL.
    #[instrument(skip(self, cmd), fields(amount = cmd.amount))]
    pub async fn create_payment(
        &self,
        cmd: CreatePaymentCommand,
        ip_addr: &str,
    ) -> Result<CreatedPayment, ServiceError> {
        cmd.validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        // Reject amounts the wire format cannot carry before the order is
        // registered, so an invalid request leaves no pending order behind.
        wire_amount(cmd.amount)?;

        let now = Utc::now();
        let order_id = match cmd.order_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            // DDHHmmss in the gateway's timezone, like the sample merchant
            None => {
                let offset = offset_from_minutes(self.cfg.tz_offset_minutes);
                format_gateway_date(now, offset)[6..].to_string()
            }
        };

        self.store.register(&order_id, cmd.amount).await?;

        let req = PaymentRequest {
            amount: cmd.amount,
            txn_ref: order_id.clone(),
            order_info: cmd
                .order_info
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| format!("Thanh toan don hang {}", order_id)),
            ip_addr: ip_addr.to_string(),
            locale: cmd.language,
            bank_code: cmd.bank_code,
        };
        let payment_url = build_payment_url(&self.cfg, &req, now)?;

        info!(order_id = %order_id, "payment URL created");
        Ok(CreatedPayment {
            order_id,
            payment_url,
        })
    }

    /// Verify the browser return. Display-only: order state changes ride the
    /// IPN channel, never this one.
    pub fn verify_return(&self, params: &ParamMap) -> ReturnVerdict {
        let get = |key: &str| params.get(key).cloned().unwrap_or_default();

        let verified = params
            .get(P_SECURE_HASH)
            .map(|supplied| verify_params(params, supplied, &self.cfg.hash_secret))
            .unwrap_or(false);

        let response_code = if verified {
            get(P_RESPONSE_CODE)
        } else {
            warn!(txn_ref = %get(P_TXN_REF), "return signature verification failed");
            "97".to_string()
        };

        ReturnVerdict {
            response_code,
            txn_ref: get(P_TXN_REF),
            amount: get(P_AMOUNT),
            transaction_no: get(P_TRANSACTION_NO),
            bank_code: get(P_BANK_CODE),
        }
    }

    /// Settle an order from a gateway IPN call.
    ///
    /// This never errors: every outcome maps to an acknowledgement code the
    /// gateway understands, and the HTTP layer always answers 200.
    ///
    /// Check order: required params, order lookup, duplicate, signature,
    /// amount. Duplicates are acknowledged before signature verification so
    /// replays of an already-settled order never read as checksum failures,
    /// but no state transition happens without a valid signature.
    #[instrument(skip(self, params))]
    pub async fn process_ipn(&self, params: &ParamMap) -> IpnCode {
        let supplied_hash = match params.get(P_SECURE_HASH) {
            Some(h) => h.clone(),
            None => return IpnCode::UnknownError,
        };
        let (txn_ref, rsp_code, amount_param) = match (
            params.get(P_TXN_REF),
            params.get(P_RESPONSE_CODE),
            params.get(P_AMOUNT),
        ) {
            (Some(t), Some(r), Some(a)) => (t.clone(), r.clone(), a.clone()),
            _ => return IpnCode::UnknownError,
        };

        let order = match self.store.find(&txn_ref).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!(txn_ref = %txn_ref, "IPN for unknown order");
                return IpnCode::OrderNotFound;
            }
            Err(e) => {
                warn!(txn_ref = %txn_ref, error = %e, "order lookup failed during IPN");
                return IpnCode::UnknownError;
            }
        };

        if order.state != PaymentState::Pending {
            info!(txn_ref = %txn_ref, state = ?order.state, "duplicate IPN acknowledged");
            return IpnCode::AlreadyUpdated;
        }

        if !verify_params(params, &supplied_hash, &self.cfg.hash_secret) {
            warn!(txn_ref = %txn_ref, "IPN signature verification failed");
            return IpnCode::ChecksumFailed;
        }

        match (amount_param.parse::<i64>(), wire_amount(order.amount)) {
            (Ok(got), Ok(expected)) if got == expected => {}
            _ => {
                warn!(txn_ref = %txn_ref, amount = %amount_param, "IPN amount mismatch");
                return IpnCode::AmountInvalid;
            }
        }

        let update = PaymentUpdate {
            success: rsp_code == "00",
            transaction_no: params.get(P_TRANSACTION_NO).cloned(),
            bank_code: params.get(P_BANK_CODE).cloned(),
            pay_date: params.get(P_PAY_DATE).cloned(),
            response_code: rsp_code,
        };

        match self.store.apply_payment(&txn_ref, update).await {
            Ok(ApplyOutcome::Applied(state)) => {
                info!(txn_ref = %txn_ref, state = ?state, "order settled from IPN");
                IpnCode::Success
            }
            // Lost a race with a concurrent duplicate delivery
            Ok(ApplyOutcome::AlreadyProcessed(_)) => IpnCode::AlreadyUpdated,
            Err(e) => {
                warn!(txn_ref = %txn_ref, error = %e, "order settlement failed");
                IpnCode::UnknownError
            }
        }
    }

    pub async fn query_transaction(
        &self,
        req: &QueryRequest,
        ip_addr: &str,
    ) -> Result<GatewayApiResponse, ServiceError> {
        self.client.query_transaction(req, ip_addr, Utc::now()).await
    }

    pub async fn refund_transaction(
        &self,
        req: &RefundRequest,
        ip_addr: &str,
    ) -> Result<GatewayApiResponse, ServiceError> {
        if req.amount <= 0 {
            return Err(ServiceError::InvalidInput(
                "refund amount must be positive".into(),
            ));
        }
        self.client.refund_transaction(req, ip_addr, Utc::now()).await
    }
}
