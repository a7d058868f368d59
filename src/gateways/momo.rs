//! MoMo wallet signing and IPN verification.
//!
//! MoMo signs an `&`-joined `key=value` raw string over a fixed,
//! alphabetical field list with HMAC-SHA256. Create requests and IPN
//! callbacks use different field lists but the same digest.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::MomoConfig;
use crate::crypto::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 digest.
pub fn hmac_sha256_hex(data: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// IPN payload delivered by MoMo after a payment attempt.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MomoIpn {
    pub partner_code: String,
    pub order_id: String,
    pub request_id: String,
    pub amount: i64,
    pub order_info: String,
    pub order_type: String,
    pub trans_id: i64,
    pub result_code: i64,
    pub message: String,
    pub pay_type: String,
    pub response_time: i64,
    pub extra_data: String,
    pub signature: String,
}

/// Raw string for signing an outbound create-payment request.
pub fn create_raw_data(cfg: &MomoConfig, request_id: &str, order_id: &str, order_info: &str, amount: i64, extra_data: &str) -> String {
    [
        format!("accessKey={}", cfg.access_key),
        format!("amount={}", amount),
        format!("extraData={}", extra_data),
        format!("ipnUrl={}", cfg.ipn_url),
        format!("orderId={}", order_id),
        format!("orderInfo={}", order_info),
        format!("partnerCode={}", cfg.partner_code),
        format!("redirectUrl={}", cfg.redirect_url),
        format!("requestId={}", request_id),
        format!("requestType={}", cfg.request_type),
    ]
    .join("&")
}

/// Verify an IPN signature. The raw string covers MoMo's documented IPN
/// field list; `accessKey` comes from our own configuration, not the
/// payload, so a caller cannot choose the key material.
pub fn verify_ipn(cfg: &MomoConfig, ipn: &MomoIpn) -> bool {
    let raw = [
        format!("accessKey={}", cfg.access_key),
        format!("amount={}", ipn.amount),
        format!("extraData={}", ipn.extra_data),
        format!("message={}", ipn.message),
        format!("orderId={}", ipn.order_id),
        format!("orderInfo={}", ipn.order_info),
        format!("orderType={}", ipn.order_type),
        format!("partnerCode={}", ipn.partner_code),
        format!("payType={}", ipn.pay_type),
        format!("requestId={}", ipn.request_id),
        format!("responseTime={}", ipn.response_time),
        format!("resultCode={}", ipn.result_code),
        format!("transId={}", ipn.trans_id),
    ]
    .join("&");

    let expected = hmac_sha256_hex(&raw, &cfg.secret_key);
    constant_time_eq(&expected, &ipn.signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg() -> MomoConfig {
        MomoConfig {
            partner_code: "PARTNER".into(),
            access_key: "ACCESS".into(),
            secret_key: "SECRET".into(),
            endpoint: "https://test-payment.momo.vn/v2/gateway/api/create".into(),
            redirect_url: "https://shop.example.com/checkout/momo-return".into(),
            ipn_url: "https://shop.example.com/api/v1/payments/momo/ipn".into(),
            request_type: "payWithATM".into(),
        }
    }

    fn signed_ipn() -> MomoIpn {
        let cfg = test_cfg();
        let mut ipn = MomoIpn {
            partner_code: cfg.partner_code.clone(),
            order_id: "ORD-1".into(),
            request_id: "ORD-1_1717230000".into(),
            amount: 150_000,
            order_info: "Thanh toan don hang ORD-1".into(),
            order_type: "momo_wallet".into(),
            trans_id: 4_001_002_003,
            result_code: 0,
            message: "Successful.".into(),
            pay_type: "qr".into(),
            response_time: 1_717_230_001,
            extra_data: "e30=".into(),
            signature: String::new(),
        };
        let raw = [
            format!("accessKey={}", cfg.access_key),
            format!("amount={}", ipn.amount),
            format!("extraData={}", ipn.extra_data),
            format!("message={}", ipn.message),
            format!("orderId={}", ipn.order_id),
            format!("orderInfo={}", ipn.order_info),
            format!("orderType={}", ipn.order_type),
            format!("partnerCode={}", ipn.partner_code),
            format!("payType={}", ipn.pay_type),
            format!("requestId={}", ipn.request_id),
            format!("responseTime={}", ipn.response_time),
            format!("resultCode={}", ipn.result_code),
            format!("transId={}", ipn.trans_id),
        ]
        .join("&");
        ipn.signature = hmac_sha256_hex(&raw, &cfg.secret_key);
        ipn
    }

    #[test]
    fn valid_ipn_signature_verifies() {
        assert!(verify_ipn(&test_cfg(), &signed_ipn()));
    }

    #[test]
    fn tampered_amount_fails_verification() {
        let mut ipn = signed_ipn();
        ipn.amount += 1;
        assert!(!verify_ipn(&test_cfg(), &ipn));
    }

    #[test]
    fn create_raw_data_field_order_is_fixed() {
        let raw = create_raw_data(&test_cfg(), "req-1", "ORD-1", "info", 1000, "e30=");
        assert!(raw.starts_with("accessKey=ACCESS&amount=1000&extraData=e30=&ipnUrl="));
        assert!(raw.ends_with("requestId=req-1&requestType=payWithATM"));
    }
}
