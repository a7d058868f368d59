//! ZaloPay order signing and callback verification.
//!
//! ZaloPay computes HMAC-SHA256 over a `|`-joined field tuple: outbound
//! create-order requests are keyed with `key1`, inbound callbacks with
//! `key2`. Field order is positional, not named.

use serde::{Deserialize, Serialize};

use crate::config::ZalopayConfig;
use crate::crypto::constant_time_eq;

use super::momo::hmac_sha256_hex;

/// Callback payload posted by ZaloPay after a payment attempt.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ZalopayCallback {
    pub app_id: String,
    pub app_trans_id: String,
    #[serde(default)]
    pub pmcid: String,
    #[serde(default)]
    pub bank_code: String,
    pub amount: i64,
    #[serde(default)]
    pub discount_amount: i64,
    pub status: i64,
    pub mac: String,
}

/// Acknowledgment body the gateway expects from the callback endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ZalopayAck {
    pub return_code: i64,
    pub return_message: String,
}

impl ZalopayAck {
    pub fn success() -> Self {
        Self {
            return_code: 1,
            return_message: "success".into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            return_code: 0,
            return_message: message.into(),
        }
    }
}

/// Mac for an outbound create-order request (key1).
pub fn order_mac(
    cfg: &ZalopayConfig,
    app_trans_id: &str,
    app_user: &str,
    amount: i64,
    app_time: i64,
    embed_data: &str,
    item: &str,
) -> String {
    let data = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        cfg.app_id, app_trans_id, app_user, amount, app_time, embed_data, item
    );
    hmac_sha256_hex(&data, &cfg.key1)
}

/// Verify an inbound callback mac (key2).
pub fn verify_callback(cfg: &ZalopayConfig, cb: &ZalopayCallback) -> bool {
    let data = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        cb.app_id, cb.app_trans_id, cb.pmcid, cb.bank_code, cb.amount, cb.discount_amount, cb.status
    );
    let expected = hmac_sha256_hex(&data, &cfg.key2);
    constant_time_eq(&expected, &cb.mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg() -> ZalopayConfig {
        ZalopayConfig {
            app_id: "2553".into(),
            key1: "key-one".into(),
            key2: "key-two".into(),
            endpoint: "https://sb-openapi.zalopay.vn/v2/create".into(),
        }
    }

    fn signed_callback() -> ZalopayCallback {
        let cfg = test_cfg();
        let mut cb = ZalopayCallback {
            app_id: cfg.app_id.clone(),
            app_trans_id: "250601_170001".into(),
            pmcid: "38".into(),
            bank_code: "".into(),
            amount: 250_000,
            discount_amount: 0,
            status: 1,
            mac: String::new(),
        };
        let data = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            cb.app_id,
            cb.app_trans_id,
            cb.pmcid,
            cb.bank_code,
            cb.amount,
            cb.discount_amount,
            cb.status
        );
        cb.mac = hmac_sha256_hex(&data, &cfg.key2);
        cb
    }

    #[test]
    fn valid_callback_mac_verifies() {
        assert!(verify_callback(&test_cfg(), &signed_callback()));
    }

    #[test]
    fn callback_mac_uses_key2_not_key1() {
        let cfg = test_cfg();
        let mut cb = signed_callback();
        let data = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            cb.app_id,
            cb.app_trans_id,
            cb.pmcid,
            cb.bank_code,
            cb.amount,
            cb.discount_amount,
            cb.status
        );
        cb.mac = hmac_sha256_hex(&data, &cfg.key1);
        assert!(!verify_callback(&cfg, &cb));
    }

    #[test]
    fn tampered_status_fails_verification() {
        let mut cb = signed_callback();
        cb.status = 2;
        assert!(!verify_callback(&test_cfg(), &cb));
    }

    #[test]
    fn near_miss_and_truncated_macs_fail_verification() {
        let mut cb = signed_callback();
        let last = if cb.mac.ends_with('0') { '1' } else { '0' };
        cb.mac.pop();
        cb.mac.push(last);
        assert!(!verify_callback(&test_cfg(), &cb));

        let mut cb = signed_callback();
        cb.mac.pop();
        assert!(!verify_callback(&test_cfg(), &cb));
    }

    #[test]
    fn order_mac_is_deterministic() {
        let cfg = test_cfg();
        let a = order_mac(&cfg, "t", "u", 1, 2, "e", "i");
        let b = order_mac(&cfg, "t", "u", 1, 2, "e", "i");
        assert_eq!(a, b);
        assert_eq!(a, hmac_sha256_hex("2553|t|u|1|2|e|i", &cfg.key1));
    }
}
