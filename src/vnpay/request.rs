//! Payment URL construction (`pay` command).

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::config::VnpayConfig;
use crate::errors::ServiceError;

use super::canonical::{canonical_query, ParamMap};
use super::signature::sign_params;
use super::{CMD_PAY, CURR_CODE, P_SECURE_HASH, VERSION};

/// Format a timestamp as the gateway's `YYYYMMDDHHmmss`, shifted into the
/// given offset. The offset is an explicit parameter; nothing here touches
/// process-wide timezone state.
pub fn format_gateway_date(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string()
}

/// Offset from a minutes-east value, clamped to the valid chrono range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(7 * 3600).expect("+07:00 is a valid offset"))
}

/// Inputs for one payment URL.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Order amount in VND (the wire carries this value x 100)
    pub amount: i64,
    /// Transaction reference, also the order id
    pub txn_ref: String,
    /// Order description shown on the gateway page
    pub order_info: String,
    /// Customer IP address as seen by us
    pub ip_addr: String,
    /// Display locale override ("vn"/"en")
    pub locale: Option<String>,
    /// Preselected bank code, skipped when empty
    pub bank_code: Option<String>,
}

/// Wire representation of a VND amount: the gateway carries VND x 100.
/// Amounts large enough to overflow an `i64` on the wire are invalid input,
/// not a panic.
pub fn wire_amount(amount_vnd: i64) -> Result<i64, ServiceError> {
    amount_vnd
        .checked_mul(100)
        .ok_or_else(|| ServiceError::ValidationError("amount out of range".into()))
}

/// Build the signed redirect URL for the hosted payment page.
///
/// Assembles the `vnp_*` parameter set, canonicalizes, signs, and appends
/// `vnp_SecureHash`. `now` is injected so tests get reproducible URLs.
pub fn build_payment_url(
    cfg: &VnpayConfig,
    req: &PaymentRequest,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let amount = wire_amount(req.amount)?;
    let offset = offset_from_minutes(cfg.tz_offset_minutes);
    let create_date = format_gateway_date(now, offset);
    let expire_date = format_gateway_date(now + Duration::minutes(cfg.expire_minutes), offset);

    let mut params = ParamMap::new();
    params.insert("vnp_Version".into(), VERSION.into());
    params.insert("vnp_Command".into(), CMD_PAY.into());
    params.insert("vnp_TmnCode".into(), cfg.tmn_code.clone());
    params.insert(
        "vnp_Locale".into(),
        req.locale
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| cfg.locale.clone()),
    );
    params.insert("vnp_CurrCode".into(), CURR_CODE.into());
    params.insert("vnp_TxnRef".into(), req.txn_ref.clone());
    params.insert("vnp_OrderInfo".into(), req.order_info.clone());
    params.insert("vnp_OrderType".into(), "other".into());
    params.insert("vnp_Amount".into(), amount.to_string());
    params.insert("vnp_ReturnUrl".into(), cfg.return_url.clone());
    params.insert("vnp_IpAddr".into(), req.ip_addr.clone());
    params.insert("vnp_CreateDate".into(), create_date);
    params.insert("vnp_ExpireDate".into(), expire_date);

    if let Some(bank) = req.bank_code.as_deref().filter(|b| !b.is_empty()) {
        params.insert("vnp_BankCode".into(), bank.to_string());
    }

    let signature = sign_params(&params, &cfg.hash_secret);
    let query = canonical_query(&params);

    Ok(format!(
        "{}?{}&{}={}",
        cfg.pay_url, query, P_SECURE_HASH, signature
    ))
}
