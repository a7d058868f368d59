//! VNPay payment gateway protocol: canonical parameter encoding, HMAC-SHA512
//! request signing, callback verification, payment-URL construction and the
//! merchant API (querydr/refund) client.
//!
//! The gateway contract is byte-exact: any deviation in encoding or key order
//! invalidates every signature, so all signing and verification in this crate
//! goes through the single canonicalization in [`canonical`].

pub mod canonical;
pub mod client;
pub mod codes;
pub mod request;
pub mod signature;

/// Protocol version sent as `vnp_Version`
pub const VERSION: &str = "2.1.0";

/// Currency code sent as `vnp_CurrCode`
pub const CURR_CODE: &str = "VND";

/// Commands accepted by the gateway
pub const CMD_PAY: &str = "pay";
pub const CMD_QUERY: &str = "querydr";
pub const CMD_REFUND: &str = "refund";

/// Parameter names shared between the pay URL, the return redirect and the IPN
pub const P_SECURE_HASH: &str = "vnp_SecureHash";
pub const P_SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
pub const P_TXN_REF: &str = "vnp_TxnRef";
pub const P_AMOUNT: &str = "vnp_Amount";
pub const P_RESPONSE_CODE: &str = "vnp_ResponseCode";
pub const P_TRANSACTION_NO: &str = "vnp_TransactionNo";
pub const P_BANK_CODE: &str = "vnp_BankCode";
pub const P_PAY_DATE: &str = "vnp_PayDate";
