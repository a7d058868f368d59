//! Request signing and callback verification.
//!
//! Two digest forms exist in the protocol: the canonical query form (pay URL,
//! return redirect, IPN) and the `|`-joined field list used by the merchant
//! API commands (querydr, refund). Both are HMAC-SHA512 over UTF-8 bytes with
//! a lowercase hex digest.

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::crypto::constant_time_eq;

use super::canonical::{canonical_query, ParamMap};
use super::{P_SECURE_HASH, P_SECURE_HASH_TYPE};

type HmacSha512 = Hmac<Sha512>;

/// Lowercase hex HMAC-SHA512 digest of `data`.
pub fn hmac_sha512_hex(data: &str, secret: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Sign a parameter set: canonicalize, then digest.
/// The map must not contain the secure-hash fields.
pub fn sign_params(params: &ParamMap, secret: &str) -> String {
    hmac_sha512_hex(&canonical_query(params), secret)
}

/// Digest for the merchant API commands: fields joined with `|` in the
/// gateway-documented order for the command.
pub fn sign_fields(fields: &[&str], secret: &str) -> String {
    hmac_sha512_hex(&fields.join("|"), secret)
}

/// Verify an inbound callback's signature.
///
/// The secure-hash fields are stripped from a copy of the parameter set
/// before the signature is recomputed, and the comparison is constant-time.
/// Mismatch is an authentication failure, not an error.
pub fn verify_params(params: &ParamMap, supplied: &str, secret: &str) -> bool {
    let mut signed: ParamMap = params.clone();
    signed.remove(P_SECURE_HASH);
    signed.remove(P_SECURE_HASH_TYPE);

    let expected = sign_params(&signed, secret);
    constant_time_eq(&expected, &supplied.to_ascii_lowercase())
}
