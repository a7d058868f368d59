//! Canonical parameter encoding.
//!
//! The gateway signs the query form of the sorted parameter set, with every
//! key and value escaped the way JavaScript's `encodeURIComponent` escapes
//! them and spaces in values rendered as `+`. Keys are ordered by their
//! escaped form. The secure-hash fields are never part of the signing input.

use std::collections::BTreeMap;

/// Flat string-keyed parameter set. Iteration order is the raw-key order;
/// canonicalization re-sorts by escaped key before joining.
pub type ParamMap = BTreeMap<String, String>;

/// Characters `encodeURIComponent` leaves unescaped.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

/// Percent-encode a string with `encodeURIComponent` semantics.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Encode a parameter value: component encoding with space mapped to `+`.
pub fn encode_value(input: &str) -> String {
    encode_component(input).replace("%20", "+")
}

/// Build the canonical `key=value&key=value` string the gateway signs.
///
/// Keys are escaped and sorted lexicographically by their escaped form;
/// values are escaped with `%20` mapped to `+`. An empty map yields an
/// empty string.
pub fn canonical_query(params: &ParamMap) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode_component(k), encode_value(v)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out
}

/// Decode one percent-encoded component, with `+` treated as space.
pub fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                if let (Some(hi), Some(lo)) = (
                    bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                    bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
                ) {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a query string back into a parameter map.
///
/// Inverse of [`canonical_query`] modulo ordering: parsing a signed URL's
/// query recovers the original map plus the signature field.
pub fn parse_query(query: &str) -> ParamMap {
    let mut params = ParamMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        params.insert(decode_component(k), decode_component(v));
    }
    params
}
