//! HTTP handlers, one module per gateway.

use axum::http::HeaderMap;

pub mod momo;
pub mod vnpay;
pub mod zalopay;

/// Client address as the gateway should see it. Behind the usual reverse
/// proxy setup the socket address is the proxy's, so the forwarding headers
/// take precedence.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .unwrap_or("127.0.0.1")
        .to_string()
}
