//! Shared digest-comparison helper.

/// Compare two hex digests without short-circuiting on the first differing
/// byte. Length is not secret; only the content comparison needs to be
/// constant-time.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
