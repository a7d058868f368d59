//! Additional regional gateways. Each carries its own signing scheme; none of
//! them share the VNPay canonicalization.

pub mod momo;
pub mod zalopay;
