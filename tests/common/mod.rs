#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tramhan_payments_api::config::{AppConfig, MomoConfig, VnpayConfig, ZalopayConfig};
use tramhan_payments_api::vnpay::canonical::{canonical_query, ParamMap};
use tramhan_payments_api::vnpay::signature::sign_params;
use tramhan_payments_api::{api_v1_routes, AppState};

pub const TEST_SECRET: &str = "TESTSECRETTESTSECRETTESTSECRET12";
pub const TEST_TMN: &str = "TESTTMN1";

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 18_080,
        environment: "test".into(),
        log_level: "info".into(),
        log_json: false,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        vnpay: VnpayConfig {
            tmn_code: TEST_TMN.into(),
            hash_secret: TEST_SECRET.into(),
            pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".into(),
            api_url: "https://sandbox.vnpayment.vn/merchant_webapi/api/transaction".into(),
            return_url: "http://localhost:18080/api/v1/payments/vnpay/return".into(),
            result_url: "http://localhost:3000/payment/vnpay/result".into(),
            locale: "vn".into(),
            tz_offset_minutes: 420,
            expire_minutes: 15,
        },
        momo: Some(MomoConfig {
            partner_code: "MOMOTEST".into(),
            access_key: "test-access".into(),
            secret_key: "test-momo-secret".into(),
            endpoint: "https://test-payment.momo.vn/v2/gateway/api/create".into(),
            redirect_url: "http://localhost:3000/payment/momo/result".into(),
            ipn_url: "http://localhost:18080/api/v1/payments/momo/ipn".into(),
            request_type: "payWithATM".into(),
        }),
        zalopay: Some(ZalopayConfig {
            app_id: "2553".into(),
            key1: "zalo-key-one".into(),
            key2: "zalo-key-two".into(),
            endpoint: "https://sb-openapi.zalopay.vn/v2/create".into(),
        }),
    }
}

/// Router plus state for driving endpoints with `oneshot`.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(cfg: AppConfig) -> Self {
        let state = AppState::new(cfg).expect("test app state");
        let router = Router::new()
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());
        Self { router, state }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    pub async fn send_raw(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.expect("response")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send_raw(request).await;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

/// Signed IPN parameter set as the gateway would deliver it.
pub fn signed_ipn_params(txn_ref: &str, amount_vnd: i64, rsp_code: &str) -> ParamMap {
    let mut params = ParamMap::new();
    params.insert("vnp_TmnCode".into(), TEST_TMN.into());
    params.insert("vnp_TxnRef".into(), txn_ref.to_string());
    params.insert("vnp_Amount".into(), (amount_vnd * 100).to_string());
    params.insert("vnp_ResponseCode".into(), rsp_code.to_string());
    params.insert("vnp_TransactionStatus".into(), rsp_code.to_string());
    params.insert("vnp_TransactionNo".into(), "14225082".into());
    params.insert("vnp_BankCode".into(), "NCB".into());
    params.insert("vnp_PayDate".into(), "20250601103000".into());
    params.insert("vnp_OrderInfo".into(), format!("Thanh toan don hang {}", txn_ref));
    let hash = sign_params(&params, TEST_SECRET);
    params.insert("vnp_SecureHash".into(), hash);
    params
}

/// Query string form of a parameter map, encoded the way the gateway encodes
/// its redirects.
pub fn query_string(params: &ParamMap) -> String {
    canonical_query(params)
}
