//! End-to-end IPN and return handling through the HTTP router.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{query_string, signed_ipn_params, TestApp};
use tramhan_payments_api::services::orders::PaymentState;

async fn register(app: &TestApp, txn_ref: &str, amount: i64) {
    app.state
        .orders
        .register(txn_ref, amount)
        .await
        .expect("register order");
}

#[tokio::test]
async fn successful_ipn_marks_order_paid() {
    let app = TestApp::new();
    register(&app, "ORD-100", 250_000).await;

    let query = query_string(&signed_ipn_params("ORD-100", 250_000, "00"));
    let (status, body) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["RspCode"], "00");

    let order = app.state.orders.find("ORD-100").await.unwrap().unwrap();
    assert_eq!(order.state, PaymentState::Paid);
    assert_eq!(order.bank_code.as_deref(), Some("NCB"));
}

#[tokio::test]
async fn failed_payment_ipn_is_acknowledged_and_marks_order_failed() {
    let app = TestApp::new();
    register(&app, "ORD-101", 250_000).await;

    // rsp 24 = customer cancelled; the delivery is still acknowledged 00
    let query = query_string(&signed_ipn_params("ORD-101", 250_000, "24"));
    let (status, body) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["RspCode"], "00");

    let order = app.state.orders.find("ORD-101").await.unwrap().unwrap();
    assert_eq!(order.state, PaymentState::Failed);
}

#[tokio::test]
async fn ipn_for_unknown_order_answers_01() {
    let app = TestApp::new();
    let query = query_string(&signed_ipn_params("NOPE", 250_000, "00"));
    let (status, body) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["RspCode"], "01");
}

#[tokio::test]
async fn duplicate_ipn_answers_02() {
    let app = TestApp::new();
    register(&app, "ORD-102", 250_000).await;

    let query = query_string(&signed_ipn_params("ORD-102", 250_000, "00"));
    let (_, first) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query))
        .await;
    assert_eq!(first["RspCode"], "00");

    let (status, second) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["RspCode"], "02");
}

#[tokio::test]
async fn ipn_with_wrong_amount_answers_04() {
    let app = TestApp::new();
    register(&app, "ORD-103", 250_000).await;

    // Correctly signed, but for an amount the order never had
    let query = query_string(&signed_ipn_params("ORD-103", 99_000, "00"));
    let (status, body) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["RspCode"], "04");

    let order = app.state.orders.find("ORD-103").await.unwrap().unwrap();
    assert_eq!(order.state, PaymentState::Pending);
}

#[tokio::test]
async fn ipn_with_tampered_signature_answers_97() {
    let app = TestApp::new();
    register(&app, "ORD-104", 250_000).await;

    let mut params = signed_ipn_params("ORD-104", 250_000, "00");
    params.insert("vnp_SecureHash".into(), "f".repeat(128));
    let (status, body) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query_string(&params)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["RspCode"], "97");
}

#[tokio::test]
async fn ipn_with_missing_params_answers_99() {
    let app = TestApp::new();
    let (status, body) = app
        .get("/api/v1/payments/vnpay/ipn?vnp_TxnRef=ORD-1")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["RspCode"], "99");
}

#[tokio::test]
async fn return_redirects_to_result_page_with_verified_outcome() {
    let app = TestApp::new();
    let query = query_string(&signed_ipn_params("ORD-105", 250_000, "00"));

    let request = axum::http::Request::builder()
        .uri(format!("/api/v1/payments/vnpay/return?{}", query))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send_raw(request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("http://localhost:3000/payment/vnpay/result"));
    assert!(location.contains("vnp_ResponseCode=00"));
    assert!(location.contains("vnp_TxnRef=ORD-105"));
}

#[tokio::test]
async fn tampered_return_redirects_with_code_97() {
    let app = TestApp::new();
    let mut params = signed_ipn_params("ORD-106", 250_000, "00");
    params.insert("vnp_Amount".into(), "1".into());

    let request = axum::http::Request::builder()
        .uri(format!(
            "/api/v1/payments/vnpay/return?{}",
            query_string(&params)
        ))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send_raw(request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.contains("vnp_ResponseCode=97"));
}

#[tokio::test]
async fn create_payment_returns_signed_url() {
    let app = TestApp::new();
    let (status, body) = app
        .post_json(
            "/api/v1/payments/vnpay",
            json!({ "amount": 250000, "order_id": "ORD-200" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order_id"], "ORD-200");
    let url = body["payment_url"].as_str().expect("payment_url");
    assert!(url.starts_with("https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?"));
    assert!(url.contains("vnp_SecureHash="));
    assert!(url.contains("vnp_Amount=25000000"));

    let order = app.state.orders.find("ORD-200").await.unwrap().unwrap();
    assert_eq!(order.state, PaymentState::Pending);
}

#[tokio::test]
async fn create_payment_rejects_zero_amount() {
    let app = TestApp::new();
    let (status, _) = app
        .post_json("/api/v1/payments/vnpay", json!({ "amount": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_checkout_flow_create_then_ipn() {
    let app = TestApp::new();

    let (_, created) = app
        .post_json(
            "/api/v1/payments/vnpay",
            json!({ "amount": 480000, "order_id": "ORD-201", "bank_code": "NCB" }),
        )
        .await;
    assert_eq!(created["order_id"], "ORD-201");

    let query = query_string(&signed_ipn_params("ORD-201", 480_000, "00"));
    let (_, ack) = app
        .get(&format!("/api/v1/payments/vnpay/ipn?{}", query))
        .await;
    assert_eq!(ack["RspCode"], "00");

    let order = app.state.orders.find("ORD-201").await.unwrap().unwrap();
    assert_eq!(order.state, PaymentState::Paid);
    assert_eq!(order.amount, 480_000);
}
