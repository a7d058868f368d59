use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tram Han Payments API",
        version = "0.2.0",
        description = r#"
# Tram Han Payments API

Payment gateway integration for the Tram Han storefront.

## Gateways

- **VNPay**: hosted payment page redirect, browser return verification,
  IPN settlement, and the merchant querydr/refund API
- **MoMo**: wallet IPN verification
- **ZaloPay**: callback verification

## Amounts

All request amounts are Vietnamese dong (VND). The VNPay wire format
carries amounts multiplied by 100; that conversion happens inside the
service and never appears in this API.

## IPN semantics

The VNPay IPN endpoint always answers HTTP 200. The `RspCode` field in
the body tells the gateway whether delivery succeeded (`00`) or why it
was rejected (`01` order not found, `02` already updated, `04` amount
invalid, `97` checksum failed, `99` unknown error).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "VNPay", description = "VNPay payment endpoints"),
        (name = "MoMo", description = "MoMo wallet endpoints"),
        (name = "ZaloPay", description = "ZaloPay endpoints")
    ),
    paths(
        crate::handlers::vnpay::create_payment,
        crate::handlers::vnpay::payment_return,
        crate::handlers::vnpay::payment_ipn,
        crate::handlers::vnpay::query_transaction,
        crate::handlers::vnpay::refund_transaction,
        crate::handlers::momo::payment_ipn,
        crate::handlers::zalopay::payment_callback,
    ),
    components(
        schemas(
            crate::services::payments::CreatePaymentCommand,
            crate::services::payments::CreatedPayment,
            crate::services::orders::OrderRecord,
            crate::services::orders::PaymentState,
            crate::vnpay::codes::IpnAck,
            crate::vnpay::codes::IpnCode,
            crate::vnpay::client::QueryRequest,
            crate::vnpay::client::RefundRequest,
            crate::vnpay::client::GatewayApiResponse,
            crate::gateways::momo::MomoIpn,
            crate::gateways::zalopay::ZalopayCallback,
            crate::gateways::zalopay::ZalopayAck,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
