//! Gateway response vocabularies.
//!
//! The IPN acknowledgment codes are contractual: the gateway retries delivery
//! until it receives one of them in a well-formed body, so the mapper must
//! always produce a value from this set.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed acknowledgment vocabulary for the IPN endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum IpnCode {
    /// `00` - callback accepted, order state recorded
    Success,
    /// `01` - transaction reference does not match any order
    OrderNotFound,
    /// `02` - order already moved out of pending
    AlreadyUpdated,
    /// `04` - callback amount does not match the recorded order amount
    AmountInvalid,
    /// `97` - signature verification failed
    ChecksumFailed,
    /// `99` - missing parameters or any unexpected failure
    UnknownError,
}

impl IpnCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "00",
            Self::OrderNotFound => "01",
            Self::AlreadyUpdated => "02",
            Self::AmountInvalid => "04",
            Self::ChecksumFailed => "97",
            Self::UnknownError => "99",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::OrderNotFound => "Order not found",
            Self::AlreadyUpdated => "This order has been updated to the payment status",
            Self::AmountInvalid => "Amount invalid",
            Self::ChecksumFailed => "Checksum failed",
            Self::UnknownError => "Unknown error",
        }
    }
}

/// Wire shape of the IPN acknowledgment. Always delivered with HTTP 200;
/// `RspCode`, not the transport status, carries the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IpnAck {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl From<IpnCode> for IpnAck {
    fn from(code: IpnCode) -> Self {
        Self {
            rsp_code: code.as_str().to_string(),
            message: code.message().to_string(),
        }
    }
}

/// Customer-facing description of a `vnp_ResponseCode` value.
pub fn response_message(code: &str) -> &'static str {
    match code {
        "00" => "Giao dịch thành công",
        "07" => "Trừ tiền thành công. Giao dịch bị nghi ngờ (liên quan tới lừa đảo, giao dịch bất thường).",
        "09" => "Giao dịch không thành công do: Thẻ/Tài khoản của khách hàng chưa đăng ký dịch vụ InternetBanking tại ngân hàng.",
        "10" => "Giao dịch không thành công do: Khách hàng xác thực thông tin thẻ/tài khoản không đúng quá 3 lần",
        "11" => "Giao dịch không thành công do: Đã hết hạn chờ thanh toán. Xin quý khách vui lòng thực hiện lại giao dịch.",
        "12" => "Giao dịch không thành công do: Thẻ/Tài khoản của khách hàng bị khóa.",
        "13" => "Giao dịch không thành công do Quý khách nhập sai mật khẩu xác thực giao dịch (OTP). Xin quý khách vui lòng thực hiện lại giao dịch.",
        "24" => "Giao dịch không thành công do: Khách hàng hủy giao dịch",
        "51" => "Giao dịch không thành công do: Tài khoản của quý khách không đủ số dư để thực hiện giao dịch.",
        "65" => "Giao dịch không thành công do: Tài khoản của Quý khách đã vượt quá hạn mức giao dịch trong ngày.",
        "75" => "Ngân hàng thanh toán đang bảo trì.",
        "79" => "Giao dịch không thành công do: KH nhập sai mật khẩu thanh toán quá số lần quy định. Xin QK vui lòng thực hiện lại giao dịch",
        "99" => "Các lỗi khác (lỗi còn lại, không có trong danh sách mã lỗi đã liệt kê)",
        _ => "Lỗi không xác định",
    }
}

/// Description of a `vnp_TransactionStatus` value from querydr responses.
pub fn transaction_status_message(status: &str) -> &'static str {
    match status {
        "00" => "Giao dịch thanh toán được thực hiện thành công",
        "01" => "Giao dịch đã được ghi nhận và đang chờ được xử lý",
        "02" => "Giao dịch bị từ chối bởi ngân hàng phát hành thẻ",
        "04" => "Giao dịch bị từ chối do vi phạm quy định",
        "05" => "VNPAY đang xử lý giao dịch này (GD hoàn tiền)",
        "06" => "VNPAY đã gửi yêu cầu hoàn tiền sang Ngân hàng (GD hoàn tiền)",
        "07" => "Giao dịch bị nghi ngờ là giao dịch gian lận",
        "09" => "Giao dịch hoàn trả bị từ chối",
        _ => "Trạng thái không xác định",
    }
}
