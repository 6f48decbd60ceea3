//! 支付网关模型
//!
//! 交易以随机令牌 `transaction_id` 对外标识，内部 `id` 仅用于排序。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    BankTransfer,
    Upi,
    Wallet,
    Paypal,
}

impl PaymentMethod {
    /// 卡类支付需要卡号、CVV 与持卡人姓名
    pub fn requires_card(self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

/// 币种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "JPY")]
    Jpy,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Inr => "INR",
            Self::Jpy => "JPY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 交易状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 模拟失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    InsufficientFunds,
    CardDeclined,
    InvalidCardDetails,
    GatewayTimeout,
    BankAuthorizationFailed,
}

impl FailureReason {
    /// 所有失败原因，模拟失败时从中均匀抽取
    pub const ALL: [FailureReason; 5] = [
        Self::InsufficientFunds,
        Self::CardDeclined,
        Self::InvalidCardDetails,
        Self::GatewayTimeout,
        Self::BankAuthorizationFailed,
    ];

    pub fn message(self) -> &'static str {
        match self {
            Self::InsufficientFunds => "Insufficient funds",
            Self::CardDeclined => "Card declined",
            Self::InvalidCardDetails => "Invalid card details",
            Self::GatewayTimeout => "Payment gateway timeout",
            Self::BankAuthorizationFailed => "Bank authorization failed",
        }
    }
}

/// 网关交易
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub id: u64,
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub description: String,
    pub customer_email: String,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_card() {
        assert!(PaymentMethod::CreditCard.requires_card());
        assert!(PaymentMethod::DebitCard.requires_card());
        assert!(!PaymentMethod::BankTransfer.requires_card());
        assert!(!PaymentMethod::Upi.requires_card());
        assert!(!PaymentMethod::Wallet.requires_card());
        assert!(!PaymentMethod::Paypal.requires_card());
    }

    #[test]
    fn test_currency_wire_format() {
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
        let parsed: Currency = serde_json::from_str("\"JPY\"").unwrap();
        assert_eq!(parsed, Currency::Jpy);
        assert_eq!(Currency::Gbp.to_string(), "GBP");
    }

    #[test]
    fn test_method_wire_format() {
        let parsed: PaymentMethod = serde_json::from_str("\"bank_transfer\"").unwrap();
        assert_eq!(parsed, PaymentMethod::BankTransfer);
    }

    #[test]
    fn test_failure_reasons_distinct() {
        let messages: std::collections::HashSet<_> =
            FailureReason::ALL.iter().map(|r| r.message()).collect();
        assert_eq!(messages.len(), 5);
    }
}
