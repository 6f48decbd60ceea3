//! 通用模型
//!
//! 跨服务共用的金额上限、金额汇总与消息响应。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use supporting_shared::ServiceError;

/// 单笔金额上限（1,000,000,000,000），适用于发票、网关交易与退款
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// 累加金额，溢出时返回错误
pub fn checked_total<I>(amounts: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount)
            .ok_or_else(|| ServiceError::Internal("Amount total overflowed".to_string()))
    })
}

/// 通用消息响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_amount_value() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000_i64));
        assert_eq!(MAX_AMOUNT.to_string(), "1000000000000");
    }

    #[test]
    fn test_checked_total() {
        let total = checked_total([Decimal::new(1050, 2), Decimal::new(250, 2)]).unwrap();
        assert_eq!(total, Decimal::from(13));
        assert_eq!(checked_total(Vec::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_checked_total_overflow_is_error() {
        let huge = Decimal::from_parts(0, 0, 0xE230_0000, false, 0);
        let err = checked_total([huge, huge]).unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
