//! ERP 模型
//!
//! 客户、应付发票与付款记录。发票的未付金额与状态只由付款驱动。

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use supporting_shared::ServiceError;

/// 客户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 发票类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Vendor,
    Supplier,
}

/// 发票状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Outstanding,
    PartiallyPaid,
    Paid,
    /// 仅在创建时根据到期日判定，之后不会重新评估
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// 是否仍有待付款项
    pub fn is_open(self) -> bool {
        matches!(
            self,
            Self::Outstanding | Self::PartiallyPaid | Self::Overdue
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outstanding => "outstanding",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }
}

/// 发票
///
/// 始终满足 `amount_outstanding == amount - amount_paid` 且非负
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: u64,
    pub customer_id: u64,
    pub invoice_type: InvoiceType,
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub amount_outstanding: Decimal,
    pub due_date: NaiveDate,
    pub description: String,
    pub vendor_supplier_name: String,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// 创建时的初始状态：到期日早于今天为 overdue，否则 outstanding
    pub fn initial_status(due_date: NaiveDate, today: NaiveDate) -> InvoiceStatus {
        if due_date < today {
            InvoiceStatus::Overdue
        } else {
            InvoiceStatus::Outstanding
        }
    }

    /// 校验并登记一笔付款
    ///
    /// 校验失败时发票保持不变
    pub fn apply_payment(&mut self, amount: Decimal) -> Result<(), ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidAmount(
                "Payment amount must be positive".to_string(),
            ));
        }
        if amount > self.amount_outstanding {
            return Err(ServiceError::InvalidAmount(format!(
                "Payment amount exceeds outstanding amount of {}",
                self.amount_outstanding
            )));
        }

        self.amount_paid += amount;
        self.amount_outstanding = self.amount - self.amount_paid;

        if self.amount_outstanding.is_zero() {
            self.status = InvoiceStatus::Paid;
        } else if self.amount_paid > Decimal::ZERO {
            self.status = InvoiceStatus::PartiallyPaid;
        }

        Ok(())
    }
}

/// 付款状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// 付款记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: u64,
    pub invoice_id: u64,
    pub amount: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
