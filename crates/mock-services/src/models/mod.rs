//! 模拟数据模型
//!
//! 包含邮件、ERP（客户/发票/付款）与支付网关交易的数据结构。

pub mod common;
pub mod email;
pub mod erp;
pub mod payment;

pub use common::{MAX_AMOUNT, MessageResponse, checked_total};
pub use email::{Email, EmailStatus};
pub use erp::{Customer, Invoice, InvoiceStatus, InvoiceType, Payment, PaymentStatus};
pub use payment::{Currency, FailureReason, PaymentMethod, Transaction, TransactionStatus};
