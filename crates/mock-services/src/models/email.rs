//! 邮件模型
//!
//! 收件箱与发件箱共用同一结构，一次发送在两侧各保留一份副本。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 邮件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub id: u64,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub status: EmailStatus,
}

/// 邮件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Pending,
    /// 发件箱副本
    Sent,
    /// 收件箱副本
    Delivered,
    Failed,
}

impl Email {
    /// 构造收件箱副本
    pub fn delivered_copy(&self) -> Self {
        Self {
            status: EmailStatus::Delivered,
            ..self.clone()
        }
    }
}
