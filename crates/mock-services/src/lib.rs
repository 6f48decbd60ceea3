//! Supporting Services
//!
//! 在同一进程中组合三个模拟服务，供代理或集成测试对接：
//!
//! - `/email`: 邮件收发（收件箱/发件箱）
//! - `/erp`: 客户、发票与付款，维护发票余额约束
//! - `/payment`: 概率性支付处理、退款、校验与统计
//!
//! # 主要模块
//!
//! - `services`: 各服务的状态、操作与路由
//! - `models`: 数据模型
//! - `store`: 基于 DashMap 的内存存储
//! - `docs`: OpenAPI 文档与 Swagger UI / ReDoc 页面
//! - `app`: 组合应用
//! - `generators`: 测试数据生成器
//!
//! # 使用示例
//!
//! ```rust
//! use mock_services::generators::DataGenerator;
//! use mock_services::services::{EmailServiceState, ErpServiceState};
//!
//! let erp = ErpServiceState::new();
//! let email = EmailServiceState::new();
//!
//! let stats = DataGenerator::with_customers(5).populate(&erp, &email).unwrap();
//! assert_eq!(stats.customers_count, 5);
//! ```

pub mod app;
pub mod cli;
pub mod docs;
pub mod generators;
pub mod models;
pub mod services;
pub mod store;
