//! 共享库
//!
//! 包含各 Mock 服务共用的配置、错误处理与可观测性基础设施代码。

pub mod config;
pub mod error;
pub mod extract;
pub mod observability;

pub use error::{Result, ServiceError};
