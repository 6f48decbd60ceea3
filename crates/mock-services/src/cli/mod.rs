//! CLI 模块
//!
//! - `server` - 启动组合 HTTP 服务
//! - `populate` - 批量生成测试数据
//!
//! # 使用示例
//!
//! ```bash
//! # 启动服务器并预填充数据
//! supporting-server server --port 8000 --populate --customers 30
//!
//! # 生成数据快照
//! supporting-server populate -c 50 -o data.json
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
