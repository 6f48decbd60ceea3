//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand};

/// 支撑服务命令行工具
///
/// 使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "supporting-server")]
#[command(version, about = "Mock email, ERP and payment gateway services")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 启动组合 HTTP 服务
    ///
    /// 邮件、ERP、支付网关分别挂载在 /email、/erp、/payment 下。
    Server {
        /// 服务端口，覆盖配置与 PORT 环境变量
        #[arg(short, long)]
        port: Option<u16>,

        /// 是否预填充测试数据
        #[arg(long)]
        populate: bool,

        /// 预填充客户数量
        #[arg(long, default_value = "20")]
        customers: usize,
    },

    /// 批量生成测试数据
    ///
    /// 打印统计信息，可选输出 JSON 快照。
    Populate {
        /// 客户数量
        #[arg(short, long, default_value = "20")]
        customers: usize,

        /// 输出到文件（JSON 格式）
        #[arg(short, long)]
        output: Option<String>,
    },
}
