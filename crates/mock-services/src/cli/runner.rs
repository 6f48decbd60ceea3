//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑。

use std::fs;
use std::io::Write as _;

use anyhow::{Context, Result};
use supporting_shared::{config::AppConfig, observability::Observability};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::app::{AppState, build_app};
use crate::generators::{DataGenerator, Snapshot};
use crate::services::{EMAIL_PREFIX, ERP_PREFIX, EmailServiceState, ErpServiceState, PAYMENT_PREFIX};

/// 命令执行器
///
/// 持有已加载的配置与可观测性句柄，作为 CLI 与服务之间的桥梁。
pub struct CommandRunner {
    config: AppConfig,
    obs: Observability,
}

impl CommandRunner {
    pub fn new(config: AppConfig, obs: Observability) -> Self {
        Self { config, obs }
    }

    /// 执行 server 命令
    pub async fn run_server(mut self, port: Option<u16>, populate: bool, customers: usize) -> Result<()> {
        if let Some(port) = port {
            self.config.server.port = port;
        }

        if self.config.base_url_unset_in_production() {
            warn!(
                base_url = %self.config.base_url,
                "BASE_URL is not set in production; API docs will advertise localhost"
            );
        }

        let state = AppState::new(&self.config);

        if populate {
            info!(customers, "populating seed data");
            let stats = DataGenerator::with_customers(customers)
                .populate(&state.erp, &state.email)
                .context("failed to populate seed data")?;
            info!(
                customers = stats.customers_count,
                invoices = stats.invoices_count,
                payments = stats.payments_count,
                emails = stats.emails_count,
                "seed data ready"
            );
        }

        let app = build_app(&self.config, &state, &self.obs);

        let addr = self.config.server_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!(addr = %addr, base_url = %self.config.base_url, "supporting services listening");
        for prefix in [EMAIL_PREFIX, ERP_PREFIX, PAYMENT_PREFIX] {
            info!("  {}{}/docs", self.config.base_url, prefix);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// 执行 populate 命令
    ///
    /// 在独立的存储中生成数据，打印统计，可选写出 JSON 快照
    pub fn run_populate(&self, customers: usize, output: Option<String>) -> Result<()> {
        let erp = ErpServiceState::new();
        let email = EmailServiceState::new();

        let stats = DataGenerator::with_customers(customers)
            .populate(&erp, &email)
            .context("failed to generate data")?;

        if let Some(ref path) = output {
            let snapshot = Snapshot::collect(&erp, &email);
            let json = serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;

            let mut file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path))?;
            file.write_all(json.as_bytes())
                .with_context(|| format!("failed to write {}", path))?;

            info!(path, "snapshot written");
        }

        println!("\nSeed data generated:");
        println!("{}", "-".repeat(30));
        println!("Customers: {}", stats.customers_count);
        println!("Invoices:  {}", stats.invoices_count);
        println!("Payments:  {}", stats.payments_count);
        println!("Emails:    {}", stats.emails_count);
        println!("{}", "-".repeat(30));

        Ok(())
    }
}

/// 监听关闭信号
///
/// 收到 Ctrl+C 或 SIGTERM 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
