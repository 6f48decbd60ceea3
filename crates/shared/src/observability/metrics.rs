//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集。
//! 指标由主服务的 `/metrics` 端点暴露，供 Prometheus 抓取。

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// 全局 Prometheus handle，recorder 只能安装一次
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// 安装 Prometheus recorder 并注册指标描述
///
/// 重复调用返回首次安装的 handle
pub fn install(service_name: &str) -> Result<PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(service_name);
    Ok(handle)
}

/// 注册通用指标
///
/// 这些描述会出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("emails_sent_total", "Total number of emails sent");
    metrics::describe_counter!(
        "erp_payments_total",
        "Total number of ERP payments applied to invoices"
    );
    metrics::describe_counter!(
        "gateway_transactions_total",
        "Total number of gateway transactions by outcome"
    );
    metrics::describe_counter!("gateway_refunds_total", "Total number of gateway refunds");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录一次邮件发送
#[inline]
pub fn record_email_sent() {
    metrics::counter!("emails_sent_total").increment(1);
}

/// 记录一笔 ERP 付款
#[inline]
pub fn record_erp_payment(invoice_status: &str) {
    metrics::counter!(
        "erp_payments_total",
        "invoice_status" => invoice_status.to_string()
    )
    .increment(1);
}

/// 记录网关交易结果
#[inline]
pub fn record_gateway_transaction(status: &str, currency: &str) {
    metrics::counter!(
        "gateway_transactions_total",
        "status" => status.to_string(),
        "currency" => currency.to_string()
    )
    .increment(1);
}

/// 记录网关退款
#[inline]
pub fn record_gateway_refund(currency: &str) {
    metrics::counter!("gateway_refunds_total", "currency" => currency.to_string()).increment(1);
}
