//! 统一可观测性模块
//!
//! 提供 metrics、tracing、logging 的统一初始化和管理。
//! 所有服务通过单一入口点配置可观测性，确保一致的指标命名。

pub mod metrics;
pub mod middleware;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ObservabilityConfig;

/// 可观测性资源句柄
///
/// 持有 Prometheus handle，供 `/metrics` 端点渲染指标。
#[derive(Clone, Default)]
pub struct Observability {
    metrics: Option<PrometheusHandle>,
}

impl Observability {
    /// 创建一个空的句柄（用于测试或禁用指标时）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn metrics_handle(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}

/// 统一初始化可观测性
///
/// 初始化顺序：
/// 1. Tracing（日志）
/// 2. Metrics（Prometheus recorder，仅在启用时安装）
///
/// # Example
///
/// ```ignore
/// use supporting_shared::{config::AppConfig, observability};
///
/// let config = AppConfig::load("supporting-services").unwrap_or_default();
/// let obs = observability::init(&config.service_name, &config.observability)?;
/// ```
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<Observability> {
    tracing::init(config)?;

    let metrics = if config.metrics_enabled {
        Some(metrics::install(service_name)?)
    } else {
        None
    };

    info!(
        service = %service_name,
        log_format = %config.log_format,
        metrics_enabled = config.metrics_enabled,
        "Observability initialized"
    );

    Ok(Observability { metrics })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_handle() {
        let obs = Observability::empty();
        assert!(obs.metrics_handle().is_none());
    }
}
