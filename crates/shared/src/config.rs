//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 本地开发时各服务文档中声明的默认服务器地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 支付网关模拟配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// 模拟支付成功的概率，取值 [0, 1]
    pub success_rate: f64,
    /// 随机种子；为空时使用系统熵源
    pub seed: Option<u64>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            success_rate: 0.9,
            seed: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    /// 对外公布的服务根地址，写入各服务 OpenAPI 文档的 servers 字段
    pub base_url: String,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
    pub payment: PaymentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "supporting-services".to_string(),
            environment: "development".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
            payment: PaymentConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. 内置默认值
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. 环境变量（SUPPORT_ 前缀，如 SUPPORT_SERVER__PORT -> server.port）
    /// 5. 部署平台约定的 PORT 与 BASE_URL
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("SUPPORT_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                Environment::with_prefix("SUPPORT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_platform_overrides(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("BASE_URL").ok().as_deref(),
        );

        Ok(config)
    }

    /// 应用部署平台注入的 PORT / BASE_URL
    ///
    /// 无法解析的端口会被忽略，保留已加载的值
    fn apply_platform_overrides(&mut self, port: Option<&str>, base_url: Option<&str>) {
        if let Some(port) = port.and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(base_url) = base_url.map(str::trim).filter(|v| !v.is_empty()) {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 生产环境仍使用默认的 localhost 地址时，文档中的 servers 对外不可达
    pub fn base_url_unset_in_production(&self) -> bool {
        self.is_production() && self.base_url == DEFAULT_BASE_URL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!((config.payment.success_rate - 0.9).abs() < f64::EPSILON);
        assert!(config.payment.seed.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_platform_overrides() {
        let mut config = AppConfig::default();
        config.apply_platform_overrides(Some("9100"), Some("https://demo.example.com/"));

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.base_url, "https://demo.example.com");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_platform_overrides(Some("not-a-port"), Some("   "));

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_production_requires_public_base_url() {
        let mut config = AppConfig {
            environment: "production".to_string(),
            ..Default::default()
        };
        assert!(config.is_production());
        assert!(config.base_url_unset_in_production());

        config.apply_platform_overrides(None, Some("https://mocks.example.com"));
        assert!(!config.base_url_unset_in_production());
        assert!(!AppConfig::default().base_url_unset_in_production());
    }

    #[test]
    fn test_json_log_format() {
        let config = ObservabilityConfig {
            log_format: "JSON".to_string(),
            ..Default::default()
        };
        assert!(config.json_logs());
        assert!(!ObservabilityConfig::default().json_logs());
    }
}
