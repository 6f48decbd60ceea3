//! 组合应用
//!
//! 将邮件、ERP、支付网关挂载到各自前缀下，附带各服务的文档页面、
//! 聚合健康检查、首页与 Prometheus 指标端点。

use std::sync::Arc;

use axum::{Json, Router, middleware, response::Html, routing::get};
use serde_json::{Value, json};
use supporting_shared::{
    config::AppConfig,
    observability::{Observability, middleware as obs_middleware},
};
use tower_http::cors::{Any, CorsLayer};

use crate::docs::docs_routes;
use crate::services::{
    EMAIL_PREFIX, ERP_PREFIX, EmailServiceState, ErpServiceState, PAYMENT_PREFIX,
    PaymentGatewayState, PaymentSimulator, email_api_doc, email_routes, erp_api_doc, erp_routes,
    payment_api_doc, payment_routes,
};

/// 三个服务的共享状态，进程内唯一
#[derive(Clone)]
pub struct AppState {
    pub email: Arc<EmailServiceState>,
    pub erp: Arc<ErpServiceState>,
    pub payment: Arc<PaymentGatewayState>,
}

impl AppState {
    /// 按配置创建空存储，支付结果使用随机模拟器
    pub fn new(config: &AppConfig) -> Self {
        Self {
            email: Arc::new(EmailServiceState::new()),
            erp: Arc::new(ErpServiceState::new()),
            payment: Arc::new(PaymentGatewayState::from_config(&config.payment)),
        }
    }

    /// 使用指定的支付模拟器
    pub fn with_simulator(simulator: Arc<dyn PaymentSimulator>) -> Self {
        Self {
            email: Arc::new(EmailServiceState::new()),
            erp: Arc::new(ErpServiceState::new()),
            payment: Arc::new(PaymentGatewayState::new(simulator)),
        }
    }
}

/// 构建完整的 HTTP 应用
pub fn build_app(config: &AppConfig, state: &AppState, obs: &Observability) -> Router {
    let base_url = config.base_url.as_str();

    let email = email_routes()
        .with_state(state.email.clone())
        .merge(docs_routes(EMAIL_PREFIX, &email_api_doc(base_url)));
    let erp = erp_routes()
        .with_state(state.erp.clone())
        .merge(docs_routes(ERP_PREFIX, &erp_api_doc(base_url)));
    let payment = payment_routes()
        .with_state(state.payment.clone())
        .merge(docs_routes(PAYMENT_PREFIX, &payment_api_doc(base_url)));

    let mut app = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .nest(EMAIL_PREFIX, email)
        .nest(ERP_PREFIX, erp)
        .nest(PAYMENT_PREFIX, payment);

    if let Some(handle) = obs.metrics_handle().cloned() {
        app = app.route(
            "/metrics",
            get(move || std::future::ready(handle.render())),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(cors)
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
}

/// 聚合健康检查
async fn health_check() -> Json<Value> {
    let service = |prefix: &str| json!({ "status": "running", "docs": format!("{}/docs", prefix) });

    Json(json!({
        "status": "healthy",
        "services": {
            "email": service(EMAIL_PREFIX),
            "erp": service(ERP_PREFIX),
            "payment": service(PAYMENT_PREFIX),
        }
    }))
}

/// 首页：列出各服务及文档入口
async fn index() -> Html<String> {
    let services = [
        ("Email Service", EMAIL_PREFIX, "Send emails and browse inbox/outbox"),
        ("ERP System", ERP_PREFIX, "Customers, invoices and payments"),
        ("Payment Gateway", PAYMENT_PREFIX, "Payment processing and refunds"),
    ];

    let cards: String = services
        .iter()
        .map(|(name, prefix, desc)| {
            format!(
                r#"<div class="card"><h2>{name}</h2><p>{desc}</p><p><a href="{prefix}/docs">Swagger UI</a> | <a href="{prefix}/redoc">ReDoc</a> | <a href="{prefix}/openapi.json">OpenAPI</a></p></div>"#
            )
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Supporting Services</title>
<meta charset="utf-8"/>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 40px auto; }}
.card {{ border: 1px solid #ddd; border-radius: 6px; padding: 12px 20px; margin-bottom: 16px; }}
</style>
</head>
<body>
<h1>Supporting Services</h1>
<p>Mock email, ERP and payment gateway APIs. Health: <a href="/health">/health</a></p>
{cards}
</body>
</html>"#
    ))
}
