//! Mock 服务模块
//!
//! 邮件、ERP 与支付网关三个服务，各自拥有独立的内存存储与路由。

pub mod email_service;
pub mod erp_service;
pub mod payment_gateway;
pub mod payment_simulator;

pub use email_service::{EMAIL_PREFIX, EmailServiceState, email_api_doc, email_routes};
pub use erp_service::{ERP_PREFIX, ErpServiceState, erp_api_doc, erp_routes};
pub use payment_gateway::{
    PAYMENT_PREFIX, PaymentGatewayState, payment_api_doc, payment_routes,
};
pub use payment_simulator::{PaymentSimulator, RandomSimulator};
