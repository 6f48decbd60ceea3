//! 数据生成器
//!
//! 批量生成测试数据，通过各服务的公开操作写入，保证发票金额约束始终成立。

use chrono::{Duration, Utc};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::company::en::{CatchPhrase, CompanyName};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use std::ops::Range;
use supporting_shared::Result;

use crate::models::{Customer, Email, Invoice, InvoiceType, Payment};
use crate::services::email_service::SendEmailRequest;
use crate::services::erp_service::{CustomerRequest, InvoiceRequest, PaymentRequest};
use crate::services::{EmailServiceState, ErpServiceState};

/// 数据生成器配置
///
/// 控制生成数据的数量和分布
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// 生成的客户数量
    pub customer_count: usize,
    /// 每个客户的发票数量范围
    pub invoices_per_customer: Range<usize>,
    /// 每个客户的来信数量范围
    pub emails_per_customer: Range<usize>,
    /// 发票被部分付款的概率
    pub partial_payment_ratio: f64,
}

impl Default for GeneratorConfig {
    /// 默认配置：20 客户，每人 1-4 张发票、0-3 封邮件
    fn default() -> Self {
        Self {
            customer_count: 20,
            invoices_per_customer: 1..4,
            emails_per_customer: 0..3,
            partial_payment_ratio: 0.3,
        }
    }
}

/// 批量数据生成器
pub struct DataGenerator {
    config: GeneratorConfig,
}

impl DataGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    /// 指定客户数量，其余取默认值
    pub fn with_customers(customer_count: usize) -> Self {
        Self::new(GeneratorConfig {
            customer_count,
            ..GeneratorConfig::default()
        })
    }

    /// 生成一条随机客户资料
    pub fn customer_request(&self) -> CustomerRequest {
        let address = format!(
            "{} {}, {}",
            BuildingNumber().fake::<String>(),
            StreetName().fake::<String>(),
            CityName().fake::<String>()
        );

        CustomerRequest {
            name: Name().fake(),
            email: SafeEmail().fake(),
            phone: Some(PhoneNumber().fake()),
            address: Some(address),
            company: Some(CompanyName().fake()),
        }
    }

    /// 为客户生成随机发票，到期日在过去 30 天到未来 60 天之间
    pub fn invoice_request(&self, customer_id: u64) -> InvoiceRequest {
        let mut rng = rand::thread_rng();
        let invoice_type = if rng.gen_bool(0.5) {
            InvoiceType::Vendor
        } else {
            InvoiceType::Supplier
        };

        InvoiceRequest {
            customer_id,
            invoice_type,
            amount: Decimal::new(rng.gen_range(5_000..500_000), 2),
            due_date: Utc::now().date_naive() + Duration::days(rng.gen_range(-30..60)),
            description: CatchPhrase().fake(),
            vendor_supplier_name: CompanyName().fake(),
        }
    }

    /// 生成一封发给 `to_email` 的随机邮件
    pub fn email_request(&self, to_email: &str) -> SendEmailRequest {
        SendEmailRequest {
            from_email: SafeEmail().fake(),
            to_email: to_email.to_string(),
            subject: Sentence(3..7).fake(),
            body: Paragraph(1..3).fake(),
        }
    }

    /// 批量填充数据
    ///
    /// 生成客户，再为每个客户生成发票与邮件；部分发票按比例登记半额付款
    pub fn populate(&self, erp: &ErpServiceState, email: &EmailServiceState) -> Result<GenerationStats> {
        let mut rng = rand::thread_rng();

        for _ in 0..self.config.customer_count {
            let customer = erp.create_customer(self.customer_request())?;

            let invoice_count = rng.gen_range(self.config.invoices_per_customer.clone());
            for _ in 0..invoice_count {
                let invoice = erp.create_invoice(self.invoice_request(customer.id))?;

                if rng.gen_bool(self.config.partial_payment_ratio.clamp(0.0, 1.0)) {
                    erp.create_payment(PaymentRequest {
                        invoice_id: invoice.id,
                        amount: (invoice.amount / Decimal::TWO).round_dp(2),
                        payment_method: "bank_transfer".to_string(),
                        notes: Some("Seeded partial payment".to_string()),
                    })?;
                }
            }

            let email_count = rng.gen_range(self.config.emails_per_customer.clone());
            for _ in 0..email_count {
                email.send(self.email_request(&customer.email))?;
            }
        }

        Ok(GenerationStats::collect(erp, email))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

/// 统计数据生成结果
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStats {
    pub customers_count: usize,
    pub invoices_count: usize,
    pub payments_count: usize,
    pub emails_count: usize,
}

impl GenerationStats {
    /// 从服务状态中收集统计信息
    pub fn collect(erp: &ErpServiceState, email: &EmailServiceState) -> Self {
        Self {
            customers_count: erp.customers.count(),
            invoices_count: erp.invoices.count(),
            payments_count: erp.payments.count(),
            emails_count: email.inbox.count(),
        }
    }
}

/// 数据快照，供 `populate --output` 写出
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
    pub emails: Vec<Email>,
}

impl Snapshot {
    pub fn collect(erp: &ErpServiceState, email: &EmailServiceState) -> Self {
        Self {
            customers: erp.customers.list(),
            invoices: erp.invoices.list(),
            payments: erp.payments.list(),
            emails: email.outbox.list(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_generated_customer_is_valid() {
        let generator = DataGenerator::with_defaults();
        for _ in 0..20 {
            let req = generator.customer_request();
            assert!(req.validate().is_ok(), "{:?}", req);
        }
    }

    #[test]
    fn test_invoice_request_ranges() {
        let generator = DataGenerator::with_defaults();
        let today = Utc::now().date_naive();

        for _ in 0..50 {
            let req = generator.invoice_request(7);
            assert_eq!(req.customer_id, 7);
            assert!(req.amount >= Decimal::new(5_000, 2));
            assert!(req.amount < Decimal::new(500_000, 2));
            assert!(req.due_date >= today - Duration::days(30));
            assert!(req.due_date < today + Duration::days(60));
        }
    }

    #[test]
    fn test_populate() {
        let config = GeneratorConfig {
            customer_count: 5,
            invoices_per_customer: 2..4,
            emails_per_customer: 1..2,
            partial_payment_ratio: 1.0,
        };
        let generator = DataGenerator::new(config);
        let erp = ErpServiceState::new();
        let email = EmailServiceState::new();

        let stats = generator.populate(&erp, &email).unwrap();

        assert_eq!(stats.customers_count, 5);
        assert!(stats.invoices_count >= 10);
        // 每张发票都被付了一半
        assert_eq!(stats.payments_count, stats.invoices_count);
        assert_eq!(stats.emails_count, 5);

        for invoice in erp.invoices.list() {
            assert_eq!(invoice.amount_outstanding, invoice.amount - invoice.amount_paid);
            assert!(invoice.amount_outstanding > Decimal::ZERO);
            assert!(erp.customers.contains(invoice.customer_id));
        }
    }

    #[test]
    fn test_snapshot_serializes() {
        let generator = DataGenerator::with_customers(2);
        let erp = ErpServiceState::new();
        let email = EmailServiceState::new();
        generator.populate(&erp, &email).unwrap();

        let snapshot = Snapshot::collect(&erp, &email);
        assert_eq!(snapshot.customers.len(), 2);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["invoices"].is_array());
    }

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.customer_count, 20);
        assert_eq!(config.invoices_per_customer, 1..4);
        assert_eq!(config.emails_per_customer, 0..3);
    }
}
