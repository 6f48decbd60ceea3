//! Mock ERP 服务
//!
//! 管理客户、供应商发票与付款。登记付款时在发票条目锁内完成校验、
//! 扣减未付金额与状态重算，保证并发付款不会超付。

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supporting_shared::{
    Result, ServiceError,
    extract::{ApiJson, ApiPath, ApiQuery},
    observability::metrics,
};
use validator::Validate;

use crate::docs::{ApiDoc, object_schema};
use crate::models::{
    Customer, Invoice, InvoiceStatus, InvoiceType, MAX_AMOUNT, MessageResponse, Payment,
    PaymentStatus, checked_total,
};
use crate::store::{IdSequence, MemoryStore};

/// 挂载前缀
pub const ERP_PREFIX: &str = "/erp";

/// Mock ERP 服务状态
#[derive(Default)]
pub struct ErpServiceState {
    pub customers: MemoryStore<Customer>,
    pub invoices: MemoryStore<Invoice>,
    pub payments: MemoryStore<Payment>,
    customer_ids: IdSequence,
    invoice_ids: IdSequence,
    payment_ids: IdSequence,
}

impl ErpServiceState {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 客户 ====================

    pub fn create_customer(&self, req: CustomerRequest) -> Result<Customer> {
        req.validate()?;

        let customer = Customer {
            id: self.customer_ids.next_id(),
            name: req.name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            company: req.company,
            created_at: Utc::now(),
        };
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    pub fn get_customer(&self, id: u64) -> Result<Customer> {
        self.customers
            .get(id)
            .ok_or_else(|| ServiceError::not_found("Customer"))
    }

    /// 整体替换客户资料，保留 id 与创建时间
    pub fn update_customer(&self, id: u64, req: CustomerRequest) -> Result<Customer> {
        req.validate()?;

        self.customers
            .update(id, |customer| {
                customer.name = req.name;
                customer.email = req.email;
                customer.phone = req.phone;
                customer.address = req.address;
                customer.company = req.company;
                customer.clone()
            })
            .ok_or_else(|| ServiceError::not_found("Customer"))
    }

    pub fn delete_customer(&self, id: u64) -> Result<Customer> {
        self.customers
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("Customer"))
    }

    // ==================== 发票 ====================

    /// 创建发票，按今天的日期判定初始状态
    pub fn create_invoice(&self, req: InvoiceRequest) -> Result<Invoice> {
        self.create_invoice_as_of(req, Utc::now().date_naive())
    }

    /// 创建发票，`today` 用于判定是否已逾期
    pub fn create_invoice_as_of(&self, req: InvoiceRequest, today: NaiveDate) -> Result<Invoice> {
        if !self.customers.contains(req.customer_id) {
            return Err(ServiceError::not_found("Customer"));
        }
        if req.amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidAmount(
                "Invoice amount must be positive".to_string(),
            ));
        }
        if req.amount > MAX_AMOUNT {
            return Err(ServiceError::InvalidAmount(format!(
                "Invoice amount exceeds maximum of {}",
                MAX_AMOUNT
            )));
        }

        let invoice = Invoice {
            id: self.invoice_ids.next_id(),
            customer_id: req.customer_id,
            invoice_type: req.invoice_type,
            amount: req.amount,
            amount_paid: Decimal::ZERO,
            amount_outstanding: req.amount,
            due_date: req.due_date,
            description: req.description,
            vendor_supplier_name: req.vendor_supplier_name,
            status: Invoice::initial_status(req.due_date, today),
            created_at: Utc::now(),
        };
        self.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    pub fn get_invoice(&self, id: u64) -> Result<Invoice> {
        self.invoices
            .get(id)
            .ok_or_else(|| ServiceError::not_found("Invoice"))
    }

    pub fn list_invoices(&self, query: &InvoiceQuery) -> Vec<Invoice> {
        self.invoices.list_by(|inv| {
            query.status.is_none_or(|s| inv.status == s)
                && query.invoice_type.is_none_or(|t| inv.invoice_type == t)
                && query.customer_id.is_none_or(|c| inv.customer_id == c)
        })
    }

    /// 仍有待付款项的发票（outstanding / partially_paid / overdue）
    pub fn outstanding_invoices(&self) -> Vec<Invoice> {
        self.invoices.list_by(|inv| inv.status.is_open())
    }

    pub fn delete_invoice(&self, id: u64) -> Result<Invoice> {
        self.invoices
            .remove(id)
            .ok_or_else(|| ServiceError::not_found("Invoice"))
    }

    // ==================== 付款 ====================

    /// 登记付款
    ///
    /// 校验、发票更新与付款记录写入在发票条目锁内完成；校验失败时不产生任何修改
    pub fn create_payment(&self, req: PaymentRequest) -> Result<Payment> {
        let PaymentRequest {
            invoice_id,
            amount,
            payment_method,
            notes,
        } = req;

        let (payment, invoice_status) = self
            .invoices
            .update(invoice_id, |invoice| -> Result<(Payment, InvoiceStatus)> {
                invoice.apply_payment(amount)?;

                let payment = Payment {
                    id: self.payment_ids.next_id(),
                    invoice_id,
                    amount,
                    payment_method,
                    notes,
                    status: PaymentStatus::Completed,
                    created_at: Utc::now(),
                };
                self.payments.insert(payment.id, payment.clone());
                Ok((payment, invoice.status))
            })
            .ok_or_else(|| ServiceError::not_found("Invoice"))??;

        metrics::record_erp_payment(invoice_status.as_str());
        tracing::info!(
            payment_id = payment.id,
            invoice_id,
            amount = %payment.amount,
            invoice_status = invoice_status.as_str(),
            "payment applied"
        );

        Ok(payment)
    }

    pub fn get_payment(&self, id: u64) -> Result<Payment> {
        self.payments
            .get(id)
            .ok_or_else(|| ServiceError::not_found("Payment"))
    }

    pub fn list_payments(&self, invoice_id: Option<u64>) -> Vec<Payment> {
        match invoice_id {
            Some(id) => self.payments.list_by(|p| p.invoice_id == id),
            None => self.payments.list(),
        }
    }

    /// 调用时即时汇总，不做缓存
    pub fn statistics(&self) -> Result<ErpStatistics> {
        let invoices = self.invoices.list();

        Ok(ErpStatistics {
            total_customers: self.customers.count(),
            total_invoices: invoices.len(),
            total_payments: self.payments.count(),
            outstanding_invoices_count: invoices.iter().filter(|i| i.status.is_open()).count(),
            total_outstanding_amount: checked_total(invoices.iter().map(|i| i.amount_outstanding))?,
            total_paid_amount: checked_total(invoices.iter().map(|i| i.amount_paid))?,
        })
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 创建/更新客户请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
}

/// 创建发票请求
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceRequest {
    pub customer_id: u64,
    pub invoice_type: InvoiceType,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub description: String,
    pub vendor_supplier_name: String,
}

/// 登记付款请求
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub invoice_id: u64,
    pub amount: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// 发票过滤参数
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    pub status: Option<InvoiceStatus>,
    pub invoice_type: Option<InvoiceType>,
    pub customer_id: Option<u64>,
}

/// 付款过滤参数
#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub invoice_id: Option<u64>,
}

/// ERP 统计
#[derive(Debug, Serialize, Deserialize)]
pub struct ErpStatistics {
    pub total_customers: usize,
    pub total_invoices: usize,
    pub total_payments: usize,
    pub outstanding_invoices_count: usize,
    pub total_outstanding_amount: Decimal,
    pub total_paid_amount: Decimal,
}

// ============================================================================
// 路由配置
// ============================================================================

/// 构建 ERP 服务路由
pub fn erp_routes() -> Router<Arc<ErpServiceState>> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{customer_id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/outstanding", get(outstanding_invoices))
        .route("/invoices/{invoice_id}", get(get_invoice).delete(delete_invoice))
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/{payment_id}", get(get_payment))
        .route("/statistics", get(statistics))
}

/// ERP 服务文档
pub fn erp_api_doc(base_url: &str) -> ApiDoc {
    ApiDoc::new(
        "ERP System API",
        "Dummy ERP System for managing customers, invoices, and payments",
    )
    .servers(base_url, ERP_PREFIX, "ERP System")
    .operation("GET", "/customers", "Get all customers")
    .operation_with_body("POST", "/customers", "Create a new customer", customer_schema())
    .operation("GET", "/customers/{customer_id}", "Get a specific customer by ID")
    .operation_with_body(
        "PUT",
        "/customers/{customer_id}",
        "Update a customer",
        customer_schema(),
    )
    .operation("DELETE", "/customers/{customer_id}", "Delete a customer")
    .operation("GET", "/invoices", "Get all invoices with optional filters")
    .operation_with_body(
        "POST",
        "/invoices",
        "Create a new invoice",
        object_schema(&[
            ("customer_id", "integer", true),
            ("invoice_type", "string", true),
            ("amount", "number", true),
            ("due_date", "string", true),
            ("description", "string", true),
            ("vendor_supplier_name", "string", true),
        ]),
    )
    .operation("GET", "/invoices/outstanding", "Get all outstanding invoices")
    .operation("GET", "/invoices/{invoice_id}", "Get a specific invoice by ID")
    .operation("DELETE", "/invoices/{invoice_id}", "Delete an invoice")
    .operation("GET", "/payments", "Get all payments with optional invoice filter")
    .operation_with_body(
        "POST",
        "/payments",
        "Create a new payment and update invoice status",
        object_schema(&[
            ("invoice_id", "integer", true),
            ("amount", "number", true),
            ("payment_method", "string", true),
            ("notes", "string", false),
        ]),
    )
    .operation("GET", "/payments/{payment_id}", "Get a specific payment by ID")
    .operation("GET", "/statistics", "Get ERP system statistics")
}

fn customer_schema() -> serde_json::Value {
    object_schema(&[
        ("name", "string", true),
        ("email", "string", true),
        ("phone", "string", false),
        ("address", "string", false),
        ("company", "string", false),
    ])
}

// ============================================================================
// 端点处理函数
// ============================================================================

#[tracing::instrument(skip(state))]
async fn list_customers(State(state): State<Arc<ErpServiceState>>) -> Json<Vec<Customer>> {
    Json(state.customers.list())
}

#[tracing::instrument(skip(state))]
async fn get_customer(
    State(state): State<Arc<ErpServiceState>>,
    ApiPath(customer_id): ApiPath<u64>,
) -> Result<Json<Customer>> {
    state.get_customer(customer_id).map(Json)
}

#[tracing::instrument(skip(state, req))]
async fn create_customer(
    State(state): State<Arc<ErpServiceState>>,
    ApiJson(req): ApiJson<CustomerRequest>,
) -> Result<(StatusCode, Json<Customer>)> {
    let customer = state.create_customer(req)?;
    tracing::info!(customer_id = customer.id, "customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

#[tracing::instrument(skip(state, req))]
async fn update_customer(
    State(state): State<Arc<ErpServiceState>>,
    ApiPath(customer_id): ApiPath<u64>,
    ApiJson(req): ApiJson<CustomerRequest>,
) -> Result<Json<Customer>> {
    state.update_customer(customer_id, req).map(Json)
}

#[tracing::instrument(skip(state))]
async fn delete_customer(
    State(state): State<Arc<ErpServiceState>>,
    ApiPath(customer_id): ApiPath<u64>,
) -> Result<Json<MessageResponse>> {
    state.delete_customer(customer_id)?;
    tracing::info!(customer_id, "customer deleted");
    Ok(Json(MessageResponse::new("Customer deleted successfully")))
}

#[tracing::instrument(skip(state))]
async fn list_invoices(
    State(state): State<Arc<ErpServiceState>>,
    ApiQuery(query): ApiQuery<InvoiceQuery>,
) -> Json<Vec<Invoice>> {
    Json(state.list_invoices(&query))
}

#[tracing::instrument(skip(state))]
async fn outstanding_invoices(State(state): State<Arc<ErpServiceState>>) -> Json<Vec<Invoice>> {
    Json(state.outstanding_invoices())
}

#[tracing::instrument(skip(state))]
async fn get_invoice(
    State(state): State<Arc<ErpServiceState>>,
    ApiPath(invoice_id): ApiPath<u64>,
) -> Result<Json<Invoice>> {
    state.get_invoice(invoice_id).map(Json)
}

#[tracing::instrument(skip(state, req), fields(customer_id = req.customer_id))]
async fn create_invoice(
    State(state): State<Arc<ErpServiceState>>,
    ApiJson(req): ApiJson<InvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>)> {
    let invoice = state.create_invoice(req)?;
    tracing::info!(
        invoice_id = invoice.id,
        amount = %invoice.amount,
        status = invoice.status.as_str(),
        "invoice created"
    );
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[tracing::instrument(skip(state))]
async fn delete_invoice(
    State(state): State<Arc<ErpServiceState>>,
    ApiPath(invoice_id): ApiPath<u64>,
) -> Result<Json<MessageResponse>> {
    state.delete_invoice(invoice_id)?;
    tracing::info!(invoice_id, "invoice deleted");
    Ok(Json(MessageResponse::new("Invoice deleted successfully")))
}

#[tracing::instrument(skip(state))]
async fn list_payments(
    State(state): State<Arc<ErpServiceState>>,
    ApiQuery(query): ApiQuery<PaymentQuery>,
) -> Json<Vec<Payment>> {
    Json(state.list_payments(query.invoice_id))
}

#[tracing::instrument(skip(state))]
async fn get_payment(
    State(state): State<Arc<ErpServiceState>>,
    ApiPath(payment_id): ApiPath<u64>,
) -> Result<Json<Payment>> {
    state.get_payment(payment_id).map(Json)
}

#[tracing::instrument(skip(state))]
async fn create_payment(
    State(state): State<Arc<ErpServiceState>>,
    ApiJson(req): ApiJson<PaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    let payment = state.create_payment(req)?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[tracing::instrument(skip(state))]
async fn statistics(State(state): State<Arc<ErpServiceState>>) -> Result<Json<ErpStatistics>> {
    state.statistics().map(Json)
}

// ============================================================================
// 单元测试
// ============================================================================
