//! Mock 支付网关
//!
//! 模拟支付处理、退款、支付信息预校验与统计。处理结果由注入的
//! [`PaymentSimulator`] 决定，模拟失败同样记录为交易。

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supporting_shared::{
    Result, ServiceError,
    config::PaymentConfig,
    extract::{ApiJson, ApiPath, ApiQuery},
    observability::metrics,
};

use super::payment_simulator::{PaymentSimulator, RandomSimulator};
use crate::docs::{ApiDoc, object_schema};
use crate::models::{
    Currency, MAX_AMOUNT, MessageResponse, PaymentMethod, Transaction, TransactionStatus,
    checked_total,
};
use crate::store::{IdSequence, MemoryStore};

/// 挂载前缀
pub const PAYMENT_PREFIX: &str = "/payment";

const CARD_DETAILS_REQUIRED: &str =
    "Card number, CVV, and card holder name are required for card payments";

/// 生成不重复交易令牌的最大尝试次数
const TOKEN_ATTEMPTS: usize = 8;

/// Mock 支付网关状态
pub struct PaymentGatewayState {
    pub transactions: MemoryStore<Transaction>,
    /// 交易令牌 -> 内部 id
    tokens: DashMap<String, u64>,
    ids: IdSequence,
    simulator: Arc<dyn PaymentSimulator>,
}

impl PaymentGatewayState {
    pub fn new(simulator: Arc<dyn PaymentSimulator>) -> Self {
        Self {
            transactions: MemoryStore::new(),
            tokens: DashMap::new(),
            ids: IdSequence::new(),
            simulator,
        }
    }

    /// 按配置的成功率与种子构建随机模拟器
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(Arc::new(RandomSimulator::new(config.success_rate, config.seed)))
    }

    /// 处理一笔支付
    ///
    /// 校验失败时不记录任何交易；模拟失败的交易以 failed 状态记录
    pub fn process(&self, req: PaymentRequest) -> Result<Transaction> {
        if req.payment_method.requires_card() && req.missing_card_details() {
            return Err(ServiceError::Validation(CARD_DETAILS_REQUIRED.to_string()));
        }
        let errors = validation_errors(&req);
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors.join("; ")));
        }

        let failure = self.simulator.outcome();
        let status = match failure {
            None => TransactionStatus::Success,
            Some(_) => TransactionStatus::Failed,
        };
        let now = Utc::now();
        let (id, transaction_id) = self.reserve_token()?;

        let txn = Transaction {
            transaction_id,
            id,
            amount: req.amount,
            currency: req.currency,
            payment_method: req.payment_method,
            status,
            description: req.description,
            customer_email: req.customer_email,
            customer_name: req.customer_name,
            created_at: now,
            updated_at: now,
            failure_reason: failure.map(|reason| reason.message().to_string()),
        };
        self.transactions.insert(txn.id, txn.clone());

        metrics::record_gateway_transaction(status.as_str(), txn.currency.code());
        match &txn.failure_reason {
            None => tracing::info!(
                transaction_id = %txn.transaction_id,
                amount = %txn.amount,
                currency = %txn.currency,
                "payment processed"
            ),
            Some(reason) => tracing::warn!(
                transaction_id = %txn.transaction_id,
                reason = %reason,
                "simulated payment failure"
            ),
        }

        Ok(txn)
    }

    pub fn list(&self, query: &TransactionQuery) -> Vec<Transaction> {
        self.transactions.list_by(|t| {
            query.status.is_none_or(|s| t.status == s)
                && query
                    .customer_email
                    .as_deref()
                    .is_none_or(|email| t.customer_email == email)
        })
    }

    pub fn get(&self, transaction_id: &str) -> Result<Transaction> {
        self.lookup(transaction_id)
            .and_then(|id| self.transactions.get(id))
            .ok_or_else(|| ServiceError::not_found("Transaction"))
    }

    pub fn status(&self, transaction_id: &str) -> Result<TransactionStatusResponse> {
        let txn = self.get(transaction_id)?;
        Ok(TransactionStatusResponse {
            transaction_id: txn.transaction_id,
            status: txn.status,
            amount: txn.amount,
            currency: txn.currency,
            updated_at: txn.updated_at,
        })
    }

    /// 退款
    ///
    /// 只有 success 状态的交易可以退款，且只能退一次；金额缺省为原交易金额
    pub fn refund(&self, transaction_id: &str, req: RefundRequest) -> Result<RefundResponse> {
        let id = self
            .lookup(transaction_id)
            .ok_or_else(|| ServiceError::not_found("Transaction"))?;

        let (amount, currency) = self
            .transactions
            .update(id, |txn| -> Result<(Decimal, Currency)> {
                if txn.status != TransactionStatus::Success {
                    return Err(ServiceError::InvalidState(format!(
                        "Cannot refund transaction with status: {}",
                        txn.status
                    )));
                }

                let amount = req.amount.unwrap_or(txn.amount);
                if amount <= Decimal::ZERO {
                    return Err(ServiceError::InvalidAmount(
                        "Refund amount must be positive".to_string(),
                    ));
                }
                if amount > txn.amount {
                    return Err(ServiceError::InvalidAmount(format!(
                        "Refund amount cannot exceed original transaction amount of {}",
                        txn.amount
                    )));
                }

                txn.status = TransactionStatus::Refunded;
                txn.updated_at = Utc::now();
                Ok((amount, txn.currency))
            })
            .ok_or_else(|| ServiceError::not_found("Transaction"))??;

        metrics::record_gateway_refund(currency.code());
        tracing::info!(
            transaction_id,
            amount = %amount,
            reason = req.reason.as_deref().unwrap_or(""),
            "transaction refunded"
        );

        Ok(RefundResponse {
            transaction_id: transaction_id.to_string(),
            refund_id: self.simulator.generate_id(),
            amount,
            status: "completed".to_string(),
            message: format!("Refund of {} {} processed successfully", amount, currency),
        })
    }

    /// 只做校验，不产生任何交易
    pub fn validate(&self, req: &PaymentRequest) -> ValidationResponse {
        let errors = validation_errors(req);
        if errors.is_empty() {
            ValidationResponse {
                valid: true,
                errors,
                message: Some("Payment details are valid".to_string()),
            }
        } else {
            ValidationResponse {
                valid: false,
                errors,
                message: None,
            }
        }
    }

    pub fn statistics(&self) -> Result<GatewayStatistics> {
        let txns = self.transactions.list();
        let count = |status: TransactionStatus| txns.iter().filter(|t| t.status == status).count();
        let sum = |status: TransactionStatus| {
            checked_total(txns.iter().filter(|t| t.status == status).map(|t| t.amount))
        };

        let successful_count = count(TransactionStatus::Success);
        let success_rate = if txns.is_empty() {
            0.0
        } else {
            successful_count as f64 / txns.len() as f64 * 100.0
        };

        Ok(GatewayStatistics {
            total_transactions: txns.len(),
            successful_count,
            failed_count: count(TransactionStatus::Failed),
            refunded_count: count(TransactionStatus::Refunded),
            total_amount_processed: sum(TransactionStatus::Success)?,
            total_amount_refunded: sum(TransactionStatus::Refunded)?,
            success_rate,
        })
    }

    /// 清空交易记录，返回清除条数
    pub fn clear(&self) -> usize {
        self.tokens.clear();
        self.transactions.clear()
    }

    fn lookup(&self, transaction_id: &str) -> Option<u64> {
        self.tokens.get(transaction_id).map(|entry| *entry.value())
    }

    /// 分配内部 id 与不重复的交易令牌，令牌冲突时重新生成
    fn reserve_token(&self) -> Result<(u64, String)> {
        for _ in 0..TOKEN_ATTEMPTS {
            let token = self.simulator.generate_id();
            match self.tokens.entry(token) {
                Entry::Vacant(slot) => {
                    let id = self.ids.next_id();
                    let token = slot.key().clone();
                    slot.insert(id);
                    return Ok((id, token));
                }
                Entry::Occupied(taken) => {
                    tracing::warn!(token = %taken.key(), "transaction id collision, regenerating");
                }
            }
        }

        Err(ServiceError::Internal(
            "Failed to allocate a unique transaction id".to_string(),
        ))
    }
}

/// 空值或仅含空白视为未提供
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// 结构性校验，返回全部错误信息
pub fn validation_errors(req: &PaymentRequest) -> Vec<String> {
    let mut errors = Vec::new();
    let is_card = req.payment_method.requires_card();

    match provided(&req.card_number) {
        None if is_card => errors.push("Card number is required".to_string()),
        Some(number) if !(13..=19).contains(&number.len()) => {
            errors.push("Invalid card number length".to_string())
        }
        _ => {}
    }

    match provided(&req.cvv) {
        None if is_card => errors.push("CVV is required".to_string()),
        Some(cvv) if !(3..=4).contains(&cvv.len()) => {
            errors.push("Invalid CVV length".to_string())
        }
        _ => {}
    }

    if is_card && provided(&req.card_holder_name).is_none() {
        errors.push("Card holder name is required".to_string());
    }

    if req.amount <= Decimal::ZERO {
        errors.push("Amount must be positive".to_string());
    } else if req.amount > MAX_AMOUNT {
        errors.push(format!("Amount exceeds maximum of {}", MAX_AMOUNT));
    }

    errors
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 支付请求
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub card_number: Option<String>,
    pub card_holder_name: Option<String>,
    pub cvv: Option<String>,
    pub description: String,
    pub customer_email: String,
    pub customer_name: String,
}

impl PaymentRequest {
    fn missing_card_details(&self) -> bool {
        [&self.card_number, &self.cvv, &self.card_holder_name]
            .into_iter()
            .any(|field| provided(field).is_none())
    }
}

/// 交易过滤参数
#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub status: Option<TransactionStatus>,
    pub customer_email: Option<String>,
}

/// 退款请求，`amount` 缺省时全额退款
#[derive(Debug, Default, Deserialize)]
pub struct RefundRequest {
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefundResponse {
    pub transaction_id: String,
    pub refund_id: String,
    pub amount: Decimal,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub currency: Currency,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 网关统计，`success_rate` 为百分比
#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayStatistics {
    pub total_transactions: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub refunded_count: usize,
    pub total_amount_processed: Decimal,
    pub total_amount_refunded: Decimal,
    pub success_rate: f64,
}

// ============================================================================
// 路由配置
// ============================================================================

/// 构建支付网关路由
pub fn payment_routes() -> Router<Arc<PaymentGatewayState>> {
    Router::new()
        .route("/process", post(process_payment))
        .route("/transactions", get(list_transactions))
        .route("/transactions/clear", delete(clear_transactions))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route(
            "/transactions/{transaction_id}/status",
            get(get_transaction_status),
        )
        .route(
            "/transactions/{transaction_id}/refund",
            post(refund_transaction),
        )
        .route("/validate", post(validate_payment))
        .route("/statistics", get(statistics))
}

/// 支付网关文档
pub fn payment_api_doc(base_url: &str) -> ApiDoc {
    ApiDoc::new(
        "Payment Gateway API",
        "Dummy Payment Gateway for processing payments and refunds",
    )
    .servers(base_url, PAYMENT_PREFIX, "Payment Gateway Server")
    .operation_with_body(
        "POST",
        "/process",
        "Process a payment transaction",
        payment_schema(),
    )
    .operation("GET", "/transactions", "Get all transactions with optional filters")
    .operation("DELETE", "/transactions/clear", "Clear all transaction history")
    .operation("GET", "/transactions/{transaction_id}", "Get a specific transaction by ID")
    .operation(
        "GET",
        "/transactions/{transaction_id}/status",
        "Get the status of a transaction",
    )
    .operation_with_body(
        "POST",
        "/transactions/{transaction_id}/refund",
        "Refund a transaction (full or partial)",
        object_schema(&[("amount", "number", false), ("reason", "string", false)]),
    )
    .operation_with_body(
        "POST",
        "/validate",
        "Validate payment details without processing",
        payment_schema(),
    )
    .operation("GET", "/statistics", "Get payment gateway statistics")
}

fn payment_schema() -> serde_json::Value {
    object_schema(&[
        ("amount", "number", true),
        ("currency", "string", true),
        ("payment_method", "string", true),
        ("card_number", "string", false),
        ("card_holder_name", "string", false),
        ("cvv", "string", false),
        ("description", "string", true),
        ("customer_email", "string", true),
        ("customer_name", "string", true),
    ])
}

// ============================================================================
// 端点处理函数
// ============================================================================

#[tracing::instrument(skip(state, req))]
async fn process_payment(
    State(state): State<Arc<PaymentGatewayState>>,
    ApiJson(req): ApiJson<PaymentRequest>,
) -> Result<(StatusCode, Json<Transaction>)> {
    let txn = state.process(req)?;
    Ok((StatusCode::CREATED, Json(txn)))
}

#[tracing::instrument(skip(state))]
async fn list_transactions(
    State(state): State<Arc<PaymentGatewayState>>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> Json<Vec<Transaction>> {
    Json(state.list(&query))
}

#[tracing::instrument(skip(state))]
async fn get_transaction(
    State(state): State<Arc<PaymentGatewayState>>,
    ApiPath(transaction_id): ApiPath<String>,
) -> Result<Json<Transaction>> {
    state.get(&transaction_id).map(Json)
}

#[tracing::instrument(skip(state))]
async fn get_transaction_status(
    State(state): State<Arc<PaymentGatewayState>>,
    ApiPath(transaction_id): ApiPath<String>,
) -> Result<Json<TransactionStatusResponse>> {
    state.status(&transaction_id).map(Json)
}

#[tracing::instrument(skip(state, req))]
async fn refund_transaction(
    State(state): State<Arc<PaymentGatewayState>>,
    ApiPath(transaction_id): ApiPath<String>,
    ApiJson(req): ApiJson<RefundRequest>,
) -> Result<Json<RefundResponse>> {
    state.refund(&transaction_id, req).map(Json)
}

#[tracing::instrument(skip(state, req))]
async fn validate_payment(
    State(state): State<Arc<PaymentGatewayState>>,
    ApiJson(req): ApiJson<PaymentRequest>,
) -> Json<ValidationResponse> {
    Json(state.validate(&req))
}

#[tracing::instrument(skip(state))]
async fn statistics(
    State(state): State<Arc<PaymentGatewayState>>,
) -> Result<Json<GatewayStatistics>> {
    state.statistics().map(Json)
}

#[tracing::instrument(skip(state))]
async fn clear_transactions(
    State(state): State<Arc<PaymentGatewayState>>,
) -> Json<MessageResponse> {
    let count = state.clear();
    tracing::info!(count, "transactions cleared");
    Json(MessageResponse::new(format!("Cleared {} transactions", count)))
}

// ============================================================================
// 单元测试
// ============================================================================
