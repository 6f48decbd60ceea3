//! Mock 邮件服务
//!
//! 提供收件箱、发件箱的查询、删除、清空以及发送邮件的 REST API 端点。
//! 发送总是成功：发件箱保留 sent 副本，收件箱保留 delivered 副本。

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supporting_shared::{
    Result, ServiceError,
    extract::{ApiJson, ApiPath, ApiQuery},
    observability::metrics,
};
use validator::Validate;

use crate::docs::{ApiDoc, object_schema};
use crate::models::{Email, EmailStatus, MessageResponse};
use crate::store::{IdSequence, MemoryStore};

/// 挂载前缀
pub const EMAIL_PREFIX: &str = "/email";

/// Mock Email 服务状态
#[derive(Default)]
pub struct EmailServiceState {
    pub inbox: MemoryStore<Email>,
    pub outbox: MemoryStore<Email>,
    ids: IdSequence,
}

impl EmailServiceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发送邮件
    ///
    /// 分配新 id 并写入两侧，返回发件箱副本
    pub fn send(&self, req: SendEmailRequest) -> Result<Email> {
        req.validate()?;

        let email = Email {
            id: self.ids.next_id(),
            from_email: req.from_email,
            to_email: req.to_email,
            subject: req.subject,
            body: req.body,
            timestamp: Utc::now(),
            status: EmailStatus::Sent,
        };

        self.outbox.insert(email.id, email.clone());
        self.inbox.insert(email.id, email.delivered_copy());
        metrics::record_email_sent();

        Ok(email)
    }

    /// 收件箱列表，可按收件人过滤
    pub fn list_inbox(&self, recipient: Option<&str>) -> Vec<Email> {
        match recipient {
            Some(addr) => self.inbox.list_by(|e| e.to_email == addr),
            None => self.inbox.list(),
        }
    }

    /// 发件箱列表，可按发件人过滤
    pub fn list_outbox(&self, sender: Option<&str>) -> Vec<Email> {
        match sender {
            Some(addr) => self.outbox.list_by(|e| e.from_email == addr),
            None => self.outbox.list(),
        }
    }

    pub fn get_inbox(&self, id: u64) -> Result<Email> {
        self.inbox.get(id).ok_or_else(|| ServiceError::not_found("Email"))
    }

    pub fn get_outbox(&self, id: u64) -> Result<Email> {
        self.outbox.get(id).ok_or_else(|| ServiceError::not_found("Email"))
    }

    pub fn delete_inbox(&self, id: u64) -> Result<Email> {
        self.inbox.remove(id).ok_or_else(|| ServiceError::not_found("Email"))
    }

    pub fn delete_outbox(&self, id: u64) -> Result<Email> {
        self.outbox.remove(id).ok_or_else(|| ServiceError::not_found("Email"))
    }

    /// 标记已读
    ///
    /// 仅确认邮件存在，不改变任何状态
    pub fn mark_read(&self, id: u64) -> Result<()> {
        if self.inbox.contains(id) {
            Ok(())
        } else {
            Err(ServiceError::not_found("Email"))
        }
    }

    pub fn clear_inbox(&self) -> usize {
        self.inbox.clear()
    }

    pub fn clear_outbox(&self) -> usize {
        self.outbox.clear()
    }
}

// ============================================================================
// 请求/响应 DTO
// ============================================================================

/// 发送邮件请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[validate(email(message = "from_email must be a valid email address"))]
    pub from_email: String,
    #[validate(email(message = "to_email must be a valid email address"))]
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// 邮箱过滤参数
#[derive(Debug, Deserialize)]
pub struct MailboxQuery {
    pub email: Option<String>,
}

/// 标记已读响应
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub message: String,
    pub email_id: u64,
}

// ============================================================================
// 路由配置
// ============================================================================

/// 构建邮件服务路由
pub fn email_routes() -> Router<Arc<EmailServiceState>> {
    Router::new()
        .route("/inbox", get(list_inbox))
        .route("/inbox/clear", delete(clear_inbox))
        .route("/inbox/mark-read/{email_id}", post(mark_read))
        .route("/inbox/{email_id}", get(get_inbox_email).delete(delete_inbox_email))
        .route("/outbox", get(list_outbox))
        .route("/outbox/clear", delete(clear_outbox))
        .route("/outbox/{email_id}", get(get_outbox_email).delete(delete_outbox_email))
        .route("/send", post(send_email))
}

/// 邮件服务文档
pub fn email_api_doc(base_url: &str) -> ApiDoc {
    ApiDoc::new(
        "Email Server API",
        "Dummy Email Server for managing inbox and outbox",
    )
    .servers(base_url, EMAIL_PREFIX, "Email Server")
    .operation("GET", "/inbox", "Get all emails in inbox, optionally filtered by recipient")
    .operation("GET", "/inbox/{email_id}", "Get a specific email from inbox by ID")
    .operation("DELETE", "/inbox/{email_id}", "Delete an email from inbox")
    .operation("POST", "/inbox/mark-read/{email_id}", "Mark an email as read")
    .operation("DELETE", "/inbox/clear", "Clear all emails from inbox")
    .operation("GET", "/outbox", "Get all emails in outbox, optionally filtered by sender")
    .operation("GET", "/outbox/{email_id}", "Get a specific email from outbox by ID")
    .operation("DELETE", "/outbox/{email_id}", "Delete an email from outbox")
    .operation("DELETE", "/outbox/clear", "Clear all emails from outbox")
    .operation_with_body(
        "POST",
        "/send",
        "Send an email (adds to outbox and inbox)",
        object_schema(&[
            ("from_email", "string", true),
            ("to_email", "string", true),
            ("subject", "string", true),
            ("body", "string", true),
        ]),
    )
}

// ============================================================================
// 端点处理函数
// ============================================================================

#[tracing::instrument(skip(state))]
async fn list_inbox(
    State(state): State<Arc<EmailServiceState>>,
    ApiQuery(query): ApiQuery<MailboxQuery>,
) -> Json<Vec<Email>> {
    Json(state.list_inbox(query.email.as_deref()))
}

#[tracing::instrument(skip(state))]
async fn get_inbox_email(
    State(state): State<Arc<EmailServiceState>>,
    ApiPath(email_id): ApiPath<u64>,
) -> Result<Json<Email>> {
    state.get_inbox(email_id).map(Json)
}

#[tracing::instrument(skip(state))]
async fn delete_inbox_email(
    State(state): State<Arc<EmailServiceState>>,
    ApiPath(email_id): ApiPath<u64>,
) -> Result<Json<MessageResponse>> {
    state.delete_inbox(email_id)?;
    tracing::info!(email_id, "inbox email deleted");
    Ok(Json(MessageResponse::new("Email deleted successfully")))
}

#[tracing::instrument(skip(state))]
async fn list_outbox(
    State(state): State<Arc<EmailServiceState>>,
    ApiQuery(query): ApiQuery<MailboxQuery>,
) -> Json<Vec<Email>> {
    Json(state.list_outbox(query.email.as_deref()))
}

#[tracing::instrument(skip(state))]
async fn get_outbox_email(
    State(state): State<Arc<EmailServiceState>>,
    ApiPath(email_id): ApiPath<u64>,
) -> Result<Json<Email>> {
    state.get_outbox(email_id).map(Json)
}

#[tracing::instrument(skip(state))]
async fn delete_outbox_email(
    State(state): State<Arc<EmailServiceState>>,
    ApiPath(email_id): ApiPath<u64>,
) -> Result<Json<MessageResponse>> {
    state.delete_outbox(email_id)?;
    tracing::info!(email_id, "outbox email deleted");
    Ok(Json(MessageResponse::new("Email deleted successfully")))
}

#[tracing::instrument(skip(state, req))]
async fn send_email(
    State(state): State<Arc<EmailServiceState>>,
    ApiJson(req): ApiJson<SendEmailRequest>,
) -> Result<(StatusCode, Json<Email>)> {
    let email = state.send(req)?;
    tracing::info!(email_id = email.id, to = %email.to_email, "email sent");
    Ok((StatusCode::CREATED, Json(email)))
}

#[tracing::instrument(skip(state))]
async fn mark_read(
    State(state): State<Arc<EmailServiceState>>,
    ApiPath(email_id): ApiPath<u64>,
) -> Result<Json<MarkReadResponse>> {
    state.mark_read(email_id)?;
    Ok(Json(MarkReadResponse {
        message: "Email marked as read".to_string(),
        email_id,
    }))
}

#[tracing::instrument(skip(state))]
async fn clear_inbox(State(state): State<Arc<EmailServiceState>>) -> Json<MessageResponse> {
    let count = state.clear_inbox();
    tracing::info!(count, "inbox cleared");
    Json(MessageResponse::new(format!("Cleared {} emails from inbox", count)))
}

#[tracing::instrument(skip(state))]
async fn clear_outbox(State(state): State<Arc<EmailServiceState>>) -> Json<MessageResponse> {
    let count = state.clear_outbox();
    tracing::info!(count, "outbox cleared");
    Json(MessageResponse::new(format!("Cleared {} emails from outbox", count)))
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn create_test_app_with_state(state: Arc<EmailServiceState>) -> Router {
        email_routes().with_state(state)
    }

    fn send_request(from: &str, to: &str) -> SendEmailRequest {
        SendEmailRequest {
            from_email: from.to_string(),
            to_email: to.to_string(),
            subject: "Invoice reminder".to_string(),
            body: "Please pay invoice #12".to_string(),
        }
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_send_writes_both_boxes() {
        let state = EmailServiceState::new();
        let sent = state.send(send_request("a@x.com", "b@x.com")).unwrap();

        assert_eq!(sent.id, 1);
        assert_eq!(sent.status, EmailStatus::Sent);

        let inbox = state.get_inbox(1).unwrap();
        assert_eq!(inbox.status, EmailStatus::Delivered);
        assert_eq!(inbox.subject, sent.subject);
        assert_eq!(state.get_outbox(1).unwrap().status, EmailStatus::Sent);
    }

    #[test]
    fn test_send_rejects_invalid_address() {
        let state = EmailServiceState::new();
        let err = state.send(send_request("not-an-address", "b@x.com")).unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(state.inbox.count(), 0);
        assert_eq!(state.outbox.count(), 0);
    }

    #[test]
    fn test_filters() {
        let state = EmailServiceState::new();
        state.send(send_request("a@x.com", "b@x.com")).unwrap();
        state.send(send_request("c@x.com", "b@x.com")).unwrap();
        state.send(send_request("a@x.com", "d@x.com")).unwrap();

        let to_b = state.list_inbox(Some("b@x.com"));
        assert_eq!(to_b.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);

        let from_a = state.list_outbox(Some("a@x.com"));
        assert_eq!(from_a.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 3]);

        assert_eq!(state.list_inbox(None).len(), 3);
    }

    #[test]
    fn test_delete_only_affects_one_box() {
        let state = EmailServiceState::new();
        state.send(send_request("a@x.com", "b@x.com")).unwrap();

        state.delete_inbox(1).unwrap();
        assert!(state.get_inbox(1).is_err());
        assert!(state.get_outbox(1).is_ok());
        assert!(matches!(state.delete_inbox(1), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_ids_continue_after_clear() {
        let state = EmailServiceState::new();
        state.send(send_request("a@x.com", "b@x.com")).unwrap();
        state.send(send_request("a@x.com", "b@x.com")).unwrap();

        assert_eq!(state.clear_inbox(), 2);
        assert_eq!(state.clear_outbox(), 2);

        let next = state.send(send_request("a@x.com", "b@x.com")).unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn test_send_and_filter_over_http() {
        let state = Arc::new(EmailServiceState::new());
        let app = create_test_app_with_state(state.clone());

        let req_body = serde_json::json!({
            "from_email": "a@x.com",
            "to_email": "b@x.com",
            "subject": "Hello",
            "body": "World"
        });

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/send")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(&req_body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let sent: Email = body_json(response).await;
        assert_eq!(sent.status, EmailStatus::Sent);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/inbox?email=b@x.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let inbox: Vec<Email> = body_json(response).await;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, sent.id);
        assert_eq!(inbox[0].status, EmailStatus::Delivered);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/outbox?email=a@x.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let outbox: Vec<Email> = body_json(response).await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].id, sent.id);
        assert_eq!(outbox[0].status, EmailStatus::Sent);
    }

    #[tokio::test]
    async fn test_get_missing_email_returns_404() {
        let app = create_test_app_with_state(Arc::new(EmailServiceState::new()));

        let response = app
            .oneshot(Request::builder().uri("/inbox/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body["detail"], "Email not found");
    }

    #[tokio::test]
    async fn test_mark_read_and_clear() {
        let state = Arc::new(EmailServiceState::new());
        state.send(send_request("a@x.com", "b@x.com")).unwrap();
        let app = create_test_app_with_state(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/inbox/mark-read/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resp: MarkReadResponse = body_json(response).await;
        assert_eq!(resp.email_id, 1);
        assert_eq!(state.get_inbox(1).unwrap().status, EmailStatus::Delivered);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/inbox/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resp: MessageResponse = body_json(response).await;
        assert_eq!(resp.message, "Cleared 1 emails from inbox");
        assert_eq!(state.inbox.count(), 0);
        assert_eq!(state.outbox.count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_send_returns_json_error() {
        let state = Arc::new(EmailServiceState::new());
        let app = create_test_app_with_state(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/send")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"from_email":"a@x.com","to_email":"b@x.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: serde_json::Value = body_json(response).await;
        assert_eq!(err["code"], "VALIDATION_ERROR");
        assert!(err["detail"].as_str().unwrap().contains("subject"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/inbox/first")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: serde_json::Value = body_json(response).await;
        assert_eq!(err["code"], "VALIDATION_ERROR");
        assert_eq!(state.outbox.count(), 0);
    }
}
