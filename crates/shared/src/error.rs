//! 统一错误处理模块
//!
//! 定义各 Mock 服务共享的错误类型，并负责映射为 HTTP 响应。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// 服务错误类型
///
/// Display 输出即返回给调用方的可读信息
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 未知 id 或引用
    #[error("{0}")]
    NotFound(String),

    /// 请求字段缺失或格式错误
    #[error("{0}")]
    Validation(String),

    /// 金额非正或超过上限
    #[error("{0}")]
    InvalidAmount(String),

    /// 当前状态不允许该操作
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// 以资源名构造 NotFound，如 `not_found("Invoice")` -> "Invoice not found"
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidAmount(_) | Self::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => {
                tracing::warn!(code = other.error_code(), detail = %other, "request rejected");
                other.to_string()
            }
        };

        let body = json!({
            "detail": detail,
            "code": self.error_code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ServiceError::not_found("Customer");
        assert_eq!(err.to_string(), "Customer not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (ServiceError::InvalidAmount("x".into()), StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            (ServiceError::InvalidState("x".into()), StatusCode::BAD_REQUEST, "INVALID_STATE"),
            (
                ServiceError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ServiceError::InvalidState("Cannot refund".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["detail"], "Cannot refund");
        assert_eq!(value["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ServiceError::Internal("lock poisoned".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["detail"], "Internal server error");
    }
}
